//! Body mass index.

use super::format::format_fixed;
use crate::error::{CalcError, CalcResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Metric takes centimeters and kilograms, imperial inches and pounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obesity,
}

impl BmiCategory {
    /// Category bounds are half-open: 18.5 is normal, 25 is overweight
    pub fn from_value(bmi: f64) -> Self {
        if bmi < 18.5 {
            BmiCategory::Underweight
        } else if bmi < 25.0 {
            BmiCategory::Normal
        } else if bmi < 30.0 {
            BmiCategory::Overweight
        } else {
            BmiCategory::Obesity
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BmiCategory::Underweight => "Underweight",
            BmiCategory::Normal => "Normal weight",
            BmiCategory::Overweight => "Overweight",
            BmiCategory::Obesity => "Obesity",
        }
    }
}

impl fmt::Display for BmiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BmiReading {
    pub value: f64,
    pub category: BmiCategory,
}

impl BmiReading {
    /// One decimal, e.g. "22.9"
    pub fn display_value(&self) -> String {
        format_fixed(self.value, 1)
    }
}

pub fn compute_bmi(height: f64, weight: f64, units: UnitSystem) -> CalcResult<BmiReading> {
    for (field, value) in [("height", height), ("weight", weight)] {
        if !(value.is_finite() && value > 0.0) {
            return Err(CalcError::InvalidInput(format!(
                "{} must be a positive number, got {}",
                field, value
            )));
        }
    }

    let value = match units {
        UnitSystem::Metric => {
            let meters = height / 100.0;
            weight / (meters * meters)
        }
        UnitSystem::Imperial => weight * 703.0 / (height * height),
    };

    Ok(BmiReading {
        value,
        category: BmiCategory::from_value(value),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric() {
        let reading = compute_bmi(175.0, 70.0, UnitSystem::Metric).unwrap();
        assert_eq!(reading.display_value(), "22.9");
        assert_eq!(reading.category, BmiCategory::Normal);
    }

    #[test]
    fn test_imperial() {
        let reading = compute_bmi(69.0, 200.0, UnitSystem::Imperial).unwrap();
        assert_eq!(reading.display_value(), "29.5");
        assert_eq!(reading.category, BmiCategory::Overweight);
    }

    #[test]
    fn test_category_boundaries() {
        assert_eq!(BmiCategory::from_value(18.49), BmiCategory::Underweight);
        assert_eq!(BmiCategory::from_value(18.5), BmiCategory::Normal);
        assert_eq!(BmiCategory::from_value(24.95), BmiCategory::Normal);
        assert_eq!(BmiCategory::from_value(25.0), BmiCategory::Overweight);
        assert_eq!(BmiCategory::from_value(30.0), BmiCategory::Obesity);
    }

    #[test]
    fn test_rejects_non_positive() {
        assert!(compute_bmi(0.0, 70.0, UnitSystem::Metric).is_err());
        assert!(compute_bmi(175.0, -1.0, UnitSystem::Metric).is_err());
        assert!(compute_bmi(f64::NAN, 70.0, UnitSystem::Imperial).is_err());
    }
}
