//! Progressive income tax across filing-status bracket tables.

use crate::error::{CalcError, CalcResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilingStatus {
    Single,
    MarriedJoint,
    HeadOfHousehold,
}

impl FilingStatus {
    pub const ALL: [FilingStatus; 3] = [
        FilingStatus::Single,
        FilingStatus::MarriedJoint,
        FilingStatus::HeadOfHousehold,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FilingStatus::Single => "Single",
            FilingStatus::MarriedJoint => "Married Filing Jointly",
            FilingStatus::HeadOfHousehold => "Head of Household",
        }
    }
}

impl fmt::Display for FilingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for FilingStatus {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "single" => Ok(FilingStatus::Single),
            "married" | "married_joint" | "mfj" => Ok(FilingStatus::MarriedJoint),
            "head" | "head_of_household" | "hoh" => Ok(FilingStatus::HeadOfHousehold),
            other => Err(CalcError::InvalidInput(format!(
                "unknown filing status '{}'",
                other
            ))),
        }
    }
}

/// Income from `min` up to `max` is taxed at `rate` (a fraction, 0.12 = 12%)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxBracket {
    pub rate: f64,
    pub min: f64,
    /// None for the open-ended top bracket
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl TaxBracket {
    const fn new(rate: f64, min: f64, max: f64) -> Self {
        Self {
            rate,
            min,
            max: Some(max),
        }
    }

    const fn top(rate: f64, min: f64) -> Self {
        Self {
            rate,
            min,
            max: None,
        }
    }
}

/// Deduction and brackets for one filing status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusTable {
    pub standard_deduction: f64,
    pub brackets: Vec<TaxBracket>,
}

impl StatusTable {
    fn validate(&self) -> Result<(), String> {
        if !(self.standard_deduction.is_finite() && self.standard_deduction >= 0.0) {
            return Err(format!(
                "standard deduction {} is not a non-negative amount",
                self.standard_deduction
            ));
        }
        let Some((top, lower)) = self.brackets.split_last() else {
            return Err("no brackets".to_string());
        };
        if top.max.is_some() {
            return Err("the last bracket must have no upper bound".to_string());
        }
        for bracket in &self.brackets {
            if !(0.0..=1.0).contains(&bracket.rate) {
                return Err(format!("rate {} is outside 0..=1", bracket.rate));
            }
        }
        for (i, bracket) in lower.iter().enumerate() {
            let Some(max) = bracket.max else {
                return Err(format!("bracket {} is unbounded but not last", i + 1));
            };
            if max <= bracket.min {
                return Err(format!("bracket {} ends before it starts", i + 1));
            }
            if self.brackets[i + 1].min < max {
                return Err(format!("bracket {} overlaps the next one", i + 1));
            }
        }
        Ok(())
    }
}

/// Bracket tables for every filing status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxTable {
    pub single: StatusTable,
    pub married_joint: StatusTable,
    pub head_of_household: StatusTable,
}

impl TaxTable {
    /// US federal brackets for 2023 with the 2024 standard deductions
    pub fn us_2023() -> Self {
        Self {
            single: StatusTable {
                standard_deduction: 14600.0,
                brackets: vec![
                    TaxBracket::new(0.10, 0.0, 11000.0),
                    TaxBracket::new(0.12, 11001.0, 44725.0),
                    TaxBracket::new(0.22, 44726.0, 95375.0),
                    TaxBracket::new(0.24, 95376.0, 182100.0),
                    TaxBracket::new(0.32, 182101.0, 231250.0),
                    TaxBracket::new(0.35, 231251.0, 578125.0),
                    TaxBracket::top(0.37, 578126.0),
                ],
            },
            married_joint: StatusTable {
                standard_deduction: 29200.0,
                brackets: vec![
                    TaxBracket::new(0.10, 0.0, 22000.0),
                    TaxBracket::new(0.12, 22001.0, 89450.0),
                    TaxBracket::new(0.22, 89451.0, 190750.0),
                    TaxBracket::new(0.24, 190751.0, 364200.0),
                    TaxBracket::new(0.32, 364201.0, 462500.0),
                    TaxBracket::new(0.35, 462501.0, 693750.0),
                    TaxBracket::top(0.37, 693751.0),
                ],
            },
            head_of_household: StatusTable {
                standard_deduction: 21900.0,
                brackets: vec![
                    TaxBracket::new(0.10, 0.0, 15700.0),
                    TaxBracket::new(0.12, 15701.0, 59850.0),
                    TaxBracket::new(0.22, 59851.0, 95350.0),
                    TaxBracket::new(0.24, 95351.0, 182100.0),
                    TaxBracket::new(0.32, 182101.0, 231250.0),
                    TaxBracket::new(0.35, 231251.0, 578100.0),
                    TaxBracket::top(0.37, 578101.0),
                ],
            },
        }
    }

    pub fn status(&self, status: FilingStatus) -> &StatusTable {
        match status {
            FilingStatus::Single => &self.single,
            FilingStatus::MarriedJoint => &self.married_joint,
            FilingStatus::HeadOfHousehold => &self.head_of_household,
        }
    }

    pub fn standard_deduction(&self, status: FilingStatus) -> f64 {
        self.status(status).standard_deduction
    }

    pub fn brackets(&self, status: FilingStatus) -> &[TaxBracket] {
        &self.status(status).brackets
    }

    /// Brackets must be non-empty, ascending and end in one unbounded bracket
    pub fn validate(&self) -> Result<(), String> {
        for status in FilingStatus::ALL {
            self.status(status)
                .validate()
                .map_err(|e| format!("{}: {}", status, e))?;
        }
        Ok(())
    }
}

impl Default for TaxTable {
    fn default() -> Self {
        Self::us_2023()
    }
}

/// Tax owed within one bracket
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaxBracketBreakdown {
    pub rate: f64,
    pub range_min: f64,
    pub range_max: Option<f64>,
    pub taxable_amount: f64,
    pub tax: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaxSummary {
    pub filing_status: FilingStatus,
    pub gross_income: f64,
    pub standard_deduction: f64,
    pub taxable_income: f64,
    pub total_tax: f64,
    pub after_tax_income: f64,
    pub marginal_rate_percent: f64,
    pub effective_rate_percent: f64,
    pub brackets: Vec<TaxBracketBreakdown>,
}

pub fn compute_tax(
    gross_income: f64,
    status: FilingStatus,
    table: &TaxTable,
) -> CalcResult<TaxSummary> {
    if !gross_income.is_finite() || gross_income < 0.0 {
        return Err(CalcError::InvalidInput(format!(
            "gross income must not be negative, got {}",
            gross_income
        )));
    }

    let standard_deduction = table.standard_deduction(status);
    let taxable_income = (gross_income - standard_deduction).max(0.0);

    let mut brackets = Vec::new();
    let mut marginal_rate = 0.0;
    for bracket in table.brackets(status) {
        if bracket.min < taxable_income {
            let upper = bracket.max.map_or(taxable_income, |max| max.min(taxable_income));
            let taxable_amount = upper - bracket.min;
            brackets.push(TaxBracketBreakdown {
                rate: bracket.rate,
                range_min: bracket.min,
                range_max: bracket.max,
                taxable_amount,
                tax: taxable_amount * bracket.rate,
            });
            marginal_rate = bracket.rate;
        }
        if bracket.max.map_or(true, |max| taxable_income <= max) {
            break;
        }
    }

    let total_tax: f64 = brackets.iter().map(|b| b.tax).sum();
    let effective_rate_percent = if gross_income == 0.0 {
        0.0
    } else {
        total_tax / gross_income * 100.0
    };

    Ok(TaxSummary {
        filing_status: status,
        gross_income,
        standard_deduction,
        taxable_income,
        total_tax,
        after_tax_income: gross_income - total_tax,
        marginal_rate_percent: marginal_rate * 100.0,
        effective_rate_percent,
        brackets,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_fifty_thousand() {
        let table = TaxTable::us_2023();
        let tax = compute_tax(50_000.0, FilingStatus::Single, &table).unwrap();
        assert_eq!(tax.taxable_income, 35_400.0);
        assert_eq!(tax.brackets.len(), 2);
        assert!((tax.total_tax - 4027.88).abs() < 1e-6);
        assert_eq!(tax.marginal_rate_percent, 12.0);
        assert!((tax.effective_rate_percent - tax.total_tax / 50_000.0 * 100.0).abs() < 1e-12);
        assert!((tax.after_tax_income - 45_972.12).abs() < 1e-6);
    }

    #[test]
    fn test_breakdown_sums_to_total() {
        let table = TaxTable::us_2023();
        for status in FilingStatus::ALL {
            for gross in [0.0, 10_000.0, 80_000.0, 250_000.0, 1_000_000.0] {
                let tax = compute_tax(gross, status, &table).unwrap();
                let sum: f64 = tax.brackets.iter().map(|b| b.tax).sum();
                assert_eq!(sum, tax.total_tax);
            }
        }
    }

    #[test]
    fn test_tax_is_monotonic_in_income() {
        let table = TaxTable::us_2023();
        for status in FilingStatus::ALL {
            let mut previous = 0.0;
            let mut gross = 0.0;
            while gross <= 800_000.0 {
                let tax = compute_tax(gross, status, &table).unwrap().total_tax;
                assert!(tax >= previous, "{:?} at {}", status, gross);
                previous = tax;
                gross += 2_500.0;
            }
        }
    }

    #[test]
    fn test_income_below_deduction() {
        let table = TaxTable::us_2023();
        let tax = compute_tax(10_000.0, FilingStatus::MarriedJoint, &table).unwrap();
        assert_eq!(tax.taxable_income, 0.0);
        assert_eq!(tax.total_tax, 0.0);
        assert!(tax.brackets.is_empty());

        let zero = compute_tax(0.0, FilingStatus::Single, &table).unwrap();
        assert_eq!(zero.effective_rate_percent, 0.0);
    }

    #[test]
    fn test_top_bracket_is_reached() {
        let table = TaxTable::us_2023();
        let tax = compute_tax(1_000_000.0, FilingStatus::Single, &table).unwrap();
        assert_eq!(tax.brackets.len(), 7);
        assert_eq!(tax.marginal_rate_percent, 37.0);
        assert_eq!(tax.brackets.last().unwrap().range_max, None);
    }

    #[test]
    fn test_negative_income_rejected() {
        let table = TaxTable::us_2023();
        assert!(matches!(
            compute_tax(-1.0, FilingStatus::Single, &table),
            Err(CalcError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_filing_status_parsing() {
        assert_eq!("single".parse::<FilingStatus>().unwrap(), FilingStatus::Single);
        assert_eq!("Married".parse::<FilingStatus>().unwrap(), FilingStatus::MarriedJoint);
        assert_eq!(
            "head-of-household".parse::<FilingStatus>().unwrap(),
            FilingStatus::HeadOfHousehold
        );
        assert!("widowed".parse::<FilingStatus>().is_err());
    }

    #[test]
    fn test_validate() {
        assert!(TaxTable::us_2023().validate().is_ok());

        let mut table = TaxTable::us_2023();
        table.single.brackets.pop();
        assert!(table.validate().is_err());

        let mut table = TaxTable::us_2023();
        table.head_of_household.brackets.swap(1, 2);
        assert!(table.validate().is_err());

        let mut table = TaxTable::us_2023();
        table.married_joint.brackets.clear();
        assert!(table.validate().is_err());
    }
}
