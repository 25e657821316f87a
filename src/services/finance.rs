//! Input checks and rate helpers shared by the loan and SIP calculators.

use crate::error::{CalcError, CalcResult};

/// Fail unless `value` is finite and strictly positive
pub(crate) fn require_positive(field: &str, value: f64) -> CalcResult<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(CalcError::InvalidInput(format!(
            "{} must be a positive number, got {}",
            field, value
        )))
    }
}

/// Fail unless `value` is finite and not negative
pub(crate) fn require_non_negative(field: &str, value: f64) -> CalcResult<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(CalcError::InvalidInput(format!(
            "{} must not be negative, got {}",
            field, value
        )))
    }
}

/// Annual percentage to a monthly fraction: 12 -> 0.01
pub(crate) fn monthly_rate(annual_rate_percent: f64) -> f64 {
    annual_rate_percent / 100.0 / 12.0
}

/// Whole months in a term given in years, at least one and at most
/// `max_years` worth
pub(crate) fn term_months(term_years: f64, max_years: u32) -> CalcResult<u32> {
    let months = (term_years * 12.0).round();
    if !(months >= 1.0) {
        return Err(CalcError::InvalidInput(format!(
            "term of {} years is shorter than one month",
            term_years
        )));
    }
    if months > f64::from(max_years * 12) {
        return Err(CalcError::InvalidInput(format!(
            "term of {} years is longer than the {} year maximum",
            term_years, max_years
        )));
    }
    Ok(months as u32)
}

/// Fail when a computed amount overflowed to infinity or NaN
pub(crate) fn require_finite(field: &str, value: f64) -> CalcResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CalcError::InvalidInput(format!(
            "{} is too large to compute, lower the rate or shorten the term",
            field
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation() {
        assert!(require_positive("principal", 1.0).is_ok());
        assert!(require_positive("principal", 0.0).is_err());
        assert!(require_positive("principal", f64::NAN).is_err());
        assert!(require_non_negative("rate", 0.0).is_ok());
        assert!(require_non_negative("rate", -0.5).is_err());
        assert!(require_non_negative("rate", f64::INFINITY).is_err());
    }

    #[test]
    fn test_term_months() {
        assert_eq!(term_months(1.0, 50).unwrap(), 12);
        assert_eq!(term_months(2.5, 50).unwrap(), 30);
        assert_eq!(term_months(0.05, 50).unwrap(), 1);
        assert_eq!(term_months(50.0, 50).unwrap(), 600);
        assert!(term_months(0.01, 50).is_err());
        assert!((monthly_rate(12.0) - 0.01).abs() < 1e-15);
    }

    #[test]
    fn test_term_limits_have_distinct_messages() {
        let short = term_months(0.01, 50).unwrap_err().to_string();
        assert!(short.contains("shorter than one month"), "{}", short);
        let long = term_months(10_000.0, 50).unwrap_err().to_string();
        assert!(long.contains("longer than the 50 year maximum"), "{}", long);
        assert!(term_months(f64::INFINITY, 50).is_err());
        assert!(term_months(f64::NAN, 50).is_err());
    }

    #[test]
    fn test_require_finite() {
        assert_eq!(require_finite("total", 12.5).unwrap(), 12.5);
        assert!(require_finite("total", f64::INFINITY).is_err());
        assert!(require_finite("total", f64::NAN).is_err());
    }
}
