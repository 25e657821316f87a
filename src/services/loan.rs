//! Loan (EMI) calculator with a monthly amortization schedule.

use super::finance::{
    monthly_rate, require_finite, require_non_negative, require_positive, term_months,
};
use crate::error::CalcResult;
use serde::Serialize;
use tracing::debug;

/// Longest loan term accepted, in years
pub const MAX_TERM_YEARS: u32 = 100;

/// One month of the schedule
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AmortizationRow {
    pub period: u32,
    pub principal_portion: f64,
    pub interest_portion: f64,
    pub remaining_balance: f64,
}

/// Principal and interest paid during one year of the loan
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoanYear {
    pub year: u32,
    pub principal: f64,
    pub interest: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoanSummary {
    pub monthly_payment: f64,
    pub total_payment: f64,
    pub total_interest: f64,
    pub schedule: Vec<AmortizationRow>,
}

impl LoanSummary {
    /// Schedule rows grouped in blocks of twelve; the last year may be partial
    pub fn yearly_totals(&self) -> Vec<LoanYear> {
        self.schedule
            .chunks(12)
            .zip(1..)
            .map(|(rows, year)| LoanYear {
                year,
                principal: rows.iter().map(|r| r.principal_portion).sum(),
                interest: rows.iter().map(|r| r.interest_portion).sum(),
            })
            .collect()
    }
}

/// Fixed monthly payment for `principal` over `months` at monthly rate `r`
pub fn monthly_payment(principal: f64, r: f64, months: u32) -> f64 {
    if r == 0.0 {
        return principal / months as f64;
    }
    let growth = (1.0 + r).powf(months as f64);
    principal * r * growth / (growth - 1.0)
}

/// Compute the EMI, totals and full schedule.
///
/// A zero rate is allowed and repays the principal in equal parts.
pub fn compute_loan(
    principal: f64,
    annual_rate_percent: f64,
    term_years: f64,
) -> CalcResult<LoanSummary> {
    let principal = require_positive("principal", principal)?;
    let annual_rate_percent = require_non_negative("interest rate", annual_rate_percent)?;
    let term_years = require_positive("loan term", term_years)?;

    let r = monthly_rate(annual_rate_percent);
    let months = term_months(term_years, MAX_TERM_YEARS)?;
    let monthly = require_finite("monthly payment", monthly_payment(principal, r, months))?;

    let mut balance = principal;
    let mut schedule = Vec::with_capacity(months as usize);
    for period in 1..=months {
        let interest = balance * r;
        let principal_portion = monthly - interest;
        balance = (balance - principal_portion).max(0.0);
        schedule.push(AmortizationRow {
            period,
            principal_portion,
            interest_portion: interest,
            remaining_balance: balance,
        });
    }

    // Rounding leaves a few fractions of a cent on the last row
    if let Some(last) = schedule.last_mut() {
        debug!("Loan: final residual balance {:e}", last.remaining_balance);
        last.remaining_balance = 0.0;
    }

    let total_payment = require_finite("total payment", monthly * months as f64)?;
    Ok(LoanSummary {
        monthly_payment: monthly,
        total_payment,
        total_interest: total_payment - principal,
        schedule,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CalcError;

    #[test]
    fn test_one_year_loan() {
        let loan = compute_loan(100_000.0, 10.0, 1.0).unwrap();
        assert!((loan.monthly_payment - 8791.59).abs() < 0.01);
        assert_eq!(loan.schedule.len(), 12);
        assert_eq!(loan.schedule.last().unwrap().remaining_balance, 0.0);
        assert!((loan.total_interest - (loan.total_payment - 100_000.0)).abs() < 1e-9);
    }

    #[test]
    fn test_principal_portions_sum_to_principal() {
        for (principal, rate, years) in [
            (100_000.0, 10.0, 1.0),
            (2_500_000.0, 8.5, 20.0),
            (15_000.0, 3.2, 4.5),
            (999.0, 24.0, 0.5),
        ] {
            let loan = compute_loan(principal, rate, years).unwrap();
            let repaid: f64 = loan.schedule.iter().map(|r| r.principal_portion).sum();
            assert!((repaid - principal).abs() < 0.01, "{} {} {}", principal, rate, years);
            assert!(loan.schedule.iter().all(|r| r.remaining_balance >= 0.0));
            assert_eq!(loan.schedule.last().unwrap().remaining_balance, 0.0);
        }
    }

    #[test]
    fn test_zero_rate_is_linear() {
        let loan = compute_loan(12_000.0, 0.0, 1.0).unwrap();
        assert_eq!(loan.monthly_payment, 1000.0);
        assert_eq!(loan.total_interest, 0.0);
        assert!(loan.schedule.iter().all(|r| r.interest_portion == 0.0));
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(matches!(
            compute_loan(0.0, 10.0, 1.0),
            Err(CalcError::InvalidInput(_))
        ));
        assert!(compute_loan(1000.0, -1.0, 1.0).is_err());
        assert!(compute_loan(1000.0, 10.0, 0.0).is_err());
        assert!(compute_loan(f64::NAN, 10.0, 1.0).is_err());
    }

    #[test]
    fn test_long_terms_are_rejected_not_nan() {
        assert!(matches!(
            compute_loan(1000.0, 10.0, 10_000.0),
            Err(CalcError::InvalidInput(_))
        ));
        // Within the term limit, but (1+r)^n overflows
        assert!(matches!(
            compute_loan(1000.0, 100_000.0, 100.0),
            Err(CalcError::InvalidInput(_))
        ));

        let loan = compute_loan(1000.0, 10.0, 100.0).unwrap();
        assert_eq!(loan.schedule.len(), 1200);
        assert!(loan.monthly_payment.is_finite());
        let repaid: f64 = loan.schedule.iter().map(|r| r.principal_portion).sum();
        assert!((repaid - 1000.0).abs() < 0.01);
    }

    #[test]
    fn test_yearly_totals() {
        let loan = compute_loan(50_000.0, 7.0, 2.5).unwrap();
        let years = loan.yearly_totals();
        assert_eq!(years.len(), 3);
        assert_eq!(years[2].year, 3);
        let principal: f64 = years.iter().map(|y| y.principal).sum();
        let interest: f64 = years.iter().map(|y| y.interest).sum();
        assert!((principal - 50_000.0).abs() < 0.01);
        assert!((principal + interest - loan.total_payment).abs() < 0.01);
        // Interest shrinks as the balance is paid down
        assert!(years[0].interest > years[1].interest);
    }
}
