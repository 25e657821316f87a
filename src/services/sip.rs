//! Systematic investment plan: fixed monthly deposits compounding monthly.

use super::finance::{
    monthly_rate, require_finite, require_non_negative, require_positive, term_months,
};
use crate::error::CalcResult;
use serde::Serialize;

/// Longest investment period accepted, in years
pub const MAX_TERM_YEARS: u32 = 50;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SipYearPoint {
    pub year: u32,
    pub invested: f64,
    pub returns: f64,
    pub total_value: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SipSummary {
    pub total_invested: f64,
    pub estimated_returns: f64,
    pub total_value: f64,
    pub yearly: Vec<SipYearPoint>,
}

/// Future value of `months` deposits made at the start of each month
pub fn future_value(monthly_amount: f64, r: f64, months: u32) -> f64 {
    if r == 0.0 {
        return monthly_amount * months as f64;
    }
    let growth = (1.0 + r).powf(months as f64);
    monthly_amount * ((growth - 1.0) / r) * (1.0 + r)
}

pub fn compute_sip(
    monthly_amount: f64,
    annual_rate_percent: f64,
    term_years: f64,
) -> CalcResult<SipSummary> {
    let monthly_amount = require_positive("monthly investment", monthly_amount)?;
    let annual_rate_percent = require_non_negative("expected return", annual_rate_percent)?;
    let term_years = require_positive("time period", term_years)?;

    let r = monthly_rate(annual_rate_percent);
    let months = term_months(term_years, MAX_TERM_YEARS)?;

    let total_value = require_finite("total value", future_value(monthly_amount, r, months))?;
    let total_invested = monthly_amount * months as f64;

    Ok(SipSummary {
        total_invested,
        estimated_returns: total_value - total_invested,
        total_value,
        yearly: yearly_breakdown(monthly_amount, r, months),
    })
}

/// Month-by-month simulation, sampled at each year end and the final month
fn yearly_breakdown(monthly_amount: f64, r: f64, months: u32) -> Vec<SipYearPoint> {
    let mut points = Vec::with_capacity(months.div_ceil(12) as usize);
    let mut invested = 0.0;
    let mut value = 0.0;

    for month in 1..=months {
        invested += monthly_amount;
        value = (value + monthly_amount) * (1.0 + r);
        if month % 12 == 0 || month == months {
            points.push(SipYearPoint {
                year: month.div_ceil(12),
                invested,
                returns: value - invested,
                total_value: value,
            });
        }
    }
    points
}
