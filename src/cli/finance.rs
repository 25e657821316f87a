//! `calcdeck loan`, `sip`, `tax` and `bmi`.
//!
//! Loan and SIP amounts are computed in rupees, tax in US dollars. The
//! display currency only changes how amounts are printed.

use super::Output;
use crate::config::Config;
use crate::services::bmi::{compute_bmi, UnitSystem};
use crate::services::currency::DisplayCurrency;
use crate::services::format::format_fixed;
use crate::services::loan::{compute_loan, LoanSummary, LoanYear};
use crate::services::sip::{compute_sip, SipSummary};
use crate::services::tax::{compute_tax, FilingStatus, TaxSummary, TaxTable};
use serde::Serialize;
use std::fmt::Write;

const LOAN_BASE: DisplayCurrency = DisplayCurrency::Inr;
const SIP_BASE: DisplayCurrency = DisplayCurrency::Inr;
const TAX_BASE: DisplayCurrency = DisplayCurrency::Usd;

/// The `--currency` flag, or the configured display currency
pub fn display_currency(flag: Option<&str>, config: &Config) -> anyhow::Result<DisplayCurrency> {
    match flag {
        Some(code) => Ok(code.parse()?),
        None => Ok(config.currency.display),
    }
}

#[derive(Debug, Serialize)]
struct Report<'a, T> {
    base_currency: DisplayCurrency,
    display_currency: DisplayCurrency,
    #[serde(flatten)]
    summary: &'a T,
    #[serde(skip_serializing_if = "Option::is_none")]
    yearly_totals: Option<Vec<LoanYear>>,
}

pub fn run_loan(
    principal: f64,
    rate: f64,
    years: f64,
    schedule: bool,
    yearly: bool,
    display: DisplayCurrency,
    out: Output,
) -> anyhow::Result<()> {
    let summary = compute_loan(principal, rate, years)?;
    let report = Report {
        base_currency: LOAN_BASE,
        display_currency: display,
        summary: &summary,
        yearly_totals: yearly.then(|| summary.yearly_totals()),
    };
    out.emit(&report, || loan_text(&summary, schedule, yearly, display))
}

fn loan_text(summary: &LoanSummary, schedule: bool, yearly: bool, display: DisplayCurrency) -> String {
    let money = |value: f64| display.format_from(value, LOAN_BASE);
    let mut text = String::new();
    let _ = writeln!(text, "Monthly payment  {}", money(summary.monthly_payment));
    let _ = writeln!(text, "Total payment    {}", money(summary.total_payment));
    let _ = write!(text, "Total interest   {}", money(summary.total_interest));

    if yearly {
        let _ = write!(text, "\n\n{:>5}  {:>14}  {:>14}", "Year", "Principal", "Interest");
        for year in summary.yearly_totals() {
            let _ = write!(
                text,
                "\n{:>5}  {:>14}  {:>14}",
                year.year,
                money(year.principal),
                money(year.interest)
            );
        }
    }

    if schedule {
        let _ = write!(
            text,
            "\n\n{:>5}  {:>14}  {:>14}  {:>14}",
            "Month", "Principal", "Interest", "Balance"
        );
        for row in &summary.schedule {
            let _ = write!(
                text,
                "\n{:>5}  {:>14}  {:>14}  {:>14}",
                row.period,
                money(row.principal_portion),
                money(row.interest_portion),
                money(row.remaining_balance)
            );
        }
    }
    text
}

pub fn run_sip(
    amount: f64,
    rate: f64,
    years: f64,
    yearly: bool,
    display: DisplayCurrency,
    out: Output,
) -> anyhow::Result<()> {
    let summary = compute_sip(amount, rate, years)?;
    let report = Report {
        base_currency: SIP_BASE,
        display_currency: display,
        summary: &summary,
        yearly_totals: None,
    };
    out.emit(&report, || sip_text(&summary, yearly, display))
}

fn sip_text(summary: &SipSummary, yearly: bool, display: DisplayCurrency) -> String {
    let money = |value: f64| display.format_from(value, SIP_BASE);
    let mut text = String::new();
    let _ = writeln!(text, "Invested           {}", money(summary.total_invested));
    let _ = writeln!(text, "Estimated returns  {}", money(summary.estimated_returns));
    let _ = write!(text, "Total value        {}", money(summary.total_value));

    if yearly {
        let _ = write!(
            text,
            "\n\n{:>4}  {:>14}  {:>14}  {:>14}",
            "Year", "Invested", "Returns", "Value"
        );
        for point in &summary.yearly {
            let _ = write!(
                text,
                "\n{:>4}  {:>14}  {:>14}  {:>14}",
                point.year,
                money(point.invested),
                money(point.returns),
                money(point.total_value)
            );
        }
    }
    text
}

pub fn run_tax(
    income: f64,
    status: &str,
    table: &TaxTable,
    display: DisplayCurrency,
    out: Output,
) -> anyhow::Result<()> {
    let status: FilingStatus = status.parse()?;
    let summary = compute_tax(income, status, table)?;
    let report = Report {
        base_currency: TAX_BASE,
        display_currency: display,
        summary: &summary,
        yearly_totals: None,
    };
    out.emit(&report, || tax_text(&summary, display))
}

fn tax_text(summary: &TaxSummary, display: DisplayCurrency) -> String {
    let money = |value: f64| display.format_from(value, TAX_BASE);
    let mut text = String::new();
    let _ = writeln!(text, "Filing status       {}", summary.filing_status);
    let _ = writeln!(text, "Gross income        {}", money(summary.gross_income));
    let _ = writeln!(text, "Standard deduction  {}", money(summary.standard_deduction));
    let _ = writeln!(text, "Taxable income      {}", money(summary.taxable_income));
    let _ = writeln!(text, "Total tax           {}", money(summary.total_tax));
    let _ = writeln!(text, "After-tax income    {}", money(summary.after_tax_income));
    let _ = writeln!(
        text,
        "Marginal rate       {}%",
        format_fixed(summary.marginal_rate_percent, 1)
    );
    let _ = write!(
        text,
        "Effective rate      {}%",
        format_fixed(summary.effective_rate_percent, 2)
    );

    for bracket in &summary.brackets {
        let upper = bracket
            .range_max
            .map(&money)
            .unwrap_or_else(|| "and up".to_string());
        let _ = write!(
            text,
            "\n  {:>5}%  {} - {}: {}",
            format_fixed(bracket.rate * 100.0, 1),
            money(bracket.range_min),
            upper,
            money(bracket.tax)
        );
    }
    text
}

#[derive(Debug, Serialize)]
struct BmiReport {
    value: f64,
    display: String,
    category: String,
    units: UnitSystem,
}

pub fn run_bmi(height: f64, weight: f64, imperial: bool, out: Output) -> anyhow::Result<()> {
    let units = if imperial {
        UnitSystem::Imperial
    } else {
        UnitSystem::Metric
    };
    let reading = compute_bmi(height, weight, units)?;
    let report = BmiReport {
        value: reading.value,
        display: reading.display_value(),
        category: reading.category.to_string(),
        units,
    };
    out.emit(&report, || format!("BMI {} ({})", report.display, report.category))
}
