//! `calcdeck convert` and `calcdeck currency`.

use super::{Output, Quantity};
use crate::config::Config;
use crate::services::currency::{
    convert_currency, CurrencyCode, CurrencyConversion, FileRateSource, RateProvider, RateState,
    RateStore,
};
use crate::services::units::{
    convert_temperature, temperature_descriptor, Conversion, LengthUnit, TemperatureUnit, Unit,
    UnknownUnit, WeightUnit,
};
use anyhow::anyhow;
use serde::Serialize;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Serialize)]
struct UnitReport<'a, U> {
    #[serde(flatten)]
    conversion: &'a Conversion<U>,
    result: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    descriptor: Option<&'static str>,
}

pub fn run_convert(
    quantity: Quantity,
    value: f64,
    from: &str,
    to: &str,
    out: Output,
) -> anyhow::Result<()> {
    match quantity {
        Quantity::Length => report::<LengthUnit>(value, from, to, |_| None, out),
        Quantity::Weight => report::<WeightUnit>(value, from, to, |_| None, out),
        Quantity::Temperature => report::<TemperatureUnit>(
            value,
            from,
            to,
            |c| {
                let celsius =
                    convert_temperature(c.to_value, c.to_unit, TemperatureUnit::Celsius);
                temperature_descriptor(celsius)
            },
            out,
        ),
    }
}

fn report<U>(
    value: f64,
    from: &str,
    to: &str,
    describe: impl Fn(&Conversion<U>) -> Option<&'static str>,
    out: Output,
) -> anyhow::Result<()>
where
    U: Unit + FromStr<Err = UnknownUnit> + Serialize,
{
    if !value.is_finite() {
        return Err(anyhow!("value must be a finite number"));
    }
    let from: U = from.parse()?;
    let to: U = to.parse()?;
    let conversion = Conversion::new(value, from, to);
    let report = UnitReport {
        conversion: &conversion,
        result: conversion.result(),
        descriptor: describe(&conversion),
    };

    out.emit(&report, || match report.descriptor {
        Some(descriptor) => format!("{} ({})", conversion.display(), descriptor),
        None => conversion.display(),
    })
}

#[derive(Debug, Serialize)]
struct CurrencyReport<'a> {
    #[serde(flatten)]
    conversion: &'a CurrencyConversion,
    formatted: String,
    source: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    as_of: Option<&'a str>,
}

pub fn run_currency(
    amount: f64,
    from: &str,
    to: &str,
    rates_file: Option<PathBuf>,
    config: &Config,
    out: Output,
) -> anyhow::Result<()> {
    let from: CurrencyCode = from.parse()?;
    let to: CurrencyCode = to.parse()?;

    let mut store = RateStore::new(config.currency.fetch_attempts);
    if let Some(path) = rates_file {
        if let RateState::Failed(reason) = store.refresh(&FileRateSource::new(path)) {
            eprintln!("Using built-in rates: {}", reason);
        }
    }

    let conversion = convert_currency(amount, from, to, &store)
        .ok_or_else(|| anyhow!("amount must be a positive number"))?;
    let from_snapshot = store
        .snapshot()
        .is_some_and(|snapshot| snapshot.rate(from, to).is_some());

    let report = CurrencyReport {
        conversion: &conversion,
        formatted: conversion.formatted(),
        source: if from_snapshot { "snapshot" } else { "static" },
        as_of: if from_snapshot { store.as_of() } else { None },
    };

    out.emit(&report, || {
        let mut text = format!(
            "{} {} = {}\n{}",
            amount,
            from,
            report.formatted,
            conversion.rate_display()
        );
        match report.as_of {
            Some(date) => text.push_str(&format!(" (rates of {})", date)),
            None => text.push_str(" (built-in rates)"),
        }
        text
    })
}
