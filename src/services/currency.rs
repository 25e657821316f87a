//! Currency codes, exchange-rate providers and the currency converter.
//!
//! Rates come from a [`RateProvider`]. [`StaticRates`] is a fixed demo cross
//! table that is always available; a [`RateStore`] holds a fetched
//! [`RateSnapshot`] and falls back to the static table for anything the
//! snapshot cannot answer.

use super::format::{format_currency, format_number, round_decimals};
use super::history::{History, HistoryEntry};
use crate::error::{CalcError, CalcResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Currencies offered by the converter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CurrencyCode {
    Usd,
    Eur,
    Gbp,
    Jpy,
    Cad,
    Aud,
    Chf,
    Cny,
    Inr,
    Mxn,
}

impl CurrencyCode {
    pub const ALL: [CurrencyCode; 10] = [
        CurrencyCode::Usd,
        CurrencyCode::Eur,
        CurrencyCode::Gbp,
        CurrencyCode::Jpy,
        CurrencyCode::Cad,
        CurrencyCode::Aud,
        CurrencyCode::Chf,
        CurrencyCode::Cny,
        CurrencyCode::Inr,
        CurrencyCode::Mxn,
    ];

    pub fn code(self) -> &'static str {
        match self {
            CurrencyCode::Usd => "USD",
            CurrencyCode::Eur => "EUR",
            CurrencyCode::Gbp => "GBP",
            CurrencyCode::Jpy => "JPY",
            CurrencyCode::Cad => "CAD",
            CurrencyCode::Aud => "AUD",
            CurrencyCode::Chf => "CHF",
            CurrencyCode::Cny => "CNY",
            CurrencyCode::Inr => "INR",
            CurrencyCode::Mxn => "MXN",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CurrencyCode::Usd => "US Dollar",
            CurrencyCode::Eur => "Euro",
            CurrencyCode::Gbp => "British Pound",
            CurrencyCode::Jpy => "Japanese Yen",
            CurrencyCode::Cad => "Canadian Dollar",
            CurrencyCode::Aud => "Australian Dollar",
            CurrencyCode::Chf => "Swiss Franc",
            CurrencyCode::Cny => "Chinese Yuan",
            CurrencyCode::Inr => "Indian Rupee",
            CurrencyCode::Mxn => "Mexican Peso",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            CurrencyCode::Usd => "$",
            CurrencyCode::Eur => "€",
            CurrencyCode::Gbp => "£",
            CurrencyCode::Jpy => "¥",
            CurrencyCode::Cad => "CA$",
            CurrencyCode::Aud => "A$",
            CurrencyCode::Chf => "Fr",
            CurrencyCode::Cny => "CN¥",
            CurrencyCode::Inr => "₹",
            CurrencyCode::Mxn => "MX$",
        }
    }

    /// Minor-unit digits; the yen has none
    pub fn fraction_digits(self) -> usize {
        match self {
            CurrencyCode::Jpy => 0,
            _ => 2,
        }
    }

    /// Format an amount with this currency's symbol and minor units
    pub fn format(self, value: f64) -> String {
        format_currency(value, self.symbol(), self.fraction_digits())
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for CurrencyCode {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_uppercase();
        CurrencyCode::ALL
            .into_iter()
            .find(|c| c.code() == wanted)
            .ok_or_else(|| CalcError::InvalidInput(format!("unknown currency '{}'", s)))
    }
}

/// Currency the loan, SIP and tax summaries are shown in.
///
/// Rates are expressed per Indian rupee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DisplayCurrency {
    #[default]
    Inr,
    Usd,
    Eur,
}

impl DisplayCurrency {
    pub fn code(self) -> CurrencyCode {
        match self {
            DisplayCurrency::Inr => CurrencyCode::Inr,
            DisplayCurrency::Usd => CurrencyCode::Usd,
            DisplayCurrency::Eur => CurrencyCode::Eur,
        }
    }

    /// Units of this currency per rupee
    pub fn per_inr(self) -> f64 {
        match self {
            DisplayCurrency::Inr => 1.0,
            DisplayCurrency::Usd => 0.012,
            DisplayCurrency::Eur => 0.011,
        }
    }

    /// Convert `value` expressed in `base` into this currency
    pub fn convert_from(self, value: f64, base: DisplayCurrency) -> f64 {
        value / base.per_inr() * self.per_inr()
    }

    /// Convert from `base` and format in whole units
    pub fn format_from(self, value: f64, base: DisplayCurrency) -> String {
        format_currency(self.convert_from(value, base), self.code().symbol(), 0)
    }
}

impl FromStr for DisplayCurrency {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.parse::<CurrencyCode>()? {
            CurrencyCode::Inr => Ok(DisplayCurrency::Inr),
            CurrencyCode::Usd => Ok(DisplayCurrency::Usd),
            CurrencyCode::Eur => Ok(DisplayCurrency::Eur),
            other => Err(CalcError::InvalidInput(format!(
                "{} is not a display currency (use INR, USD or EUR)",
                other
            ))),
        }
    }
}

/// Source of exchange rates between two currencies
pub trait RateProvider {
    /// Units of `to` bought by one unit of `from`
    fn rate(&self, from: CurrencyCode, to: CurrencyCode) -> Option<f64>;

    /// When the rates were published, if known
    fn as_of(&self) -> Option<&str> {
        None
    }
}

/// Demo cross rates, rows are `from` and columns `to` in [`CurrencyCode::ALL`] order
const STATIC_RATES: [[f64; 10]; 10] = [
    [1.0, 0.92, 0.79, 149.82, 1.35, 1.52, 0.88, 7.19, 83.15, 16.75],
    [1.09, 1.0, 0.86, 162.84, 1.47, 1.65, 0.96, 7.82, 90.38, 18.21],
    [1.27, 1.16, 1.0, 189.35, 1.71, 1.92, 1.11, 9.1, 105.09, 21.16],
    [0.0067, 0.0061, 0.0053, 1.0, 0.009, 0.01, 0.0059, 0.048, 0.55, 0.11],
    [0.74, 0.68, 0.58, 110.97, 1.0, 1.12, 0.65, 5.32, 61.59, 12.41],
    [0.66, 0.61, 0.52, 98.57, 0.89, 1.0, 0.58, 4.73, 54.7, 11.02],
    [1.14, 1.04, 0.9, 170.25, 1.53, 1.73, 1.0, 8.17, 94.49, 19.03],
    [0.14, 0.13, 0.11, 20.84, 0.19, 0.21, 0.12, 1.0, 11.57, 2.33],
    [0.012, 0.011, 0.0095, 1.8, 0.016, 0.018, 0.011, 0.086, 1.0, 0.2],
    [0.06, 0.055, 0.047, 8.94, 0.081, 0.091, 0.053, 0.43, 4.96, 1.0],
];

/// Fixed demo table; always answers
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticRates;

impl RateProvider for StaticRates {
    fn rate(&self, from: CurrencyCode, to: CurrencyCode) -> Option<f64> {
        Some(STATIC_RATES[from.index()][to.index()])
    }
}

/// Rates relative to one base currency, as published on a given date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateSnapshot {
    pub base: String,
    pub date: String,
    /// Units of each currency per one unit of `base`, keyed by uppercase code
    pub rates: BTreeMap<String, f64>,
}

impl RateSnapshot {
    /// Parse the currency API shape: `{"date": "2024-03-01", "inr": {"usd": 0.012, ...}}`
    pub fn from_api_json(json: &str) -> CalcResult<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let object = value
            .as_object()
            .ok_or_else(|| CalcError::Rates("rate document is not a JSON object".into()))?;

        let date = object
            .get("date")
            .and_then(|d| d.as_str())
            .unwrap_or_default()
            .to_string();

        let (base, table) = object
            .iter()
            .find_map(|(key, value)| value.as_object().map(|table| (key, table)))
            .ok_or_else(|| CalcError::Rates("rate document has no rate table".into()))?;

        let base = base.to_uppercase();
        let mut rates: BTreeMap<String, f64> = table
            .iter()
            .filter_map(|(code, rate)| {
                let rate = rate.as_f64()?;
                (rate.is_finite() && rate > 0.0).then(|| (code.to_uppercase(), rate))
            })
            .collect();
        rates.entry(base.clone()).or_insert(1.0);

        debug!("Parsed {} rates against {} ({})", rates.len(), base, date);
        Ok(Self { base, date, rates })
    }
}

impl RateProvider for RateSnapshot {
    fn rate(&self, from: CurrencyCode, to: CurrencyCode) -> Option<f64> {
        let from = self.rates.get(from.code())?;
        let to = self.rates.get(to.code())?;
        Some(to / from)
    }

    fn as_of(&self) -> Option<&str> {
        (!self.date.is_empty()).then_some(self.date.as_str())
    }
}

/// Somewhere a rate snapshot can be fetched from
pub trait RateSource {
    fn fetch(&self) -> CalcResult<RateSnapshot>;
}

/// A snapshot saved to disk in the API's JSON shape
#[derive(Debug, Clone)]
pub struct FileRateSource {
    path: PathBuf,
}

impl FileRateSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RateSource for FileRateSource {
    fn fetch(&self) -> CalcResult<RateSnapshot> {
        let content = std::fs::read_to_string(&self.path)?;
        RateSnapshot::from_api_json(&content)
    }
}

/// Run `op` up to `attempts` times (at least once) until it succeeds.
///
/// Every call starts with the full budget. `op` receives the 1-based attempt
/// number. The last error is returned when all attempts fail.
pub fn retry_with_budget<T, F>(attempts: u32, mut op: F) -> CalcResult<T>
where
    F: FnMut(u32) -> CalcResult<T>,
{
    let attempts = attempts.max(1);
    let mut attempt = 1;
    loop {
        match op(attempt) {
            Ok(value) => return Ok(value),
            Err(e) if attempt < attempts => {
                debug!("Attempt {}/{} failed: {}", attempt, attempts, e);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Where a [`RateStore`] is in its refresh lifecycle
#[derive(Debug, Clone, PartialEq)]
pub enum RateState {
    Uninitialized,
    Loading,
    Ready(RateSnapshot),
    Failed(String),
}

/// Holds the latest fetched rates.
///
/// Lookups it cannot answer (not yet loaded, failed, or a currency missing
/// from the snapshot) are answered by [`StaticRates`].
#[derive(Debug, Clone)]
pub struct RateStore {
    state: RateState,
    attempts: u32,
}

impl Default for RateStore {
    fn default() -> Self {
        Self::new(3)
    }
}

impl RateStore {
    pub fn new(attempts: u32) -> Self {
        Self {
            state: RateState::Uninitialized,
            attempts,
        }
    }

    pub fn state(&self) -> &RateState {
        &self.state
    }

    pub fn snapshot(&self) -> Option<&RateSnapshot> {
        match &self.state {
            RateState::Ready(snapshot) => Some(snapshot),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.state == RateState::Loading
    }

    /// Fetch from `source`, retrying up to the configured attempts
    pub fn refresh(&mut self, source: &dyn RateSource) -> &RateState {
        self.state = RateState::Loading;
        self.state = match retry_with_budget(self.attempts, |_| source.fetch()) {
            Ok(snapshot) => {
                info!(
                    "Loaded {} exchange rates dated '{}'",
                    snapshot.rates.len(),
                    snapshot.date
                );
                RateState::Ready(snapshot)
            }
            Err(e) => {
                warn!("Exchange rate refresh failed, using static rates: {}", e);
                RateState::Failed(e.to_string())
            }
        };
        &self.state
    }
}

impl RateProvider for RateStore {
    fn rate(&self, from: CurrencyCode, to: CurrencyCode) -> Option<f64> {
        self.snapshot()
            .and_then(|snapshot| snapshot.rate(from, to))
            .or_else(|| StaticRates.rate(from, to))
    }

    fn as_of(&self) -> Option<&str> {
        self.snapshot().and_then(|snapshot| snapshot.as_of())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrencyConversion {
    pub amount: f64,
    pub from: CurrencyCode,
    pub to: CurrencyCode,
    pub rate: f64,
    pub converted: f64,
}

impl CurrencyConversion {
    /// Converted amount with the target currency's symbol
    pub fn formatted(&self) -> String {
        self.to.format(self.converted)
    }

    /// "1 USD = 0.92 EUR"
    pub fn rate_display(&self) -> String {
        format!("1 {} = {} {}", self.from, format_number(self.rate), self.to)
    }
}

/// Convert a positive amount; anything else yields `None`
pub fn convert_currency(
    amount: f64,
    from: CurrencyCode,
    to: CurrencyCode,
    rates: &dyn RateProvider,
) -> Option<CurrencyConversion> {
    if !amount.is_finite() || amount <= 0.0 {
        return None;
    }
    let rate = rates.rate(from, to)?;
    Some(CurrencyConversion {
        amount,
        from,
        to,
        rate,
        converted: amount * rate,
    })
}

/// Interactive currency converter over a rate provider
pub struct CurrencyConverter<'a> {
    rates: &'a dyn RateProvider,
    amount: String,
    from: CurrencyCode,
    to: CurrencyCode,
    result: Option<CurrencyConversion>,
    history: History,
}

impl<'a> CurrencyConverter<'a> {
    pub fn new(rates: &'a dyn RateProvider, history_limit: usize) -> Self {
        Self {
            rates,
            amount: String::new(),
            from: CurrencyCode::Usd,
            to: CurrencyCode::Eur,
            result: None,
            history: History::bounded(history_limit),
        }
    }

    pub fn amount(&self) -> &str {
        &self.amount
    }

    pub fn from_currency(&self) -> CurrencyCode {
        self.from
    }

    pub fn to_currency(&self) -> CurrencyCode {
        self.to
    }

    pub fn result(&self) -> Option<&CurrencyConversion> {
        self.result.as_ref()
    }

    /// Formatted converted amount, empty without a valid amount
    pub fn output(&self) -> String {
        self.result
            .as_ref()
            .map(CurrencyConversion::formatted)
            .unwrap_or_default()
    }

    pub fn set_amount(&mut self, amount: &str) {
        self.amount = amount.to_string();
        self.recompute();
    }

    pub fn set_from(&mut self, currency: CurrencyCode) {
        self.from = currency;
        self.recompute();
    }

    pub fn set_to(&mut self, currency: CurrencyCode) {
        self.to = currency;
        self.recompute();
    }

    /// Exchange the currencies; a converted amount becomes the new input
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.from, &mut self.to);
        if let Some(result) = self.result.take() {
            let carried = round_decimals(result.converted, result.to.fraction_digits());
            self.amount = format_number(carried);
        }
        self.recompute();
    }

    pub fn reset(&mut self) {
        self.amount.clear();
        self.result = None;
    }

    /// Recent conversions, newest first
    pub fn history(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.history.recent()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    fn recompute(&mut self) {
        let amount = self.amount.trim().parse::<f64>().unwrap_or(f64::NAN);
        self.result = convert_currency(amount, self.from, self.to, self.rates);
        if let Some(result) = &self.result {
            self.history.record(
                format!("{} {}", self.amount.trim(), result.from),
                format!("{} {}", result.formatted(), result.to),
            );
        }
    }
}
