//! Calculators, converters and the helpers they share.

pub mod bmi;
pub mod calculator;
pub mod currency;
pub mod format;
pub mod history;
pub mod loan;
pub mod scientific;
pub mod sip;
pub mod tax;
pub mod token;
pub mod units;

mod finance;

pub use calculator::Calculator;
pub use currency::{CurrencyCode, CurrencyConverter, DisplayCurrency, RateProvider, RateStore};
pub use history::{History, HistoryEntry};
pub use scientific::{AngleMode, ScientificCalculator, ScientificEngine};
pub use units::{Converter, LengthUnit, TemperatureUnit, WeightUnit};
