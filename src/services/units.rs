//! Unit converter module for length, weight and temperature.
//!
//! Length and weight are linear: every unit has a factor to a base unit
//! (meter, kilogram) and a conversion goes through that base. Temperature is
//! affine and goes through Celsius.

use super::format::{format_conversion, format_temperature};
use super::history::{History, HistoryEntry};
use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Newest-first entries a converter keeps unless configured otherwise
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

/// A unit whose conversions are `value * from.factor() / to.factor()`
pub trait LinearUnit: Copy {
    /// How many base units one of this unit is
    fn factor(self) -> f64;
}

/// Convert between two units of the same table
pub fn convert<U: LinearUnit>(value: f64, from: U, to: U) -> f64 {
    value * from.factor() / to.factor()
}

pub fn convert_length(value: f64, from: LengthUnit, to: LengthUnit) -> f64 {
    convert(value, from, to)
}

pub fn convert_weight(value: f64, from: WeightUnit, to: WeightUnit) -> f64 {
    convert(value, from, to)
}

/// Convert temperature (special case - not multiplicative)
pub fn convert_temperature(value: f64, from: TemperatureUnit, to: TemperatureUnit) -> f64 {
    let celsius = match from {
        TemperatureUnit::Celsius => value,
        TemperatureUnit::Fahrenheit => (value - 32.0) * 5.0 / 9.0,
        TemperatureUnit::Kelvin => value - 273.15,
    };

    match to {
        TemperatureUnit::Celsius => celsius,
        TemperatureUnit::Fahrenheit => celsius * 9.0 / 5.0 + 32.0,
        TemperatureUnit::Kelvin => celsius + 273.15,
    }
}

/// Rough feel of a temperature given in Celsius
pub fn temperature_descriptor(celsius: f64) -> Option<&'static str> {
    if celsius.is_nan() {
        return None;
    }
    let descriptor = if celsius < 0.0 {
        "Freezing"
    } else if celsius < 10.0 {
        "Cold"
    } else if celsius < 20.0 {
        "Cool"
    } else if celsius < 30.0 {
        "Warm"
    } else {
        "Hot"
    };
    Some(descriptor)
}

/// Error for unit names that match no unit or alias
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownUnit(pub String);

impl fmt::Display for UnknownUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown unit '{}'", self.0)
    }
}

impl std::error::Error for UnknownUnit {}

fn lookup<U: Copy>(aliases: &HashMap<&'static str, U>, name: &str) -> Result<U, UnknownUnit> {
    let key = name.trim().to_lowercase();
    aliases
        .get(key.as_str())
        .copied()
        .ok_or_else(|| UnknownUnit(name.to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthUnit {
    Meter,
    Kilometer,
    Centimeter,
    Millimeter,
    Inch,
    Foot,
    Yard,
    Mile,
    NauticalMile,
}

impl LengthUnit {
    pub const ALL: [LengthUnit; 9] = [
        LengthUnit::Meter,
        LengthUnit::Kilometer,
        LengthUnit::Centimeter,
        LengthUnit::Millimeter,
        LengthUnit::Inch,
        LengthUnit::Foot,
        LengthUnit::Yard,
        LengthUnit::Mile,
        LengthUnit::NauticalMile,
    ];
}

impl LinearUnit for LengthUnit {
    fn factor(self) -> f64 {
        match self {
            LengthUnit::Meter => 1.0,
            LengthUnit::Kilometer => 1000.0,
            LengthUnit::Centimeter => 0.01,
            LengthUnit::Millimeter => 0.001,
            LengthUnit::Inch => 0.0254,
            LengthUnit::Foot => 0.3048,
            LengthUnit::Yard => 0.9144,
            LengthUnit::Mile => 1609.34,
            LengthUnit::NauticalMile => 1852.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightUnit {
    Kilogram,
    Gram,
    Milligram,
    MetricTon,
    Pound,
    Ounce,
    Stone,
    /// US short ton
    Ton,
}

impl WeightUnit {
    pub const ALL: [WeightUnit; 8] = [
        WeightUnit::Kilogram,
        WeightUnit::Gram,
        WeightUnit::Milligram,
        WeightUnit::MetricTon,
        WeightUnit::Pound,
        WeightUnit::Ounce,
        WeightUnit::Stone,
        WeightUnit::Ton,
    ];
}

impl LinearUnit for WeightUnit {
    fn factor(self) -> f64 {
        match self {
            WeightUnit::Kilogram => 1.0,
            WeightUnit::Gram => 0.001,
            WeightUnit::Milligram => 0.000_001,
            WeightUnit::MetricTon => 1000.0,
            WeightUnit::Pound => 0.45359237,
            WeightUnit::Ounce => 0.0283495,
            WeightUnit::Stone => 6.35029,
            WeightUnit::Ton => 907.185,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TemperatureUnit {
    Celsius,
    Fahrenheit,
    Kelvin,
}

impl TemperatureUnit {
    pub const ALL: [TemperatureUnit; 3] = [
        TemperatureUnit::Celsius,
        TemperatureUnit::Fahrenheit,
        TemperatureUnit::Kelvin,
    ];
}

// Unit aliases mapping to units
static LENGTH_ALIASES: Lazy<HashMap<&'static str, LengthUnit>> = Lazy::new(|| {
    let mut m = HashMap::new();

    for alias in ["m", "meter", "meters", "metre", "metres"] {
        m.insert(alias, LengthUnit::Meter);
    }
    for alias in ["km", "kilometer", "kilometers", "kilometre", "kilometres"] {
        m.insert(alias, LengthUnit::Kilometer);
    }
    for alias in ["cm", "centimeter", "centimeters", "centimetre", "centimetres"] {
        m.insert(alias, LengthUnit::Centimeter);
    }
    for alias in ["mm", "millimeter", "millimeters", "millimetre", "millimetres"] {
        m.insert(alias, LengthUnit::Millimeter);
    }
    for alias in ["in", "inch", "inches", "\""] {
        m.insert(alias, LengthUnit::Inch);
    }
    for alias in ["ft", "foot", "feet", "'"] {
        m.insert(alias, LengthUnit::Foot);
    }
    for alias in ["yd", "yard", "yards"] {
        m.insert(alias, LengthUnit::Yard);
    }
    for alias in ["mi", "mile", "miles"] {
        m.insert(alias, LengthUnit::Mile);
    }
    for alias in [
        "nmi",
        "nautical_mile",
        "nautical mile",
        "nautical miles",
        "nauticalmile",
    ] {
        m.insert(alias, LengthUnit::NauticalMile);
    }

    m
});

static WEIGHT_ALIASES: Lazy<HashMap<&'static str, WeightUnit>> = Lazy::new(|| {
    let mut m = HashMap::new();

    for alias in ["kg", "kilogram", "kilograms", "kilo", "kilos"] {
        m.insert(alias, WeightUnit::Kilogram);
    }
    for alias in ["g", "gram", "grams"] {
        m.insert(alias, WeightUnit::Gram);
    }
    for alias in ["mg", "milligram", "milligrams"] {
        m.insert(alias, WeightUnit::Milligram);
    }
    for alias in ["t", "tonne", "tonnes", "metric_ton", "metric ton", "metricton"] {
        m.insert(alias, WeightUnit::MetricTon);
    }
    for alias in ["lb", "lbs", "pound", "pounds"] {
        m.insert(alias, WeightUnit::Pound);
    }
    for alias in ["oz", "ounce", "ounces"] {
        m.insert(alias, WeightUnit::Ounce);
    }
    for alias in ["st", "stone", "stones"] {
        m.insert(alias, WeightUnit::Stone);
    }
    for alias in ["ton", "tons", "short ton", "short_ton"] {
        m.insert(alias, WeightUnit::Ton);
    }

    m
});

static TEMPERATURE_ALIASES: Lazy<HashMap<&'static str, TemperatureUnit>> = Lazy::new(|| {
    let mut m = HashMap::new();

    for alias in ["c", "°c", "celsius", "centigrade"] {
        m.insert(alias, TemperatureUnit::Celsius);
    }
    for alias in ["f", "°f", "fahrenheit"] {
        m.insert(alias, TemperatureUnit::Fahrenheit);
    }
    for alias in ["k", "kelvin"] {
        m.insert(alias, TemperatureUnit::Kelvin);
    }

    m
});

impl FromStr for LengthUnit {
    type Err = UnknownUnit;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lookup(&*LENGTH_ALIASES, s)
    }
}

impl FromStr for WeightUnit {
    type Err = UnknownUnit;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lookup(&*WEIGHT_ALIASES, s)
    }
}

impl FromStr for TemperatureUnit {
    type Err = UnknownUnit;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lookup(&*TEMPERATURE_ALIASES, s)
    }
}

/// What a [`Converter`] needs from its unit type
pub trait Unit: Copy + PartialEq + fmt::Debug {
    fn convert_value(value: f64, from: Self, to: Self) -> f64;

    /// Short display symbol, e.g. "km" or "°F"
    fn symbol(self) -> &'static str;

    /// Full name, e.g. "Kilometer"
    fn name(self) -> &'static str;

    fn format_value(value: f64) -> String {
        format_conversion(value)
    }
}

impl Unit for LengthUnit {
    fn convert_value(value: f64, from: Self, to: Self) -> f64 {
        convert_length(value, from, to)
    }

    fn symbol(self) -> &'static str {
        match self {
            LengthUnit::Meter => "m",
            LengthUnit::Kilometer => "km",
            LengthUnit::Centimeter => "cm",
            LengthUnit::Millimeter => "mm",
            LengthUnit::Inch => "in",
            LengthUnit::Foot => "ft",
            LengthUnit::Yard => "yd",
            LengthUnit::Mile => "mi",
            LengthUnit::NauticalMile => "nmi",
        }
    }

    fn name(self) -> &'static str {
        match self {
            LengthUnit::Meter => "Meter",
            LengthUnit::Kilometer => "Kilometer",
            LengthUnit::Centimeter => "Centimeter",
            LengthUnit::Millimeter => "Millimeter",
            LengthUnit::Inch => "Inch",
            LengthUnit::Foot => "Foot",
            LengthUnit::Yard => "Yard",
            LengthUnit::Mile => "Mile",
            LengthUnit::NauticalMile => "Nautical Mile",
        }
    }
}

impl Unit for WeightUnit {
    fn convert_value(value: f64, from: Self, to: Self) -> f64 {
        convert_weight(value, from, to)
    }

    fn symbol(self) -> &'static str {
        match self {
            WeightUnit::Kilogram => "kg",
            WeightUnit::Gram => "g",
            WeightUnit::Milligram => "mg",
            WeightUnit::MetricTon => "t",
            WeightUnit::Pound => "lb",
            WeightUnit::Ounce => "oz",
            WeightUnit::Stone => "st",
            WeightUnit::Ton => "ton",
        }
    }

    fn name(self) -> &'static str {
        match self {
            WeightUnit::Kilogram => "Kilogram",
            WeightUnit::Gram => "Gram",
            WeightUnit::Milligram => "Milligram",
            WeightUnit::MetricTon => "Metric Ton",
            WeightUnit::Pound => "Pound",
            WeightUnit::Ounce => "Ounce",
            WeightUnit::Stone => "Stone",
            WeightUnit::Ton => "US Ton",
        }
    }
}

impl Unit for TemperatureUnit {
    fn convert_value(value: f64, from: Self, to: Self) -> f64 {
        convert_temperature(value, from, to)
    }

    fn symbol(self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "°C",
            TemperatureUnit::Fahrenheit => "°F",
            TemperatureUnit::Kelvin => "K",
        }
    }

    fn name(self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "Celsius",
            TemperatureUnit::Fahrenheit => "Fahrenheit",
            TemperatureUnit::Kelvin => "Kelvin",
        }
    }

    fn format_value(value: f64) -> String {
        format_temperature(value)
    }
}

/// A conversion result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conversion<U> {
    pub from_value: f64,
    pub from_unit: U,
    pub to_value: f64,
    pub to_unit: U,
}

impl<U: Unit> Conversion<U> {
    pub fn new(value: f64, from: U, to: U) -> Self {
        Self {
            from_value: value,
            from_unit: from,
            to_value: U::convert_value(value, from, to),
            to_unit: to,
        }
    }

    /// Just the result value formatted
    pub fn result(&self) -> String {
        U::format_value(self.to_value)
    }

    /// Format as display string: "10 km = 6.214 mi"
    pub fn display(&self) -> String {
        format!(
            "{} {} = {} {}",
            self.from_value,
            self.from_unit.symbol(),
            self.result(),
            self.to_unit.symbol()
        )
    }
}

/// Interactive converter: typed input, two selected units, recent history
#[derive(Debug, Clone)]
pub struct Converter<U: Unit> {
    input: String,
    output: String,
    from: U,
    to: U,
    history: History,
}

pub type LengthConverter = Converter<LengthUnit>;
pub type WeightConverter = Converter<WeightUnit>;
pub type TemperatureConverter = Converter<TemperatureUnit>;

impl Default for LengthConverter {
    fn default() -> Self {
        Converter::new(LengthUnit::Meter, LengthUnit::Foot, DEFAULT_HISTORY_LIMIT)
    }
}

impl Default for WeightConverter {
    fn default() -> Self {
        Converter::new(WeightUnit::Kilogram, WeightUnit::Pound, DEFAULT_HISTORY_LIMIT)
    }
}

impl Default for TemperatureConverter {
    fn default() -> Self {
        Converter::new(
            TemperatureUnit::Celsius,
            TemperatureUnit::Fahrenheit,
            DEFAULT_HISTORY_LIMIT,
        )
    }
}

impl<U: Unit> Converter<U> {
    pub fn new(from: U, to: U, history_limit: usize) -> Self {
        Self {
            input: String::new(),
            output: String::new(),
            from,
            to,
            history: History::bounded(history_limit),
        }
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    /// Formatted result, empty while the input is not a number
    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn from_unit(&self) -> U {
        self.from
    }

    pub fn to_unit(&self) -> U {
        self.to
    }

    pub fn set_input(&mut self, input: &str) {
        self.input = input.to_string();
        self.recompute();
    }

    pub fn set_from_unit(&mut self, unit: U) {
        self.from = unit;
        self.recompute();
    }

    pub fn set_to_unit(&mut self, unit: U) {
        self.to = unit;
        self.recompute();
    }

    /// Exchange the units and move the result into the input
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.from, &mut self.to);
        self.input = std::mem::take(&mut self.output);
        self.recompute();
    }

    /// Clear input and output; units and history stay
    pub fn reset(&mut self) {
        self.input.clear();
        self.output.clear();
    }

    /// Recent conversions, newest first
    pub fn history(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.history.recent()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    fn recompute(&mut self) {
        let value = match self.input.trim().parse::<f64>() {
            Ok(value) if value.is_finite() => value,
            _ => {
                if !self.input.trim().is_empty() {
                    debug!("Converter: ignoring non-numeric input '{}'", self.input);
                }
                self.output.clear();
                return;
            }
        };

        let conversion = Conversion::new(value, self.from, self.to);
        self.output = conversion.result();
        self.history.record(
            format!("{} {}", self.input.trim(), self.from.symbol()),
            format!("{} {}", self.output, self.to.symbol()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meter_to_feet() {
        let feet = convert_length(1.0, LengthUnit::Meter, LengthUnit::Foot);
        assert!((feet - 3.28084).abs() < 0.0001);
        assert_eq!(format_conversion(feet), "3.281");
    }

    #[test]
    fn test_kg_to_lb() {
        let pounds = convert_weight(1.0, WeightUnit::Kilogram, WeightUnit::Pound);
        assert!((pounds - 2.20462).abs() < 0.0001);
    }

    #[test]
    fn test_round_trips_are_stable() {
        for from in LengthUnit::ALL {
            for to in LengthUnit::ALL {
                let there = convert_length(123.456, from, to);
                let back = convert_length(there, to, from);
                assert!((back - 123.456).abs() < 1e-9, "{:?} -> {:?}", from, to);
            }
        }
        for from in WeightUnit::ALL {
            for to in WeightUnit::ALL {
                let back = convert_weight(convert_weight(7.5, from, to), to, from);
                assert!((back - 7.5).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_temperature() {
        assert_eq!(
            convert_temperature(0.0, TemperatureUnit::Celsius, TemperatureUnit::Fahrenheit),
            32.0
        );
        let c = convert_temperature(212.0, TemperatureUnit::Fahrenheit, TemperatureUnit::Celsius);
        assert!((c - 100.0).abs() < 1e-9);
        let k = convert_temperature(-40.0, TemperatureUnit::Fahrenheit, TemperatureUnit::Kelvin);
        assert!((k - 233.15).abs() < 1e-9);

        for from in TemperatureUnit::ALL {
            for to in TemperatureUnit::ALL {
                let back = convert_temperature(convert_temperature(36.6, from, to), to, from);
                assert!((back - 36.6).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_temperature_descriptor() {
        assert_eq!(temperature_descriptor(-5.0), Some("Freezing"));
        assert_eq!(temperature_descriptor(0.0), Some("Cold"));
        assert_eq!(temperature_descriptor(15.0), Some("Cool"));
        assert_eq!(temperature_descriptor(25.0), Some("Warm"));
        assert_eq!(temperature_descriptor(30.0), Some("Hot"));
        assert_eq!(temperature_descriptor(f64::NAN), None);
    }

    #[test]
    fn test_unit_aliases() {
        assert_eq!("km".parse::<LengthUnit>(), Ok(LengthUnit::Kilometer));
        assert_eq!(" Feet ".parse::<LengthUnit>(), Ok(LengthUnit::Foot));
        assert_eq!("lbs".parse::<WeightUnit>(), Ok(WeightUnit::Pound));
        assert_eq!("°F".parse::<TemperatureUnit>(), Ok(TemperatureUnit::Fahrenheit));
        assert!("parsec".parse::<LengthUnit>().is_err());
    }

    #[test]
    fn test_conversion_display() {
        let conversion = Conversion::new(10.0, LengthUnit::Kilometer, LengthUnit::Mile);
        assert_eq!(conversion.display(), "10 km = 6.214 mi");
    }

    #[test]
    fn test_converter_ignores_bad_input() {
        let mut converter = LengthConverter::default();
        converter.set_input("abc");
        assert_eq!(converter.output(), "");
        converter.set_input("");
        assert_eq!(converter.output(), "");
        assert_eq!(converter.history().count(), 0);
    }

    #[test]
    fn test_converter_swap_moves_result_into_input() {
        let mut converter = TemperatureConverter::default();
        converter.set_input("100");
        assert_eq!(converter.output(), "212.0");

        converter.swap();
        assert_eq!(converter.from_unit(), TemperatureUnit::Fahrenheit);
        assert_eq!(converter.to_unit(), TemperatureUnit::Celsius);
        assert_eq!(converter.input(), "212.0");
        assert_eq!(converter.output(), "100.0");
    }

    #[test]
    fn test_converter_history_is_bounded_and_newest_first() {
        let mut converter = WeightConverter::default();
        for i in 1..=15 {
            converter.set_input(&i.to_string());
        }
        let inputs: Vec<_> = converter.history().map(|e| e.input.clone()).collect();
        assert_eq!(inputs.len(), 10);
        assert_eq!(inputs[0], "15 kg");
        assert_eq!(inputs[9], "6 kg");

        converter.clear_history();
        assert_eq!(converter.history().count(), 0);
    }

    #[test]
    fn test_reset_keeps_units() {
        let mut converter = LengthConverter::default();
        converter.set_to_unit(LengthUnit::Inch);
        converter.set_input("1");
        assert_eq!(converter.output(), "39.37");
        converter.reset();
        assert_eq!(converter.input(), "");
        assert_eq!(converter.output(), "");
        assert_eq!(converter.to_unit(), LengthUnit::Inch);
    }
}
