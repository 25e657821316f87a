//! Number formatting shared by every calculator.
//!
//! All functions here are pure: the same value always renders to the same
//! string.

/// Format a floating-point number for display
/// Uses the shortest representation that round-trips, switching to exponent
/// form for very small and very large magnitudes (e.g., 4.0 -> "4",
/// 1.5e-7 -> "1.5e-7", 1e21 -> "1e+21")
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }

    let magnitude = value.abs();
    if magnitude >= 1e21 || magnitude < 1e-6 {
        signed_exponent(&format!("{:e}", value))
    } else {
        format!("{}", value)
    }
}

/// Round to a number of significant digits
pub fn round_significant(value: f64, digits: usize) -> f64 {
    if !value.is_finite() || value == 0.0 {
        return value;
    }
    let digits = digits.max(1);
    format!("{:.*e}", digits - 1, value)
        .parse()
        .unwrap_or(value)
}

/// Round to a fixed number of decimal places
pub fn round_decimals(value: f64, places: usize) -> f64 {
    if !value.is_finite() {
        return value;
    }
    format!("{:.*}", places, value).parse().unwrap_or(value)
}

/// Fixed-point rendering with `places` decimals. Negative zero renders unsigned.
pub fn format_fixed(value: f64, places: usize) -> String {
    let formatted = format!("{:.*}", places, value);
    match formatted.strip_prefix('-') {
        Some(rest) if rest.chars().all(|c| c == '0' || c == '.') => rest.to_string(),
        _ => formatted,
    }
}

/// Magnitude-adaptive formatting for length and weight conversions
///
/// Small magnitudes get more decimals, very large ones switch to exponent
/// form and anything below one millionth collapses to "0".
pub fn format_conversion(value: f64) -> String {
    let magnitude = value.abs();
    if magnitude < 0.000_001 {
        return "0".to_string();
    }
    if magnitude >= 1_000_000.0 {
        return signed_exponent(&format!("{:.6e}", value));
    }

    let places = if magnitude < 0.01 {
        6
    } else if magnitude < 0.1 {
        5
    } else if magnitude < 1.0 {
        4
    } else if magnitude < 10.0 {
        3
    } else {
        2
    };
    format_fixed(value, places)
}

/// Temperature readings use fewer decimals than other conversions.
pub fn format_temperature(value: f64) -> String {
    let magnitude = value.abs();
    let places = if magnitude < 0.01 {
        4
    } else if magnitude < 1.0 {
        3
    } else if magnitude < 10.0 {
        2
    } else {
        1
    };
    format_fixed(value, places)
}

/// Format an amount of money: sign, symbol, grouped integer part, then
/// `fraction_digits` decimals (e.g., "$1,234.56", "-₹1,235").
pub fn format_currency(value: f64, symbol: &str, fraction_digits: usize) -> String {
    let fixed = format_fixed(value, fraction_digits);
    let (negative, unsigned) = match fixed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, fixed.as_str()),
    };

    let (integer, fraction) = match unsigned.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (unsigned, None),
    };

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(symbol);
    out.push_str(&group_thousands(integer));
    if let Some(frac) = fraction {
        out.push('.');
        out.push_str(frac);
    }
    out
}

/// Insert "," every three digits from the right
fn group_thousands(digits: &str) -> String {
    let mut result = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(ch);
    }
    result
}

/// "1.5e-7" stays, "1e21" becomes "1e+21"
fn signed_exponent(formatted: &str) -> String {
    match formatted.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => format!("{}e+{}", mantissa, exp),
        _ => formatted.to_string(),
    }
}
