//! Display formatting for the values the dashboard shows.
//!
//! Undefined statistics (a mean over no values, say) render as
//! [`UNDEFINED`] rather than `NaN` or `0`.

/// Prices carry a single currency label everywhere.
pub const CURRENCY_SYMBOL: &str = "$";

pub const UNDEFINED: &str = "n/a";

/// `1234567.891` with 2 decimals → `1,234,567.89`.
pub fn thousands(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let formatted = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (formatted.as_str(), None),
    };

    let mut out = String::with_capacity(formatted.len() + int_part.len() / 3 + 1);
    if value < 0.0 {
        out.push('-');
    }
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

pub fn number(value: Option<f64>, decimals: usize) -> String {
    value.map_or_else(|| UNDEFINED.to_string(), |v| thousands(v, decimals))
}

pub fn price(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{CURRENCY_SYMBOL}{}", thousands(v, 2)),
        None => UNDEFINED.to_string(),
    }
}

pub fn count(n: usize) -> String {
    thousands(n as f64, 0)
}
