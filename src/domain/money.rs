use std::fmt;

/// Money is represented as integer cents to avoid floating-point precision issues.
/// R$ 50,00 is stored as 5000.
pub type Cents = i64;

/// Format cents as a plain decimal string.
/// Example: 5000 -> "50.00", -1234 -> "-12.34"
pub fn format_cents(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs_cents = cents.abs();
    format!("{}{}.{:02}", sign, abs_cents / 100, abs_cents % 100)
}

/// Parse a decimal string into cents. Both `.` and `,` are accepted as the
/// decimal separator, so "12,50" and "12.50" are the same amount.
pub fn parse_cents(input: &str) -> Result<Cents, ParseCentsError> {
    let input = input.trim().replace(',', ".");
    let negative = input.starts_with('-');
    let digits = input.trim_start_matches('-');

    let (units_str, decimal_str) = match digits.split_once('.') {
        Some((units, decimals)) => (units, decimals),
        None => (digits, ""),
    };
    if decimal_str.contains('.') || (units_str.is_empty() && decimal_str.is_empty()) {
        return Err(ParseCentsError::InvalidFormat);
    }

    let units: i64 = if units_str.is_empty() {
        0
    } else {
        units_str
            .parse()
            .map_err(|_| ParseCentsError::InvalidFormat)?
    };

    // Pad or truncate the fractional part to two digits
    let fraction: String = decimal_str.chars().chain("00".chars()).take(2).collect();
    if !fraction.chars().all(|c| c.is_ascii_digit()) {
        return Err(ParseCentsError::InvalidFormat);
    }
    let fraction: i64 = fraction
        .parse()
        .map_err(|_| ParseCentsError::InvalidFormat)?;

    let cents = units
        .checked_mul(100)
        .and_then(|cents| cents.checked_add(fraction))
        .ok_or(ParseCentsError::InvalidFormat)?;
    Ok(if negative { -cents } else { cents })
}

/// Percentage of `part` over `whole`. A zero or negative `whole` yields 0.0
/// so displays degrade to "0%" instead of NaN or infinity.
pub fn percent_of(part: Cents, whole: Cents) -> f64 {
    if whole <= 0 {
        return 0.0;
    }
    part as f64 / whole as f64 * 100.0
}

/// Split a total into `count` equal shares, rounding half-up to the cent.
pub fn split_evenly(total: Cents, count: u32) -> Cents {
    if count == 0 {
        return 0;
    }
    let count = i64::from(count);
    (total * 2 + count) / (count * 2)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseCentsError {
    InvalidFormat,
}

impl fmt::Display for ParseCentsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseCentsError::InvalidFormat => write!(f, "invalid money format"),
        }
    }
}

impl std::error::Error for ParseCentsError {}
