//! Minor-unit money helpers.
//!
//! Every amount in the engine is an `i64` count of minor units (bani/cents).
//! Parsing rounds to two decimals and derived percentages round half away
//! from zero, so every invariant holds exactly in integer arithmetic.

use serde::Serializer;

/// Basis points in 100%.
pub const BPS_SCALE: i64 = 10_000;

/// Parse an amount cell into minor units.
///
/// Accepts an optional sign, `.` or `,` as decimal separator, thousands
/// separators (`,` `.` space, NBSP) and any number of fraction digits
/// (rounded half away from zero at the third). Empty input is zero.
/// Returns `None` for anything non-numeric.
pub fn parse_cents(raw: &str) -> Option<i64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{a0}' && *c != '\u{202f}')
        .collect();
    if cleaned.is_empty() {
        return Some(0);
    }

    let (negative, body) = match cleaned.as_bytes()[0] {
        b'-' => (true, &cleaned[1..]),
        b'+' => (false, &cleaned[1..]),
        _ => (false, cleaned.as_str()),
    };
    if body.is_empty() {
        return None;
    }

    let normalized = normalize_separators(body)?;
    let (int_part, frac_part) = match normalized.split_once('.') {
        Some((i, f)) => (i, f),
        None => (normalized.as_str(), ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !int_part.bytes().all(|b| b.is_ascii_digit()) || !frac_part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let mut cents: i64 = 0;
    for b in int_part.bytes() {
        cents = cents.checked_mul(10)?.checked_add(i64::from(b - b'0'))?;
    }
    let mut frac = frac_part.bytes().map(|b| i64::from(b - b'0'));
    let tenths = frac.next().unwrap_or(0);
    let hundredths = frac.next().unwrap_or(0);
    let round_up = frac.next().map_or(false, |d| d >= 5);

    cents = cents.checked_mul(100)?.checked_add(tenths * 10 + hundredths)?;
    if round_up {
        cents = cents.checked_add(1)?;
    }
    Some(if negative { -cents } else { cents })
}

/// Reduce thousands/decimal separator variants to a single optional `.`.
fn normalize_separators(body: &str) -> Option<String> {
    let commas = body.matches(',').count();
    let dots = body.matches('.').count();

    let out = match (commas, dots) {
        (0, 0) | (0, 1) => body.to_string(),
        // "1,234.56" / "1.234,56": the last separator is the decimal point
        (_, _) if commas > 0 && dots > 0 => {
            let last_comma = body.rfind(',')?;
            let last_dot = body.rfind('.')?;
            if last_dot > last_comma {
                if dots > 1 {
                    return None;
                }
                body.replace(',', "")
            } else {
                if commas > 1 {
                    return None;
                }
                body.replace('.', "").replace(',', ".")
            }
        }
        // "1234,56" is a decimal comma, "1,234" and "1,234,567" are grouping
        (1, 0) => {
            let (_, after) = body.split_once(',')?;
            if after.len() == 3 {
                body.replace(',', "")
            } else {
                body.replace(',', ".")
            }
        }
        (_, 0) => body.replace(',', ""),
        // "1.234.567" grouping with dots
        (0, _) => body.replace('.', ""),
        _ => return None,
    };
    Some(out)
}

/// Integer division rounding half away from zero. `divisor` must be positive.
pub fn round_div(value: i128, divisor: i128) -> i128 {
    let quotient = value / divisor;
    let remainder = value % divisor;
    if remainder.abs() * 2 >= divisor {
        quotient + value.signum()
    } else {
        quotient
    }
}

/// `cents × bps / 10 000`, rounded half away from zero.
pub fn apply_bps(cents: i64, bps: u32) -> i64 {
    round_div(i128::from(cents) * i128::from(bps), i128::from(BPS_SCALE)) as i64
}

/// Minor units as a float in major units, for spreadsheet cells and JSON.
pub fn to_major(cents: i64) -> f64 {
    cents as f64 / 100.0
}

/// `1335.00`, `-12.50`
pub fn format_plain(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

/// `1,335.00 RON`: grouped thousands, two decimals and a currency suffix.
pub fn format_display(cents: i64, currency: &str) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    let whole = (abs / 100).to_string();

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    if currency.is_empty() {
        format!("{sign}{grouped}.{:02}", abs % 100)
    } else {
        format!("{sign}{grouped}.{:02} {currency}", abs % 100)
    }
}

/// `serialize_with` helper: minor units out as major-unit numbers.
pub fn serialize_major<S: Serializer>(cents: &i64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(to_major(*cents))
}
