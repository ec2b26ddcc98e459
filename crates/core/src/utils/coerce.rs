//! Value coercion for loosely-typed inbound payloads.
//!
//! Every function here returns `None` instead of failing, and every function
//! is idempotent: feeding the (re-serialized) output back in yields the same
//! value.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use lazy_static::lazy_static;
use num_traits::ToPrimitive;
use regex::Regex;
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

lazy_static! {
    /// Digits with optional `.`/`,` separators, nothing else.
    static ref NUMERIC_BODY_REGEX: Regex =
        Regex::new(r"^[0-9.,]+$").expect("Invalid regex pattern");

    /// Integer part followed by one or more three-digit groups.
    static ref GROUPED_REGEX: Regex =
        Regex::new(r"^[0-9]{1,3}([.,][0-9]{3})+$").expect("Invalid regex pattern");
}

/// Epoch values above this are treated as milliseconds.
const EPOCH_MILLIS_THRESHOLD: u64 = 100_000_000_000;

/// Coerces a JSON value into a decimal.
///
/// Accepts JSON numbers (including scientific notation) and strings in
/// either plain (`"1234.56"`) or European (`"1.234,56"`) format:
/// - both separators present: the right-most one is the decimal separator
/// - only commas: `"1,234"` / `"12,345,678"` are thousands groups unless the
///   integer part is `"0"`; any other single comma is a decimal comma
/// - only dots: one dot is a decimal point, several three-digit groups are
///   thousands
pub fn coerce_number(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(number) => parse_plain(&number.to_string()),
        Value::String(raw) => parse_localized(raw),
        _ => None,
    }
}

/// Coerces into a ratio within `[0, 1]`; anything outside is rejected.
pub fn coerce_ratio(value: &Value) -> Option<Decimal> {
    coerce_number(value).filter(|ratio| *ratio >= Decimal::ZERO && *ratio <= Decimal::ONE)
}

/// Coerces into a whole count, rounding fractional input.
pub fn coerce_count(value: &Value) -> Option<i64> {
    coerce_number(value).and_then(|n| n.round().to_i64())
}

/// Coerces a flag; accepts booleans, `"true"`/`"false"` and `0`/`1`.
pub fn coerce_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(flag) => Some(*flag),
        Value::String(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Some(true),
            "false" | "0" | "no" => Some(false),
            _ => None,
        },
        Value::Number(number) => match number.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        _ => None,
    }
}

/// Coerces into a trimmed, non-empty string. Numbers are stringified.
pub fn coerce_optional_string(value: &Value) -> Option<String> {
    match value {
        Value::String(raw) => {
            let trimmed = raw.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

/// Coerces into a UTC timestamp.
///
/// Accepts RFC 3339 strings, naive `YYYY-MM-DD[ T]HH:MM:SS[.f]` strings
/// (read as UTC), bare dates (midnight UTC) and epoch numbers (seconds, or
/// milliseconds for large values).
pub fn coerce_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(raw) => parse_timestamp_str(raw.trim()),
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().and_then(|f| f.trunc().to_i64()))
            .and_then(from_epoch),
        _ => None,
    }
}

fn parse_timestamp_str(raw: &str) -> Option<DateTime<Utc>> {
    if raw.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|naive| Utc.from_utc_datetime(&naive));
    }
    raw.parse::<i64>().ok().and_then(from_epoch)
}

fn from_epoch(epoch: i64) -> Option<DateTime<Utc>> {
    if epoch.unsigned_abs() >= EPOCH_MILLIS_THRESHOLD {
        DateTime::from_timestamp_millis(epoch)
    } else {
        DateTime::from_timestamp(epoch, 0)
    }
}

fn parse_plain(raw: &str) -> Option<Decimal> {
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

fn parse_localized(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    let (negative, body) = match cleaned.as_bytes().first() {
        Some(b'-') => (true, &cleaned[1..]),
        Some(b'+') => (false, &cleaned[1..]),
        _ => (false, cleaned.as_str()),
    };
    if body.is_empty() {
        return None;
    }
    if !NUMERIC_BODY_REGEX.is_match(body) {
        // Covers "NaN", "inf" and exponent notation.
        return parse_plain(&cleaned);
    }

    let canonical = canonicalize_separators(body)?;
    let canonical = if canonical.starts_with('.') {
        format!("0{}", canonical)
    } else {
        canonical
    };
    let magnitude = Decimal::from_str(&canonical).ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

/// Rewrites a separator-bearing digit string into `1234.56` form.
fn canonicalize_separators(body: &str) -> Option<String> {
    let last_comma = body.rfind(',');
    let last_dot = body.rfind('.');

    match (last_comma, last_dot) {
        (None, None) => Some(body.to_string()),
        (Some(comma), Some(dot)) => {
            let (decimal_sep, thousands_sep) = if comma > dot { (',', '.') } else { ('.', ',') };
            if body.matches(decimal_sep).count() != 1 {
                return None;
            }
            Some(body.replace(thousands_sep, "").replace(decimal_sep, "."))
        }
        (Some(_), None) => {
            let integer_part = body.split(',').next().unwrap_or_default();
            if GROUPED_REGEX.is_match(body) && integer_part != "0" {
                Some(body.replace(',', ""))
            } else if body.matches(',').count() == 1 {
                Some(body.replace(',', "."))
            } else {
                None
            }
        }
        (None, Some(_)) => match body.matches('.').count() {
            1 => Some(body.to_string()),
            _ if GROUPED_REGEX.is_match(body) => Some(body.replace('.', "")),
            _ => None,
        },
    }
}
