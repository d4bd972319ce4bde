//! Per-type token checks and coercion for variable segments.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;

use super::segment::{Variable, VariableType};

/// A variable value after type coercion.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Text(String),
    Number(f64),
    Boolean(bool),
    Date(DateTime<Utc>),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.write_str(s),
            Value::Number(n) => write!(f, "{n}"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Date(d) => f.write_str(&d.to_rfc3339()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

/// Check whether `token` satisfies the declared type of `variable`.
///
/// Untyped, `any` and `string` variables accept every token. A `flag`
/// variable only accepts its own name.
pub fn compare_type(token: &str, variable: &Variable) -> bool {
    match variable.kind() {
        None | Some(VariableType::Any) | Some(VariableType::String) => true,
        Some(VariableType::Number) => parse_number(token).is_some(),
        Some(VariableType::Boolean) => matches!(token, "true" | "false"),
        Some(VariableType::Date) => !token.is_empty() && parse_date(token).is_some(),
        Some(VariableType::Flag) => token == variable.name(),
    }
}

/// Coerce `token` according to the declared type of `variable`.
///
/// Callers are expected to have checked the token first; a token that does
/// not coerce falls back to its text.
pub fn parse_value(token: &str, variable: &Variable) -> Value {
    match variable.kind() {
        Some(VariableType::Number) => parse_number(token)
            .map(Value::Number)
            .unwrap_or_else(|| Value::Text(token.to_string())),
        Some(VariableType::Boolean) => Value::Boolean(token == "true"),
        Some(VariableType::Date) => parse_date(token)
            .map(Value::Date)
            .unwrap_or_else(|| Value::Text(token.to_string())),
        Some(VariableType::Flag) => Value::Boolean(true),
        Some(VariableType::String) | Some(VariableType::Any) | None => {
            Value::Text(token.to_string())
        }
    }
}

/// Numeric conversion following the usual shell-calculator rules: decimal,
/// exponent and `0x`/`0o`/`0b` forms, surrounding whitespace ignored, and
/// `Infinity` spelled out. Empty input and NaN are rejected.
pub fn parse_number(token: &str) -> Option<f64> {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return None;
    }

    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(digits) = trimmed.strip_prefix(prefix) {
            return u64::from_str_radix(digits, radix).ok().map(|n| n as f64);
        }
    }

    match trimmed {
        "Infinity" | "+Infinity" => return Some(f64::INFINITY),
        "-Infinity" => return Some(f64::NEG_INFINITY),
        _ => {}
    }

    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Parse RFC 3339 / RFC 2822 timestamps and plain ISO dates or date-times.
/// Values without an offset are taken as UTC.
pub fn parse_date(token: &str) -> Option<DateTime<Utc>> {
    let trimmed = token.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
