//! Compose duration values
//!
//! Accepts a bare integer (whole seconds) or `<digits><unit>` where unit is
//! one of `ns`, `us`, `ms`, `s`, `m`, `h`. The runtime API wants
//! nanoseconds.

use super::config::DurationValue;
use crate::error::{Result, StackError};
use regex::Regex;
use std::sync::LazyLock;

const NANOS_PER_SECOND: i64 = 1_000_000_000;

static DURATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)([a-z]+)?$").expect("duration pattern compiles"));

/// Nanoseconds per unit suffix
fn unit_factor(unit: &str) -> Option<i64> {
    match unit {
        "ns" => Some(1),
        "us" => Some(1_000),
        "ms" => Some(1_000_000),
        "s" => Some(NANOS_PER_SECOND),
        "m" => Some(60 * NANOS_PER_SECOND),
        "h" => Some(3_600 * NANOS_PER_SECOND),
        _ => None,
    }
}

/// Convert a duration value to nanoseconds
pub fn parse_duration(value: &DurationValue) -> Result<i64> {
    match value {
        DurationValue::Seconds(secs) => i64::try_from(*secs)
            .ok()
            .and_then(|s| s.checked_mul(NANOS_PER_SECOND))
            .ok_or_else(|| StackError::InvalidDuration(format!("{} seconds overflows", secs))),
        DurationValue::Text(text) => parse_duration_str(text),
        DurationValue::Other(_) => Err(StackError::InvalidDuration(format!(
            "{} (expected whole seconds or <digits><unit>)",
            value
        ))),
    }
}

/// Convert a duration string to nanoseconds
pub fn parse_duration_str(text: &str) -> Result<i64> {
    let trimmed = text.trim();
    let caps = DURATION_RE
        .captures(trimmed)
        .ok_or_else(|| StackError::InvalidDuration(text.to_string()))?;

    let amount: i64 = caps[1]
        .parse()
        .map_err(|_| StackError::InvalidDuration(text.to_string()))?;
    let unit = caps.get(2).map(|m| m.as_str()).unwrap_or("s");
    let factor = unit_factor(unit)
        .ok_or_else(|| StackError::InvalidDuration(format!("{} (unknown unit '{}')", text, unit)))?;

    amount
        .checked_mul(factor)
        .ok_or_else(|| StackError::InvalidDuration(format!("{} overflows", text)))
}
