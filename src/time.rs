//! Track time parsing.
//!
//! Integrations report durations and positions either as a display string
//! (`1:25.54`, `01:02:03.250`) or as a plain number of microseconds.

use serde::Deserialize;
use thiserror::Error;

const MICROS_PER_SECOND: u64 = 1_000_000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimeError {
    #[error("time value {0:?} has more than three ':'-separated parts")]
    TooManyParts(String),
    #[error("invalid time component {part:?} in {input:?}")]
    InvalidComponent { input: String, part: String },
    #[error("time value {0:?} overflows the microsecond range")]
    Overflow(String),
}

/// A time value as reported by an integration script.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TimeValue {
    Micros(u64),
    /// Fractional or negative microseconds; truncated, negatives clamp to 0.
    Float(f64),
    Text(String),
}

impl TimeValue {
    /// Resolve to microseconds. `None` means "absent" (an empty string).
    pub fn to_micros(&self) -> Result<Option<u64>, TimeError> {
        match self {
            TimeValue::Micros(us) => Ok(Some(*us)),
            TimeValue::Float(us) => Ok(Some(us.trunc() as u64)),
            TimeValue::Text(s) => parse_time_usec(s),
        }
    }
}

impl From<u64> for TimeValue {
    fn from(us: u64) -> Self {
        TimeValue::Micros(us)
    }
}

impl From<&str> for TimeValue {
    fn from(s: &str) -> Self {
        TimeValue::Text(s.to_string())
    }
}

/// Parse `[[H:]MM:]SS[.fff]` into microseconds.
///
/// Only the seconds part may carry a fraction; digits past microsecond
/// precision are dropped. A blank string parses to `None`.
pub fn parse_time_usec(input: &str) -> Result<Option<u64>, TimeError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let parts: Vec<&str> = trimmed.split(':').collect();
    if parts.len() > 3 {
        return Err(TimeError::TooManyParts(input.to_string()));
    }

    let invalid = |part: &str| TimeError::InvalidComponent {
        input: input.to_string(),
        part: part.to_string(),
    };
    let overflow = || TimeError::Overflow(input.to_string());

    let (last, leading) = parts.split_last().ok_or_else(|| invalid(trimmed))?;
    let mut micros = parse_seconds(last).ok_or_else(|| invalid(last))?;

    // Walk minutes then hours, right to left.
    let mut unit = 60 * MICROS_PER_SECOND;
    for part in leading.iter().rev() {
        let value = parse_whole(part).ok_or_else(|| invalid(part))?;
        let scaled = value.checked_mul(unit).ok_or_else(overflow)?;
        micros = micros.checked_add(scaled).ok_or_else(overflow)?;
        unit *= 60;
    }

    Ok(Some(micros))
}

fn parse_whole(part: &str) -> Option<u64> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

fn parse_seconds(part: &str) -> Option<u64> {
    let (whole, fraction) = match part.split_once('.') {
        Some((w, f)) => (w, f),
        None => (part, ""),
    };

    let seconds = if whole.is_empty() && !fraction.is_empty() {
        0
    } else {
        parse_whole(whole)?
    };

    if !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let mut frac_micros = 0u64;
    let mut scale = MICROS_PER_SECOND / 10;
    for digit in fraction.bytes().take(6) {
        frac_micros += u64::from(digit - b'0') * scale;
        scale /= 10;
    }

    seconds
        .checked_mul(MICROS_PER_SECOND)?
        .checked_add(frac_micros)
}
