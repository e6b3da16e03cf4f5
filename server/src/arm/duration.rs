//! ISO-8601 durations as Resource Manager writes them (`PT20M`,
//! `P10675199DT2H48M5.4775807S`).
//!
//! Only day and time designators are supported; Service Bus never emits
//! years, months or weeks.

use std::time::Duration;
use thiserror::Error;

const SECS_PER_MINUTE: u64 = 60;
const SECS_PER_HOUR: u64 = 60 * SECS_PER_MINUTE;
const SECS_PER_DAY: u64 = 24 * SECS_PER_HOUR;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid ISO-8601 duration '{value}': {reason}")]
pub struct DurationParseError {
    pub value: String,
    pub reason: &'static str,
}

pub fn parse(value: &str) -> Result<Duration, DurationParseError> {
    let fail = |reason| DurationParseError {
        value: value.to_string(),
        reason,
    };

    let rest = value.strip_prefix('P').ok_or_else(|| fail("missing 'P' prefix"))?;
    if rest.is_empty() {
        return Err(fail("no components"));
    }

    let mut secs: u64 = 0;
    let mut nanos: u32 = 0;
    let mut in_time = false;
    let mut number = String::new();
    let mut saw_component = false;
    let mut saw_time_component = false;

    for c in rest.chars() {
        match c {
            '0'..='9' | '.' => number.push(c),
            'T' if !in_time && number.is_empty() => in_time = true,
            'D' | 'H' | 'M' | 'S' => {
                if number.is_empty() {
                    return Err(fail("designator without a value"));
                }
                let unit = match (c, in_time) {
                    ('D', false) => SECS_PER_DAY,
                    ('H', true) => SECS_PER_HOUR,
                    ('M', true) => SECS_PER_MINUTE,
                    ('S', true) => 1,
                    _ => return Err(fail("unsupported designator")),
                };
                let (whole, fraction) = match number.split_once('.') {
                    Some((whole, fraction)) if unit == 1 => (whole, Some(fraction)),
                    Some(_) => return Err(fail("fractions are only allowed for seconds")),
                    None => (number.as_str(), None),
                };
                let whole: u64 = whole.parse().map_err(|_| fail("invalid number"))?;
                secs = whole
                    .checked_mul(unit)
                    .and_then(|v| secs.checked_add(v))
                    .ok_or_else(|| fail("value out of range"))?;
                if let Some(fraction) = fraction {
                    nanos = parse_fraction(fraction).ok_or_else(|| fail("invalid fraction"))?;
                }
                number.clear();
                saw_component = true;
                saw_time_component |= in_time;
            }
            _ => return Err(fail("unexpected character")),
        }
    }

    if !number.is_empty() || !saw_component {
        return Err(fail("trailing value without designator"));
    }
    if in_time && !saw_time_component {
        return Err(fail("'T' without time components"));
    }
    Ok(Duration::new(secs, nanos))
}

/// Up to nine fractional digits; anything finer than a nanosecond is dropped.
fn parse_fraction(fraction: &str) -> Option<u32> {
    if fraction.is_empty() || !fraction.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let digits: String = fraction.chars().take(9).collect();
    let padded = format!("{digits:0<9}");
    padded.parse().ok()
}

pub fn format(duration: Duration) -> String {
    let total = duration.as_secs();
    let days = total / SECS_PER_DAY;
    let hours = (total % SECS_PER_DAY) / SECS_PER_HOUR;
    let minutes = (total % SECS_PER_HOUR) / SECS_PER_MINUTE;
    let seconds = total % SECS_PER_MINUTE;
    let nanos = duration.subsec_nanos();

    let mut out = String::from("P");
    if days > 0 {
        out.push_str(&format!("{days}D"));
    }
    if hours > 0 || minutes > 0 || seconds > 0 || nanos > 0 || days == 0 {
        out.push('T');
        if hours > 0 {
            out.push_str(&format!("{hours}H"));
        }
        if minutes > 0 {
            out.push_str(&format!("{minutes}M"));
        }
        if seconds > 0 || nanos > 0 {
            out.push_str(&seconds.to_string());
            if nanos > 0 {
                let fraction = format!("{nanos:09}");
                out.push('.');
                out.push_str(fraction.trim_end_matches('0'));
            }
            out.push('S');
        } else if hours == 0 && minutes == 0 {
            out.push_str("0S");
        }
    }
    out
}

/// `#[serde(with = "...")]` adapter for optional durations.
pub mod option_iso8601 {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(duration) => serializer.serialize_some(&super::format(*duration)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|raw| super::parse(&raw).map_err(serde::de::Error::custom))
            .transpose()
    }
}
