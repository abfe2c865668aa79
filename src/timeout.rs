//! Deadlines written as duration strings.
//!
//! Accepts a sequence of decimal numbers, each with a unit suffix: `ns`,
//! `us` (or `µs`), `ms`, `s`, `m` or `h`. Examples: `500ms`, `10s`, `1m30s`,
//! `1.5s`. A bare `0` is also accepted. A zero duration disables the deadline.

use std::{fmt, str::FromStr, time::Duration};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

const NANOS_PER_MICRO: u64 = 1_000;
const NANOS_PER_MILLI: u64 = 1_000_000;
const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Errors raised while parsing a duration string.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TimeoutParseError {
    /// The text is not a duration.
    #[error("invalid duration {0:?}; expected a value such as 500ms, 10s or 1m30s")]
    Invalid(String),
    /// The duration does not fit in 64-bit nanoseconds.
    #[error("duration {0:?} is out of range")]
    Overflow(String),
}

/// A deadline. Zero means "wait indefinitely".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Timeout(Duration);

impl Timeout {
    /// No deadline.
    pub const NONE: Self = Self(Duration::ZERO);

    /// Wrap a duration.
    #[must_use]
    pub const fn new(duration: Duration) -> Self { Self(duration) }

    /// A deadline of whole seconds.
    #[must_use]
    pub const fn from_secs(secs: u64) -> Self { Self(Duration::from_secs(secs)) }

    /// The deadline to apply, or `None` to wait indefinitely.
    #[must_use]
    pub const fn deadline(self) -> Option<Duration> {
        if self.0.is_zero() { None } else { Some(self.0) }
    }
}

fn unit_nanos(unit: &str) -> Option<u64> {
    match unit {
        "ns" => Some(1),
        "us" | "µs" | "μs" => Some(NANOS_PER_MICRO),
        "ms" => Some(NANOS_PER_MILLI),
        "s" => Some(NANOS_PER_SEC),
        "m" => Some(60 * NANOS_PER_SEC),
        "h" => Some(3_600 * NANOS_PER_SEC),
        _ => None,
    }
}

/// Nanoseconds for one `<number><unit>` component, `None` on overflow.
///
/// Fractional digits beyond the unit's resolution are dropped.
fn component_nanos(whole: u64, fraction: &str, scale: u64) -> Option<u64> {
    let mut nanos = whole.checked_mul(scale)?;
    let mut place = scale;
    for digit in fraction.chars() {
        place = place.checked_div(10)?;
        let value = u64::from(digit.to_digit(10)?);
        nanos = nanos.checked_add(value.checked_mul(place)?)?;
    }
    Some(nanos)
}

const fn is_number_char(c: char) -> bool { c.is_ascii_digit() || c == '.' }

fn parse_duration(input: &str) -> Result<Duration, TimeoutParseError> {
    let invalid = || TimeoutParseError::Invalid(input.to_owned());
    let overflow = || TimeoutParseError::Overflow(input.to_owned());

    let text = input.trim();
    if text == "0" {
        return Ok(Duration::ZERO);
    }
    if text.is_empty() {
        return Err(invalid());
    }

    let mut rest = text;
    let mut total: u64 = 0;
    while !rest.is_empty() {
        let number_len = rest.find(|c| !is_number_char(c)).unwrap_or(rest.len());
        let (number, tail) = rest.split_at(number_len);
        let unit_len = tail.find(is_number_char).unwrap_or(tail.len());
        let (unit, next) = tail.split_at(unit_len);

        let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }
        if !fraction.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let whole_units = if whole.is_empty() {
            0
        } else {
            whole.parse::<u64>().map_err(|_| overflow())?
        };
        let scale = unit_nanos(unit).ok_or_else(invalid)?;
        let nanos = component_nanos(whole_units, fraction, scale).ok_or_else(overflow)?;
        total = total.checked_add(nanos).ok_or_else(overflow)?;
        rest = next;
    }
    Ok(Duration::from_nanos(total))
}

impl FromStr for Timeout {
    type Err = TimeoutParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> { parse_duration(s).map(Self) }
}

impl fmt::Display for Timeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = self.0;
        let sub = d.subsec_nanos();
        if d.is_zero() {
            f.write_str("0")
        } else if sub == 0 {
            write!(f, "{}s", d.as_secs())
        } else if sub == d.subsec_millis() * 1_000_000 {
            write!(f, "{}ms", d.as_millis())
        } else if sub == d.subsec_micros() * 1_000 {
            write!(f, "{}us", d.as_micros())
        } else {
            write!(f, "{}ns", d.as_nanos())
        }
    }
}

impl Serialize for Timeout {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Durations arrive as text from flags and dotfiles, but environment values
/// such as `0` or `30` are parsed as integers first; those mean seconds.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimeout {
    Secs(u64),
    Text(String),
}

impl<'de> Deserialize<'de> for Timeout {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match RawTimeout::deserialize(deserializer)? {
            RawTimeout::Secs(secs) => Ok(Self::from_secs(secs)),
            RawTimeout::Text(text) => text.parse().map_err(serde::de::Error::custom),
        }
    }
}
