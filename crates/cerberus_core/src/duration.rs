//! Compact duration tokens.
//!
//! Operators configure windows and mute lengths as compact tokens such as
//! `10s`, `5m`, `1h`, or `2d`. An unparsable or zero token means "no
//! duration" and is represented by the absence of a token, never by an
//! error: a timed mute with no duration degrades to no sanction.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use strum::{Display, EnumString};

/// Unit suffix of a duration token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString)]
pub enum DurationUnit {
    /// Seconds.
    #[strum(serialize = "s")]
    Seconds,
    /// Minutes.
    #[strum(serialize = "m")]
    Minutes,
    /// Hours.
    #[strum(serialize = "h")]
    Hours,
    /// Days.
    #[strum(serialize = "d")]
    Days,
}

impl DurationUnit {
    fn seconds(&self) -> u64 {
        match self {
            Self::Seconds => 1,
            Self::Minutes => 60,
            Self::Hours => 3_600,
            Self::Days => 86_400,
        }
    }
}

/// A parsed, non-zero duration token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DurationToken {
    value: u64,
    unit: DurationUnit,
}

impl DurationToken {
    /// Parse a compact token like `10s` or `5m`.
    ///
    /// Returns `None` for empty, malformed, or zero tokens (including the
    /// literal `"0"` used by operators to mean "no duration").
    ///
    /// # Examples
    ///
    /// ```
    /// use cerberus_core::DurationToken;
    /// use std::time::Duration;
    ///
    /// let token = DurationToken::parse("10s").unwrap();
    /// assert_eq!(token.as_duration(), Duration::from_secs(10));
    /// assert!(DurationToken::parse("0").is_none());
    /// assert!(DurationToken::parse("tenseconds").is_none());
    /// ```
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.trim();
        if token.is_empty() || token == "0" {
            return None;
        }
        let (digits, suffix) = token.split_at(token.len().checked_sub(1)?);
        let unit = DurationUnit::from_str(suffix).ok()?;
        let value: u64 = digits.parse().ok()?;
        if value == 0 {
            return None;
        }
        Some(Self { value, unit })
    }

    /// The token as a standard duration.
    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(self.value * self.unit.seconds())
    }

    /// The raw numeric component.
    pub fn value(&self) -> u64 {
        self.value
    }

    /// The unit suffix.
    pub fn unit(&self) -> DurationUnit {
        self.unit
    }
}

impl fmt::Display for DurationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit)
    }
}

impl Serialize for DurationToken {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for DurationToken {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid duration token: {raw}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_each_unit() {
        assert_eq!(
            DurationToken::parse("10s").unwrap().as_duration(),
            Duration::from_secs(10)
        );
        assert_eq!(
            DurationToken::parse("5m").unwrap().as_duration(),
            Duration::from_secs(300)
        );
        assert_eq!(
            DurationToken::parse("2h").unwrap().as_duration(),
            Duration::from_secs(7_200)
        );
        assert_eq!(
            DurationToken::parse("1d").unwrap().as_duration(),
            Duration::from_secs(86_400)
        );
    }

    #[test]
    fn malformed_and_zero_mean_no_duration() {
        for token in ["", "0", "0s", "s", "10", "10x", "-5s", "abc"] {
            assert!(DurationToken::parse(token).is_none(), "token {token:?}");
        }
    }

    #[test]
    fn display_round_trips() {
        let token = DurationToken::parse("15m").unwrap();
        assert_eq!(DurationToken::parse(&token.to_string()), Some(token));
    }
}
