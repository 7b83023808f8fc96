//! The sanction ladder.

use crate::DurationToken;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// A punitive action against a principal.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Sanction {
    /// No punitive action.
    None,
    /// Delete the offending message only; the principal stays.
    ///
    /// Only meaningful for the message-surface kinds (link, ping).
    Warn,
    /// Remove every role assignment from the principal.
    StripRoles,
    /// Time-boxed communication restriction.
    TimedMute,
    /// Remove the principal from the guild.
    Kick,
    /// Remove and blacklist the principal from rejoining.
    Ban,
}

impl Sanction {
    /// Whether the sanction removes the principal from the guild.
    pub fn removes_member(&self) -> bool {
        matches!(self, Self::Kick | Self::Ban)
    }
}

/// The active sanction for one action kind.
///
/// Global per process, not per guild; every guild the process protects
/// shares one policy table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SanctionPolicy {
    /// The sanction applied when the threshold is met.
    pub sanction: Sanction,
    /// Mute length for [`Sanction::TimedMute`]; `None` degrades the mute to
    /// no sanction.
    pub duration: Option<DurationToken>,
}

impl SanctionPolicy {
    /// A policy with no duration component.
    pub fn of(sanction: Sanction) -> Self {
        Self {
            sanction,
            duration: None,
        }
    }

    /// A timed-mute policy with the given token.
    pub fn timed_mute(duration: DurationToken) -> Self {
        Self {
            sanction: Sanction::TimedMute,
            duration: Some(duration),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn labels_round_trip() {
        assert_eq!(Sanction::from_str("strip-roles").unwrap(), Sanction::StripRoles);
        assert_eq!(Sanction::TimedMute.to_string(), "timed-mute");
    }

    #[test]
    fn only_kick_and_ban_remove() {
        assert!(Sanction::Kick.removes_member());
        assert!(Sanction::Ban.removes_member());
        assert!(!Sanction::Warn.removes_member());
        assert!(!Sanction::StripRoles.removes_member());
    }
}
