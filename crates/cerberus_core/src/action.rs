//! The fixed enumeration of monitored mutation categories.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// A monitored mutation category.
///
/// Every observed administrative event maps to exactly one of these kinds.
/// The kind selects the authorization scope checked, the rate window
/// consulted, and the sanction policy applied. The string forms double as
/// store keys and slash-command choices.
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
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum ActionKind {
    /// Posting an invite-style link in a message.
    Link,
    /// Mentioning `@everyone`, `@here`, or a limited role.
    Ping,
    /// Forcibly disconnecting or moving a member out of a voice channel.
    VoiceDisconnect,
    /// Creating, deleting, or editing a channel.
    Channel,
    /// Creating, deleting, or editing a role.
    Role,
    /// Adding a bot account to the guild.
    BotAdd,
    /// Banning a member.
    Ban,
    /// Editing the guild profile (name, icon, banner, verification level).
    Profile,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn labels_round_trip() {
        for kind in ActionKind::iter() {
            let label = kind.to_string();
            assert_eq!(ActionKind::from_str(&label).unwrap(), kind);
        }
    }

    #[test]
    fn labels_are_kebab_case() {
        assert_eq!(ActionKind::VoiceDisconnect.to_string(), "voice-disconnect");
        assert_eq!(ActionKind::BotAdd.to_string(), "bot-add");
    }
}
