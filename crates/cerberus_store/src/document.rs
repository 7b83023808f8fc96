//! The serialized store document.

use cerberus_core::{
    ActionKind, AuthorizationGrant, ChannelRef, DurationToken, GuildRef, GuildSnapshot,
    MentionTarget, ModuleSwitch, Principal, RoleRef, Sanction, SanctionPolicy, ThresholdPolicy,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use strum::{Display, EnumString};

/// Which report stream a routed channel receives.
///
/// Mirrors the two destinations enforcement reports go to: the public
/// moderation feed and the operator-only feed.
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
pub enum ReportStream {
    /// Public moderation reports.
    Moderation,
    /// Operator-only reports.
    Operator,
}

/// The complete configuration state, as serialized.
///
/// One JSON document holds everything the guard persists. `export` hands out
/// a clone of this structure and `import` replaces it wholesale; the
/// round-trip reproduces an equivalent record set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreDocument {
    /// Scoped exemptions, at most one per (guild, principal).
    #[serde(default)]
    pub grants: Vec<AuthorizationGrant>,
    /// Principals exempt from all enforcement in every guild.
    #[serde(default)]
    pub trusted_operators: BTreeSet<Principal>,
    /// Principals exempt from all enforcement within one guild.
    #[serde(default)]
    pub guild_operators: BTreeMap<GuildRef, BTreeSet<Principal>>,
    /// Process-wide rate thresholds per action kind.
    #[serde(default)]
    pub thresholds: BTreeMap<ActionKind, ThresholdPolicy>,
    /// Per-guild threshold overrides.
    #[serde(default)]
    pub guild_thresholds: BTreeMap<GuildRef, BTreeMap<ActionKind, ThresholdPolicy>>,
    /// Process-wide sanction policies per action kind.
    #[serde(default)]
    pub sanctions: BTreeMap<ActionKind, SanctionPolicy>,
    /// Roles members below the authorization threshold may never hold.
    #[serde(default)]
    pub limited_roles: BTreeMap<RoleRef, String>,
    /// Mentions members below the authorization threshold may never invoke.
    #[serde(default)]
    pub limited_mentions: BTreeSet<MentionTarget>,
    /// Enable switches per enforcement module.
    #[serde(default)]
    pub modules: BTreeMap<ActionKind, ModuleSwitch>,
    /// Last known-good guild profiles.
    #[serde(default)]
    pub snapshots: BTreeMap<GuildRef, GuildSnapshot>,
    /// Report-channel routing per guild and stream.
    #[serde(default)]
    pub report_channels: BTreeMap<GuildRef, BTreeMap<ReportStream, ChannelRef>>,
}

impl StoreDocument {
    /// The factory configuration: default thresholds and sanctions, every
    /// module unarmed.
    pub fn seeded() -> Self {
        let window = |token: &str| DurationToken::parse(token).expect("static token");
        let threshold =
            |count: u32, token: &str| ThresholdPolicy::new(count, window(token)).expect("non-zero");

        let thresholds = BTreeMap::from([
            (ActionKind::VoiceDisconnect, threshold(3, "10s")),
            (ActionKind::Ban, threshold(1, "10s")),
            (ActionKind::Role, threshold(2, "10s")),
            (ActionKind::Channel, threshold(2, "10s")),
            (ActionKind::Ping, threshold(5, "10s")),
            (ActionKind::Profile, threshold(2, "10s")),
        ]);

        let sanctions = BTreeMap::from([
            (ActionKind::BotAdd, SanctionPolicy::of(Sanction::Kick)),
            (ActionKind::Link, SanctionPolicy::of(Sanction::Warn)),
            (ActionKind::Ping, SanctionPolicy::of(Sanction::Warn)),
            (
                ActionKind::VoiceDisconnect,
                SanctionPolicy::of(Sanction::Warn),
            ),
            (ActionKind::Channel, SanctionPolicy::of(Sanction::StripRoles)),
            (ActionKind::Role, SanctionPolicy::of(Sanction::StripRoles)),
            (ActionKind::Ban, SanctionPolicy::of(Sanction::Ban)),
            (ActionKind::Profile, SanctionPolicy::of(Sanction::StripRoles)),
        ]);

        Self {
            thresholds,
            sanctions,
            ..Self::default()
        }
    }
}
