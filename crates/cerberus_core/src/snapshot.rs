//! Guild profile snapshots.

use crate::GuildRef;
use chrono::{DateTime, Utc};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// Which binary asset of a guild profile a blob belongs to.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AssetSlot {
    /// The guild icon.
    Icon,
    /// The guild banner.
    Banner,
}

/// The last known-good guild profile.
///
/// One current snapshot per guild, overwritten on re-capture; there is no
/// history. The revert engine rolls unauthorized profile edits back to these
/// values. Icon and banner bytes live in the asset blob store keyed by guild
/// and [`AssetSlot`]; the snapshot records the CDN URL they were captured
/// from, or `None` when the guild had no such asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, TypedBuilder)]
pub struct GuildSnapshot {
    /// Guild the snapshot belongs to.
    guild: GuildRef,
    /// Guild name at capture time.
    #[builder(setter(into))]
    name: String,
    /// Source URL of the captured icon blob.
    #[builder(default)]
    icon_url: Option<String>,
    /// Source URL of the captured banner blob.
    #[builder(default)]
    banner_url: Option<String>,
    /// Vanity invite code; detected on change but not revertible.
    #[builder(default)]
    vanity_code: Option<String>,
    /// Verification level at capture time.
    verification_level: u8,
    /// When the snapshot was taken.
    captured_at: DateTime<Utc>,
}
