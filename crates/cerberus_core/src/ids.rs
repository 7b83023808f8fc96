//! Opaque platform identifiers.
//!
//! Guilds, users, roles, and channels are referenced by snowflake id only;
//! Cerberus never owns their lifecycle. The newtypes keep the id spaces from
//! mixing at call sites.

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

/// A tenant community (server) id.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, From, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct GuildRef(pub u64);

/// A platform user identity.
///
/// The acting party in attribution, authorization, and sanctioning.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, From, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Principal(pub u64);

/// A role id within a guild.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, From, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RoleRef(pub u64);

/// A channel id within a guild.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, From, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ChannelRef(pub u64);

/// A message id within a channel.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, From, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct MessageRef(pub u64);
