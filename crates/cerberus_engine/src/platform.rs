//! The platform mutation boundary.
//!
//! Everything the engine does to the outside world goes through
//! [`MutationApi`]. Each call is one attempt; the engine catches failures at
//! the call site, reports them, and moves on. The payload types here are
//! platform-independent mirrors of the few Discord shapes the engine needs
//! to describe a compensating edit.

use async_trait::async_trait;
use cerberus_core::{ChannelRef, GuildRef, MessageRef, Principal, RoleRef};
use cerberus_error::EngineResult;
use std::time::Duration;
use strum::Display;

/// The observed live profile of a guild.
///
/// Snapshot captures and profile-edit comparisons both read from this.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveProfile {
    /// The guild the profile belongs to.
    pub guild: GuildRef,
    /// Guild name.
    pub name: String,
    /// CDN URL of the current icon, if set.
    pub icon_url: Option<String>,
    /// CDN URL of the current banner, if set.
    pub banner_url: Option<String>,
    /// Vanity invite code, if set.
    pub vanity_code: Option<String>,
    /// Verification level.
    pub verification_level: u8,
}

/// A guild-profile field the revert engine tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ProfileField {
    /// The guild name.
    Name,
    /// The guild icon.
    Icon,
    /// The guild banner.
    Banner,
    /// The vanity invite code. Detected, reported, not revertible.
    VanityCode,
    /// The verification level.
    VerificationLevel,
}

/// A compensating guild-profile edit.
///
/// Only the populated fields are restored; the rest are left as they are.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileRestore {
    /// Restore the guild name to this value.
    pub name: Option<String>,
    /// Restore the icon from these raw bytes.
    pub icon: Option<Vec<u8>>,
    /// Restore the banner from these raw bytes.
    pub banner: Option<Vec<u8>>,
    /// Restore the verification level to this value.
    pub verification_level: Option<u8>,
}

impl ProfileRestore {
    /// Whether the restore would change anything.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.icon.is_none()
            && self.banner.is_none()
            && self.verification_level.is_none()
    }
}

/// Whether a permission overwrite targets a role or a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverwriteKind {
    /// Overwrite for a role.
    Role,
    /// Overwrite for a member.
    Member,
}

/// A channel permission overwrite, as a raw bitset pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionOverwrite {
    /// Role or member id the overwrite applies to.
    pub target: u64,
    /// Target kind.
    pub kind: OverwriteKind,
    /// Allowed permission bits.
    pub allow: u64,
    /// Denied permission bits.
    pub deny: u64,
}

/// The revertible attributes of a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelState {
    /// Channel name.
    pub name: String,
    /// Parent category, if any.
    pub category: Option<ChannelRef>,
    /// Permission overwrites.
    pub overwrites: Vec<PermissionOverwrite>,
}

/// Platform mutation calls issued by the revert engine and the escalator.
///
/// Implementations perform exactly one attempt per call and surface the
/// platform's failure as a [`cerberus_error::EngineError`]; the engine never
/// retries a mutation.
#[async_trait]
pub trait MutationApi: Send + Sync {
    /// Delete a channel.
    async fn delete_channel(
        &self,
        guild: GuildRef,
        channel: ChannelRef,
        reason: &str,
    ) -> EngineResult<()>;

    /// Delete a role.
    async fn delete_role(&self, guild: GuildRef, role: RoleRef, reason: &str) -> EngineResult<()>;

    /// Restore a channel's name, category, and permission overwrites.
    async fn edit_channel(
        &self,
        guild: GuildRef,
        channel: ChannelRef,
        state: &ChannelState,
    ) -> EngineResult<()>;

    /// Restore a role's permission bitset.
    async fn edit_role_permissions(
        &self,
        guild: GuildRef,
        role: RoleRef,
        permissions: u64,
    ) -> EngineResult<()>;

    /// Apply a compensating guild-profile edit.
    async fn edit_guild(&self, guild: GuildRef, restore: &ProfileRestore) -> EngineResult<()>;

    /// Remove a member from the guild.
    async fn kick_member(
        &self,
        guild: GuildRef,
        principal: Principal,
        reason: &str,
    ) -> EngineResult<()>;

    /// Remove and blacklist a member.
    async fn ban_member(
        &self,
        guild: GuildRef,
        principal: Principal,
        reason: &str,
    ) -> EngineResult<()>;

    /// Apply a time-boxed communication restriction.
    async fn timeout_member(
        &self,
        guild: GuildRef,
        principal: Principal,
        duration: Duration,
        reason: &str,
    ) -> EngineResult<()>;

    /// Remove every role assignment from a member.
    async fn strip_roles(
        &self,
        guild: GuildRef,
        principal: Principal,
        reason: &str,
    ) -> EngineResult<()>;

    /// Remove one role from a member.
    async fn remove_role(
        &self,
        guild: GuildRef,
        principal: Principal,
        role: RoleRef,
        reason: &str,
    ) -> EngineResult<()>;

    /// Delete a message.
    async fn delete_message(&self, channel: ChannelRef, message: MessageRef) -> EngineResult<()>;

    /// Post a plain notice to a channel.
    async fn send_channel_notice(&self, channel: ChannelRef, text: &str) -> EngineResult<()>;
}
