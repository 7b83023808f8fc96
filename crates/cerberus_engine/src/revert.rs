//! Compensating mutations for unauthorized changes.

use crate::platform::{ChannelState, LiveProfile, MutationApi, ProfileField, ProfileRestore};
use crate::snapshot::SnapshotKeeper;
use cerberus_core::{AssetSlot, ChannelRef, GuildRef, GuildSnapshot, RoleRef};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Issues the compensating mutations that undo unauthorized changes.
///
/// Every call here is one best-effort attempt: a rejected mutation is
/// logged and reported by the caller, and never blocks rate accounting or
/// escalation for the same event.
#[derive(Clone)]
pub struct RevertEngine {
    mutations: Arc<dyn MutationApi>,
}

impl RevertEngine {
    /// A revert engine issuing mutations through the given API.
    pub fn new(mutations: Arc<dyn MutationApi>) -> Self {
        Self { mutations }
    }

    /// Delete a channel created by a non-exempt principal.
    ///
    /// Unauthorized creations are never allowed to persist, independent of
    /// rate thresholds; the rate limiter only governs whether the creator
    /// is additionally sanctioned.
    #[instrument(skip(self))]
    pub async fn delete_created_channel(
        &self,
        guild: GuildRef,
        channel: ChannelRef,
        reason: &str,
    ) -> bool {
        match self.mutations.delete_channel(guild, channel, reason).await {
            Ok(()) => {
                info!("Deleted unauthorized channel");
                true
            }
            Err(e) => {
                warn!(error = %e, "Channel delete rejected");
                false
            }
        }
    }

    /// Delete a role created by a non-exempt principal.
    #[instrument(skip(self))]
    pub async fn delete_created_role(&self, guild: GuildRef, role: RoleRef, reason: &str) -> bool {
        match self.mutations.delete_role(guild, role, reason).await {
            Ok(()) => {
                info!("Deleted unauthorized role");
                true
            }
            Err(e) => {
                warn!(error = %e, "Role delete rejected");
                false
            }
        }
    }

    /// Restore a channel's name, category, and overwrites to their prior
    /// value. Unconditional for non-exempt editors, not gated by
    /// escalation.
    #[instrument(skip(self, prior))]
    pub async fn restore_channel(
        &self,
        guild: GuildRef,
        channel: ChannelRef,
        prior: &ChannelState,
    ) -> bool {
        match self.mutations.edit_channel(guild, channel, prior).await {
            Ok(()) => {
                info!(name = %prior.name, "Restored channel attributes");
                true
            }
            Err(e) => {
                warn!(error = %e, "Channel restore rejected");
                false
            }
        }
    }

    /// Restore a role's permission bitset to its prior value.
    #[instrument(skip(self))]
    pub async fn restore_role_permissions(
        &self,
        guild: GuildRef,
        role: RoleRef,
        permissions: u64,
    ) -> bool {
        match self
            .mutations
            .edit_role_permissions(guild, role, permissions)
            .await
        {
            Ok(()) => {
                info!("Restored role permissions");
                true
            }
            Err(e) => {
                warn!(error = %e, "Role permission restore rejected");
                false
            }
        }
    }

    /// Roll an edited guild profile back to its snapshot, field by field.
    ///
    /// Returns the fields found changed and whether the compensating edit
    /// (if any was issued) succeeded. The vanity code is detected and
    /// reported but cannot be written back; the platform exposes no write
    /// path for it here.
    #[instrument(skip(self, keeper, snapshot, observed), fields(guild = %observed.guild))]
    pub async fn rollback_profile(
        &self,
        keeper: &SnapshotKeeper,
        snapshot: &GuildSnapshot,
        observed: &LiveProfile,
    ) -> (Vec<ProfileField>, bool) {
        let mut changed = Vec::new();
        let mut restore = ProfileRestore::default();

        if observed.name != *snapshot.name() {
            changed.push(ProfileField::Name);
            restore.name = Some(snapshot.name().clone());
        }
        if observed.icon_url != *snapshot.icon_url() {
            changed.push(ProfileField::Icon);
            restore.icon = self.asset_bytes(keeper, observed.guild, AssetSlot::Icon).await;
        }
        if observed.banner_url != *snapshot.banner_url() {
            changed.push(ProfileField::Banner);
            restore.banner = self
                .asset_bytes(keeper, observed.guild, AssetSlot::Banner)
                .await;
        }
        if observed.vanity_code != *snapshot.vanity_code() {
            changed.push(ProfileField::VanityCode);
        }
        if observed.verification_level != *snapshot.verification_level() {
            changed.push(ProfileField::VerificationLevel);
            restore.verification_level = Some(*snapshot.verification_level());
        }

        if restore.is_empty() {
            return (changed, true);
        }

        match self.mutations.edit_guild(observed.guild, &restore).await {
            Ok(()) => {
                info!(?changed, "Rolled guild profile back to snapshot");
                (changed, true)
            }
            Err(e) => {
                warn!(error = %e, ?changed, "Profile rollback rejected");
                (changed, false)
            }
        }
    }

    async fn asset_bytes(
        &self,
        keeper: &SnapshotKeeper,
        guild: GuildRef,
        slot: AssetSlot,
    ) -> Option<Vec<u8>> {
        match keeper.asset(guild, slot).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(%slot, error = %e, "Asset retrieval failed");
                None
            }
        }
    }
}
