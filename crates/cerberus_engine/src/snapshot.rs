//! Guild snapshot capture and retrieval.

use crate::platform::LiveProfile;
use async_trait::async_trait;
use cerberus_core::{AssetSlot, GuildRef, GuildSnapshot};
use cerberus_error::{EngineResult, StoreResult};
use cerberus_store::GuardStore;
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Binary blob storage for guild icon and banner backups.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Download the asset at `url` and store it under (guild, slot).
    async fn backup(&self, guild: GuildRef, slot: AssetSlot, url: &str) -> EngineResult<()>;

    /// The stored bytes for (guild, slot), if any.
    async fn retrieve(&self, guild: GuildRef, slot: AssetSlot) -> EngineResult<Option<Vec<u8>>>;
}

/// Holds the last known-good profile per guild.
///
/// One mutable snapshot per guild, no history. Capture runs on first sight
/// of a guild and whenever a profile edit arrives with no snapshot on
/// record; legitimate edits by authorized principals do not re-capture.
#[derive(Clone)]
pub struct SnapshotKeeper {
    store: Arc<GuardStore>,
    assets: Arc<dyn AssetStore>,
}

impl SnapshotKeeper {
    /// A keeper over the given store and asset backend.
    pub fn new(store: Arc<GuardStore>, assets: Arc<dyn AssetStore>) -> Self {
        Self { store, assets }
    }

    /// The current snapshot for a guild.
    pub fn get(&self, guild: GuildRef) -> Option<GuildSnapshot> {
        self.store.snapshot(guild)
    }

    /// Capture `profile` as the guild's snapshot, overwriting any previous
    /// one, and back up its binary assets.
    ///
    /// Asset downloads are best-effort; a failed backup leaves the metadata
    /// snapshot in place and the corresponding restore will simply find no
    /// bytes.
    #[instrument(skip(self, profile), fields(guild = %profile.guild))]
    pub async fn capture(&self, profile: &LiveProfile) -> StoreResult<GuildSnapshot> {
        if let Some(url) = &profile.icon_url {
            if let Err(e) = self.assets.backup(profile.guild, AssetSlot::Icon, url).await {
                warn!(error = %e, "Icon backup failed");
            }
        }
        if let Some(url) = &profile.banner_url {
            if let Err(e) = self
                .assets
                .backup(profile.guild, AssetSlot::Banner, url)
                .await
            {
                warn!(error = %e, "Banner backup failed");
            }
        }

        let snapshot = GuildSnapshot::builder()
            .guild(profile.guild)
            .name(profile.name.clone())
            .icon_url(profile.icon_url.clone())
            .banner_url(profile.banner_url.clone())
            .vanity_code(profile.vanity_code.clone())
            .verification_level(profile.verification_level)
            .captured_at(Utc::now())
            .build();
        self.store.capture(snapshot.clone())?;
        info!(name = %snapshot.name(), "Captured guild snapshot");
        Ok(snapshot)
    }

    /// Capture only when no snapshot exists yet; returns the snapshot that
    /// is current afterwards and whether this call created it.
    pub async fn capture_if_missing(
        &self,
        profile: &LiveProfile,
    ) -> StoreResult<(GuildSnapshot, bool)> {
        match self.get(profile.guild) {
            Some(existing) => Ok((existing, false)),
            None => Ok((self.capture(profile).await?, true)),
        }
    }

    /// The stored bytes for a guild asset slot.
    pub async fn asset(&self, guild: GuildRef, slot: AssetSlot) -> EngineResult<Option<Vec<u8>>> {
        self.assets.retrieve(guild, slot).await
    }
}
