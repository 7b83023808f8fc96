//! Filesystem-backed asset blob store.
//!
//! Icon and banner bytes are downloaded from the CDN at snapshot time and
//! kept in a per-guild directory, keyed by slot. Restores read the bytes
//! back and hand them to the guild edit.

use async_trait::async_trait;
use cerberus_core::{AssetSlot, GuildRef};
use cerberus_engine::AssetStore;
use cerberus_error::{EngineError, EngineErrorKind, EngineResult};
use std::path::PathBuf;
use tracing::{debug, instrument};

/// Asset blobs on the local filesystem under one backup root.
#[derive(Debug, Clone)]
pub struct FileAssetStore {
    root: PathBuf,
    client: reqwest::Client,
}

impl FileAssetStore {
    /// A store rooted at `root`; directories are created on demand.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            client: reqwest::Client::new(),
        }
    }

    fn blob_path(&self, guild: GuildRef, slot: AssetSlot) -> PathBuf {
        self.root.join(guild.0.to_string()).join(format!("{slot}.png"))
    }

    fn io_rejected(err: impl std::fmt::Display) -> EngineError {
        EngineError::new(EngineErrorKind::MutationRejected {
            operation: "asset-io".to_string(),
            reason: err.to_string(),
        })
    }
}

#[async_trait]
impl AssetStore for FileAssetStore {
    #[instrument(skip(self, url), fields(guild = %guild, slot = %slot))]
    async fn backup(&self, guild: GuildRef, slot: AssetSlot, url: &str) -> EngineResult<()> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(Self::io_rejected)?;
        let bytes = response.bytes().await.map_err(Self::io_rejected)?;

        let path = self.blob_path(guild, slot);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(Self::io_rejected)?;
        }
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(Self::io_rejected)?;
        debug!(path = %path.display(), size = bytes.len(), "Backed up guild asset");
        Ok(())
    }

    #[instrument(skip(self), fields(guild = %guild, slot = %slot))]
    async fn retrieve(&self, guild: GuildRef, slot: AssetSlot) -> EngineResult<Option<Vec<u8>>> {
        let path = self.blob_path(guild, slot);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Self::io_rejected(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn retrieve_reads_back_what_was_written() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileAssetStore::new(dir.path());
        let guild = GuildRef(1);
        let path = store.blob_path(guild, AssetSlot::Icon);
        tokio::fs::create_dir_all(path.parent().unwrap())
            .await
            .unwrap();
        tokio::fs::write(&path, b"png-bytes").await.unwrap();

        let bytes = store.retrieve(guild, AssetSlot::Icon).await.unwrap();
        assert_eq!(bytes.as_deref(), Some(b"png-bytes".as_slice()));
    }

    #[tokio::test]
    async fn missing_blob_is_none_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileAssetStore::new(dir.path());
        let bytes = store.retrieve(GuildRef(2), AssetSlot::Banner).await.unwrap();
        assert!(bytes.is_none());
    }
}
