//! File storage for uploaded phone images.

use crate::error::{CoreError, CoreResult};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

/// Accepts an uploaded binary plus the desired name and returns the stored file name.
///
/// A stored image is never replaced: saving under a name that is already taken fails.
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn save(&self, file_name: &str, bytes: &[u8]) -> CoreResult<String>;

    /// Best-effort removal, used to undo a save when the catalog insert fails.
    async fn remove(&self, file_name: &str);
}

/// Stores images as plain files inside one asset directory.
#[derive(Debug, Clone)]
pub struct DiskImageStore {
    dir: PathBuf,
}

impl DiskImageStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }
}

#[async_trait]
impl ImageStore for DiskImageStore {
    async fn save(&self, file_name: &str, bytes: &[u8]) -> CoreResult<String> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(file_name);
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path).await {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(CoreError::validation(format!(
                    "image name already taken: {}",
                    file_name
                )));
            }
            Err(e) => return Err(e.into()),
        };
        if let Err(e) = write_all(&mut file, bytes).await {
            drop(file);
            let _ = tokio::fs::remove_file(&path).await;
            return Err(e.into());
        }
        info!(path = %path.display(), bytes = bytes.len(), "stored image");
        Ok(file_name.to_string())
    }

    async fn remove(&self, file_name: &str) {
        let path = self.dir.join(file_name);
        if let Err(e) = tokio::fs::remove_file(&path).await {
            warn!(path = %path.display(), error = %e, "could not remove image");
        }
    }
}

async fn write_all(file: &mut tokio::fs::File, bytes: &[u8]) -> std::io::Result<()> {
    file.write_all(bytes).await?;
    file.sync_all().await
}
