use std::path::PathBuf;

use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;

/// Destination for uploaded listing images. Implementations return the
/// public path the listing record will reference.
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn save(&self, key: &str, body: Bytes) -> anyhow::Result<String>;
}

/// Disk-backed storage under the static-served upload directory.
#[derive(Clone)]
pub struct DiskStorage {
    root: PathBuf,
}

impl DiskStorage {
    pub async fn new(root: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .with_context(|| format!("create upload dir {}", root.display()))?;
        Ok(Self { root })
    }
}

#[async_trait]
impl ImageStore for DiskStorage {
    async fn save(&self, key: &str, body: Bytes) -> anyhow::Result<String> {
        let path = self.root.join(key);
        tokio::fs::write(&path, &body)
            .await
            .with_context(|| format!("write upload {}", path.display()))?;
        Ok(format!("/uploads/{}", key))
    }
}
