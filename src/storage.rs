use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

pub const LATEST_IMAGE_NAME: &str = "latest_esp32.jpg";

/// Keeps the most recent camera frame.
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn put_latest(&self, body: Bytes) -> anyhow::Result<()>;
    async fn latest(&self) -> anyhow::Result<Option<Bytes>>;
}

#[derive(Debug, Clone)]
pub struct FsImageStore {
    path: PathBuf,
}

impl FsImageStore {
    pub async fn new(folder: &Path) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(folder)
            .await
            .with_context(|| format!("create upload folder {}", folder.display()))?;
        Ok(Self {
            path: folder.join(LATEST_IMAGE_NAME),
        })
    }
}

#[async_trait]
impl ImageStore for FsImageStore {
    async fn put_latest(&self, body: Bytes) -> anyhow::Result<()> {
        // Write then rename so readers never see a half-written frame.
        let tmp = self.path.with_extension("jpg.part");
        tokio::fs::write(&tmp, &body)
            .await
            .with_context(|| format!("write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("rename to {}", self.path.display()))?;
        debug!(bytes = body.len(), path = %self.path.display(), "latest image stored");
        Ok(())
    }

    async fn latest(&self) -> anyhow::Result<Option<Bytes>> {
        match tokio::fs::read(&self.path).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("read {}", self.path.display())),
        }
    }
}

#[cfg(test)]
pub mod testing {
    use tokio::sync::Mutex;

    use super::*;

    #[derive(Default)]
    pub struct MemoryImageStore {
        latest: Mutex<Option<Bytes>>,
    }

    #[async_trait]
    impl ImageStore for MemoryImageStore {
        async fn put_latest(&self, body: Bytes) -> anyhow::Result<()> {
            *self.latest.lock().await = Some(body);
            Ok(())
        }

        async fn latest(&self) -> anyhow::Result<Option<Bytes>> {
            Ok(self.latest.lock().await.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_store_has_no_image() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsImageStore::new(dir.path()).await.unwrap();
        assert!(store.latest().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn latest_write_wins() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsImageStore::new(&dir.path().join("uploads")).await.unwrap();
        store.put_latest(Bytes::from_static(b"first")).await.unwrap();
        store.put_latest(Bytes::from_static(b"second")).await.unwrap();
        assert_eq!(store.latest().await.unwrap().unwrap(), Bytes::from_static(b"second"));
        assert!(dir.path().join("uploads").join(LATEST_IMAGE_NAME).exists());
    }
}
