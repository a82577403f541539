use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::likes::{LikeMap, LikeStore};

/// Key the like mapping is stored under inside the storage document.
pub const LIKES_STORAGE_KEY: &str = "videoLikes";

/// Like counts in a JSON document on disk, one named key per stored value.
///
/// Writes go through a temporary file and a rename, so readers see either the
/// old or the new document. The mutex only serializes this process; two
/// processes sharing the file may lose increments.
pub struct LocalLikeStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl LocalLikeStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Increment that reports write failures instead of degrading.
    pub async fn try_increment(&self, url: &str) -> Result<u64> {
        let _guard = self.write_lock.lock().await;

        let mut document = self.read_document().await;
        let mut likes = likes_from(&document);
        let count = likes.entry(url.to_string()).or_insert(0);
        *count = count.saturating_add(1);
        let count = *count;

        document.insert(LIKES_STORAGE_KEY.to_string(), serde_json::to_value(&likes)?);
        self.write_document(&document).await?;

        debug!("Stored like for {} (total {})", url, count);
        Ok(count)
    }

    async fn read_document(&self) -> Map<String, Value> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Map::new(),
            Err(e) => {
                error!("Failed to read {}: {}", self.path.display(), e);
                return Map::new();
            }
        };

        match serde_json::from_str::<Map<String, Value>>(&raw) {
            Ok(document) => document,
            Err(e) => {
                warn!("Ignoring unreadable like storage {}: {}", self.path.display(), e);
                Map::new()
            }
        }
    }

    async fn write_document(&self, document: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("create {}", parent.display()))?;
        }

        let tmp_path = self.path.with_extension("json.tmp");
        let body = serde_json::to_vec_pretty(document)?;
        fs::write(&tmp_path, body)
            .await
            .with_context(|| format!("write {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &self.path)
            .await
            .with_context(|| format!("replace {}", self.path.display()))?;
        Ok(())
    }
}

fn likes_from(document: &Map<String, Value>) -> LikeMap {
    match document.get(LIKES_STORAGE_KEY) {
        None => LikeMap::new(),
        Some(value) => serde_json::from_value(value.clone()).unwrap_or_else(|e| {
            warn!("Ignoring malformed like mapping: {}", e);
            LikeMap::new()
        }),
    }
}

#[async_trait]
impl LikeStore for LocalLikeStore {
    async fn likes(&self, url: &str) -> u64 {
        likes_from(&self.read_document().await)
            .get(url)
            .copied()
            .unwrap_or(0)
    }

    async fn get_all(&self) -> LikeMap {
        likes_from(&self.read_document().await)
    }

    async fn increment(&self, url: &str) -> u64 {
        match self.try_increment(url).await {
            Ok(count) => count,
            Err(e) => {
                error!("Failed to save like for {}: {:#}", url, e);
                self.likes(url).await.saturating_add(1)
            }
        }
    }

    async fn reset_all(&self, likes: LikeMap) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut document = self.read_document().await;
        if likes.is_empty() {
            document.remove(LIKES_STORAGE_KEY);
        } else {
            document.insert(LIKES_STORAGE_KEY.to_string(), serde_json::to_value(&likes)?);
        }
        self.write_document(&document).await?;

        info!("Reset like storage ({} records kept)", likes.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> LocalLikeStore {
        LocalLikeStore::new(dir.path().join("likes.json"))
    }

    #[tokio::test]
    async fn increments_by_one() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        assert_eq!(store.likes("a.mp4").await, 0);
        assert_eq!(store.increment("a.mp4").await, 1);
        assert_eq!(store.increment("a.mp4").await, 2);
        assert_eq!(store.increment("b.mp4").await, 1);
        assert_eq!(store.likes("a.mp4").await, 2);

        let all = store.get_all().await;
        assert_eq!(all.len(), 2);
        assert_eq!(all["b.mp4"], 1);
    }

    #[tokio::test]
    async fn survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        store_in(&dir).increment("a.mp4").await;
        assert_eq!(store_in(&dir).likes("a.mp4").await, 1);
    }

    #[tokio::test]
    async fn reset_then_get_all_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.increment("a.mp4").await;

        store.reset_all(LikeMap::new()).await.unwrap();
        assert!(store.get_all().await.is_empty());
    }

    #[tokio::test]
    async fn bulk_reset_overwrites_everything() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.increment("a.mp4").await;

        store
            .reset_all(LikeMap::from([("b.mp4".to_string(), 5)]))
            .await
            .unwrap();
        assert_eq!(
            store.get_all().await,
            LikeMap::from([("b.mp4".to_string(), 5)])
        );
    }

    #[tokio::test]
    async fn other_keys_are_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("likes.json");
        std::fs::write(&path, r#"{"theme":"dark","videoLikes":{"a.mp4":4}}"#).unwrap();

        let store = LocalLikeStore::new(&path);
        assert_eq!(store.increment("a.mp4").await, 5);
        store.reset_all(LikeMap::new()).await.unwrap();

        let document: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(document, serde_json::json!({"theme": "dark"}));
    }

    #[tokio::test]
    async fn corrupt_storage_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("likes.json");
        std::fs::write(&path, "not json").unwrap();

        let store = LocalLikeStore::new(&path);
        assert!(store.get_all().await.is_empty());
        assert_eq!(store.increment("a.mp4").await, 1);
    }

    #[tokio::test]
    async fn increment_saturates_at_max() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store
            .reset_all(LikeMap::from([("a.mp4".to_string(), u64::MAX)]))
            .await
            .unwrap();

        assert_eq!(store.increment("a.mp4").await, u64::MAX);
        assert_eq!(store.likes("a.mp4").await, u64::MAX);
    }

    #[tokio::test]
    async fn negative_counts_are_rejected_as_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("likes.json");
        std::fs::write(&path, r#"{"videoLikes":{"a.mp4":-3}}"#).unwrap();

        assert!(LocalLikeStore::new(&path).get_all().await.is_empty());
    }
}
