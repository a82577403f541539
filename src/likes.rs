pub mod cache;
pub mod local;
pub mod remote;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

use crate::config::settings::Config;
use crate::likes::local::LocalLikeStore;
use crate::likes::remote::RemoteLikeStore;

/// Video url -> like count.
pub type LikeMap = BTreeMap<String, u64>;

/// Body of a POST to the likes endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum LikeAction {
    Like { url: String },
    Bulk { data: LikeMap },
    Reset,
}

/// Like counts keyed by video url.
///
/// Reads and increments never fail: a broken backend degrades to whatever the
/// store last knew. Only `reset_all`, an administrative operation, reports errors.
#[async_trait]
pub trait LikeStore: Send + Sync {
    /// Count for one video from the current snapshot, 0 when unknown.
    async fn likes(&self, url: &str) -> u64;

    async fn get_all(&self) -> LikeMap;

    /// Adds one like and returns the new count.
    async fn increment(&self, url: &str) -> u64;

    /// An empty map clears every record, otherwise the map replaces them all.
    async fn reset_all(&self, likes: LikeMap) -> Result<()>;
}

/// Picks the remote backend when an endpoint is configured, else the local file.
pub fn from_config(config: &Config, local: Arc<LocalLikeStore>) -> Arc<dyn LikeStore> {
    match &config.likes_api_url {
        Some(url) => {
            info!("Using remote like store at {}", url);
            Arc::new(RemoteLikeStore::new(url.clone(), config.admin_token.clone()))
        }
        None => {
            info!("Using local like store at {}", local.path().display());
            local
        }
    }
}
