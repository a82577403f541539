use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;
use tokio::fs;
use tracing::{error, info, warn};

use crate::catalog::models::Catalog;
use crate::catalog::scanner::scan_catalog;
use crate::config::settings::Config;

/// Where the catalog comes from on the happy path.
#[derive(Debug, Clone)]
pub enum CatalogSource {
    /// A catalog endpoint serving the `/api/videos` shape.
    Remote(String),
    /// Scan the category directories directly.
    Directory(PathBuf),
}

pub struct CatalogLoader {
    source: CatalogSource,
    fallback: Option<PathBuf>,
    client: reqwest::Client,
}

impl CatalogLoader {
    pub fn new(source: CatalogSource, fallback: Option<PathBuf>) -> Self {
        Self {
            source,
            fallback,
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let source = match &config.catalog_url {
            Some(url) => CatalogSource::Remote(url.clone()),
            None => CatalogSource::Directory(config.videos_path()),
        };
        Self::new(source, Some(PathBuf::from(&config.fallback_catalog)))
    }

    /// Single attempt at the primary source, then the static fallback, then an
    /// empty catalog. Never fails.
    pub async fn load(&self) -> Catalog {
        match self.load_primary().await {
            Ok(catalog) => {
                info!("Loaded {} videos from {:?}", catalog.total(), self.source);
                return catalog;
            }
            Err(e) => warn!("Catalog source unavailable, using fallback: {:#}", e),
        }

        match self.load_fallback().await {
            Ok(catalog) => {
                info!("Loaded {} videos from fallback catalog", catalog.total());
                catalog
            }
            Err(e) => {
                error!("No video catalog available: {:#}", e);
                Catalog::empty()
            }
        }
    }

    async fn load_primary(&self) -> Result<Catalog> {
        match &self.source {
            CatalogSource::Remote(url) => {
                let res = self
                    .client
                    .get(url)
                    .send()
                    .await
                    .with_context(|| format!("request {}", url))?;

                if !res.status().is_success() {
                    return Err(anyhow!("catalog source returned {}", res.status()));
                }

                res.json::<Catalog>()
                    .await
                    .context("decode catalog response")
            }
            CatalogSource::Directory(path) => scan_catalog(path)
                .await
                .with_context(|| format!("scan {}", path.display())),
        }
    }

    async fn load_fallback(&self) -> Result<Catalog> {
        let path = self
            .fallback
            .as_ref()
            .ok_or_else(|| anyhow!("no fallback catalog configured"))?;

        let raw = fs::read_to_string(path)
            .await
            .with_context(|| format!("read {}", path.display()))?;

        serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))
    }
}
