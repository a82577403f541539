use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::header::CACHE_CONTROL;
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::likes::cache::{LikeCache, CACHE_DURATION};
use crate::likes::{LikeAction, LikeMap, LikeStore};

/// How often a caller waiting on someone else's fetch checks whether it is done.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

const ADMIN_TOKEN_HEADER: &str = "X-Admin-Token";

#[derive(Deserialize)]
struct CountResponse {
    #[serde(default)]
    count: Option<u64>,
}

/// Like counts held by an HTTP key-value endpoint.
///
/// Reads are served from a short-lived cache and concurrent refreshes collapse
/// into one request. Writes that fail fall back to an optimistic local count
/// which is never reconciled with the server.
pub struct RemoteLikeStore {
    endpoint: String,
    admin_token: Option<String>,
    client: reqwest::Client,
    cache: Mutex<LikeCache>,
    fetching: AtomicBool,
}

// Clears the in-flight flag even if the fetching future is dropped
struct FetchGuard<'a>(&'a AtomicBool);

impl Drop for FetchGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl RemoteLikeStore {
    pub fn new(endpoint: String, admin_token: Option<String>) -> Self {
        Self::with_ttl(endpoint, admin_token, CACHE_DURATION)
    }

    pub fn with_ttl(endpoint: String, admin_token: Option<String>, ttl: Duration) -> Self {
        Self {
            endpoint,
            admin_token,
            client: reqwest::Client::new(),
            cache: Mutex::new(LikeCache::new(ttl)),
            fetching: AtomicBool::new(false),
        }
    }

    async fn fetch_all(&self) -> Result<LikeMap> {
        let res = self
            .client
            .get(&self.endpoint)
            .header(CACHE_CONTROL, "no-store")
            .send()
            .await
            .with_context(|| format!("request {}", self.endpoint))?;

        if !res.status().is_success() {
            return Err(anyhow!("API {}", res.status()));
        }

        res.json::<LikeMap>().await.context("decode like mapping")
    }

    async fn post(&self, action: &LikeAction) -> Result<reqwest::Response> {
        let mut req = self.client.post(&self.endpoint).json(action);
        if matches!(action, LikeAction::Reset) {
            req = req.query(&[("action", "reset")]);
        }
        if let Some(token) = &self.admin_token {
            req = req.header(ADMIN_TOKEN_HEADER, token);
        }

        let res = req
            .send()
            .await
            .with_context(|| format!("request {}", self.endpoint))?;

        if !res.status().is_success() {
            return Err(anyhow!("API {}", res.status()));
        }
        Ok(res)
    }

    async fn post_like(&self, url: &str) -> Result<u64> {
        let res = self
            .post(&LikeAction::Like {
                url: url.to_string(),
            })
            .await?;
        let body: CountResponse = res.json().await.context("decode like response")?;
        Ok(body.count.unwrap_or(0))
    }
}

#[async_trait]
impl LikeStore for RemoteLikeStore {
    async fn likes(&self, url: &str) -> u64 {
        self.cache.lock().await.get(url)
    }

    async fn get_all(&self) -> LikeMap {
        {
            let cache = self.cache.lock().await;
            if cache.is_fresh() {
                return cache.likes.clone();
            }
        }

        if self
            .fetching
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            // Someone else is fetching; wait for them and share the result
            while self.fetching.load(Ordering::Acquire) {
                tokio::time::sleep(POLL_INTERVAL).await;
            }
            return self.cache.lock().await.likes.clone();
        }

        let _guard = FetchGuard(&self.fetching);
        let started = Instant::now();

        match self.fetch_all().await {
            Ok(likes) => {
                info!("Fetched {} like records", likes.len());
                self.cache.lock().await.store(likes.clone(), started);
                likes
            }
            Err(e) => {
                error!("Failed to fetch likes: {:#}", e);
                self.cache.lock().await.likes.clone()
            }
        }
    }

    async fn increment(&self, url: &str) -> u64 {
        match self.post_like(url).await {
            Ok(count) => {
                info!("Saved like for {} (total {})", url, count);
                self.cache.lock().await.likes.insert(url.to_string(), count);
                count
            }
            Err(e) => {
                error!("Failed to save like for {}: {:#}", url, e);
                let mut cache = self.cache.lock().await;
                let count = cache.likes.entry(url.to_string()).or_insert(0);
                *count = count.saturating_add(1);
                *count
            }
        }
    }

    async fn reset_all(&self, likes: LikeMap) -> Result<()> {
        let action = if likes.is_empty() {
            LikeAction::Reset
        } else {
            LikeAction::Bulk {
                data: likes.clone(),
            }
        };

        if let Err(e) = self.post(&action).await {
            error!("Failed to update likes: {:#}", e);
            return Err(e);
        }

        info!("Replaced remote likes ({} records)", likes.len());
        self.cache.lock().await.replace_stale(likes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::likes::local::LocalLikeStore;
    use crate::web::likes_api::{self, LikesApi};
    use actix_web::dev::Service;
    use actix_web::http::Method;
    use actix_web::{web, App, HttpServer};
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    struct TestEndpoint {
        url: String,
        gets: Arc<AtomicUsize>,
        _dir: tempfile::TempDir,
    }

    // Real likes endpoint on an ephemeral port, counting GET requests
    fn start_endpoint(admin_token: Option<&str>) -> TestEndpoint {
        let dir = tempfile::tempdir().unwrap();
        let api = web::Data::new(LikesApi::new(
            Arc::new(LocalLikeStore::new(dir.path().join("likes.json"))),
            admin_token.map(str::to_string),
        ));
        let gets = Arc::new(AtomicUsize::new(0));

        let counter = gets.clone();
        let server = HttpServer::new(move || {
            let counter = counter.clone();
            App::new()
                .app_data(api.clone())
                .wrap_fn(move |req, srv| {
                    if req.method() == Method::GET {
                        counter.fetch_add(1, Ordering::SeqCst);
                    }
                    srv.call(req)
                })
                .configure(likes_api::configure)
        })
        .workers(1)
        .disable_signals()
        .bind(("127.0.0.1", 0))
        .unwrap();

        let addr = server.addrs()[0];
        actix_web::rt::spawn(server.run());

        TestEndpoint {
            url: format!("http://{}/likes", addr),
            gets,
            _dir: dir,
        }
    }

    #[actix_web::test]
    async fn increment_returns_server_count() {
        let endpoint = start_endpoint(None);
        let store = RemoteLikeStore::new(endpoint.url.clone(), None);

        assert_eq!(store.increment("a.mp4").await, 1);
        assert_eq!(store.increment("a.mp4").await, 2);
        assert_eq!(store.likes("a.mp4").await, 2);
    }

    #[actix_web::test]
    async fn get_all_within_ttl_issues_one_request() {
        let endpoint = start_endpoint(None);
        let writer = RemoteLikeStore::new(endpoint.url.clone(), None);
        writer.increment("a.mp4").await;

        let store = RemoteLikeStore::new(endpoint.url.clone(), None);
        let first = store.get_all().await;
        let second = store.get_all().await;

        assert_eq!(first, second);
        assert_eq!(first["a.mp4"], 1);
        assert_eq!(endpoint.gets.load(Ordering::SeqCst), 1);
    }

    #[actix_web::test]
    async fn concurrent_get_all_coalesces() {
        let endpoint = start_endpoint(None);
        let store = RemoteLikeStore::new(endpoint.url.clone(), None);

        let (a, b, c) = tokio::join!(store.get_all(), store.get_all(), store.get_all());

        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(endpoint.gets.load(Ordering::SeqCst), 1);
    }

    #[actix_web::test]
    async fn stale_cache_refetches() {
        let endpoint = start_endpoint(None);
        let store = RemoteLikeStore::with_ttl(endpoint.url.clone(), None, Duration::ZERO);

        store.get_all().await;
        store.get_all().await;
        assert_eq!(endpoint.gets.load(Ordering::SeqCst), 2);
    }

    #[actix_web::test]
    async fn reset_round_trip_uses_admin_token() {
        let endpoint = start_endpoint(Some("secret"));
        let store = RemoteLikeStore::new(endpoint.url.clone(), Some("secret".to_string()));
        store.increment("a.mp4").await;

        store.reset_all(LikeMap::new()).await.unwrap();
        assert!(store.get_all().await.is_empty());

        store
            .reset_all(LikeMap::from([("b.mp4".to_string(), 4)]))
            .await
            .unwrap();
        assert_eq!(store.get_all().await["b.mp4"], 4);
    }

    #[actix_web::test]
    async fn reset_without_token_is_refused() {
        let endpoint = start_endpoint(Some("secret"));
        let store = RemoteLikeStore::new(endpoint.url.clone(), None);

        assert!(store.reset_all(LikeMap::new()).await.is_err());
        assert!(store
            .reset_all(LikeMap::from([("b.mp4".to_string(), 4)]))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn unreachable_endpoint_degrades() {
        let store = RemoteLikeStore::new("http://127.0.0.1:1/likes".to_string(), None);

        assert!(store.get_all().await.is_empty());
        assert_eq!(store.increment("a.mp4").await, 1);
        assert_eq!(store.increment("a.mp4").await, 2);
        assert_eq!(store.get_all().await["a.mp4"], 2);
        assert!(store.reset_all(LikeMap::new()).await.is_err());
    }

    #[tokio::test]
    async fn optimistic_increment_saturates() {
        let store = RemoteLikeStore::new("http://127.0.0.1:1/likes".to_string(), None);
        store
            .cache
            .lock()
            .await
            .likes
            .insert("a.mp4".to_string(), u64::MAX);

        assert_eq!(store.increment("a.mp4").await, u64::MAX);
    }

    #[actix_web::test]
    async fn server_count_saturates_after_bulk_max() {
        let endpoint = start_endpoint(None);
        let store = RemoteLikeStore::new(endpoint.url.clone(), None);
        store
            .reset_all(LikeMap::from([("a.mp4".to_string(), u64::MAX)]))
            .await
            .unwrap();

        assert_eq!(store.increment("a.mp4").await, u64::MAX);
        assert_eq!(store.get_all().await["a.mp4"], u64::MAX);
    }
}
