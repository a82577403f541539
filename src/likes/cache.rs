use std::time::{Duration, Instant};

use crate::likes::LikeMap;

/// How long a fetched like mapping is served without asking the endpoint again.
pub const CACHE_DURATION: Duration = Duration::from_secs(10);

// Last known like mapping, to avoid hitting the endpoint on every render
#[derive(Debug)]
pub struct LikeCache {
    pub likes: LikeMap,
    pub last_fetch: Option<Instant>,
    ttl: Duration,
}

impl LikeCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            likes: LikeMap::new(),
            // None forces the first read to fetch
            last_fetch: None,
            ttl,
        }
    }

    pub fn is_fresh(&self) -> bool {
        self.last_fetch
            .map(|fetched| fetched.elapsed() < self.ttl)
            .unwrap_or(false)
    }

    pub fn store(&mut self, likes: LikeMap, fetched_at: Instant) {
        self.likes = likes;
        self.last_fetch = Some(fetched_at);
    }

    /// Replace the mapping but make the next read go to the endpoint.
    pub fn replace_stale(&mut self, likes: LikeMap) {
        self.likes = likes;
        self.last_fetch = None;
    }

    pub fn get(&self, url: &str) -> u64 {
        self.likes.get(url).copied().unwrap_or(0)
    }
}

impl Default for LikeCache {
    fn default() -> Self {
        Self::new(CACHE_DURATION)
    }
}
