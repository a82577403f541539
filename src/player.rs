use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::catalog::models::{AspectClass, VideoEntry};
use crate::likes::LikeStore;

/// Sessions nobody closed are dropped after this long.
const SESSION_TTL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone, PartialEq)]
pub enum ModalState {
    Closed,
    Open { video: VideoEntry, liked: bool },
}

/// What a like click on an open player turns into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LikeAttempt {
    /// First like in this session, should be counted.
    First(String),
    /// Already liked, nothing to count.
    Repeat(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeOutcome {
    pub count: u64,
    pub registered: bool,
}

/// Single-video overlay. A like is counted at most once per open.
#[derive(Debug)]
pub struct ModalPlayer {
    state: ModalState,
}

impl ModalPlayer {
    pub fn new() -> Self {
        Self {
            state: ModalState::Closed,
        }
    }

    pub fn state(&self) -> &ModalState {
        &self.state
    }

    /// Opens (or re-opens) on `video` with the like button reset.
    pub fn open(&mut self, video: VideoEntry) -> AspectClass {
        let aspect = AspectClass::for_entry(&video);
        self.state = ModalState::Open {
            video,
            liked: false,
        };
        aspect
    }

    pub fn current(&self) -> Option<&VideoEntry> {
        match &self.state {
            ModalState::Open { video, .. } => Some(video),
            ModalState::Closed => None,
        }
    }

    pub fn is_liked(&self) -> bool {
        matches!(self.state, ModalState::Open { liked: true, .. })
    }

    /// Flips the liked flag before any store call so double clicks count once.
    pub fn register_like(&mut self) -> Option<LikeAttempt> {
        match &mut self.state {
            ModalState::Closed => None,
            ModalState::Open { video, liked } => {
                if *liked {
                    Some(LikeAttempt::Repeat(video.url.clone()))
                } else {
                    *liked = true;
                    Some(LikeAttempt::First(video.url.clone()))
                }
            }
        }
    }

    pub fn close(&mut self) {
        self.state = ModalState::Closed;
    }
}

impl Default for ModalPlayer {
    fn default() -> Self {
        Self::new()
    }
}

struct Session {
    player: ModalPlayer,
    opened_at: Instant,
}

/// Open players keyed by session id, one per overlay shown in a browser.
pub struct PlayerSessions {
    sessions: Mutex<HashMap<String, Session>>,
    next_id: AtomicU64,
    prefix: u64,
}

impl PlayerSessions {
    pub fn new() -> Self {
        let prefix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_nanos() as u64)
            .unwrap_or(0);

        Self {
            sessions: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            prefix,
        }
    }

    /// Returns the new session id and the overlay's initial aspect class.
    pub async fn open(&self, video: VideoEntry) -> (String, AspectClass) {
        let id = format!(
            "{:x}-{:x}",
            self.prefix,
            self.next_id.fetch_add(1, Ordering::Relaxed)
        );

        let mut player = ModalPlayer::new();
        let url = video.url.clone();
        let aspect = player.open(video);

        let mut sessions = self.sessions.lock().await;
        sessions.retain(|_, session| session.opened_at.elapsed() < SESSION_TTL);
        sessions.insert(
            id.clone(),
            Session {
                player,
                opened_at: Instant::now(),
            },
        );

        info!("Opened player {} for {} ({} open)", id, url, sessions.len());
        (id, aspect)
    }

    /// `None` when the session is unknown or already closed.
    pub async fn like(&self, id: &str, store: &dyn LikeStore) -> Option<LikeOutcome> {
        let attempt = {
            let mut sessions = self.sessions.lock().await;
            sessions.get_mut(id)?.player.register_like()?
        };

        match attempt {
            LikeAttempt::First(url) => {
                let count = store.increment(&url).await;
                info!("Like registered for {} (total {})", url, count);
                Some(LikeOutcome {
                    count,
                    registered: true,
                })
            }
            LikeAttempt::Repeat(url) => {
                debug!("Ignoring repeated like for {} in {}", url, id);
                Some(LikeOutcome {
                    count: store.likes(&url).await,
                    registered: false,
                })
            }
        }
    }

    /// Returns whether a session was open.
    pub async fn close(&self, id: &str) -> bool {
        match self.sessions.lock().await.remove(id) {
            Some(mut session) => {
                if let Some(video) = session.player.current() {
                    debug!(
                        "Closed player {} for {} (liked: {})",
                        id,
                        video.url,
                        session.player.is_liked()
                    );
                }
                session.player.close();
                true
            }
            None => false,
        }
    }
}

impl Default for PlayerSessions {
    fn default() -> Self {
        Self::new()
    }
}
