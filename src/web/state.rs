use std::path::PathBuf;
use std::sync::Arc;

use crate::catalog::loader::CatalogLoader;
use crate::likes::LikeStore;
use crate::player::PlayerSessions;

/// Shared by every gallery handler.
pub struct AppState {
    pub catalog: CatalogLoader,
    /// Root of the category directories, served under `/videos`.
    pub videos_dir: PathBuf,
    pub likes: Arc<dyn LikeStore>,
    pub sessions: PlayerSessions,
    /// Plaintext gate in front of the reset button. Not an access control.
    pub reset_password: Option<String>,
}

impl AppState {
    pub fn new(
        catalog: CatalogLoader,
        videos_dir: PathBuf,
        likes: Arc<dyn LikeStore>,
        reset_password: Option<String>,
    ) -> Self {
        Self {
            catalog,
            videos_dir,
            likes,
            sessions: PlayerSessions::new(),
            reset_password,
        }
    }
}
