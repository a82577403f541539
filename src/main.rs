use actix_web::web::Data;
use anyhow::Context;
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::{error, info};

use video_gallery::catalog::loader::CatalogLoader;
use video_gallery::config::settings::CONFIG;
use video_gallery::likes;
use video_gallery::likes::local::LocalLikeStore;
use video_gallery::web::likes_api::LikesApi;
use video_gallery::web::server::run_server;
use video_gallery::web::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();
    info!("Logging initialized, starting the gallery");
    info!("Gallery data path: {}", CONFIG.data_path);

    tokio::fs::create_dir_all(&CONFIG.videos_dir)
        .await
        .with_context(|| format!("create videos directory {}", CONFIG.videos_dir))?;

    // The likes endpoint always serves the local file; the gallery may use a remote one
    let local_likes = Arc::new(LocalLikeStore::new(CONFIG.likes_file()));
    let likes = likes::from_config(&CONFIG, local_likes.clone());

    let state = Data::new(AppState::new(
        CatalogLoader::from_config(&CONFIG),
        CONFIG.videos_path(),
        likes,
        CONFIG.reset_password.clone(),
    ));
    let likes_api = Data::new(LikesApi::new(local_likes, CONFIG.admin_token.clone()));

    // Create shutdown signal
    let shutdown = Arc::new(Notify::new());

    let signal = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        info!("Ctrl+C received, shutting down");
        signal.notify_one();
    });

    let web_shutdown = shutdown.clone();
    let web_server_handle = tokio::spawn(async move {
        if let Err(e) = run_server(state, likes_api, web_shutdown).await {
            error!("Gallery server error: {:?}", e);
        }
    });

    let _ = web_server_handle.await;

    info!("Shutdown complete");
    Ok(())
}
