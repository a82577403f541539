use actix_files::Files;
use actix_web::{web, App, HttpServer};
use std::io;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::info;

use crate::config::settings::CONFIG;
use crate::web::handlers;
use crate::web::likes_api::{self, LikesApi};
use crate::web::state::AppState;

pub fn configure(cfg: &mut web::ServiceConfig, videos_dir: &Path) {
    cfg.service(handlers::index)
        .service(handlers::category_page)
        .service(handlers::list_videos)
        .service(handlers::watch)
        .service(handlers::like)
        .service(handlers::close)
        .service(handlers::reset)
        .configure(likes_api::configure)
        .service(Files::new("/videos", videos_dir));
}

pub async fn run_server(
    state: web::Data<AppState>,
    likes_api: web::Data<LikesApi>,
    shutdown_signal: Arc<Notify>,
) -> io::Result<()> {
    let addr = format!("{}:{}", CONFIG.webserver_host, CONFIG.webserver_port)
        .parse::<SocketAddr>()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    let server = HttpServer::new(move || {
        let videos_dir = state.videos_dir.clone();
        App::new()
            .app_data(state.clone())
            .app_data(likes_api.clone())
            .configure(|cfg| configure(cfg, &videos_dir))
    })
    .disable_signals()
    .bind(addr)?
    .run();

    info!("Starting gallery server on: {addr}");

    let server_handle = server.handle();

    tokio::select! {
        result = server => result,
        _ = shutdown_signal.notified() => {
            info!("Shutdown signal received, stopping web server");
            server_handle.stop(true).await;
            Ok(())
        }
    }
}
