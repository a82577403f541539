use actix_web::http::header::CACHE_CONTROL;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

use crate::likes::local::LocalLikeStore;
use crate::likes::{LikeAction, LikeMap, LikeStore};
use crate::web::error::ApiError;

const ADMIN_TOKEN_HEADER: &str = "X-Admin-Token";

/// The likes key-value endpoint, backed by the local file store.
pub struct LikesApi {
    store: Arc<LocalLikeStore>,
    admin_token: Option<String>,
}

impl LikesApi {
    pub fn new(store: Arc<LocalLikeStore>, admin_token: Option<String>) -> Self {
        Self { store, admin_token }
    }

    // Without a configured token, reset and bulk are open
    fn authorize(&self, req: &HttpRequest) -> Result<(), ApiError> {
        let Some(expected) = &self.admin_token else {
            return Ok(());
        };

        let supplied = req
            .headers()
            .get(ADMIN_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok());

        if supplied == Some(expected.as_str()) {
            Ok(())
        } else {
            warn!("Rejected admin request to likes endpoint");
            Err(ApiError::Forbidden)
        }
    }
}

#[derive(Deserialize)]
struct ActionQuery {
    action: Option<String>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/likes")
            .route(web::get().to(list_likes))
            .route(web::post().to(update_likes)),
    );
}

async fn list_likes(api: web::Data<LikesApi>) -> HttpResponse {
    HttpResponse::Ok()
        .insert_header((CACHE_CONTROL, "no-store"))
        .json(api.store.get_all().await)
}

async fn update_likes(
    req: HttpRequest,
    query: web::Query<ActionQuery>,
    body: web::Bytes,
    api: web::Data<LikesApi>,
) -> Result<HttpResponse, ApiError> {
    // `?action=reset` wins over whatever the body says
    let action = if query.action.as_deref() == Some("reset") {
        LikeAction::Reset
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::BadRequest(format!("invalid like request: {}", e)))?
    };

    match action {
        LikeAction::Like { url } => {
            if url.trim().is_empty() {
                return Err(ApiError::BadRequest("url is required".to_string()));
            }
            let count = api.store.try_increment(&url).await?;
            Ok(HttpResponse::Ok().json(json!({ "count": count })))
        }
        LikeAction::Bulk { data } => {
            api.authorize(&req)?;
            info!("Bulk overwrite of {} like records", data.len());
            api.store.reset_all(data).await?;
            Ok(HttpResponse::Ok().json(json!({ "ok": true })))
        }
        LikeAction::Reset => {
            api.authorize(&req)?;
            info!("Resetting all likes");
            api.store.reset_all(LikeMap::new()).await?;
            Ok(HttpResponse::Ok().json(json!({ "ok": true })))
        }
    }
}
