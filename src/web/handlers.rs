use actix_web::http::header::LOCATION;
use actix_web::{get, post, web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info, warn};

use crate::catalog::models::{Catalog, Category};
use crate::catalog::scanner::scan_catalog;
use crate::gallery::render::{render_gallery, render_message, render_player, PlayerView};
use crate::likes::LikeMap;
use crate::web::error::ApiError;
use crate::web::state::AppState;

fn html(body: String) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(body)
}

// Catalog and likes are re-read on every render so the order is always current
async fn gallery_page(state: &AppState, category: Category) -> HttpResponse {
    let catalog = state.catalog.load().await;
    let likes = state.likes.get_all().await;
    html(render_gallery(category, &catalog, &likes))
}

#[get("/")]
pub async fn index(state: web::Data<AppState>) -> HttpResponse {
    gallery_page(&state, Category::default()).await
}

#[get("/category/{key}")]
pub async fn category_page(
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let key = path.into_inner();
    let category = Category::from_key(&key)
        .ok_or_else(|| ApiError::NotFound(format!("unknown category {}", key)))?;
    Ok(gallery_page(&state, category).await)
}

// The catalog source endpoint: a plain listing of the category directories
#[get("/api/videos")]
pub async fn list_videos(state: web::Data<AppState>) -> HttpResponse {
    let catalog = match scan_catalog(&state.videos_dir).await {
        Ok(catalog) => catalog,
        Err(e) => {
            warn!(
                "Failed to scan {}: {}",
                state.videos_dir.display(),
                e
            );
            Catalog::empty()
        }
    };
    HttpResponse::Ok().json(catalog)
}

#[derive(Deserialize)]
pub struct WatchQuery {
    url: String,
}

#[get("/watch")]
pub async fn watch(
    query: web::Query<WatchQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let catalog = state.catalog.load().await;
    let (category, video) = catalog
        .locate(&query.url)
        .ok_or_else(|| ApiError::NotFound(format!("unknown video {}", query.url)))?;

    let likes = state
        .likes
        .get_all()
        .await
        .get(&video.url)
        .copied()
        .unwrap_or(0);
    let (session_id, aspect) = state.sessions.open(video.clone()).await;

    Ok(html(render_player(&PlayerView {
        session_id: &session_id,
        category,
        video,
        likes,
        aspect,
    })))
}

#[post("/watch/{id}/like")]
pub async fn like(
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let outcome = state
        .sessions
        .like(&id, state.likes.as_ref())
        .await
        .ok_or_else(|| ApiError::NotFound(format!("no open player {}", id)))?;

    Ok(HttpResponse::Ok().json(json!({
        "count": outcome.count,
        "liked": true,
        "registered": outcome.registered,
    })))
}

#[post("/watch/{id}/close")]
pub async fn close(
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    if state.sessions.close(&id).await {
        Ok(HttpResponse::NoContent().finish())
    } else {
        Err(ApiError::NotFound(format!("no open player {}", id)))
    }
}

#[derive(Deserialize)]
pub struct ResetForm {
    password: String,
    category: Option<String>,
}

// Password check is page gating only; the likes endpoint has its own admin token
#[post("/admin/reset")]
pub async fn reset(form: web::Form<ResetForm>, state: web::Data<AppState>) -> HttpResponse {
    let back = form
        .category
        .as_deref()
        .and_then(Category::from_key)
        .unwrap_or_default();

    let Some(expected) = &state.reset_password else {
        warn!("Reset requested but no reset password is configured");
        return HttpResponse::Forbidden()
            .content_type("text/html; charset=utf-8")
            .body(render_message(
                "Reset disabled",
                "No reset password is configured for this gallery.",
                back,
            ));
    };

    if form.password != *expected {
        warn!("Wrong reset password entered");
        return HttpResponse::Forbidden()
            .content_type("text/html; charset=utf-8")
            .body(render_message("Wrong password", "The password is incorrect.", back));
    }

    if let Err(e) = state.likes.reset_all(LikeMap::new()).await {
        error!("Failed to reset likes: {:#}", e);
        return HttpResponse::InternalServerError()
            .content_type("text/html; charset=utf-8")
            .body(render_message(
                "Reset failed",
                "The like counts could not be reset. Please try again later.",
                back,
            ));
    }

    info!("All like counts were reset");
    HttpResponse::SeeOther()
        .insert_header((LOCATION, format!("/category/{}", back.key())))
        .finish()
}
