//! Review HTTP routes, nested under a game.

use actix_web::{web, HttpResponse, Result};
use serde::Serialize;

use crate::error::AppError;
use crate::extractors::CurrentUser;
use crate::models::{ReviewCreate, ReviewUpdate};
use crate::services::reviews;
use crate::state::app_state::AppState;
use crate::utils::pagination::{PageQuery, PageWindow};

#[derive(Debug, Serialize)]
struct LocationResponse {
    url: String,
}

fn review_url(game_id: &str, review_id: &str) -> String {
    format!("/api/v1.0/games/{game_id}/reviews/{review_id}")
}

/// GET /games/{game_id}/reviews?pn&ps
async fn list_reviews(
    path: web::Path<String>,
    query: web::Query<PageQuery>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let window = PageWindow::from_query(&query)?;
    let store = app_state.require_store()?;

    let page = reviews::list(store, &path, window).await?;
    Ok(HttpResponse::Ok().json(page))
}

/// POST /games/{game_id}/reviews — any authenticated caller.
async fn add_review(
    path: web::Path<String>,
    user: CurrentUser,
    payload: web::Json<ReviewCreate>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let store = app_state.require_store()?;

    let review_id = reviews::add(store, &path, &user, payload.into_inner()).await?;

    Ok(HttpResponse::Created().json(LocationResponse {
        url: review_url(&path, &review_id.to_hex()),
    }))
}

/// GET /games/{game_id}/reviews/{review_id}
async fn get_review(
    path: web::Path<(String, String)>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let (game_id, review_id) = path.into_inner();
    let store = app_state.require_store()?;

    let review = reviews::get(store, &game_id, &review_id).await?;
    Ok(HttpResponse::Ok().json(review))
}

/// PUT /games/{game_id}/reviews/{review_id} — owner or admin.
async fn edit_review(
    path: web::Path<(String, String)>,
    user: CurrentUser,
    payload: web::Json<ReviewUpdate>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let (game_id, review_id) = path.into_inner();
    let store = app_state.require_store()?;

    reviews::edit(store, &game_id, &review_id, &user, payload.into_inner()).await?;

    Ok(HttpResponse::Ok().json(LocationResponse {
        url: review_url(&game_id, &review_id),
    }))
}

/// DELETE /games/{game_id}/reviews/{review_id} — owner or admin.
async fn delete_review(
    path: web::Path<(String, String)>,
    user: CurrentUser,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let (game_id, review_id) = path.into_inner();
    let store = app_state.require_store()?;

    reviews::delete(store, &game_id, &review_id, &user).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/games/{game_id}/reviews")
            .route(web::get().to(list_reviews))
            .route(web::post().to(add_review)),
    );
    cfg.service(
        web::resource("/games/{game_id}/reviews/{review_id}")
            .route(web::get().to(get_review))
            .route(web::put().to(edit_review))
            .route(web::delete().to(delete_review)),
    );
}
