//! Game catalog HTTP routes, including the two aggregation endpoints.

use actix_web::{web, HttpResponse, Result};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::extractors::AdminUser;
use crate::models::{GameCreate, GameUpdate};
use crate::services::{catalog, rankings};
use crate::state::app_state::AppState;
use crate::utils::pagination::{PageQuery, PageWindow};

const DEFAULT_CLOSEST_LIMIT: i64 = 5;

#[derive(Debug, Serialize)]
struct CreatedResponse {
    game_id: String,
    url: String,
}

#[derive(Debug, Serialize)]
struct LocationResponse {
    url: String,
}

fn game_url(id: &str) -> String {
    format!("/api/v1.0/games/{id}")
}

/// GET /games?pn&ps
async fn list_games(
    query: web::Query<PageQuery>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let window = PageWindow::from_query(&query)?;
    let store = app_state.require_store()?;

    let games = catalog::list(store, window).await?;
    Ok(HttpResponse::Ok().json(games))
}

/// GET /games/{id}
async fn get_game(
    path: web::Path<String>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let store = app_state.require_store()?;

    let game = catalog::get(store, &path).await?;
    Ok(HttpResponse::Ok().json(game))
}

/// POST /games — admin only.
async fn create_game(
    _admin: AdminUser,
    payload: web::Json<GameCreate>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let store = app_state.require_store()?;

    let id = catalog::create(store, payload.into_inner()).await?;
    let id = id.to_hex();

    Ok(HttpResponse::Created().json(CreatedResponse {
        url: game_url(&id),
        game_id: id,
    }))
}

/// PUT /games/{id} — admin only, partial update.
async fn update_game(
    _admin: AdminUser,
    path: web::Path<String>,
    payload: web::Json<GameUpdate>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let store = app_state.require_store()?;

    catalog::update(store, &path, payload.into_inner()).await?;

    Ok(HttpResponse::Ok().json(LocationResponse {
        url: game_url(&path),
    }))
}

/// DELETE /games/{id} — admin only.
async fn delete_game(
    _admin: AdminUser,
    path: web::Path<String>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let store = app_state.require_store()?;

    catalog::delete(store, &path).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// GET /games/award-leaderboard?pn&ps
async fn award_leaderboard(
    query: web::Query<PageQuery>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let window = PageWindow::from_query(&query)?;
    let store = app_state.require_store()?;

    let entries = rankings::award_leaderboard(store, window).await?;
    Ok(HttpResponse::Ok().json(entries))
}

/// Raw geospatial query parameters; parsed by hand so each bad value gets
/// its own message instead of a framework decode error.
#[derive(Debug, Default, Deserialize)]
pub struct GeoQuery {
    pub lng: Option<String>,
    pub lat: Option<String>,
    pub radius: Option<String>,
    pub limit: Option<String>,
}

fn parse_geo_query(query: &GeoQuery) -> Result<(f64, f64, f64, i64), AppError> {
    let lng = query
        .lng
        .as_deref()
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| (-180.0..=180.0).contains(v))
        .ok_or_else(|| AppError::bad_request("INVALID_LONGITUDE", "Invalid longitude"))?;

    let lat = query
        .lat
        .as_deref()
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| (-90.0..=90.0).contains(v))
        .ok_or_else(|| AppError::bad_request("INVALID_LATITUDE", "Invalid latitude"))?;

    let radius = query
        .radius
        .as_deref()
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v > 0.0)
        .ok_or_else(|| AppError::bad_request("INVALID_RADIUS", "Invalid radius"))?;

    let limit = match query.limit.as_deref() {
        None => DEFAULT_CLOSEST_LIMIT,
        Some(s) => s
            .trim()
            .parse::<i64>()
            .ok()
            .filter(|v| *v >= 1)
            .ok_or_else(|| AppError::bad_request("INVALID_LIMIT", "Invalid limit"))?,
    };

    Ok((lng, lat, radius, limit))
}

/// GET /games/closest?lng&lat&radius&limit — radius in meters, distances
/// reported in kilometers.
async fn closest(
    query: web::Query<GeoQuery>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let (lng, lat, radius, limit) = parse_geo_query(&query)?;
    let store = app_state.require_store()?;

    let response = rankings::closest_hq(store, lng, lat, radius, limit).await?;
    Ok(HttpResponse::Ok().json(response))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/games")
            .route(web::get().to(list_games))
            .route(web::post().to(create_game)),
    );
    // Fixed paths must come before the `{id}` matcher.
    cfg.service(
        web::resource("/games/award-leaderboard").route(web::get().to(award_leaderboard)),
    );
    cfg.service(web::resource("/games/closest").route(web::get().to(closest)));
    cfg.service(
        web::resource("/games/{id}")
            .route(web::get().to(get_game))
            .route(web::put().to(update_game))
            .route(web::delete().to(delete_game)),
    );
}
