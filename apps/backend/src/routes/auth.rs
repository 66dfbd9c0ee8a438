//! Identity lifecycle routes: register, login, logout.

use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse, Result};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::extractors::{AuthToken, CurrentUser};
use crate::services::identity;
use crate::state::app_state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Debug, Serialize)]
struct MessageResponse {
    message: &'static str,
}

/// POST /register — create a non-admin account. No token is issued;
/// clients log in separately.
async fn register(
    req: web::Json<RegisterRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let store = app_state.require_store()?;

    identity::register(store, &req.username, &req.password).await?;

    Ok(HttpResponse::Created().json(MessageResponse {
        message: "User registered successfully",
    }))
}

/// POST /login — authenticate and mint a 30-minute bearer token.
///
/// Credentials come from an HTTP Basic Authorization header or, failing
/// that, from a JSON body.
async fn login(
    http_req: HttpRequest,
    body: Option<web::Json<LoginRequest>>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let store = app_state.require_store()?;

    let credentials = http_req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(identity::basic_credentials)
        .or_else(|| {
            body.map(|b| (b.username.clone(), b.password.clone()))
                .filter(|(username, password)| !username.is_empty() && !password.is_empty())
        });

    let (username, password) = credentials.ok_or_else(|| {
        AppError::unauthorized("MISSING_CREDENTIALS", "Authentication credentials required")
    })?;

    let token = identity::login(store, &app_state.security, &username, &password).await?;

    Ok(HttpResponse::Ok().json(LoginResponse { token }))
}

/// POST /logout — blacklist the presented token. The guard has already
/// validated it, so revocation is the only work left.
async fn logout(
    token: AuthToken,
    _user: CurrentUser,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let store = app_state.require_store()?;

    identity::logout(store, &app_state.security, &token.token).await?;

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Logout successful",
    }))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/register").route(web::post().to(register)));
    cfg.service(web::resource("/login").route(web::post().to(login)));
    cfg.service(web::resource("/logout").route(web::post().to(logout)));
}
