//! Account registration, credential authentication, and token revocation.

use std::time::SystemTime;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use mongodb::bson::DateTime;
use tracing::{debug, info, warn};

use crate::auth::jwt::{mint_access_token, verify_access_token};
use crate::auth::password::{hash_password, verify_password, MIN_PASSWORD_LEN};
use crate::error::AppError;
use crate::models::{RevokedToken, User};
use crate::state::security_config::SecurityConfig;
use crate::storage::Storage;

fn bad_credentials() -> AppError {
    // Same response for unknown user and wrong password.
    AppError::unauthorized("BAD_CREDENTIALS", "Invalid username or password")
}

/// Create a new non-admin account. Registration never issues a token;
/// a separate login is required.
pub async fn register(store: &dyn Storage, username: &str, password: &str) -> Result<(), AppError> {
    let username = username.trim();
    if username.is_empty() || password.is_empty() {
        return Err(AppError::bad_request(
            "MISSING_CREDENTIALS",
            "Missing username or password",
        ));
    }

    if password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::bad_request(
            "WEAK_PASSWORD",
            format!("Password must be at least {MIN_PASSWORD_LEN} characters long"),
        ));
    }

    if store.find_user_by_username(username).await?.is_some() {
        return Err(AppError::conflict(
            "USERNAME_TAKEN",
            "Username already exists",
        ));
    }

    let user = User::new(username, hash_password(password)?);
    store.insert_user(&user).await?;

    info!(username, "registered new user");
    Ok(())
}

/// Check credentials and mint a fresh access token.
pub async fn login(
    store: &dyn Storage,
    security: &SecurityConfig,
    username: &str,
    password: &str,
) -> Result<String, AppError> {
    let user = store
        .find_user_by_username(username)
        .await?
        .ok_or_else(bad_credentials)?;

    if !verify_password(password, &user.password)? {
        warn!(username, "login rejected: password mismatch");
        return Err(bad_credentials());
    }

    let user_id = user
        .id
        .ok_or_else(|| AppError::internal("stored user has no id"))?;

    let token = mint_access_token(
        &user_id.to_hex(),
        &user.username,
        user.admin,
        SystemTime::now(),
        security,
    )?;

    debug!(username, admin = user.admin, "issued access token");
    Ok(token)
}

/// Revoke the presented token for the remainder of its lifetime.
///
/// The caller has already passed the auth guard, so the token is valid and
/// not yet blacklisted; the membership check here is the service-level
/// invariant for direct callers.
pub async fn logout(
    store: &dyn Storage,
    security: &SecurityConfig,
    token: &str,
) -> Result<(), AppError> {
    if store.blacklist_contains(token).await? {
        return Err(AppError::unauthorized(
            "TOKEN_BLACKLISTED",
            "Token has been blacklisted",
        ));
    }

    let claims = verify_access_token(token, security)?;

    store
        .insert_revoked(&RevokedToken {
            token: token.to_string(),
            expires_at: DateTime::from_millis(claims.exp * 1000),
        })
        .await?;

    info!(username = %claims.username, "token revoked");
    Ok(())
}

/// Decode an HTTP Basic `Authorization` header value into credentials.
pub fn basic_credentials(header_value: &str) -> Option<(String, String)> {
    let encoded = header_value.strip_prefix("Basic ")?.trim();
    let decoded = BASE64.decode(encoded).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}
