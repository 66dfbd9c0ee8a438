use actix_web::{dev::Payload, http::header, FromRequest, HttpRequest};
use serde::{Deserialize, Serialize};

use crate::AppError;

fn token_missing() -> AppError {
    AppError::unauthorized("TOKEN_MISSING", "Token missing")
}

/// Bearer token extracted verbatim from the Authorization header.
///
/// Presence only — signature, expiry, and blacklist membership are checked
/// by [`CurrentUser`](crate::extractors::current_user::CurrentUser).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AuthToken {
    pub token: String,
}

impl FromRequest for AuthToken {
    type Error = AppError;
    type Future = std::pin::Pin<Box<dyn std::future::Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let req = req.clone();

        Box::pin(async move {
            let auth_header = req
                .headers()
                .get(header::AUTHORIZATION)
                .ok_or_else(token_missing)?;

            let auth_value = auth_header.to_str().map_err(|_| token_missing())?;

            // Parse "Bearer <token>" format
            let parts: Vec<&str> = auth_value.split_whitespace().collect();
            if parts.len() != 2 || parts[0] != "Bearer" {
                return Err(token_missing());
            }

            let token = parts[1];
            if token.is_empty() {
                return Err(token_missing());
            }

            Ok(AuthToken {
                token: token.to_string(),
            })
        })
    }
}
