use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest};
use mongodb::bson::oid::ObjectId;

use crate::auth::jwt::verify_access_token;
use crate::error::AppError;
use crate::extractors::auth_token::AuthToken;
use crate::state::app_state::AppState;

/// The authenticated caller, derived from the bearer token.
///
/// This is the explicit identity value handlers thread into the service
/// layer; nothing downstream reads auth state from anywhere else.
///
/// Validation order is fixed: token presence, then blacklist membership,
/// then signature/expiry.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user_id: ObjectId,
    pub username: String,
    pub admin: bool,
}

impl FromRequest for CurrentUser {
    type Error = AppError;
    type Future = std::pin::Pin<Box<dyn std::future::Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let token_fut = AuthToken::from_request(req, payload);
        let req = req.clone();

        Box::pin(async move {
            let AuthToken { token } = token_fut.await?;

            let app_state = req
                .app_data::<web::Data<AppState>>()
                .ok_or_else(|| AppError::internal("AppState not available"))?;
            let store = app_state.require_store()?;

            // Revoked tokens are rejected before the signature is even
            // looked at, so a blacklisted-but-expired token still reads
            // as blacklisted.
            if store.blacklist_contains(&token).await? {
                return Err(AppError::unauthorized(
                    "TOKEN_BLACKLISTED",
                    "Token has been blacklisted",
                ));
            }

            let claims = verify_access_token(&token, &app_state.security)?;

            let user_id = ObjectId::parse_str(&claims.sub)
                .map_err(|_| AppError::unauthorized("INVALID_TOKEN", "Invalid token"))?;

            Ok(CurrentUser {
                user_id,
                username: claims.username,
                admin: claims.admin,
            })
        })
    }
}
