use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest};

use crate::error::AppError;
use crate::extractors::current_user::CurrentUser;

/// An authenticated caller whose token carries the admin flag.
///
/// Wraps [`CurrentUser`], so the full validation chain runs first; a valid
/// non-admin token fails with 403 rather than 401.
#[derive(Debug, Clone)]
pub struct AdminUser(pub CurrentUser);

impl FromRequest for AdminUser {
    type Error = AppError;
    type Future = std::pin::Pin<Box<dyn std::future::Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let user_fut = CurrentUser::from_request(req, payload);

        Box::pin(async move {
            let user = user_fut.await?;

            if !user.admin {
                return Err(AppError::forbidden(
                    "ADMIN_REQUIRED",
                    "Admin privileges required",
                ));
            }

            Ok(AdminUser(user))
        })
    }
}
