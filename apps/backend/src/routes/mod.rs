use actix_web::web;

use crate::error::AppError;

pub mod auth;
pub mod games;
pub mod health;
pub mod reviews;

/// Configure all application routes.
///
/// Review routes must register after the game routes: both live under
/// `/games`, and the fixed aggregation paths have to win over `{id}`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    // Unparseable JSON bodies get the same error shape as everything else.
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        AppError::bad_request("INVALID_JSON", format!("Invalid JSON payload: {err}")).into()
    }));

    // Health check: /health
    cfg.configure(health::configure_routes);

    // Versioned API surface.
    cfg.service(
        web::scope("/api/v1.0")
            .configure(auth::configure_routes)
            .configure(games::configure_routes)
            .configure(reviews::configure_routes),
    );
}
