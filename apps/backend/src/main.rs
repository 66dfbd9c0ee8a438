use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use backend::config::db::{mongo_config, DbProfile};
use backend::middleware::cors::cors_middleware;
use backend::middleware::request_trace::RequestTrace;
use backend::routes;
use backend::state::app_state::AppState;
use backend::state::security_config::SecurityConfig;
use backend::storage::mongo::MongoStorage;
use backend::telemetry;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    telemetry::init_tracing();

    // Environment variables must be set by the runtime environment:
    // - Docker: Set via docker-compose env_file or docker run --env-file
    // - Local dev: Source env files manually (e.g., set -a; . ./.env; set +a)
    let host = std::env::var("BACKEND_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("BACKEND_PORT")
        .unwrap_or_else(|_| "3001".to_string())
        .parse::<u16>()
        .unwrap_or_else(|_| {
            eprintln!("❌ BACKEND_PORT must be a valid port number");
            std::process::exit(1);
        });

    println!("🚀 Starting Game Catalog Backend on http://{}:{}", host, port);

    let jwt = match std::env::var("BACKEND_JWT_SECRET") {
        Ok(jwt) => jwt,
        Err(_) => {
            eprintln!("❌ BACKEND_JWT_SECRET must be set");
            std::process::exit(1);
        }
    };
    let security_config = SecurityConfig::new(jwt.as_bytes());

    let db_config = match mongo_config(DbProfile::Prod) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Invalid database configuration: {e}");
            std::process::exit(1);
        }
    };

    let storage = match MongoStorage::connect(&db_config).await {
        Ok(storage) => storage,
        Err(e) => {
            eprintln!("❌ Failed to connect to MongoDB: {e}");
            std::process::exit(1);
        }
    };

    println!("✅ Database connected");

    let app_state = AppState::new(Arc::new(storage), security_config);

    // Wrap AppState with web::Data before passing to HttpServer
    let data = web::Data::new(app_state);

    HttpServer::new(move || {
        App::new()
            .wrap(cors_middleware())
            .wrap(RequestTrace)
            .app_data(data.clone())
            .configure(routes::configure)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
