//! Shared helpers for the integration suites.
//!
//! Apps are built over the in-memory storage backend so endpoint behavior
//! can be exercised without a running MongoDB deployment.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::SystemTime;

use actix_web::web;
use mongodb::bson::oid::ObjectId;

use backend::auth::password::hash_password;
use backend::models::{Game, GeoPoint, User};
use backend::state::app_state::AppState;
use backend::state::security_config::SecurityConfig;
use backend::storage::memory::MemoryStorage;
use backend::storage::Storage;

pub const TEST_JWT_SECRET: &[u8] = b"test_secret_key_for_testing_purposes_only";

pub fn security() -> SecurityConfig {
    SecurityConfig::new(TEST_JWT_SECRET)
}

/// Fresh app state over an empty in-memory store. The store handle is
/// returned separately so tests can seed data directly.
pub fn test_state() -> (web::Data<AppState>, Arc<MemoryStorage>) {
    let store = Arc::new(MemoryStorage::new());
    let state = AppState::new(store.clone(), security());
    (web::Data::new(state), store)
}

/// Insert a user with a real Argon2id hash and return its id.
pub async fn seed_user(
    store: &MemoryStorage,
    username: &str,
    password: &str,
    admin: bool,
) -> ObjectId {
    let mut user = User::new(username, hash_password(password).expect("hash password"));
    user.admin = admin;
    store.insert_user(&user).await.expect("insert user")
}

/// Mint a token the way the login endpoint would, for the shared secret.
pub fn token_for(user_id: ObjectId, username: &str, admin: bool) -> String {
    backend::mint_access_token(
        &user_id.to_hex(),
        username,
        admin,
        SystemTime::now(),
        &security(),
    )
    .expect("mint token")
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {token}"))
}

pub fn sample_game(title: &str) -> Game {
    Game {
        id: None,
        title: title.to_string(),
        platforms: vec!["PC".to_string(), "PS5".to_string()],
        release_year: 2022,
        developer: "Sample Dev".to_string(),
        publisher: "Sample Pub".to_string(),
        esrb: "T".to_string(),
        genres: vec!["RPG".to_string()],
        modes: vec!["Single-player".to_string()],
        rating: None,
        developer_hq: None,
        awards: Vec::new(),
        reviews: Vec::new(),
    }
}

pub async fn seed_game(store: &MemoryStorage, title: &str) -> ObjectId {
    store
        .insert_game(&sample_game(title))
        .await
        .expect("insert game")
}

pub async fn seed_game_with_hq(
    store: &MemoryStorage,
    title: &str,
    longitude: f64,
    latitude: f64,
) -> ObjectId {
    let mut game = sample_game(title);
    game.developer_hq = Some(GeoPoint::new(longitude, latitude));
    store.insert_game(&game).await.expect("insert game")
}
