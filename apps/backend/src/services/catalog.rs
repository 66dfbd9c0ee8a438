//! Game catalog manager: CRUD over top-level game documents.

use mongodb::bson::oid::ObjectId;
use tracing::{debug, info};

use crate::error::AppError;
use crate::models::{Game, GameCreate, GameResponse, GameUpdate};
use crate::storage::Storage;
use crate::utils::pagination::PageWindow;

fn game_not_found() -> AppError {
    AppError::not_found("GAME_NOT_FOUND", "Invalid Game ID")
}

/// Parse a path id, rejecting malformed values as a 400.
pub fn parse_game_id(id: &str) -> Result<ObjectId, AppError> {
    ObjectId::parse_str(id)
        .map_err(|_| AppError::bad_request("INVALID_GAME_ID_FORMAT", "Invalid Game ID format"))
}

/// Window over the catalog in natural storage order. The order is whatever
/// the storage engine yields and is not guaranteed stable across calls.
pub async fn list(store: &dyn Storage, window: PageWindow) -> Result<Vec<GameResponse>, AppError> {
    let games = store.list_games(window.offset(), window.size()).await?;
    Ok(games.into_iter().map(GameResponse::from).collect())
}

/// Fetch one game. Reads report a malformed id as 404 with the format
/// message; mutations report it as 400.
pub async fn get(store: &dyn Storage, id: &str) -> Result<GameResponse, AppError> {
    let id = ObjectId::parse_str(id)
        .map_err(|_| AppError::not_found("INVALID_GAME_ID_FORMAT", "Invalid Game ID format"))?;

    store
        .find_game(id)
        .await?
        .map(GameResponse::from)
        .ok_or_else(game_not_found)
}

/// Create a game. Title uniqueness is checked against the live collection
/// before insert.
pub async fn create(store: &dyn Storage, payload: GameCreate) -> Result<ObjectId, AppError> {
    let game: Game = payload.into_game()?;

    if store.title_exists(&game.title).await? {
        return Err(AppError::conflict(
            "DUPLICATE_TITLE",
            "A game already exists with that title",
        ));
    }

    let id = store.insert_game(&game).await?;
    info!(game_id = %id, title = %game.title, "created game");
    Ok(id)
}

/// Apply a partial update. Supplied fields overwrite whole fields; fields
/// the payload type does not know about were dropped at the door.
pub async fn update(store: &dyn Storage, id: &str, payload: GameUpdate) -> Result<(), AppError> {
    let id = parse_game_id(id)?;
    let fields = payload.into_set_document()?;

    let outcome = store.update_game(id, fields).await?;
    if outcome.matched != 1 {
        return Err(game_not_found());
    }

    debug!(game_id = %id, "updated game");
    Ok(())
}

/// Delete a game. The second delete of the same id reports 404.
pub async fn delete(store: &dyn Storage, id: &str) -> Result<(), AppError> {
    let id = parse_game_id(id)?;

    if store.delete_game(id).await? != 1 {
        return Err(game_not_found());
    }

    info!(game_id = %id, "deleted game");
    Ok(())
}
