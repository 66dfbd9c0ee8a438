//! Storage gateway for the catalog.
//!
//! The [`Storage`] trait is the narrow seam between the service layer and
//! the document store: find/insert/update/delete plus the two aggregations,
//! each atomic at the single-document level. Review mutations take the full
//! match condition (game id, review id, owner) so the one round-trip is
//! authoritative — callers never read-modify-write a whole document.
//!
//! [`mongo::MongoStorage`] is the production backend; [`memory::MemoryStorage`]
//! mirrors its semantics in process for the test suites.

pub mod memory;
pub mod mongo;

use async_trait::async_trait;
use mongodb::bson::{oid::ObjectId, Document};

use crate::error::AppError;
use crate::models::{Game, RevokedToken, Review, User};

/// Outcome of a conditional single-document update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub matched: u64,
    pub modified: u64,
}

/// One row of the award leaderboard aggregation.
#[derive(Debug, Clone)]
pub struct AwardCount {
    pub id: ObjectId,
    pub title: String,
    pub award_count: i64,
}

/// A game returned by the geospatial query, with its spherical distance
/// from the query point in meters.
#[derive(Debug, Clone)]
pub struct NearbyGame {
    pub game: Game,
    pub distance_meters: f64,
}

#[async_trait]
pub trait Storage: Send + Sync {
    // -- games ---------------------------------------------------------

    /// Window over the collection in natural storage order.
    async fn list_games(&self, skip: u64, limit: i64) -> Result<Vec<Game>, AppError>;

    async fn find_game(&self, id: ObjectId) -> Result<Option<Game>, AppError>;

    async fn title_exists(&self, title: &str) -> Result<bool, AppError>;

    async fn insert_game(&self, game: &Game) -> Result<ObjectId, AppError>;

    /// `$set` the given fields on the matching game.
    async fn update_game(&self, id: ObjectId, fields: Document)
        -> Result<UpdateOutcome, AppError>;

    /// Returns the number of deleted documents (0 or 1).
    async fn delete_game(&self, id: ObjectId) -> Result<u64, AppError>;

    // -- reviews (atomic array ops on the parent document) -------------

    /// `None` when the game itself is absent.
    async fn find_reviews(&self, game_id: ObjectId) -> Result<Option<Vec<Review>>, AppError>;

    /// Atomic append to the parent's review sequence.
    async fn push_review(
        &self,
        game_id: ObjectId,
        review: &Review,
    ) -> Result<UpdateOutcome, AppError>;

    /// `$set` fields on the matched array element. When `owner` is given it
    /// becomes part of the match condition, so a non-owner never matches.
    async fn update_review(
        &self,
        game_id: ObjectId,
        review_id: ObjectId,
        owner: Option<ObjectId>,
        fields: Document,
    ) -> Result<UpdateOutcome, AppError>;

    /// Atomic removal of the matching array element, same owner rule.
    async fn pull_review(
        &self,
        game_id: ObjectId,
        review_id: ObjectId,
        owner: Option<ObjectId>,
    ) -> Result<UpdateOutcome, AppError>;

    // -- users ---------------------------------------------------------

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError>;

    async fn insert_user(&self, user: &User) -> Result<ObjectId, AppError>;

    // -- token blacklist -----------------------------------------------

    async fn blacklist_contains(&self, token: &str) -> Result<bool, AppError>;

    async fn insert_revoked(&self, entry: &RevokedToken) -> Result<(), AppError>;

    // -- aggregations --------------------------------------------------

    /// Games ranked by award count, descending. Ties fall back to storage
    /// order, which is deliberately left unspecified.
    async fn award_leaderboard(&self, skip: u64, limit: i64) -> Result<Vec<AwardCount>, AppError>;

    /// Games with a `developer_hq`, ascending by spherical distance from
    /// the query point. `max_distance_meters: None` means unbounded.
    async fn games_near(
        &self,
        longitude: f64,
        latitude: f64,
        max_distance_meters: Option<f64>,
        limit: i64,
    ) -> Result<Vec<NearbyGame>, AppError>;
}
