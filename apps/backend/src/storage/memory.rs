//! In-process storage backend mirroring the MongoDB gateway's semantics.
//!
//! Used by the test suites so handler and service behavior can be exercised
//! without a running deployment. Mutations follow the same match-condition
//! rules as the Mongo backend: a review update or pull only matches when
//! game id, review id, and (if given) owner id all line up.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use mongodb::bson::{self, oid::ObjectId, Document};

use super::{AwardCount, NearbyGame, Storage, UpdateOutcome};
use crate::error::AppError;
use crate::models::{Game, RevokedToken, Review, User};

const EARTH_RADIUS_METERS: f64 = 6_378_137.0;

/// Spherical (haversine) distance between two [lng, lat] points, in meters.
pub fn spherical_distance_meters(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lng1, lat1) = (from.0.to_radians(), from.1.to_radians());
    let (lng2, lat2) = (to.0.to_radians(), to.1.to_radians());

    let dlat = lat2 - lat1;
    let dlng = lng2 - lng1;
    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    2.0 * a.sqrt().asin() * EARTH_RADIUS_METERS
}

#[derive(Default)]
pub struct MemoryStorage {
    games: Mutex<Vec<Game>>,
    users: Mutex<Vec<User>>,
    blacklist: Mutex<Vec<RevokedToken>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, AppError> {
    mutex
        .lock()
        .map_err(|_| AppError::internal("storage lock poisoned"))
}

/// Overlay `fields` onto a serialized document and decode it back,
/// reporting whether anything actually changed.
fn apply_fields<T>(target: &mut T, fields: &Document) -> Result<bool, AppError>
where
    T: serde::Serialize + serde::de::DeserializeOwned,
{
    let mut doc = bson::to_document(target)
        .map_err(|e| AppError::internal(format!("failed to encode document: {e}")))?;
    let before = doc.clone();

    for (key, value) in fields.iter() {
        doc.insert(key.clone(), value.clone());
    }

    if doc == before {
        return Ok(false);
    }

    *target = bson::from_document(doc)
        .map_err(|e| AppError::internal(format!("failed to decode document: {e}")))?;
    Ok(true)
}

fn review_matches(review: &Review, review_id: ObjectId, owner: Option<ObjectId>) -> bool {
    review.id == review_id && owner.map_or(true, |owner| review.user_id == owner)
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn list_games(&self, skip: u64, limit: i64) -> Result<Vec<Game>, AppError> {
        let games = lock(&self.games)?;
        Ok(games
            .iter()
            .skip(skip as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn find_game(&self, id: ObjectId) -> Result<Option<Game>, AppError> {
        let games = lock(&self.games)?;
        Ok(games.iter().find(|g| g.id == Some(id)).cloned())
    }

    async fn title_exists(&self, title: &str) -> Result<bool, AppError> {
        let games = lock(&self.games)?;
        Ok(games.iter().any(|g| g.title == title))
    }

    async fn insert_game(&self, game: &Game) -> Result<ObjectId, AppError> {
        let mut games = lock(&self.games)?;
        let id = game.id.unwrap_or_else(ObjectId::new);
        let mut stored = game.clone();
        stored.id = Some(id);
        games.push(stored);
        Ok(id)
    }

    async fn update_game(
        &self,
        id: ObjectId,
        fields: Document,
    ) -> Result<UpdateOutcome, AppError> {
        let mut games = lock(&self.games)?;
        match games.iter_mut().find(|g| g.id == Some(id)) {
            Some(game) => {
                let modified = apply_fields(game, &fields)?;
                Ok(UpdateOutcome {
                    matched: 1,
                    modified: modified as u64,
                })
            }
            None => Ok(UpdateOutcome {
                matched: 0,
                modified: 0,
            }),
        }
    }

    async fn delete_game(&self, id: ObjectId) -> Result<u64, AppError> {
        let mut games = lock(&self.games)?;
        let before = games.len();
        games.retain(|g| g.id != Some(id));
        Ok((before - games.len()) as u64)
    }

    async fn find_reviews(&self, game_id: ObjectId) -> Result<Option<Vec<Review>>, AppError> {
        let games = lock(&self.games)?;
        Ok(games
            .iter()
            .find(|g| g.id == Some(game_id))
            .map(|g| g.reviews.clone()))
    }

    async fn push_review(
        &self,
        game_id: ObjectId,
        review: &Review,
    ) -> Result<UpdateOutcome, AppError> {
        let mut games = lock(&self.games)?;
        match games.iter_mut().find(|g| g.id == Some(game_id)) {
            Some(game) => {
                game.reviews.push(review.clone());
                Ok(UpdateOutcome {
                    matched: 1,
                    modified: 1,
                })
            }
            None => Ok(UpdateOutcome {
                matched: 0,
                modified: 0,
            }),
        }
    }

    async fn update_review(
        &self,
        game_id: ObjectId,
        review_id: ObjectId,
        owner: Option<ObjectId>,
        fields: Document,
    ) -> Result<UpdateOutcome, AppError> {
        let mut games = lock(&self.games)?;
        let review = games
            .iter_mut()
            .find(|g| g.id == Some(game_id))
            .and_then(|g| {
                g.reviews
                    .iter_mut()
                    .find(|r| review_matches(r, review_id, owner))
            });

        match review {
            Some(review) => {
                let modified = apply_fields(review, &fields)?;
                Ok(UpdateOutcome {
                    matched: 1,
                    modified: modified as u64,
                })
            }
            None => Ok(UpdateOutcome {
                matched: 0,
                modified: 0,
            }),
        }
    }

    async fn pull_review(
        &self,
        game_id: ObjectId,
        review_id: ObjectId,
        owner: Option<ObjectId>,
    ) -> Result<UpdateOutcome, AppError> {
        let mut games = lock(&self.games)?;
        let game = games
            .iter_mut()
            .find(|g| g.id == Some(game_id) && g.reviews.iter().any(|r| review_matches(r, review_id, owner)));

        match game {
            Some(game) => {
                let before = game.reviews.len();
                game.reviews.retain(|r| r.id != review_id);
                Ok(UpdateOutcome {
                    matched: 1,
                    modified: (before - game.reviews.len()) as u64,
                })
            }
            None => Ok(UpdateOutcome {
                matched: 0,
                modified: 0,
            }),
        }
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let users = lock(&self.users)?;
        Ok(users.iter().find(|u| u.username == username).cloned())
    }

    async fn insert_user(&self, user: &User) -> Result<ObjectId, AppError> {
        let mut users = lock(&self.users)?;
        if users.iter().any(|u| u.username == user.username) {
            return Err(AppError::conflict(
                "DUPLICATE_KEY",
                "Username already exists",
            ));
        }
        let id = user.id.unwrap_or_else(ObjectId::new);
        let mut stored = user.clone();
        stored.id = Some(id);
        users.push(stored);
        Ok(id)
    }

    async fn blacklist_contains(&self, token: &str) -> Result<bool, AppError> {
        let mut blacklist = lock(&self.blacklist)?;
        // Stand-in for the TTL index: expired revocations fall out on lookup.
        let now = bson::DateTime::now();
        blacklist.retain(|entry| entry.expires_at > now);
        Ok(blacklist.iter().any(|entry| entry.token == token))
    }

    async fn insert_revoked(&self, entry: &RevokedToken) -> Result<(), AppError> {
        let mut blacklist = lock(&self.blacklist)?;
        blacklist.push(entry.clone());
        Ok(())
    }

    async fn award_leaderboard(&self, skip: u64, limit: i64) -> Result<Vec<AwardCount>, AppError> {
        let games = lock(&self.games)?;
        let mut entries: Vec<AwardCount> = games
            .iter()
            .filter_map(|g| {
                g.id.map(|id| AwardCount {
                    id,
                    title: g.title.clone(),
                    award_count: g.awards.len() as i64,
                })
            })
            .collect();

        // Stable sort keeps storage order for ties, matching the unspecified
        // tie-break of the real aggregation closely enough for tests.
        entries.sort_by(|a, b| b.award_count.cmp(&a.award_count));
        Ok(entries
            .into_iter()
            .skip(skip as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn games_near(
        &self,
        longitude: f64,
        latitude: f64,
        max_distance_meters: Option<f64>,
        limit: i64,
    ) -> Result<Vec<NearbyGame>, AppError> {
        let games = lock(&self.games)?;
        let mut nearby: Vec<NearbyGame> = games
            .iter()
            .filter_map(|g| {
                let hq = g.developer_hq.as_ref()?;
                let distance_meters = spherical_distance_meters(
                    (longitude, latitude),
                    (hq.longitude(), hq.latitude()),
                );
                Some(NearbyGame {
                    game: g.clone(),
                    distance_meters,
                })
            })
            .filter(|n| max_distance_meters.map_or(true, |max| n.distance_meters <= max))
            .collect();

        nearby.sort_by(|a, b| {
            a.distance_meters
                .partial_cmp(&b.distance_meters)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        nearby.truncate(limit.max(0) as usize);
        Ok(nearby)
    }
}
