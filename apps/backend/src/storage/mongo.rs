//! MongoDB-backed storage gateway.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::bson::{self, doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, IndexModel};
use tracing::info;

use super::{AwardCount, NearbyGame, Storage, UpdateOutcome};
use crate::config::db::MongoConfig;
use crate::error::AppError;
use crate::models::{Game, RevokedToken, Review, User};

pub struct MongoStorage {
    games: Collection<Game>,
    users: Collection<User>,
    blacklist: Collection<RevokedToken>,
}

impl MongoStorage {
    /// Connect to the deployment and make sure the indexes this service
    /// relies on exist. Index creation is idempotent.
    pub async fn connect(config: &MongoConfig) -> Result<Self, AppError> {
        let client = Client::with_uri_str(&config.uri)
            .await
            .map_err(|e| AppError::db(format!("failed to connect to MongoDB: {e}")))?;
        let db = client.database(&config.db_name);

        let storage = Self {
            games: db.collection("games"),
            users: db.collection("users"),
            blacklist: db.collection("blacklist"),
        };
        storage.ensure_indexes().await?;

        info!(db = %config.db_name, "storage gateway connected");
        Ok(storage)
    }

    async fn ensure_indexes(&self) -> Result<(), AppError> {
        self.users
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "username": 1 })
                    .options(IndexOptions::builder().unique(true).build())
                    .build(),
            )
            .await?;

        // 2dsphere index backing the $geoNear aggregation.
        self.games
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "developer_hq": "2dsphere" })
                    .build(),
            )
            .await?;

        // Revoked tokens evict themselves once the token is expired anyway.
        self.blacklist
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "expires_at": 1 })
                    .options(
                        IndexOptions::builder()
                            .expire_after(Duration::from_secs(0))
                            .build(),
                    )
                    .build(),
            )
            .await?;

        Ok(())
    }

    /// Match condition for a review element inside its parent game,
    /// optionally constrained to an owner.
    fn review_filter(game_id: ObjectId, review_id: ObjectId, owner: Option<ObjectId>) -> Document {
        let mut element = doc! { "_id": review_id };
        if let Some(owner) = owner {
            element.insert("user_id", owner);
        }
        doc! { "_id": game_id, "reviews": { "$elemMatch": element } }
    }
}

fn map_write_err(e: mongodb::error::Error) -> AppError {
    if let mongodb::error::ErrorKind::Write(mongodb::error::WriteFailure::WriteError(we)) =
        &*e.kind
    {
        // Duplicate key on a unique index; the pre-insert check lost a race.
        if we.code == 11000 {
            return AppError::conflict("DUPLICATE_KEY", "Username already exists");
        }
    }
    AppError::from(e)
}

impl From<mongodb::results::UpdateResult> for UpdateOutcome {
    fn from(result: mongodb::results::UpdateResult) -> Self {
        Self {
            matched: result.matched_count,
            modified: result.modified_count,
        }
    }
}

#[async_trait]
impl Storage for MongoStorage {
    async fn list_games(&self, skip: u64, limit: i64) -> Result<Vec<Game>, AppError> {
        let cursor = self.games.find(doc! {}).skip(skip).limit(limit).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find_game(&self, id: ObjectId) -> Result<Option<Game>, AppError> {
        Ok(self.games.find_one(doc! { "_id": id }).await?)
    }

    async fn title_exists(&self, title: &str) -> Result<bool, AppError> {
        Ok(self
            .games
            .find_one(doc! { "title": title })
            .await?
            .is_some())
    }

    async fn insert_game(&self, game: &Game) -> Result<ObjectId, AppError> {
        let result = self.games.insert_one(game).await?;
        result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| AppError::db("insert did not yield an ObjectId"))
    }

    async fn update_game(
        &self,
        id: ObjectId,
        fields: Document,
    ) -> Result<UpdateOutcome, AppError> {
        let result = self
            .games
            .update_one(doc! { "_id": id }, doc! { "$set": fields })
            .await?;
        Ok(result.into())
    }

    async fn delete_game(&self, id: ObjectId) -> Result<u64, AppError> {
        let result = self.games.delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count)
    }

    async fn find_reviews(&self, game_id: ObjectId) -> Result<Option<Vec<Review>>, AppError> {
        Ok(self.find_game(game_id).await?.map(|game| game.reviews))
    }

    async fn push_review(
        &self,
        game_id: ObjectId,
        review: &Review,
    ) -> Result<UpdateOutcome, AppError> {
        let element = bson::to_bson(review)
            .map_err(|e| AppError::internal(format!("Failed to encode review: {e}")))?;
        let result = self
            .games
            .update_one(
                doc! { "_id": game_id },
                doc! { "$push": { "reviews": element } },
            )
            .await?;
        Ok(result.into())
    }

    async fn update_review(
        &self,
        game_id: ObjectId,
        review_id: ObjectId,
        owner: Option<ObjectId>,
        fields: Document,
    ) -> Result<UpdateOutcome, AppError> {
        // Positional $ targets the element matched by $elemMatch.
        let mut set = Document::new();
        for (key, value) in fields {
            set.insert(format!("reviews.$.{key}"), value);
        }

        let result = self
            .games
            .update_one(
                Self::review_filter(game_id, review_id, owner),
                doc! { "$set": set },
            )
            .await?;
        Ok(result.into())
    }

    async fn pull_review(
        &self,
        game_id: ObjectId,
        review_id: ObjectId,
        owner: Option<ObjectId>,
    ) -> Result<UpdateOutcome, AppError> {
        let result = self
            .games
            .update_one(
                Self::review_filter(game_id, review_id, owner),
                doc! { "$pull": { "reviews": { "_id": review_id } } },
            )
            .await?;
        Ok(result.into())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.find_one(doc! { "username": username }).await?)
    }

    async fn insert_user(&self, user: &User) -> Result<ObjectId, AppError> {
        let result = self.users.insert_one(user).await.map_err(map_write_err)?;
        result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| AppError::db("insert did not yield an ObjectId"))
    }

    async fn blacklist_contains(&self, token: &str) -> Result<bool, AppError> {
        Ok(self
            .blacklist
            .find_one(doc! { "token": token })
            .await?
            .is_some())
    }

    async fn insert_revoked(&self, entry: &RevokedToken) -> Result<(), AppError> {
        self.blacklist.insert_one(entry).await?;
        Ok(())
    }

    async fn award_leaderboard(&self, skip: u64, limit: i64) -> Result<Vec<AwardCount>, AppError> {
        let pipeline = vec![
            doc! { "$project": {
                "title": 1,
                "award_count": { "$size": { "$ifNull": ["$awards", []] } },
            } },
            doc! { "$sort": { "award_count": -1 } },
            doc! { "$skip": skip as i64 },
            doc! { "$limit": limit },
        ];

        let mut cursor = self.games.aggregate(pipeline).await?;
        let mut entries = Vec::new();
        while let Some(row) = cursor.try_next().await? {
            entries.push(AwardCount {
                id: row
                    .get_object_id("_id")
                    .map_err(|e| AppError::db(format!("leaderboard row missing _id: {e}")))?,
                title: row
                    .get_str("title")
                    .map_err(|e| AppError::db(format!("leaderboard row missing title: {e}")))?
                    .to_string(),
                award_count: numeric_field(&row, "award_count")?,
            });
        }
        Ok(entries)
    }

    async fn games_near(
        &self,
        longitude: f64,
        latitude: f64,
        max_distance_meters: Option<f64>,
        limit: i64,
    ) -> Result<Vec<NearbyGame>, AppError> {
        let mut geo_near = doc! {
            "near": { "type": "Point", "coordinates": [longitude, latitude] },
            "distanceField": "distance",
            "spherical": true,
        };
        if let Some(max) = max_distance_meters {
            geo_near.insert("maxDistance", max);
        }

        let pipeline = vec![doc! { "$geoNear": geo_near }, doc! { "$limit": limit }];

        let mut cursor = self.games.aggregate(pipeline).await?;
        let mut nearby = Vec::new();
        while let Some(row) = cursor.try_next().await? {
            let distance_meters = row
                .get_f64("distance")
                .map_err(|e| AppError::db(format!("geo row missing distance: {e}")))?;
            let game: Game = bson::from_document(row)
                .map_err(|e| AppError::db(format!("failed to decode game: {e}")))?;
            nearby.push(NearbyGame {
                game,
                distance_meters,
            });
        }
        Ok(nearby)
    }
}

fn numeric_field(row: &Document, key: &str) -> Result<i64, AppError> {
    row.get_i64(key)
        .or_else(|_| row.get_i32(key).map(i64::from))
        .map_err(|e| AppError::db(format!("aggregation row missing {key}: {e}")))
}
