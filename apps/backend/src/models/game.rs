//! Game documents and their embedded reviews.
//!
//! `Game` and `Review` are the storage representations (bson, ObjectId
//! ids). The `*Response` types are the wire shapes: identifiers become
//! hex strings so the storage id format never leaks to clients.

use mongodb::bson::{self, oid::ObjectId, Document};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

const GEOJSON_POINT: &str = "Point";

/// GeoJSON point: `{ "type": "Point", "coordinates": [lng, lat] }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: Vec<f64>,
}

impl GeoPoint {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            kind: GEOJSON_POINT.to_string(),
            coordinates: vec![longitude, latitude],
        }
    }

    /// A well-formed point has the `Point` tag and exactly two finite
    /// coordinates within geographic bounds.
    pub fn validate(&self) -> Result<(), AppError> {
        let valid = self.kind == GEOJSON_POINT
            && self.coordinates.len() == 2
            && self.coordinates.iter().all(|c| c.is_finite())
            && (-180.0..=180.0).contains(&self.coordinates[0])
            && (-90.0..=90.0).contains(&self.coordinates[1]);

        if valid {
            Ok(())
        } else {
            Err(AppError::bad_request(
                "INVALID_GEO_POINT",
                "developer_hq must be a GeoJSON Point with [longitude, latitude] coordinates",
            ))
        }
    }

    pub fn longitude(&self) -> f64 {
        self.coordinates[0]
    }

    pub fn latitude(&self) -> f64 {
        self.coordinates[1]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    /// Weak reference to the author; not synchronized with later renames.
    pub user_id: ObjectId,
    /// Username snapshot taken at creation time.
    pub username: String,
    pub comment: String,
    pub rating: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub title: String,
    pub platforms: Vec<String>,
    pub release_year: i32,
    pub developer: String,
    pub publisher: String,
    pub esrb: String,
    pub genres: Vec<String>,
    pub modes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub developer_hq: Option<GeoPoint>,
    /// Opaque award records; only ever counted.
    #[serde(default)]
    pub awards: Vec<Document>,
    #[serde(default)]
    pub reviews: Vec<Review>,
}

// ---------------------------------------------------------------------------
// Request payloads
// ---------------------------------------------------------------------------

/// Create payload. Required fields are `Option` so that absence yields the
/// catalog's own "Missing required fields" error rather than a decode error;
/// unknown fields never reach storage because they have nowhere to land.
#[derive(Debug, Default, Deserialize)]
pub struct GameCreate {
    pub title: Option<String>,
    pub platforms: Option<Vec<String>>,
    pub release_year: Option<i32>,
    pub developer: Option<String>,
    pub publisher: Option<String>,
    pub esrb: Option<String>,
    pub genres: Option<Vec<String>>,
    pub modes: Option<Vec<String>>,
    pub rating: Option<f64>,
    pub developer_hq: Option<GeoPoint>,
    pub awards: Option<Vec<Document>>,
}

impl GameCreate {
    /// Validate the payload and build the document to insert.
    pub fn into_game(self) -> Result<Game, AppError> {
        if let Some(hq) = &self.developer_hq {
            hq.validate()?;
        }

        match (
            self.title,
            self.platforms,
            self.release_year,
            self.developer,
            self.publisher,
            self.esrb,
            self.genres,
            self.modes,
        ) {
            (
                Some(title),
                Some(platforms),
                Some(release_year),
                Some(developer),
                Some(publisher),
                Some(esrb),
                Some(genres),
                Some(modes),
            ) => Ok(Game {
                id: None,
                title,
                platforms,
                release_year,
                developer,
                publisher,
                esrb,
                genres,
                modes,
                rating: self.rating,
                developer_hq: self.developer_hq,
                awards: self.awards.unwrap_or_default(),
                reviews: Vec::new(),
            }),
            _ => Err(AppError::bad_request(
                "MISSING_FIELDS",
                "Missing required fields",
            )),
        }
    }
}

/// Partial update payload. Every recognized field is optional; anything
/// else is dropped during deserialization and can never be written.
#[derive(Debug, Default, Deserialize)]
pub struct GameUpdate {
    pub title: Option<String>,
    pub platforms: Option<Vec<String>>,
    pub release_year: Option<i32>,
    pub developer: Option<String>,
    pub publisher: Option<String>,
    pub esrb: Option<String>,
    pub genres: Option<Vec<String>>,
    pub modes: Option<Vec<String>>,
    pub rating: Option<f64>,
    pub developer_hq: Option<GeoPoint>,
}

impl GameUpdate {
    /// Build the `$set` document from the supplied fields.
    ///
    /// Whole-field overwrite per field, no merge within a field. Zero
    /// recognized fields is an error.
    pub fn into_set_document(self) -> Result<Document, AppError> {
        let mut fields = Document::new();

        if let Some(title) = self.title {
            fields.insert("title", title);
        }
        if let Some(platforms) = self.platforms {
            fields.insert("platforms", platforms);
        }
        if let Some(release_year) = self.release_year {
            fields.insert("release_year", release_year);
        }
        if let Some(developer) = self.developer {
            fields.insert("developer", developer);
        }
        if let Some(publisher) = self.publisher {
            fields.insert("publisher", publisher);
        }
        if let Some(esrb) = self.esrb {
            fields.insert("esrb", esrb);
        }
        if let Some(genres) = self.genres {
            fields.insert("genres", genres);
        }
        if let Some(modes) = self.modes {
            fields.insert("modes", modes);
        }
        if let Some(rating) = self.rating {
            fields.insert("rating", rating);
        }
        if let Some(hq) = self.developer_hq {
            hq.validate()?;
            let value = bson::to_bson(&hq)
                .map_err(|e| AppError::internal(format!("Failed to encode geo point: {e}")))?;
            fields.insert("developer_hq", value);
        }

        if fields.is_empty() {
            return Err(AppError::bad_request(
                "NO_VALID_FIELDS",
                "No valid fields provided",
            ));
        }

        Ok(fields)
    }
}

/// Review create payload. `rating` stays a raw JSON value until
/// [`parse_rating`] has vetted it.
#[derive(Debug, Default, Deserialize)]
pub struct ReviewCreate {
    pub comment: Option<String>,
    pub rating: Option<serde_json::Value>,
}

/// Review edit payload; both fields optional, at least one required.
#[derive(Debug, Default, Deserialize)]
pub struct ReviewUpdate {
    pub comment: Option<String>,
    pub rating: Option<serde_json::Value>,
}

/// Parse and bound-check a review rating.
///
/// Accepts a JSON integer or a decimal string; anything else is rejected
/// before the range check so "abc" and 7.5 both read as "not a number".
pub fn parse_rating(value: &serde_json::Value) -> Result<i32, AppError> {
    let parsed = match value {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };

    let rating = parsed.ok_or_else(|| {
        AppError::bad_request("INVALID_RATING", "Rating must be a valid number")
    })?;

    if !(1..=10).contains(&rating) {
        return Err(AppError::bad_request(
            "RATING_OUT_OF_RANGE",
            "Rating must be between 1 and 10",
        ));
    }

    Ok(rating as i32)
}

// ---------------------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub username: String,
    pub comment: String,
    pub rating: i32,
}

impl From<&Review> for ReviewResponse {
    fn from(review: &Review) -> Self {
        Self {
            id: review.id.to_hex(),
            user_id: review.user_id.to_hex(),
            username: review.username.clone(),
            comment: review.comment.clone(),
            rating: review.rating,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GameResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub platforms: Vec<String>,
    pub release_year: i32,
    pub developer: String,
    pub publisher: String,
    pub esrb: String,
    pub genres: Vec<String>,
    pub modes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub developer_hq: Option<GeoPoint>,
    pub awards: Vec<Document>,
    pub reviews: Vec<ReviewResponse>,
}

impl From<Game> for GameResponse {
    fn from(game: Game) -> Self {
        Self {
            id: game.id.map(|id| id.to_hex()).unwrap_or_default(),
            title: game.title,
            platforms: game.platforms,
            release_year: game.release_year,
            developer: game.developer,
            publisher: game.publisher,
            esrb: game.esrb,
            genres: game.genres,
            modes: game.modes,
            rating: game.rating,
            developer_hq: game.developer_hq,
            awards: game.awards,
            reviews: game.reviews.iter().map(ReviewResponse::from).collect(),
        }
    }
}
