//! Review subdocument manager: CRUD over the `reviews` array embedded in a
//! game document.
//!
//! Mutations are authorized by ownership-or-admin. The authorization is not
//! a separate pre-check: the owner id is part of the atomic update's match
//! condition, so the single round-trip decides. A zero-match outcome is
//! then classified with one diagnostic read purely to pick the right error.

use mongodb::bson::{oid::ObjectId, Document};
use tracing::{debug, info, warn};

use crate::error::AppError;
use crate::extractors::current_user::CurrentUser;
use crate::models::{parse_rating, Review, ReviewCreate, ReviewResponse, ReviewUpdate};
use crate::services::catalog::parse_game_id;
use crate::storage::Storage;
use crate::utils::pagination::PageWindow;

fn game_not_found() -> AppError {
    AppError::not_found("GAME_NOT_FOUND", "Invalid Game ID")
}

fn review_not_found() -> AppError {
    AppError::not_found("REVIEW_NOT_FOUND", "Invalid Review ID")
}

fn not_owner() -> AppError {
    AppError::forbidden("NOT_REVIEW_OWNER", "You can only modify your own reviews")
}

fn parse_review_id(id: &str) -> Result<ObjectId, AppError> {
    ObjectId::parse_str(id)
        .map_err(|_| AppError::bad_request("INVALID_REVIEW_ID_FORMAT", "Invalid Review ID format"))
}

/// Owner constraint for the update filter: admins bypass it.
fn owner_filter(caller: &CurrentUser) -> Option<ObjectId> {
    (!caller.admin).then_some(caller.user_id)
}

/// List a game's reviews. An existing game with zero reviews is its own
/// 404 ("No reviews found"), distinct from an absent game; the page window
/// slices the sequence in memory after retrieval.
pub async fn list(
    store: &dyn Storage,
    game_id: &str,
    window: PageWindow,
) -> Result<Vec<ReviewResponse>, AppError> {
    let game_id = parse_game_id(game_id)?;

    let reviews = store
        .find_reviews(game_id)
        .await?
        .ok_or_else(game_not_found)?;

    if reviews.is_empty() {
        return Err(AppError::not_found("NO_REVIEWS", "No reviews found"));
    }

    let start = (window.offset() as usize).min(reviews.len());
    let end = start.saturating_add(window.size() as usize).min(reviews.len());
    Ok(reviews[start..end].iter().map(ReviewResponse::from).collect())
}

/// Fetch one review by id: a linear scan of the parent's sequence.
pub async fn get(
    store: &dyn Storage,
    game_id: &str,
    review_id: &str,
) -> Result<ReviewResponse, AppError> {
    let game_id = parse_game_id(game_id)?;
    let review_id = parse_review_id(review_id)?;

    let reviews = store
        .find_reviews(game_id)
        .await?
        .ok_or_else(game_not_found)?;

    reviews
        .iter()
        .find(|r| r.id == review_id)
        .map(ReviewResponse::from)
        .ok_or_else(review_not_found)
}

/// Append a new review, snapshotting the caller's username as it is now.
pub async fn add(
    store: &dyn Storage,
    game_id: &str,
    caller: &CurrentUser,
    payload: ReviewCreate,
) -> Result<ObjectId, AppError> {
    let game_id = parse_game_id(game_id)?;

    let (comment, rating) = match (payload.comment, payload.rating) {
        (Some(comment), Some(rating)) => (comment, rating),
        _ => {
            return Err(AppError::bad_request(
                "MISSING_FIELDS",
                "Missing required fields",
            ))
        }
    };
    let rating = parse_rating(&rating)?;

    let review = Review {
        id: ObjectId::new(),
        user_id: caller.user_id,
        username: caller.username.clone(),
        comment,
        rating,
    };

    let outcome = store.push_review(game_id, &review).await?;
    if outcome.matched != 1 {
        return Err(game_not_found());
    }

    info!(game_id = %game_id, review_id = %review.id, username = %caller.username, "added review");
    Ok(review.id)
}

/// Edit a review in place. Only `comment` and `rating` are recognized.
pub async fn edit(
    store: &dyn Storage,
    game_id: &str,
    review_id: &str,
    caller: &CurrentUser,
    payload: ReviewUpdate,
) -> Result<(), AppError> {
    let game_id = parse_game_id(game_id)?;
    let review_id = parse_review_id(review_id)?;

    let mut fields = Document::new();
    if let Some(comment) = payload.comment {
        fields.insert("comment", comment);
    }
    if let Some(rating) = payload.rating {
        fields.insert("rating", parse_rating(&rating)?);
    }
    if fields.is_empty() {
        return Err(AppError::bad_request(
            "NO_VALID_FIELDS",
            "No valid fields provided",
        ));
    }

    let outcome = store
        .update_review(game_id, review_id, owner_filter(caller), fields)
        .await?;

    if outcome.matched == 0 {
        return Err(classify_zero_match(store, game_id, review_id).await);
    }
    if outcome.modified != 1 {
        warn!(game_id = %game_id, review_id = %review_id, "review update matched but modified nothing");
        return Err(AppError::internal("Review update failed"));
    }

    debug!(game_id = %game_id, review_id = %review_id, "edited review");
    Ok(())
}

/// Remove a review. Exactly one element must come out of the sequence; a
/// matched-but-unmodified outcome means the existence the filter observed
/// no longer holds and is surfaced as a server error.
pub async fn delete(
    store: &dyn Storage,
    game_id: &str,
    review_id: &str,
    caller: &CurrentUser,
) -> Result<(), AppError> {
    let game_id = parse_game_id(game_id)?;
    let review_id = parse_review_id(review_id)?;

    let outcome = store
        .pull_review(game_id, review_id, owner_filter(caller))
        .await?;

    if outcome.matched == 0 {
        return Err(classify_zero_match(store, game_id, review_id).await);
    }
    if outcome.modified != 1 {
        warn!(game_id = %game_id, review_id = %review_id, "review pull matched but removed nothing");
        return Err(AppError::internal("Review deletion failed"));
    }

    info!(game_id = %game_id, review_id = %review_id, "deleted review");
    Ok(())
}

/// The mutation's filter said no. Read once to decide which "no" it was:
/// absent game, absent review, or somebody else's review.
async fn classify_zero_match(
    store: &dyn Storage,
    game_id: ObjectId,
    review_id: ObjectId,
) -> AppError {
    match store.find_reviews(game_id).await {
        Err(e) => e,
        Ok(None) => game_not_found(),
        Ok(Some(reviews)) => {
            if reviews.iter().any(|r| r.id == review_id) {
                not_owner()
            } else {
                review_not_found()
            }
        }
    }
}
