//! Aggregation queries: award leaderboard and nearest developer HQ.

use serde::Serialize;

use crate::error::AppError;
use crate::models::GameResponse;
use crate::storage::{NearbyGame, Storage};
use crate::utils::pagination::PageWindow;

pub const RADIUS_FALLBACK_MESSAGE: &str =
    "No games found within radius, returning closest game";

#[derive(Debug, Serialize)]
pub struct LeaderboardEntry {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub award_count: i64,
}

#[derive(Debug, Serialize)]
pub struct NearbyGameResponse {
    #[serde(flatten)]
    pub game: GameResponse,
    pub distance_km: f64,
}

#[derive(Debug, Serialize)]
pub struct ClosestResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub results: Vec<NearbyGameResponse>,
}

/// Games ranked by award count, descending, paginated. The tie-break
/// between equal counts is whatever order storage yields.
pub async fn award_leaderboard(
    store: &dyn Storage,
    window: PageWindow,
) -> Result<Vec<LeaderboardEntry>, AppError> {
    let counts = store
        .award_leaderboard(window.offset(), window.size())
        .await?;

    Ok(counts
        .into_iter()
        .map(|c| LeaderboardEntry {
            id: c.id.to_hex(),
            title: c.title,
            award_count: c.award_count,
        })
        .collect())
}

/// Round meters to kilometers with 2 decimal places, the wire precision.
fn distance_km(meters: f64) -> f64 {
    (meters / 1000.0 * 100.0).round() / 100.0
}

fn to_response(nearby: Vec<NearbyGame>) -> Vec<NearbyGameResponse> {
    nearby
        .into_iter()
        .map(|n| NearbyGameResponse {
            game: GameResponse::from(n.game),
            distance_km: distance_km(n.distance_meters),
        })
        .collect()
}

/// Find developer HQs within `radius_meters` of the query point, closest
/// first. When nothing is inside the radius, fall back to the single
/// globally closest HQ with a distinct message; when no game has an HQ at
/// all, 404.
pub async fn closest_hq(
    store: &dyn Storage,
    longitude: f64,
    latitude: f64,
    radius_meters: f64,
    limit: i64,
) -> Result<ClosestResponse, AppError> {
    let within = store
        .games_near(longitude, latitude, Some(radius_meters), limit)
        .await?;

    if !within.is_empty() {
        return Ok(ClosestResponse {
            message: None,
            results: to_response(within),
        });
    }

    let fallback = store.games_near(longitude, latitude, None, 1).await?;
    if fallback.is_empty() {
        return Err(AppError::not_found(
            "NO_DEVELOPER_HQ",
            "No games with a developer HQ found",
        ));
    }

    Ok(ClosestResponse {
        message: Some(RADIUS_FALLBACK_MESSAGE),
        results: to_response(fallback),
    })
}

#[cfg(test)]
mod tests {
    use super::distance_km;

    #[test]
    fn test_distance_rounds_to_two_decimals() {
        assert_eq!(distance_km(1234.0), 1.23);
        assert_eq!(distance_km(1235.0), 1.24);
        assert_eq!(distance_km(0.0), 0.0);
        assert_eq!(distance_km(1_000_000.0), 1000.0);
    }
}
