//! Integration tests for the aggregation endpoints: award leaderboard and
//! closest developer HQ.

use actix_web::{test, App};
use backend::routes;
use backend::storage::memory::spherical_distance_meters;
use backend::storage::Storage;
use mongodb::bson::doc;
use serde_json::Value;

mod support;

async fn seed_awarded_game(
    store: &backend::storage::memory::MemoryStorage,
    title: &str,
    awards: usize,
) {
    let mut game = support::sample_game(title);
    game.awards = (0..awards)
        .map(|i| doc! { "name": format!("Award {i}"), "year": 2020 + i as i32 })
        .collect();
    store.insert_game(&game).await.expect("insert game");
}

#[actix_web::test]
async fn test_leaderboard_sorts_by_award_count_desc() {
    let (data, store) = support::test_state();
    let app =
        test::init_service(App::new().app_data(data.clone()).configure(routes::configure)).await;

    seed_awarded_game(&store, "One Award", 1).await;
    seed_awarded_game(&store, "Three Awards", 3).await;
    seed_awarded_game(&store, "No Awards", 0).await;
    seed_awarded_game(&store, "Two Awards", 2).await;

    let req = test::TestRequest::get()
        .uri("/api/v1.0/games/award-leaderboard")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 200);

    let rows: Value = test::read_body_json(resp).await;
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 4);

    let titles: Vec<&str> = rows.iter().map(|r| r["title"].as_str().unwrap()).collect();
    assert_eq!(
        titles,
        ["Three Awards", "Two Awards", "One Award", "No Awards"]
    );
    assert_eq!(rows[0]["award_count"], 3);
    assert_eq!(rows[3]["award_count"], 0);
}

#[actix_web::test]
async fn test_leaderboard_paginates() {
    let (data, store) = support::test_state();
    let app =
        test::init_service(App::new().app_data(data.clone()).configure(routes::configure)).await;

    for i in 0..5 {
        seed_awarded_game(&store, &format!("Game {i}"), i).await;
    }

    let req = test::TestRequest::get()
        .uri("/api/v1.0/games/award-leaderboard?pn=2&ps=2")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 200);

    let rows: Value = test::read_body_json(resp).await;
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["award_count"], 2);
    assert_eq!(rows[1]["award_count"], 1);
}

#[actix_web::test]
async fn test_closest_returns_games_within_radius_sorted() {
    let (data, store) = support::test_state();
    let app =
        test::init_service(App::new().app_data(data.clone()).configure(routes::configure)).await;

    // Roughly 1.1 km and 15.6 km north of the query point, plus one far away.
    support::seed_game_with_hq(&store, "Near", 0.0, 0.01).await;
    support::seed_game_with_hq(&store, "Farther", 0.0, 0.14).await;
    support::seed_game_with_hq(&store, "Remote", 100.0, 45.0).await;
    support::seed_game(&store, "No HQ").await;

    let req = test::TestRequest::get()
        .uri("/api/v1.0/games/closest?lng=0&lat=0&radius=20000&limit=5")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 200);

    let body: Value = test::read_body_json(resp).await;
    assert!(body.get("message").is_none());

    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["title"], "Near");
    assert_eq!(results[1]["title"], "Farther");

    let d0 = results[0]["distance_km"].as_f64().unwrap();
    let d1 = results[1]["distance_km"].as_f64().unwrap();
    assert!(d0 < d1);
    assert!(d0 > 0.0);
}

#[actix_web::test]
async fn test_closest_falls_back_to_global_nearest() {
    let (data, store) = support::test_state();
    let app =
        test::init_service(App::new().app_data(data.clone()).configure(routes::configure)).await;

    support::seed_game_with_hq(&store, "Only Game", 10.0, 10.0).await;

    // Nothing within one meter of the origin.
    let req = test::TestRequest::get()
        .uri("/api/v1.0/games/closest?lng=0&lat=0&radius=1&limit=5")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 200);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body["message"],
        "No games found within radius, returning closest game"
    );

    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["title"], "Only Game");

    // distance_km is the spherical distance rounded to 2 decimals.
    let expected_m = spherical_distance_meters((0.0, 0.0), (10.0, 10.0));
    let expected_km = (expected_m / 1000.0 * 100.0).round() / 100.0;
    assert_eq!(results[0]["distance_km"].as_f64().unwrap(), expected_km);
}

#[actix_web::test]
async fn test_closest_with_no_hq_anywhere_is_not_found() {
    let (data, store) = support::test_state();
    let app =
        test::init_service(App::new().app_data(data.clone()).configure(routes::configure)).await;

    support::seed_game(&store, "No HQ").await;

    let req = test::TestRequest::get()
        .uri("/api/v1.0/games/closest?lng=0&lat=0&radius=1000&limit=5")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 404);
}

#[actix_web::test]
async fn test_closest_validates_query_parameters() {
    let (data, _store) = support::test_state();
    let app =
        test::init_service(App::new().app_data(data.clone()).configure(routes::configure)).await;

    for uri in [
        "/api/v1.0/games/closest?lat=0&radius=1000",       // missing lng
        "/api/v1.0/games/closest?lng=abc&lat=0&radius=1",  // garbage lng
        "/api/v1.0/games/closest?lng=0&lat=95&radius=1",   // lat out of range
        "/api/v1.0/games/closest?lng=0&lat=0&radius=-1",   // bad radius
        "/api/v1.0/games/closest?lng=0&lat=0&radius=1&limit=0", // bad limit
    ] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 400, "uri {uri}");
    }
}

#[actix_web::test]
async fn test_closest_distance_is_zero_at_exact_point() {
    let (data, store) = support::test_state();
    let app =
        test::init_service(App::new().app_data(data.clone()).configure(routes::configure)).await;

    support::seed_game_with_hq(&store, "Here", 12.5, 41.9).await;

    let req = test::TestRequest::get()
        .uri("/api/v1.0/games/closest?lng=12.5&lat=41.9&radius=100&limit=1")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 200);

    let body: Value = test::read_body_json(resp).await;
    let results = body["results"].as_array().unwrap();
    assert_eq!(results[0]["distance_km"].as_f64().unwrap(), 0.0);
}
