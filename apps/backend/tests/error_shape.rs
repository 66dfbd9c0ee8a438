//! Cross-cutting response shape tests: every error body is
//! `{"error": <message>}`, responses carry the request id header, and the
//! health endpoint answers without storage.

use actix_web::{test, App};
use backend::middleware::request_trace::RequestTrace;
use backend::routes;
use serde_json::{json, Value};

mod support;

#[actix_web::test]
async fn test_error_bodies_share_the_wire_shape() {
    let (data, _store) = support::test_state();
    let app =
        test::init_service(App::new().app_data(data.clone()).configure(routes::configure)).await;

    // (request, expected status)
    let cases = [
        ("/api/v1.0/games?pn=0", 400),
        ("/api/v1.0/games/not-an-id", 404),
        ("/api/v1.0/games/not-an-id/reviews", 400),
    ];

    for (uri, status) in cases {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), status, "uri {uri}");

        let body: Value = test::read_body_json(resp).await;
        let error = body.get("error").expect("error key present");
        assert!(error.is_string(), "error message is a string");
        assert_eq!(body.as_object().unwrap().len(), 1, "error body has one key");
    }
}

#[actix_web::test]
async fn test_unauthorized_mutation_has_error_body() {
    let (data, _store) = support::test_state();
    let app =
        test::init_service(App::new().app_data(data.clone()).configure(routes::configure)).await;

    let req = test::TestRequest::post()
        .uri("/api/v1.0/games")
        .set_json(json!({"title": "X"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 401);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Token missing");
}

#[actix_web::test]
async fn test_malformed_json_body_keeps_error_shape() {
    let (data, store) = support::test_state();
    let app =
        test::init_service(App::new().app_data(data.clone()).configure(routes::configure)).await;

    let admin_id = support::seed_user(&store, "root", "admin-password", true).await;
    let token = support::token_for(admin_id, "root", true);

    let req = test::TestRequest::post()
        .uri("/api/v1.0/games")
        .insert_header(support::bearer(&token))
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 400);

    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].is_string());
}

#[actix_web::test]
async fn test_responses_carry_request_id_header() {
    let (data, _store) = support::test_state();
    let app = test::init_service(
        App::new()
            .wrap(RequestTrace)
            .app_data(data.clone())
            .configure(routes::configure),
    )
    .await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 200);

    let request_id = resp
        .headers()
        .get("x-request-id")
        .expect("x-request-id header")
        .to_str()
        .unwrap();
    assert!(!request_id.is_empty());
}

#[actix_web::test]
async fn test_health_answers_without_storage() {
    let state = backend::state::app_state::AppState::without_store(support::security());
    let app = test::init_service(
        App::new()
            .app_data(actix_web::web::Data::new(state))
            .configure(routes::configure),
    )
    .await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 200);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "ok");
}
