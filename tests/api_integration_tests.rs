//! HTTP API tests driving the full router with a mocked provider.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use review_relay::config::{AppConfig, SecurityConfig};
use review_relay::repositories::{ProductReviewRepository, ScheduleRepository};
use review_relay::server::{build_components, router};
use serde_json::json;
use sha2::{Digest, Sha256};
use tower::ServiceExt;

mod test_utils;
use test_utils::{setup_test_db, test_config};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

const API_KEY: &str = "test-api-key";
const API_SALT: &str = "a1b2c3d4";

fn secured_config(base_url: &str) -> AppConfig {
    let salt = hex::decode(API_SALT).unwrap();
    let mut hasher = Sha256::new();
    hasher.update(&salt);
    hasher.update(API_KEY.as_bytes());

    AppConfig {
        security: SecurityConfig {
            api_key_hash: hex::encode(hasher.finalize()),
            api_key_salt: API_SALT.to_string(),
            ..SecurityConfig::default()
        },
        ..test_config(base_url)
    }
}

fn post(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-api-key", API_KEY)
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn root_reports_service_info_without_auth() {
    let mock_server = MockServer::start().await;
    let db = setup_test_db().await;
    let (state, _sweeper) = build_components(Arc::new(secured_config(&mock_server.uri())), db);

    let response = router(state)
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn protected_route_rejects_missing_and_wrong_keys() {
    let mock_server = MockServer::start().await;
    let db = setup_test_db().await;
    let (state, _sweeper) = build_components(Arc::new(secured_config(&mock_server.uri())), db);
    let app = router(state);

    let missing = Request::builder()
        .method("POST")
        .uri("/schedule")
        .header("content-type", "application/json")
        .body(Body::from("{}"))
        .unwrap();
    let response = app.clone().oneshot(missing).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let wrong = Request::builder()
        .method("POST")
        .uri("/schedule")
        .header("content-type", "application/json")
        .header("x-api-key", "not-the-key")
        .body(Body::from("{}"))
        .unwrap();
    let response = app.oneshot(wrong).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn malformed_callback_is_rejected() {
    let mock_server = MockServer::start().await;
    let db = setup_test_db().await;
    let (state, _sweeper) = build_components(Arc::new(secured_config(&mock_server.uri())), db);

    let response = router(state)
        .oneshot(post("/process_job", json!({"job_id": "not-a-number"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn callback_does_not_require_an_api_key() {
    let mock_server = MockServer::start().await;
    let db = setup_test_db().await;

    Mock::given(method("GET"))
        .and(path("/profiles/info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "job_id": 5,
            "url": "https://shop.example.com/p/1",
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/notify"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let (state, _sweeper) = build_components(Arc::new(secured_config(&mock_server.uri())), db);

    let request = Request::builder()
        .method("POST")
        .uri("/process_job")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({"job_id": 5, "crawl_status": "failed"}).to_string(),
        ))
        .unwrap();
    let response = router(state).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn callback_for_completed_job_stages_reviews() {
    let mock_server = MockServer::start().await;
    let db = setup_test_db().await;

    Mock::given(method("GET"))
        .and(path("/profiles/reviews"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "job_id": 42,
            "unique_id": "SKU-1",
            "source_name": "shop",
            "source_url": "https://shop.example.com/p/1",
            "result_count": 2,
            "reviews": [
                {"review_uuid": "u-1", "review_text": "good"},
                {"review_uuid": "u-2", "review_text": "bad"},
            ],
        })))
        .mount(&mock_server)
        .await;

    let (state, _sweeper) =
        build_components(Arc::new(secured_config(&mock_server.uri())), db.clone());

    let response = router(state)
        .oneshot(post(
            "/process_job",
            json!({"job_id": 42, "crawl_status": "complete"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        ProductReviewRepository::new(db).count().await.unwrap(),
        2
    );
}

#[tokio::test]
async fn schedule_creation_registers_with_provider_then_locally() {
    let mock_server = MockServer::start().await;
    let db = setup_test_db().await;

    Mock::given(method("POST"))
        .and(path("/schedules"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 777})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (state, _sweeper) =
        build_components(Arc::new(secured_config(&mock_server.uri())), db.clone());
    let app = router(state);

    let response = app
        .clone()
        .oneshot(post(
            "/schedule",
            json!({"url": "https://shop.example.com/p/1", "frequency": "weekly"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert!(
        ScheduleRepository::new(db)
            .exists_by_url("https://shop.example.com/p/1")
            .await
            .unwrap()
    );

    // Same URL again is rejected before the provider is contacted.
    let response = app
        .oneshot(post(
            "/schedule",
            json!({"url": "https://shop.example.com/p/1", "frequency": "weekly"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn schedule_creation_rejects_invalid_urls() {
    let mock_server = MockServer::start().await;
    let db = setup_test_db().await;
    let (state, _sweeper) = build_components(Arc::new(secured_config(&mock_server.uri())), db);

    let response = router(state)
        .oneshot(post(
            "/schedule",
            json!({"url": "not a url", "frequency": "daily"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn schedule_deletion_removes_provider_and_local_state() {
    let mock_server = MockServer::start().await;
    let db = setup_test_db().await;
    test_utils::insert_schedule(&db, 777, "https://shop.example.com/p/1").await;

    Mock::given(method("DELETE"))
        .and(path("/schedules/777"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (state, _sweeper) =
        build_components(Arc::new(secured_config(&mock_server.uri())), db.clone());
    let app = router(state);

    let request = Request::builder()
        .method("DELETE")
        .uri("/schedule?schedule_id=777")
        .header("x-api-key", API_KEY)
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let request = Request::builder()
        .method("DELETE")
        .uri("/schedule?schedule_id=777")
        .header("x-api-key", API_KEY)
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn product_mapping_batch_reports_existing_ids_without_failing() {
    let mock_server = MockServer::start().await;
    let db = setup_test_db().await;
    test_utils::insert_product_mapping(&db, "SKU-1", "Acme", "500ml").await;
    let (state, _sweeper) =
        build_components(Arc::new(secured_config(&mock_server.uri())), db.clone());
    let app = router(state);

    let response = app
        .clone()
        .oneshot(post(
            "/product_mapping",
            json!([{"product_id": "SKU-2", "brand": "Acme", "format": "1l"}]),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    // Mixed batch: the new id is inserted, the known one is reported back.
    let response = app
        .clone()
        .oneshot(post(
            "/product_mapping",
            json!([
                {"product_id": "SKU-1", "brand": "Acme", "format": "500ml"},
                {"product_id": "SKU-3", "brand": "Acme", "format": "250ml"},
            ]),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::MULTI_STATUS);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(parsed["created"], json!(["SKU-3"]));
    assert_eq!(parsed["already_existing"], json!(["SKU-1"]));

    let response = app
        .oneshot(post(
            "/product_mapping",
            json!([{"product_id": "", "brand": "Acme", "format": "500ml"}]),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
