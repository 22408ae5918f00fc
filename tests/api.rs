// tests/api.rs

mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::util::ServiceExt;

use reconcile_lib::api::{build_router, AppState};
use reconcile_lib::store::MemoryStore;

async fn app() -> Router {
    let store = Arc::new(MemoryStore::new());
    let engine = common::engine(common::fixture_sheets().await, store.clone());
    build_router(AppState::new(Arc::new(engine), common::aggregator(store)))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_empty(uri: &str) -> Request<Body> {
    Request::builder().method("POST").uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_health() {
    let app = app().await;
    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("ok"));
}

#[tokio::test]
async fn test_sync_then_read() {
    let app = app().await;

    let (status, body) = send(&app, post_empty("/sync?dataset=all&language=en")).await;
    assert_eq!(status, StatusCode::OK);
    let outcomes = body.as_array().unwrap();
    assert_eq!(outcomes.len(), 4);
    assert!(outcomes.iter().all(|o| o.get("error").is_none()));

    let (status, body) = send(&app, get("/records?collection=profile&language=en")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 4);

    let (status, body) = send(
        &app,
        post_json(
            "/by-categories",
            json!({"categories": ["LIVE: DOMESTIC IPS"], "filters": {"governanceTypology": ["Central Bank"]}}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalCategories"], json!(1));
    assert_eq!(body["results"][0]["data"][0]["volumes2024"], json!(2500));

    let (status, body) = send(&app, post_json("/value/graph", json!({"systemNames": ["Total"]}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"]["values2024"], json!(42.5));
    assert_eq!(body["data"].as_array().unwrap().len(), 3);

    let (status, body) = send(&app, get("/volume/total")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["systemName"], json!("Total"));

    let (status, body) = send(&app, get("/profiles/by-geographic-reach?geographicReach=Kenya")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["systemName"], json!("PesaLink"));
    assert_eq!(body[0]["inclusivityRanking"], json!("Advanced"));

    let (status, body) = send(&app, get("/categories/summary")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalGroups"], json!(2));
}

#[tokio::test]
async fn test_single_dataset_sync() {
    let app = app().await;
    let (status, body) = send(&app, post_empty("/sync?dataset=volume")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["dataset"], json!("volume"));
    assert_eq!(body[0]["report"]["upserted"], json!(5));
}

#[tokio::test]
async fn test_bad_requests() {
    let app = app().await;

    let (status, body) = send(&app, get("/search?term=a")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["statusCode"], json!(400));
    assert_eq!(body["message"], json!("Search term must be at least 2 characters long."));

    let (status, _) = send(&app, post_json("/volume/graph", json!({"systemNames": []}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, post_json("/by-categories", json!({"categories": []}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], json!("Categories must be a non-empty array."));

    let (status, _) = send(&app, post_empty("/sync?dataset=ledger")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, get("/records?collection=nope")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        post_json("/value/graph", json!({"systemNames": ["GIP"], "startYear": 1, "endYear": 200000})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], json!("startYear and endYear must be between 1900 and 2100."));

    let (status, body) = send(&app, post_json("/by-categories", json!({"categories": ["LIVE: DOMESTIC IPS"], "startYear": 2023}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["statusCode"], json!(400));
}

#[tokio::test]
async fn test_malformed_input_uses_error_envelope() {
    let app = app().await;

    let (status, body) = send(&app, post_json("/volume/graph", json!({"systemNames": "GIP"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["statusCode"], json!(400));
    assert!(body["message"].as_str().unwrap().contains("systemNames"));

    let malformed = Request::builder()
        .method("POST")
        .uri("/by-categories")
        .header("content-type", "application/json")
        .body(Body::from("{\"categories\": ["))
        .unwrap();
    let (status, body) = send(&app, malformed).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["statusCode"], json!(400));

    let (status, body) = send(&app, get("/search?term=gip&language=de")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["statusCode"], json!(400));
}

#[tokio::test]
async fn test_reads_before_any_sync_are_empty() {
    let app = app().await;
    let (status, body) = send(&app, get("/value/all-except-total")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let (status, body) = send(&app, get("/value/total")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::Null);
}
