mod common;

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use common::arrival_payload;
use moviesd::{AppState, config::Config, routes, store::MemoryStore};
use serde_json::{Value, json};
use tower::ServiceExt;

fn app() -> Router {
    let config = Config::from_lookup(|key| match key {
        "MOVIES_SEED_PATH" => Some(String::new()),
        _ => None,
    })
    .unwrap();
    let state = AppState::new(Arc::new(config), Arc::new(MemoryStore::new()));
    routes::router(Arc::new(state))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, json)
}

#[tokio::test]
async fn crud_roundtrip_over_http() {
    let app = app();

    let (status, created) = send(&app, "POST", "/movies", Some(arrival_payload())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["rate"], json!(0.0));
    let id = created["id"].as_str().unwrap().to_string();

    let (status, fetched) = send(&app, "GET", &format!("/movies/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);

    let (status, updated) =
        send(&app, "PATCH", &format!("/movies/{id}"), Some(json!({ "rate": 8.5 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["rate"], json!(8.5));
    assert_eq!(updated["title"], created["title"]);

    let (status, deleted) = send(&app, "DELETE", &format!("/movies/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted, updated);

    let (status, body) = send(&app, "GET", &format!("/movies/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Not found" }));
}

#[tokio::test]
async fn list_supports_genre_query() {
    let app = app();
    send(&app, "POST", "/movies", Some(arrival_payload())).await;

    let (status, all) = send(&app, "GET", "/movies", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().unwrap().len(), 1);

    let (_, drama) = send(&app, "GET", "/movies?genre=drama", None).await;
    assert_eq!(drama, all);

    let (status, none) = send(&app, "GET", "/movies?genre=Western", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(none, json!([]));
}

#[tokio::test]
async fn validation_errors_are_422_with_field_list() {
    let app = app();
    let mut payload = arrival_payload();
    payload["year"] = json!(1850);

    let (status, body) = send(&app, "POST", "/movies", Some(payload)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"][0]["field"], "year");
    assert_eq!(body["error"][0]["reason"], "out_of_range");

    let (_, all) = send(&app, "GET", "/movies", None).await;
    assert_eq!(all, json!([]));
}

#[tokio::test]
async fn patch_validates_before_lookup() {
    let app = app();

    let (status, body) =
        send(&app, "PATCH", "/movies/missing", Some(json!({ "genre": ["Horror"] }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"][0]["reason"], "not_in_enum");

    let (status, _) = send(&app, "PATCH", "/movies/missing", Some(json!({}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_routes_are_404() {
    let app = app();
    let (status, body) = send(&app, "GET", "/series", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Not found" }));
}

#[tokio::test]
async fn cors_allows_only_configured_origins() {
    let app = app();

    let request = |origin: &str| {
        Request::builder()
            .uri("/movies")
            .header(header::ORIGIN, origin)
            .body(Body::empty())
            .unwrap()
    };

    let allowed = app.clone().oneshot(request("http://localhost:8080")).await.unwrap();
    assert_eq!(
        allowed.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "http://localhost:8080"
    );

    let denied = app.clone().oneshot(request("http://evil.test")).await.unwrap();
    assert!(denied.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}
