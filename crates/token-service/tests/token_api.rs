//! HTTP-level tests for the token service router.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use common::jwt::verify_room_token;
use common::secret::SecretString;
use common::types::RoomName;
use http_body_util::BodyExt;
use std::collections::HashMap;
use std::sync::Arc;
use token_service::config::Config;
use token_service::routes::{build_routes, AppState};
use tower::ServiceExt;

const SECRET: &str = "integration-test-secret";

fn app() -> Router {
    let vars = HashMap::from([
        ("ROOM_API_SECRET".to_string(), SECRET.to_string()),
        ("ROOM_TOKEN_TTL_SECONDS".to_string(), "600".to_string()),
    ]);
    let config = Config::from_vars(&vars).unwrap();
    build_routes(Arc::new(AppState { config }))
}

fn token_request(body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/token")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_issue_token_grants_room_join() {
    let response = app()
        .oneshot(token_request(
            r#"{"roomName": "room-42", "participantName": "alice"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let token = body["token"].as_str().expect("token string");

    let claims = verify_room_token(token, "devkey", &SecretString::from(SECRET)).unwrap();
    assert_eq!(claims.sub, "alice");
    assert!(claims.grants_join(&RoomName::new("room-42")));
    assert_eq!(claims.exp - claims.nbf, 600);
}

#[tokio::test]
async fn test_missing_participant_is_bad_request() {
    let response = app()
        .oneshot(token_request(r#"{"roomName": "room-42"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(
        body["errorMessage"],
        "roomName and participantName are required"
    );
}

#[tokio::test]
async fn test_empty_room_is_bad_request() {
    let response = app()
        .oneshot(token_request(
            r#"{"roomName": "", "participantName": "alice"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_non_json_body_is_bad_request() {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/token")
        .body(Body::from("roomName=room-42"))
        .unwrap();

    let response = app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(
        body["errorMessage"],
        "roomName and participantName are required"
    );
}

#[tokio::test]
async fn test_health() {
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let response = app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(bytes.as_ref(), b"OK");
}

#[tokio::test]
async fn test_cors_allows_configured_origin() {
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/token")
        .header(header::ORIGIN, "http://localhost:5080")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();

    let response = app().oneshot(request).await.unwrap();

    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "http://localhost:5080"
    );
}

#[tokio::test]
async fn test_cors_rejects_unknown_origin() {
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/token")
        .header(header::ORIGIN, "http://evil.example.com")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();

    let response = app().oneshot(request).await.unwrap();

    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}
