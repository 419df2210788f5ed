#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use dailish_server::{database::ServerDatabase, router, AppState};
use serde_json::Value;
use tower::ServiceExt;

pub async fn setup_test_db() -> ServerDatabase {
    let db = ServerDatabase::new("sqlite::memory:")
        .await
        .expect("open in-memory database");
    db.run_migrations().await.expect("run migrations");
    db
}

pub async fn setup_test_app() -> Router {
    router(AppState::new(setup_test_db().await))
}

/// Sends one request through the router and returns the status and the
/// body parsed as JSON (`Value::Null` for an empty body).
pub async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            request = request.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(request.body(body).expect("valid request"))
        .await
        .expect("router is infallible");

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, json)
}
