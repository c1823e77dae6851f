//! Shared helpers for integration tests.

#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use rusqlite::Connection;
use tempfile::TempDir;
use tower::ServiceExt;

use exampay::db::{self, AppState, queries};
use exampay::finance::{PricingConfig, PricingEngine};
use exampay::models::{CreateExam, CreateFlashcard, CreateUser, Exam, Flashcard, User, UserRole, UserType};
use exampay::payments::ZarinpalClient;

/// Build an app state over a fresh temp database. Keep the returned TempDir
/// alive for the duration of the test; dropping it deletes the database.
pub fn create_test_state() -> (AppState, TempDir) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let db_path = dir.path().join("exampay-test.db");
    let pool = db::init_pool(db_path.to_str().expect("utf-8 path")).expect("init pool");

    let state = AppState {
        db: pool,
        pricing: PricingEngine::new(PricingConfig::default()),
        // Points at a closed port; tests never reach the real gateway.
        gateway: ZarinpalClient::new("test-merchant", "http://127.0.0.1:1"),
        base_url: "http://127.0.0.1:3000".to_string(),
        success_page_url: "http://127.0.0.1:3000/payment-result".to_string(),
        payment_link_ttl_secs: 900,
        dev_mode: true,
    };

    (state, dir)
}

pub fn create_test_user(conn: &Connection, name: &str, user_type: UserType) -> (User, String) {
    queries::create_user(
        conn,
        &CreateUser {
            email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
            name: name.to_string(),
            user_type,
        },
        UserRole::User,
    )
    .expect("create user")
}

pub fn create_test_admin(conn: &Connection) -> (User, String) {
    queries::create_user(
        conn,
        &CreateUser {
            email: "admin@example.com".to_string(),
            name: "Admin".to_string(),
            user_type: UserType::Regular,
        },
        UserRole::Admin,
    )
    .expect("create admin")
}

pub fn create_test_exam(conn: &Connection, designer_id: &str, question_count: u32) -> Exam {
    queries::create_exam(
        conn,
        designer_id,
        &CreateExam {
            title: format!("Test Exam ({} questions)", question_count),
            question_count,
        },
    )
    .expect("create exam")
}

pub fn create_test_flashcard(
    conn: &Connection,
    designer_id: &str,
    price: Option<i64>,
) -> Flashcard {
    queries::create_flashcard(
        conn,
        designer_id,
        &CreateFlashcard {
            title: "Test Flashcard".to_string(),
            price,
        },
    )
    .expect("create flashcard")
}

/// Put spendable funds into a wallet without touching earnings totals.
pub fn fund_wallet(conn: &Connection, user_id: &str, amount: i64) {
    queries::credit_refund(conn, user_id, amount).expect("fund wallet");
}

/// Fire a request at the router and decode the JSON response body.
pub async fn request(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }

    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .expect("build request"),
        None => builder.body(Body::empty()).expect("build request"),
    };

    let response = app.clone().oneshot(request).await.expect("send request");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let value = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };

    (status, value)
}

/// Like [`request`] but returns the raw response for header assertions.
pub async fn raw_request(
    app: &Router,
    method: &str,
    uri: &str,
) -> axum::http::Response<Body> {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("build request");
    app.clone().oneshot(req).await.expect("send request")
}
