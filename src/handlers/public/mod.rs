mod callback;
mod pricing;

pub use callback::*;
pub use pricing::*;

use axum::{
    Json, Router,
    routing::{get, post},
};
use serde::Serialize;

use crate::db::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/calculate-price", post(calculate_price))
        .route("/calculate-flashcard-price", post(calculate_flashcard_price))
        .route("/exam-price/{exam_id}", get(exam_price))
        .route("/payments/callback", get(payment_callback))
}
