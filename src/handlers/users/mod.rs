mod catalog;
mod payments;
mod wallet;

pub use catalog::*;
pub use payments::*;
pub use wallet::*;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::db::AppState;
use crate::middleware::user_auth;

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/payments", post(create_payment))
        .route("/payments/verify", post(verify_payment))
        .route("/wallet", get(get_wallet))
        .route("/wallet/transactions", get(list_transactions))
        .route("/wallet/withdrawals", post(request_withdrawal))
        .route("/library", get(list_library))
        .route("/exams", post(create_exam).get(list_my_exams))
        .route("/exams/{id}", get(get_exam).put(update_exam))
        .route("/flashcards", post(create_flashcard))
        .route("/flashcards/{id}", put(update_flashcard))
        .layer(middleware::from_fn_with_state(state, user_auth))
}
