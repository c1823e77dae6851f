mod refunds;
mod settings;
mod withdrawals;

pub use refunds::*;
pub use settings::*;
pub use withdrawals::*;

use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};

use crate::db::AppState;
use crate::middleware::admin_auth;

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/withdrawal-requests", get(list_withdrawal_requests))
        .route("/withdrawal-requests/{id}", put(process_withdrawal_request))
        .route("/finance-settings", get(get_finance_settings))
        .route("/finance-settings", put(update_finance_settings))
        .route("/finance-settings/calculate-sharing", post(calculate_sharing))
        .route("/exams/{exam_id}/revenue-settings", put(put_exam_revenue_settings))
        .route("/exams/{exam_id}/revenue-settings", delete(reset_exam_revenue_settings))
        .route("/transactions/{id}/refund", post(refund_transaction))
        .layer(middleware::from_fn_with_state(state, admin_auth))
}
