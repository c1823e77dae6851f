//! Development-only endpoints, mounted under /dev. Every handler refuses to
//! run outside dev mode so the routes are inert in production builds.

use axum::{Router, extract::State, routing::post};
use serde::{Deserialize, Serialize};

use crate::db::AppState;
use crate::error::{AppError, Result};
use crate::extractors::Json;
use crate::finance::settlement;

#[derive(Debug, Deserialize)]
pub struct DevCompletePayment {
    pub transaction_id: String,
}

#[derive(Debug, Serialize)]
pub struct DevPaymentCompleted {
    pub transaction_id: String,
    pub amount: i64,
    pub designer_share: i64,
    pub platform_fee: i64,
}

/// Settle a pending gateway payment without the external round-trip,
/// exactly as a successful verify would.
pub async fn complete_payment(
    State(state): State<AppState>,
    Json(input): Json<DevCompletePayment>,
) -> Result<Json<DevPaymentCompleted>> {
    if !state.dev_mode {
        return Err(AppError::NotFound("Not found".into()));
    }

    let mut conn = state.db.get()?;
    let reference = format!("DEV-REF-{}", input.transaction_id);
    let completed = settlement::complete_purchase(&mut conn, &input.transaction_id, Some(&reference))?;

    tracing::info!(
        "DEV: completed payment for transaction {}",
        completed.transaction.id
    );

    Ok(Json(DevPaymentCompleted {
        transaction_id: completed.transaction.id,
        amount: completed.transaction.amount,
        designer_share: completed.designer_share,
        platform_fee: completed.platform_fee,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/payments/complete", post(complete_payment))
}
