use axum::extract::State;
use serde::Deserialize;

use crate::db::AppState;
use crate::error::Result;
use crate::extractors::{Json, Path};
use crate::finance::settlement;
use crate::models::Transaction;

#[derive(Debug, Deserialize)]
pub struct TransactionPath {
    pub id: String,
}

/// Refund a completed purchase. The original row flips to `refunded` and a
/// compensating REFUND transaction is returned; refunding twice fails.
pub async fn refund_transaction(
    State(state): State<AppState>,
    Path(path): Path<TransactionPath>,
) -> Result<Json<Transaction>> {
    let mut conn = state.db.get()?;
    let refund = settlement::refund_purchase(&mut conn, &path.id)?;
    Ok(Json(refund))
}
