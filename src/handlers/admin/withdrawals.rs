use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::db::{AppState, queries};
use crate::error::Result;
use crate::extractors::{Json, Path, Query};
use crate::finance::settlement;
use crate::models::{WithdrawalAction, WithdrawalRequest, WithdrawalStatus};

fn default_limit() -> i64 {
    50
}

#[derive(Debug, Deserialize)]
pub struct WithdrawalListQuery {
    #[serde(default)]
    pub status: Option<WithdrawalStatus>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

#[derive(Debug, Serialize)]
pub struct WithdrawalRequestList {
    pub items: Vec<WithdrawalRequest>,
    pub total: i64,
}

pub async fn list_withdrawal_requests(
    State(state): State<AppState>,
    Query(query): Query<WithdrawalListQuery>,
) -> Result<Json<WithdrawalRequestList>> {
    let conn = state.db.get()?;
    let (items, total) = queries::list_withdrawal_requests(
        &conn,
        query.status,
        query.limit.clamp(1, 200),
        query.offset.max(0),
    )?;
    Ok(Json(WithdrawalRequestList { items, total }))
}

#[derive(Debug, Deserialize)]
pub struct IdPath {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct ProcessWithdrawalRequestBody {
    pub action: WithdrawalAction,
    #[serde(default)]
    pub admin_notes: Option<String>,
}

pub async fn process_withdrawal_request(
    State(state): State<AppState>,
    Path(path): Path<IdPath>,
    Json(input): Json<ProcessWithdrawalRequestBody>,
) -> Result<Json<WithdrawalRequest>> {
    let mut conn = state.db.get()?;
    let processed = settlement::process_withdrawal(
        &mut conn,
        &path.id,
        input.action,
        input.admin_notes.as_deref(),
    )?;
    Ok(Json(processed))
}
