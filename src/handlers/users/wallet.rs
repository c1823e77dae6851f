use axum::extract::{Extension, State};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::db::{AppState, queries};
use crate::error::{AppError, Result};
use crate::extractors::{Json, Query};
use crate::finance::settlement;
use crate::middleware::AuthedUser;
use crate::models::{Transaction, Wallet, WithdrawalRequest};

#[derive(Debug, Serialize)]
pub struct WalletSummary {
    pub balance: i64,
    pub total_earnings: i64,
    pub total_withdrawals: i64,
    pub pending_withdrawals: i64,
    pub freeze_amount: i64,
    pub available_balance: i64,
}

impl From<Wallet> for WalletSummary {
    fn from(wallet: Wallet) -> Self {
        Self {
            available_balance: wallet.available_balance(),
            balance: wallet.balance,
            total_earnings: wallet.total_earnings,
            total_withdrawals: wallet.total_withdrawals,
            pending_withdrawals: wallet.pending_withdrawals,
            freeze_amount: wallet.freeze_amount,
        }
    }
}

pub async fn get_wallet(
    State(state): State<AppState>,
    Extension(AuthedUser(user)): Extension<AuthedUser>,
) -> Result<Json<WalletSummary>> {
    let conn = state.db.get()?;
    let wallet = queries::get_wallet(&conn, &user.id)?
        .unwrap_or_else(|| Wallet::empty(&user.id, Utc::now().timestamp()));
    Ok(Json(wallet.into()))
}

fn default_limit() -> i64 {
    50
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

#[derive(Debug, Serialize)]
pub struct TransactionList {
    pub items: Vec<Transaction>,
    pub total: i64,
}

pub async fn list_transactions(
    State(state): State<AppState>,
    Extension(AuthedUser(user)): Extension<AuthedUser>,
    Query(query): Query<ListQuery>,
) -> Result<Json<TransactionList>> {
    let conn = state.db.get()?;
    let (items, total) = queries::list_transactions_for_user(
        &conn,
        &user.id,
        query.limit.clamp(1, 200),
        query.offset.max(0),
    )?;
    Ok(Json(TransactionList { items, total }))
}

#[derive(Debug, Deserialize)]
pub struct WithdrawalRequestBody {
    pub amount: i64,
}

pub async fn request_withdrawal(
    State(state): State<AppState>,
    Extension(AuthedUser(user)): Extension<AuthedUser>,
    Json(input): Json<WithdrawalRequestBody>,
) -> Result<Json<WithdrawalRequest>> {
    if input.amount <= 0 {
        return Err(AppError::BadRequest(
            "Withdrawal amount must be positive".into(),
        ));
    }

    let mut conn = state.db.get()?;
    let request = settlement::request_withdrawal(&mut conn, &user.id, input.amount)?;
    Ok(Json(request))
}
