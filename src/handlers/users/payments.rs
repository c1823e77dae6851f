use axum::extract::{Extension, State};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{AppState, queries};
use crate::error::{AppError, Result};
use crate::extractors::Json;
use crate::finance::settlement;
use crate::middleware::AuthedUser;
use crate::models::{CreateTransaction, TransactionStatus, TransactionType};
use crate::payments::{PaymentLink, PaymentMethod};

const MIN_QUESTION_COUNT: u32 = 10;
const MAX_QUESTION_COUNT: u32 = 50;

#[derive(Debug, Deserialize)]
pub struct CreatePaymentRequest {
    pub exam_id: String,
    pub payment_method: PaymentMethod,
    /// Where to send the buyer after the gateway callback. Ignored for
    /// wallet payments.
    #[serde(default)]
    pub return_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreatePaymentResponse {
    pub transaction_id: String,
    pub status: TransactionStatus,
    pub amount: i64,
    /// Present for gateway payments only.
    pub payment_url: Option<String>,
    pub expires_at: Option<i64>,
}

pub async fn create_payment(
    State(state): State<AppState>,
    Extension(AuthedUser(user)): Extension<AuthedUser>,
    Json(input): Json<CreatePaymentRequest>,
) -> Result<Json<CreatePaymentResponse>> {
    let mut conn = state.db.get()?;

    let exam = queries::get_exam_by_id(&conn, &input.exam_id)?
        .ok_or_else(|| AppError::NotFound("Exam not found".into()))?;

    if exam.designer_id == user.id {
        return Err(AppError::BadRequest(
            "Designers cannot purchase their own exam".into(),
        ));
    }
    if queries::has_exam_access(&conn, &user.id, &exam.id)? {
        return Err(AppError::BadRequest("Exam already purchased".into()));
    }
    if !(MIN_QUESTION_COUNT..=MAX_QUESTION_COUNT).contains(&exam.question_count) {
        return Err(AppError::BadRequest(
            "Exam question count is outside the sellable range".into(),
        ));
    }

    let is_first_purchase = queries::count_completed_purchases(&conn, &user.id)? == 0;
    let pricing = state
        .pricing
        .exam_price(exam.question_count, user.user_type, is_first_purchase, 0)?;
    let amount = pricing.final_price;

    let tx = queries::create_transaction(
        &conn,
        &CreateTransaction {
            user_id: user.id.clone(),
            tx_type: TransactionType::Purchase,
            amount,
            reference_id: None,
            exam_id: Some(exam.id.clone()),
            designer_id: Some(exam.designer_id.clone()),
            related_transaction_id: None,
        },
        TransactionStatus::Pending,
    )?;

    match input.payment_method {
        PaymentMethod::Wallet => {
            let completed = settlement::complete_wallet_purchase(&mut conn, &tx.id)?;
            Ok(Json(CreatePaymentResponse {
                transaction_id: completed.transaction.id,
                status: TransactionStatus::Completed,
                amount,
                payment_url: None,
                expires_at: None,
            }))
        }
        PaymentMethod::Gateway => {
            let callback_url = format!("{}/payments/callback", state.base_url);
            let link = if state.dev_mode {
                // No external round-trip in dev; /dev/payments/complete
                // settles the transaction instead.
                let authority = format!("DEV-{}", Uuid::new_v4());
                PaymentLink {
                    url: format!("{}/dev/pay/{}", state.base_url, authority),
                    authority,
                }
            } else {
                state
                    .gateway
                    .request_payment(
                        amount,
                        &format!("Exam purchase: {}", exam.title),
                        &callback_url,
                    )
                    .await?
            };

            let expires_at = Utc::now().timestamp() + state.payment_link_ttl_secs;
            let session = queries::create_payment_session(
                &conn,
                &tx.id,
                &link.authority,
                &link.url,
                input.return_url.as_deref(),
                expires_at,
            )?;

            tracing::info!(
                "Payment created: transaction={}, amount={}, authority={}",
                tx.id,
                amount,
                session.authority,
            );

            Ok(Json(CreatePaymentResponse {
                transaction_id: tx.id,
                status: TransactionStatus::Pending,
                amount,
                payment_url: Some(session.url),
                expires_at: Some(session.expires_at),
            }))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct VerifyPaymentRequest {
    pub transaction_id: String,
    /// The gateway authority handed out at create-payment time.
    pub payment_reference: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyPaymentResponse {
    pub transaction_id: String,
    pub exam_id: String,
    pub amount: i64,
    pub ref_id: String,
}

pub async fn verify_payment(
    State(state): State<AppState>,
    Extension(AuthedUser(user)): Extension<AuthedUser>,
    Json(input): Json<VerifyPaymentRequest>,
) -> Result<Json<VerifyPaymentResponse>> {
    let mut conn = state.db.get()?;

    let tx = queries::get_transaction_by_id(&conn, &input.transaction_id)?
        .filter(|tx| tx.user_id == user.id)
        .ok_or_else(|| AppError::NotFound("Transaction not found".into()))?;

    let session = queries::get_payment_session(&conn, &tx.id)?
        .ok_or_else(|| AppError::BadRequest("Transaction has no payment link".into()))?;

    if session.authority != input.payment_reference {
        return Err(AppError::BadRequest("Payment reference mismatch".into()));
    }
    if tx.status != TransactionStatus::Pending {
        return Err(AppError::BadRequest(
            "Transaction has already been processed".into(),
        ));
    }
    if Utc::now().timestamp() > session.expires_at {
        settlement::fail_purchase(&conn, &tx.id)?;
        return Err(AppError::BadRequest("Payment link has expired".into()));
    }

    let verified = match state
        .gateway
        .verify_payment(tx.amount, &session.authority)
        .await
    {
        Ok(v) => v,
        Err(AppError::BadRequest(msg)) => {
            // The gateway says this payment never settled: terminal.
            settlement::fail_purchase(&conn, &tx.id)?;
            return Err(AppError::BadRequest(msg));
        }
        Err(e) => return Err(e),
    };

    if verified.already_verified {
        tracing::warn!(
            "Gateway reports authority for transaction {} was verified before",
            tx.id
        );
    }

    let completed = settlement::complete_purchase(&mut conn, &tx.id, Some(&verified.ref_id))?;

    Ok(Json(VerifyPaymentResponse {
        transaction_id: completed.transaction.id,
        exam_id: completed
            .transaction
            .exam_id
            .unwrap_or_default(),
        amount: completed.transaction.amount,
        ref_id: verified.ref_id,
    }))
}
