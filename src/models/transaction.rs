use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, AsRefStr, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TransactionType {
    /// Buyer pays for an exam.
    Purchase,
    /// Designer's share of a completed purchase.
    Earning,
    /// Funds leaving a wallet via an approved withdrawal request.
    Withdrawal,
    /// Compensating entry for a refunded purchase.
    Refund,
}

/// `pending -> {completed, failed}`, `completed -> refunded`. No transition
/// skips `pending`, and rows are otherwise immutable.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, AsRefStr, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub user_id: String,
    pub tx_type: TransactionType,
    pub status: TransactionStatus,
    /// Integer currency units, always positive; direction comes from tx_type.
    pub amount: i64,
    /// Gateway authority for purchases, gateway ref_id after verification.
    pub reference_id: Option<String>,
    pub exam_id: Option<String>,
    /// Content owner credited by the paired earning (purchases only).
    pub designer_id: Option<String>,
    /// Links earnings and refunds back to the purchase they compensate.
    pub related_transaction_id: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone)]
pub struct CreateTransaction {
    pub user_id: String,
    pub tx_type: TransactionType,
    pub amount: i64,
    pub reference_id: Option<String>,
    pub exam_id: Option<String>,
    pub designer_id: Option<String>,
    pub related_transaction_id: Option<String>,
}

/// Gateway handoff state for a pending purchase: the authority the gateway
/// issued, where to send the buyer, and when the link goes void.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSession {
    pub transaction_id: String,
    pub authority: String,
    pub url: String,
    pub return_url: Option<String>,
    pub expires_at: i64,
    pub created_at: i64,
}

/// Access granted to a buyer when a purchase completes. Also serves as the
/// duplicate-purchase guard.
#[derive(Debug, Clone, Serialize)]
pub struct ExamAccess {
    pub user_id: String,
    pub exam_id: String,
    pub transaction_id: String,
    pub granted_at: i64,
}
