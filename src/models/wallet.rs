use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wallet {
    pub user_id: String,
    pub balance: i64,
    pub total_earnings: i64,
    pub total_withdrawals: i64,
    pub pending_withdrawals: i64,
    pub freeze_amount: i64,
    pub updated_at: i64,
}

impl Wallet {
    /// Funds the owner can actually spend or withdraw right now.
    pub fn available_balance(&self) -> i64 {
        self.balance - self.freeze_amount - self.pending_withdrawals
    }

    /// Zeroed wallet for users with no ledger activity yet.
    pub fn empty(user_id: &str, now: i64) -> Self {
        Self {
            user_id: user_id.to_string(),
            balance: 0,
            total_earnings: 0,
            total_withdrawals: 0,
            pending_withdrawals: 0,
            freeze_amount: 0,
            updated_at: now,
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, AsRefStr, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WithdrawalStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WithdrawalAction {
    Approve,
    Reject,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawalRequest {
    pub id: String,
    pub user_id: String,
    /// The pending WITHDRAWAL ledger row opened when the request was made.
    pub transaction_id: String,
    pub amount: i64,
    pub status: WithdrawalStatus,
    pub admin_notes: Option<String>,
    pub created_at: i64,
    pub processed_at: Option<i64>,
}
