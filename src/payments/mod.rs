mod zarinpal;

pub use zarinpal::*;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Redirect the buyer to the external gateway; settled on verify/callback.
    Gateway,
    /// Debit the buyer's wallet balance; settled in the same request.
    Wallet,
}

/// A gateway payment link handed back to the buyer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentLink {
    pub authority: String,
    pub url: String,
}
