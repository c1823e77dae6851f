//! ZarinPal REST client (v4 payment API).
//!
//! The flow is request -> redirect to StartPay -> callback -> verify. Only
//! a successful verify settles the payment; the wallet core never runs on
//! unverified callbacks.

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

use super::PaymentLink;

const GATEWAY_OK: i64 = 100;
const GATEWAY_ALREADY_VERIFIED: i64 = 101;

#[derive(Debug, Serialize)]
struct PaymentRequestBody<'a> {
    merchant_id: &'a str,
    amount: i64,
    callback_url: &'a str,
    description: &'a str,
}

#[derive(Debug, Deserialize)]
struct PaymentRequestResponse {
    data: Option<PaymentRequestData>,
}

#[derive(Debug, Deserialize)]
struct PaymentRequestData {
    code: i64,
    authority: String,
}

#[derive(Debug, Serialize)]
struct VerifyRequestBody<'a> {
    merchant_id: &'a str,
    amount: i64,
    authority: &'a str,
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    data: Option<VerifyData>,
}

#[derive(Debug, Deserialize)]
struct VerifyData {
    code: i64,
    ref_id: Option<i64>,
}

/// Outcome of a successful verification.
#[derive(Debug, Clone)]
pub struct VerifiedPayment {
    /// Gateway settlement reference.
    pub ref_id: String,
    /// True when the gateway reports the authority was verified before
    /// (code 101). The settlement layer's own claim guard decides whether
    /// anything is left to do.
    pub already_verified: bool,
}

#[derive(Debug, Clone)]
pub struct ZarinpalClient {
    client: Client,
    merchant_id: String,
    base_url: String,
}

impl ZarinpalClient {
    pub fn new(merchant_id: &str, base_url: &str) -> Self {
        Self {
            client: Client::new(),
            merchant_id: merchant_id.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn request_payment(
        &self,
        amount: i64,
        description: &str,
        callback_url: &str,
    ) -> Result<PaymentLink> {
        let body = PaymentRequestBody {
            merchant_id: &self.merchant_id,
            amount,
            callback_url,
            description,
        };

        let response = self
            .client
            .post(format!("{}/pg/v4/payment/request.json", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Gateway(format!("payment request failed: {}", e)))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Gateway(format!(
                "payment request rejected: {}",
                error_text
            )));
        }

        let parsed: PaymentRequestResponse = response
            .json()
            .await
            .map_err(|e| AppError::Gateway(format!("invalid payment request response: {}", e)))?;

        let data = parsed
            .data
            .ok_or_else(|| AppError::Gateway("payment request returned no data".into()))?;

        if data.code != GATEWAY_OK {
            return Err(AppError::Gateway(format!(
                "payment request returned code {}",
                data.code
            )));
        }

        Ok(PaymentLink {
            url: format!("{}/pg/StartPay/{}", self.base_url, data.authority),
            authority: data.authority,
        })
    }

    /// Verify a completed gateway payment. Errors here mean the payment is
    /// NOT settled and no wallet mutation may happen.
    pub async fn verify_payment(&self, amount: i64, authority: &str) -> Result<VerifiedPayment> {
        let body = VerifyRequestBody {
            merchant_id: &self.merchant_id,
            amount,
            authority,
        };

        let response = self
            .client
            .post(format!("{}/pg/v4/payment/verify.json", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Gateway(format!("verify request failed: {}", e)))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Gateway(format!(
                "verify request rejected: {}",
                error_text
            )));
        }

        let parsed: VerifyResponse = response
            .json()
            .await
            .map_err(|e| AppError::Gateway(format!("invalid verify response: {}", e)))?;

        let data = parsed
            .data
            .ok_or_else(|| AppError::BadRequest("Payment verification failed".into()))?;

        match data.code {
            GATEWAY_OK | GATEWAY_ALREADY_VERIFIED => Ok(VerifiedPayment {
                ref_id: data
                    .ref_id
                    .map(|r| r.to_string())
                    .unwrap_or_else(|| authority.to_string()),
                already_verified: data.code == GATEWAY_ALREADY_VERIFIED,
            }),
            code => Err(AppError::BadRequest(format!(
                "Payment verification failed (code {})",
                code
            ))),
        }
    }
}
