use axum::{extract::State, response::Redirect};
use chrono::Utc;
use serde::Deserialize;

use crate::db::{AppState, queries};
use crate::error::{AppError, Result};
use crate::extractors::Query;
use crate::finance::settlement;
use crate::models::TransactionStatus;
use crate::util::append_query_params;

/// Query parameters the gateway appends when redirecting the buyer back.
#[derive(Debug, Deserialize)]
pub struct GatewayCallbackQuery {
    #[serde(rename = "Authority")]
    pub authority: String,
    #[serde(rename = "Status")]
    pub status: String,
}

/// Gateway redirect target after the buyer leaves the payment page.
///
/// Verification happens server-to-server here; the Status query parameter
/// alone never settles anything. The buyer ends up on the session's
/// return_url (or the configured success page) with a status parameter.
pub async fn payment_callback(
    State(state): State<AppState>,
    Query(query): Query<GatewayCallbackQuery>,
) -> Result<Redirect> {
    let session = {
        let conn = state.db.get()?;
        queries::get_payment_session_by_authority(&conn, &query.authority)?
            .ok_or_else(|| AppError::NotFound("Payment session not found".into()))?
    };

    let base_redirect = session
        .return_url
        .clone()
        .unwrap_or_else(|| state.success_page_url.clone());

    let mut conn = state.db.get()?;

    let tx = queries::get_transaction_by_id(&conn, &session.transaction_id)?
        .ok_or_else(|| AppError::Internal("payment session without transaction".into()))?;

    // Replayed callback for a settled payment: send the buyer to success
    // without touching the ledger.
    if tx.status == TransactionStatus::Completed {
        let url = append_query_params(
            &base_redirect,
            &[("transaction_id", tx.id.as_str()), ("status", "success")],
        );
        return Ok(Redirect::temporary(&url));
    }
    if tx.status != TransactionStatus::Pending {
        let url = append_query_params(
            &base_redirect,
            &[("transaction_id", tx.id.as_str()), ("status", "failed")],
        );
        return Ok(Redirect::temporary(&url));
    }

    if Utc::now().timestamp() > session.expires_at {
        settlement::fail_purchase(&conn, &tx.id)?;
        let url = append_query_params(
            &base_redirect,
            &[("transaction_id", tx.id.as_str()), ("status", "expired")],
        );
        return Ok(Redirect::temporary(&url));
    }

    if !query.status.eq_ignore_ascii_case("OK") {
        settlement::fail_purchase(&conn, &tx.id)?;
        let url = append_query_params(
            &base_redirect,
            &[("transaction_id", tx.id.as_str()), ("status", "failed")],
        );
        return Ok(Redirect::temporary(&url));
    }

    let verified = match state
        .gateway
        .verify_payment(tx.amount, &query.authority)
        .await
    {
        Ok(v) => v,
        Err(AppError::BadRequest(msg)) => {
            tracing::warn!("Gateway rejected payment {}: {}", tx.id, msg);
            settlement::fail_purchase(&conn, &tx.id)?;
            let url = append_query_params(
                &base_redirect,
                &[("transaction_id", tx.id.as_str()), ("status", "failed")],
            );
            return Ok(Redirect::temporary(&url));
        }
        // Gateway unreachable is not a verification failure; leave the
        // transaction pending so verify can retry.
        Err(e) => return Err(e),
    };

    let completed = settlement::complete_purchase(&mut conn, &tx.id, Some(&verified.ref_id))?;

    let url = append_query_params(
        &base_redirect,
        &[
            ("transaction_id", completed.transaction.id.as_str()),
            ("ref_id", verified.ref_id.as_str()),
            ("status", "success"),
        ],
    );
    Ok(Redirect::temporary(&url))
}
