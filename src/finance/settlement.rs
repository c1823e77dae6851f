//! Wallet and transaction consistency rules.
//!
//! Every multi-step mutation here runs inside a SQLite transaction and
//! claims its state transition with a guarded UPDATE first, so concurrent
//! verify/callback/refund/withdrawal requests cannot double-settle. A
//! returned error before commit rolls the whole step back.

use rusqlite::Connection;

use crate::db::queries;
use crate::error::{AppError, Result};
use crate::finance::revenue;
use crate::models::{
    CreateTransaction, Transaction, TransactionStatus, TransactionType, WithdrawalAction,
    WithdrawalRequest, WithdrawalStatus,
};

#[derive(Debug, Clone)]
pub struct CompletedPurchase {
    pub transaction: Transaction,
    pub designer_share: i64,
    pub platform_fee: i64,
}

/// Settle a verified gateway purchase.
///
/// Precondition: the transaction exists and is a pending PURCHASE. Credits
/// the buyer's exam access, resolves revenue settings (per-exam override
/// over global), appends the paired EARNING row and credits the designer's
/// wallet — atomically. The platform fee stays derived (`amount - share`),
/// it gets no ledger row of its own.
pub fn complete_purchase(
    conn: &mut Connection,
    transaction_id: &str,
    gateway_reference: Option<&str>,
) -> Result<CompletedPurchase> {
    let txn = conn.transaction()?;
    let result = complete_purchase_in_txn(&txn, transaction_id, gateway_reference)?;
    txn.commit()?;

    tracing::info!(
        "Purchase completed: transaction={}, amount={}, designer_share={}, platform_fee={}",
        result.transaction.id,
        result.transaction.amount,
        result.designer_share,
        result.platform_fee,
    );

    Ok(result)
}

fn complete_purchase_in_txn(
    txn: &Connection,
    transaction_id: &str,
    gateway_reference: Option<&str>,
) -> Result<CompletedPurchase> {
    let tx = queries::get_transaction_by_id(txn, transaction_id)?
        .ok_or_else(|| AppError::NotFound("Transaction not found".into()))?;

    if tx.tx_type != TransactionType::Purchase {
        return Err(AppError::BadRequest("Not a purchase transaction".into()));
    }

    // Claim the pending -> completed transition; losing it means another
    // verify/callback already settled this payment.
    if !queries::try_transition_transaction(
        txn,
        &tx.id,
        TransactionStatus::Pending,
        TransactionStatus::Completed,
    )? {
        return Err(AppError::BadRequest(
            "Transaction has already been processed".into(),
        ));
    }

    if let Some(reference) = gateway_reference {
        queries::set_transaction_reference(txn, &tx.id, reference)?;
    }

    let exam_id = tx
        .exam_id
        .as_deref()
        .ok_or_else(|| AppError::Internal("purchase has no exam".into()))?;
    let designer_id = tx
        .designer_id
        .as_deref()
        .ok_or_else(|| AppError::Internal("purchase has no designer".into()))?;

    queries::grant_exam_access(txn, &tx.user_id, exam_id, &tx.id)?;

    let settings = queries::resolve_revenue_settings(txn, Some(exam_id))?;
    let split = revenue::split_amount(tx.amount, &settings);

    queries::create_transaction(
        txn,
        &CreateTransaction {
            user_id: designer_id.to_string(),
            tx_type: TransactionType::Earning,
            amount: split.designer_share,
            reference_id: None,
            exam_id: Some(exam_id.to_string()),
            designer_id: None,
            related_transaction_id: Some(tx.id.clone()),
        },
        TransactionStatus::Completed,
    )?;
    queries::credit_earning(txn, designer_id, split.designer_share)?;

    let transaction = queries::get_transaction_by_id(txn, &tx.id)?
        .ok_or_else(|| AppError::Internal("transaction vanished mid-settlement".into()))?;

    Ok(CompletedPurchase {
        transaction,
        designer_share: split.designer_share,
        platform_fee: split.platform_fee,
    })
}

/// Settle a wallet-method purchase: debit the buyer's available balance,
/// then run the same completion path as a verified gateway payment. An
/// insufficient balance marks the transaction failed and nothing else moves.
pub fn complete_wallet_purchase(
    conn: &mut Connection,
    transaction_id: &str,
) -> Result<CompletedPurchase> {
    let txn = conn.transaction()?;

    let tx = queries::get_transaction_by_id(&txn, transaction_id)?
        .ok_or_else(|| AppError::NotFound("Transaction not found".into()))?;

    if tx.tx_type != TransactionType::Purchase {
        return Err(AppError::BadRequest("Not a purchase transaction".into()));
    }
    if tx.status != TransactionStatus::Pending {
        return Err(AppError::BadRequest(
            "Transaction has already been processed".into(),
        ));
    }

    if !queries::try_debit_available(&txn, &tx.user_id, tx.amount)? {
        drop(txn);
        fail_purchase(conn, transaction_id)?;
        return Err(AppError::BadRequest(
            "Insufficient wallet balance".into(),
        ));
    }

    let result = complete_purchase_in_txn(&txn, transaction_id, None)?;
    txn.commit()?;

    tracing::info!(
        "Wallet purchase completed: transaction={}, amount={}",
        result.transaction.id,
        result.transaction.amount,
    );

    Ok(result)
}

/// Mark a pending purchase failed after gateway rejection or link expiry.
/// No wallet state moves. Returns whether this call did the marking.
pub fn fail_purchase(conn: &Connection, transaction_id: &str) -> Result<bool> {
    queries::try_transition_transaction(
        conn,
        transaction_id,
        TransactionStatus::Pending,
        TransactionStatus::Failed,
    )
}

/// Refund a completed purchase.
///
/// Claims `completed -> refunded` (a second refund loses the claim), claws
/// the earned share back from the designer — refused if their available
/// balance no longer covers it — credits the buyer's wallet with the full
/// amount, revokes exam access and appends the compensating REFUND row.
pub fn refund_purchase(conn: &mut Connection, transaction_id: &str) -> Result<Transaction> {
    let txn = conn.transaction()?;

    let tx = queries::get_transaction_by_id(&txn, transaction_id)?
        .ok_or_else(|| AppError::NotFound("Transaction not found".into()))?;

    if tx.tx_type != TransactionType::Purchase {
        return Err(AppError::BadRequest("Not a purchase transaction".into()));
    }

    if !queries::try_transition_transaction(
        &txn,
        &tx.id,
        TransactionStatus::Completed,
        TransactionStatus::Refunded,
    )? {
        return Err(AppError::BadRequest(
            "Only completed transactions can be refunded".into(),
        ));
    }

    let designer_id = tx
        .designer_id
        .as_deref()
        .ok_or_else(|| AppError::Internal("purchase has no designer".into()))?;

    let earned = queries::get_earning_for_purchase(&txn, &tx.id)?
        .map(|earning| earning.amount)
        .unwrap_or(0);

    if earned > 0 && !queries::try_debit_available(&txn, designer_id, earned)? {
        return Err(AppError::BadRequest(
            "Designer balance does not cover the refund".into(),
        ));
    }

    queries::credit_refund(&txn, &tx.user_id, tx.amount)?;

    if let Some(exam_id) = tx.exam_id.as_deref() {
        queries::revoke_exam_access(&txn, &tx.user_id, exam_id)?;
    }

    let refund = queries::create_transaction(
        &txn,
        &CreateTransaction {
            user_id: tx.user_id.clone(),
            tx_type: TransactionType::Refund,
            amount: tx.amount,
            reference_id: None,
            exam_id: tx.exam_id.clone(),
            designer_id: Some(designer_id.to_string()),
            related_transaction_id: Some(tx.id.clone()),
        },
        TransactionStatus::Completed,
    )?;

    txn.commit()?;

    tracing::info!(
        "Purchase refunded: transaction={}, refund={}, clawed_back={}",
        tx.id,
        refund.id,
        earned,
    );

    Ok(refund)
}

/// Open a withdrawal request, reserving the amount out of available
/// balance and pairing it with a pending WITHDRAWAL ledger row.
pub fn request_withdrawal(
    conn: &mut Connection,
    user_id: &str,
    amount: i64,
) -> Result<WithdrawalRequest> {
    let txn = conn.transaction()?;

    if !queries::try_reserve_withdrawal(&txn, user_id, amount)? {
        return Err(AppError::BadRequest(
            "Insufficient available balance".into(),
        ));
    }

    let wd_tx = queries::create_transaction(
        &txn,
        &CreateTransaction {
            user_id: user_id.to_string(),
            tx_type: TransactionType::Withdrawal,
            amount,
            reference_id: None,
            exam_id: None,
            designer_id: None,
            related_transaction_id: None,
        },
        TransactionStatus::Pending,
    )?;

    let request = queries::create_withdrawal_request(&txn, user_id, &wd_tx.id, amount)?;
    txn.commit()?;

    tracing::info!(
        "Withdrawal requested: request={}, user={}, amount={}",
        request.id,
        user_id,
        amount,
    );

    Ok(request)
}

/// Approve or reject a pending withdrawal request.
///
/// APPROVE moves the amount out of both `balance` and `pending_withdrawals`
/// into `total_withdrawals` in one statement; REJECT only releases the
/// reservation, returning the funds to available balance implicitly.
pub fn process_withdrawal(
    conn: &mut Connection,
    request_id: &str,
    action: WithdrawalAction,
    admin_notes: Option<&str>,
) -> Result<WithdrawalRequest> {
    let txn = conn.transaction()?;

    let request = queries::get_withdrawal_request(&txn, request_id)?
        .ok_or_else(|| AppError::NotFound("Withdrawal request not found".into()))?;

    let to_status = match action {
        WithdrawalAction::Approve => WithdrawalStatus::Approved,
        WithdrawalAction::Reject => WithdrawalStatus::Rejected,
    };

    if !queries::try_process_withdrawal_request(&txn, &request.id, to_status, admin_notes)? {
        return Err(AppError::BadRequest(
            "Withdrawal request has already been processed".into(),
        ));
    }

    match action {
        WithdrawalAction::Approve => {
            // The reservation guarantees coverage; a lost guard here means
            // the ledger is inconsistent, not a user error.
            if !queries::try_apply_withdrawal(&txn, &request.user_id, request.amount)? {
                return Err(AppError::Conflict(
                    "Wallet balance does not cover the withdrawal".into(),
                ));
            }
            queries::try_transition_transaction(
                &txn,
                &request.transaction_id,
                TransactionStatus::Pending,
                TransactionStatus::Completed,
            )?;
        }
        WithdrawalAction::Reject => {
            if !queries::try_release_withdrawal(&txn, &request.user_id, request.amount)? {
                return Err(AppError::Conflict(
                    "Withdrawal reservation is out of sync".into(),
                ));
            }
            queries::try_transition_transaction(
                &txn,
                &request.transaction_id,
                TransactionStatus::Pending,
                TransactionStatus::Failed,
            )?;
        }
    }

    let processed = queries::get_withdrawal_request(&txn, &request.id)?
        .ok_or_else(|| AppError::Internal("withdrawal request vanished mid-processing".into()))?;

    txn.commit()?;

    tracing::info!(
        "Withdrawal {}: request={}, user={}, amount={}",
        processed.status,
        processed.id,
        processed.user_id,
        processed.amount,
    );

    Ok(processed)
}
