use chrono::Utc;
use rusqlite::{Connection, params, types::Value};
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;
use crate::util::{generate_api_key, hash_api_key};

use super::from_row::{
    EXAM_ACCESS_COLS, EXAM_COLS, FLASHCARD_COLS, PAYMENT_SESSION_COLS, REVENUE_SETTINGS_COLS,
    TRANSACTION_COLS, USER_COLS, WALLET_COLS, WITHDRAWAL_REQUEST_COLS, query_all, query_one,
};

fn now() -> i64 {
    Utc::now().timestamp()
}

fn gen_id() -> String {
    Uuid::new_v4().to_string()
}

/// Builder for dynamic UPDATE statements with optional fields.
/// Combines multiple field updates into a single query.
struct UpdateBuilder {
    table: &'static str,
    id: String,
    fields: Vec<(&'static str, Value)>,
}

impl UpdateBuilder {
    fn new(table: &'static str, id: &str) -> Self {
        Self {
            table,
            id: id.to_string(),
            fields: Vec::new(),
        }
    }

    fn set(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.fields.push((column, value.into()));
        self
    }

    fn set_opt<V: Into<Value>>(self, column: &'static str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.set(column, v),
            None => self,
        }
    }

    /// Set a column to an explicit value (including NULL).
    /// Use this for Option<T> where Some(v) = set to v, None = set to NULL.
    fn set_nullable<V: Into<Value>>(mut self, column: &'static str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.fields.push((column, v.into())),
            None => self.fields.push((column, Value::Null)),
        }
        self
    }

    fn execute(mut self, conn: &Connection) -> Result<bool> {
        if self.fields.is_empty() {
            return Ok(false);
        }
        self.fields.push(("updated_at", now().into()));
        let sets: Vec<String> = self
            .fields
            .iter()
            .map(|(col, _)| format!("{} = ?", col))
            .collect();
        let mut values: Vec<Value> = self.fields.into_iter().map(|(_, v)| v).collect();
        values.push(self.id.into());
        let sql = format!("UPDATE {} SET {} WHERE id = ?", self.table, sets.join(", "));
        let affected = conn.execute(&sql, rusqlite::params_from_iter(values))?;
        Ok(affected > 0)
    }
}

// ============ Users ============

/// Create a user, returning the plaintext API key alongside.
/// The key is shown once; only its hash is stored.
pub fn create_user(conn: &Connection, input: &CreateUser, role: UserRole) -> Result<(User, String)> {
    let id = gen_id();
    let now = now();
    let api_key = generate_api_key();
    let api_key_hash = hash_api_key(&api_key);

    conn.execute(
        "INSERT INTO users (id, email, name, role, user_type, api_key_hash, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            &id,
            &input.email,
            &input.name,
            role.as_ref(),
            input.user_type.as_ref(),
            &api_key_hash,
            now,
            now
        ],
    )?;

    Ok((
        User {
            id,
            email: input.email.clone(),
            name: input.name.clone(),
            role,
            user_type: input.user_type,
            api_key_hash,
            created_at: now,
            updated_at: now,
        },
        api_key,
    ))
}

pub fn get_user_by_api_key(conn: &Connection, api_key: &str) -> Result<Option<User>> {
    let hash = hash_api_key(api_key);
    query_one(
        conn,
        &format!("SELECT {} FROM users WHERE api_key_hash = ?1", USER_COLS),
        &[&hash],
    )
}

pub fn get_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>> {
    query_one(
        conn,
        &format!("SELECT {} FROM users WHERE email = ?1", USER_COLS),
        &[&email],
    )
}

// ============ Exams ============

pub fn create_exam(conn: &Connection, designer_id: &str, input: &CreateExam) -> Result<Exam> {
    let id = gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO exams (id, designer_id, title, question_count, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![&id, designer_id, &input.title, input.question_count, now, now],
    )?;

    Ok(Exam {
        id,
        designer_id: designer_id.to_string(),
        title: input.title.clone(),
        question_count: input.question_count,
        created_at: now,
        updated_at: now,
    })
}

pub fn get_exam_by_id(conn: &Connection, id: &str) -> Result<Option<Exam>> {
    query_one(
        conn,
        &format!("SELECT {} FROM exams WHERE id = ?1", EXAM_COLS),
        &[&id],
    )
}

pub fn list_exams_by_designer(conn: &Connection, designer_id: &str) -> Result<Vec<Exam>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM exams WHERE designer_id = ?1 ORDER BY created_at DESC",
            EXAM_COLS
        ),
        &[&designer_id],
    )
}

pub fn update_exam(conn: &Connection, id: &str, input: &UpdateExam) -> Result<bool> {
    UpdateBuilder::new("exams", id)
        .set_opt("title", input.title.clone())
        .set_opt("question_count", input.question_count)
        .execute(conn)
}

// ============ Flashcards ============

pub fn create_flashcard(
    conn: &Connection,
    designer_id: &str,
    input: &CreateFlashcard,
) -> Result<Flashcard> {
    let id = gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO flashcards (id, designer_id, title, price, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![&id, designer_id, &input.title, input.price, now, now],
    )?;

    Ok(Flashcard {
        id,
        designer_id: designer_id.to_string(),
        title: input.title.clone(),
        price: input.price,
        created_at: now,
        updated_at: now,
    })
}

pub fn get_flashcard_by_id(conn: &Connection, id: &str) -> Result<Option<Flashcard>> {
    query_one(
        conn,
        &format!("SELECT {} FROM flashcards WHERE id = ?1", FLASHCARD_COLS),
        &[&id],
    )
}

/// Fetch a set of flashcards by id. The result preserves no particular
/// order and silently omits unknown ids; callers that need every id to
/// resolve check for the missing ones themselves.
pub fn get_flashcards_by_ids(conn: &Connection, ids: &[String]) -> Result<Vec<Flashcard>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let placeholders: Vec<String> = (1..=ids.len()).map(|i| format!("?{}", i)).collect();
    let sql = format!(
        "SELECT {} FROM flashcards WHERE id IN ({})",
        FLASHCARD_COLS,
        placeholders.join(", ")
    );
    use super::from_row::FromRow;

    let values: Vec<Value> = ids.iter().map(|id| id.clone().into()).collect();
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(values), |row| {
        Flashcard::from_row(row)
    })?;
    Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
}

pub fn update_flashcard(conn: &Connection, id: &str, input: &UpdateFlashcard) -> Result<bool> {
    let mut builder = UpdateBuilder::new("flashcards", id).set_opt("title", input.title.clone());
    // Outer None leaves the price alone; Some(None) clears it back to the
    // configured default.
    if let Some(price) = input.price {
        builder = builder.set_nullable("price", price);
    }
    builder.execute(conn)
}

// ============ Transactions ============

pub fn create_transaction(
    conn: &Connection,
    input: &CreateTransaction,
    status: TransactionStatus,
) -> Result<Transaction> {
    let id = gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO transactions (id, user_id, tx_type, status, amount, reference_id, exam_id, \
         designer_id, related_transaction_id, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            &id,
            &input.user_id,
            input.tx_type.as_ref(),
            status.as_ref(),
            input.amount,
            &input.reference_id,
            &input.exam_id,
            &input.designer_id,
            &input.related_transaction_id,
            now,
            now
        ],
    )?;

    Ok(Transaction {
        id,
        user_id: input.user_id.clone(),
        tx_type: input.tx_type,
        status,
        amount: input.amount,
        reference_id: input.reference_id.clone(),
        exam_id: input.exam_id.clone(),
        designer_id: input.designer_id.clone(),
        related_transaction_id: input.related_transaction_id.clone(),
        created_at: now,
        updated_at: now,
    })
}

pub fn get_transaction_by_id(conn: &Connection, id: &str) -> Result<Option<Transaction>> {
    query_one(
        conn,
        &format!("SELECT {} FROM transactions WHERE id = ?1", TRANSACTION_COLS),
        &[&id],
    )
}

// ============ Payment Sessions ============

pub fn create_payment_session(
    conn: &Connection,
    transaction_id: &str,
    authority: &str,
    url: &str,
    return_url: Option<&str>,
    expires_at: i64,
) -> Result<PaymentSession> {
    let now = now();

    conn.execute(
        "INSERT INTO payment_sessions (transaction_id, authority, url, return_url, expires_at, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![transaction_id, authority, url, return_url, expires_at, now],
    )?;

    Ok(PaymentSession {
        transaction_id: transaction_id.to_string(),
        authority: authority.to_string(),
        url: url.to_string(),
        return_url: return_url.map(String::from),
        expires_at,
        created_at: now,
    })
}

pub fn get_payment_session(
    conn: &Connection,
    transaction_id: &str,
) -> Result<Option<PaymentSession>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM payment_sessions WHERE transaction_id = ?1",
            PAYMENT_SESSION_COLS
        ),
        &[&transaction_id],
    )
}

pub fn get_payment_session_by_authority(
    conn: &Connection,
    authority: &str,
) -> Result<Option<PaymentSession>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM payment_sessions WHERE authority = ?1",
            PAYMENT_SESSION_COLS
        ),
        &[&authority],
    )
}

/// Atomically move a transaction between statuses, returning whether this
/// call won the transition.
///
/// The guarded UPDATE is what enforces the state machine under concurrent
/// verify/callback/refund requests: only one caller observes `true`.
pub fn try_transition_transaction(
    conn: &Connection,
    id: &str,
    from: TransactionStatus,
    to: TransactionStatus,
) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE transactions SET status = ?1, updated_at = ?2 WHERE id = ?3 AND status = ?4",
        params![to.as_ref(), now(), id, from.as_ref()],
    )?;
    Ok(affected > 0)
}

/// Record the gateway's settlement reference on a verified purchase.
pub fn set_transaction_reference(conn: &Connection, id: &str, reference: &str) -> Result<()> {
    conn.execute(
        "UPDATE transactions SET reference_id = ?1, updated_at = ?2 WHERE id = ?3",
        params![reference, now(), id],
    )?;
    Ok(())
}

/// The EARNING row paired with a completed purchase, if any.
pub fn get_earning_for_purchase(
    conn: &Connection,
    purchase_id: &str,
) -> Result<Option<Transaction>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM transactions \
             WHERE related_transaction_id = ?1 AND tx_type = 'earning'",
            TRANSACTION_COLS
        ),
        &[&purchase_id],
    )
}

/// First-purchase detection: the ledger is the source of truth, not a
/// stored history on the user record.
pub fn count_completed_purchases(conn: &Connection, user_id: &str) -> Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM transactions
         WHERE user_id = ?1 AND tx_type = 'purchase' AND status IN ('completed', 'refunded')",
        params![user_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

pub fn list_transactions_for_user(
    conn: &Connection,
    user_id: &str,
    limit: i64,
    offset: i64,
) -> Result<(Vec<Transaction>, i64)> {
    let total: i64 = conn.query_row(
        "SELECT COUNT(*) FROM transactions WHERE user_id = ?1",
        params![user_id],
        |row| row.get(0),
    )?;
    let items = query_all(
        conn,
        &format!(
            "SELECT {} FROM transactions WHERE user_id = ?1 ORDER BY created_at DESC LIMIT ?2 OFFSET ?3",
            TRANSACTION_COLS
        ),
        params![user_id, limit, offset],
    )?;
    Ok((items, total))
}

// ============ Exam Access ============

pub fn grant_exam_access(
    conn: &Connection,
    user_id: &str,
    exam_id: &str,
    transaction_id: &str,
) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO exam_access (user_id, exam_id, transaction_id, granted_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![user_id, exam_id, transaction_id, now()],
    )?;
    Ok(())
}

pub fn revoke_exam_access(conn: &Connection, user_id: &str, exam_id: &str) -> Result<bool> {
    let deleted = conn.execute(
        "DELETE FROM exam_access WHERE user_id = ?1 AND exam_id = ?2",
        params![user_id, exam_id],
    )?;
    Ok(deleted > 0)
}

/// Everything a buyer currently owns, newest grant first.
pub fn list_exam_access_for_user(conn: &Connection, user_id: &str) -> Result<Vec<ExamAccess>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM exam_access WHERE user_id = ?1 ORDER BY granted_at DESC",
            EXAM_ACCESS_COLS
        ),
        &[&user_id],
    )
}

pub fn has_exam_access(conn: &Connection, user_id: &str, exam_id: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM exam_access WHERE user_id = ?1 AND exam_id = ?2",
        params![user_id, exam_id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

// ============ Wallets ============

pub fn get_wallet(conn: &Connection, user_id: &str) -> Result<Option<Wallet>> {
    query_one(
        conn,
        &format!("SELECT {} FROM wallets WHERE user_id = ?1", WALLET_COLS),
        &[&user_id],
    )
}

fn ensure_wallet(conn: &Connection, user_id: &str) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO wallets (user_id, updated_at) VALUES (?1, ?2)",
        params![user_id, now()],
    )?;
    Ok(())
}

/// Credit a designer's share of a completed purchase.
pub fn credit_earning(conn: &Connection, user_id: &str, amount: i64) -> Result<()> {
    ensure_wallet(conn, user_id)?;
    conn.execute(
        "UPDATE wallets SET balance = balance + ?1, total_earnings = total_earnings + ?1, \
         updated_at = ?2 WHERE user_id = ?3",
        params![amount, now(), user_id],
    )?;
    Ok(())
}

/// Credit a buyer's wallet with a refunded purchase amount.
pub fn credit_refund(conn: &Connection, user_id: &str, amount: i64) -> Result<()> {
    ensure_wallet(conn, user_id)?;
    conn.execute(
        "UPDATE wallets SET balance = balance + ?1, updated_at = ?2 WHERE user_id = ?3",
        params![amount, now(), user_id],
    )?;
    Ok(())
}

/// Debit spendable funds, refusing to drive available balance negative.
/// Returns whether the debit happened.
pub fn try_debit_available(conn: &Connection, user_id: &str, amount: i64) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE wallets SET balance = balance - ?1, updated_at = ?2
         WHERE user_id = ?3 AND balance - freeze_amount - pending_withdrawals >= ?1",
        params![amount, now(), user_id],
    )?;
    Ok(affected > 0)
}

/// Reserve funds for a new withdrawal request. The amount stays in
/// `balance` but is excluded from available balance until processed.
pub fn try_reserve_withdrawal(conn: &Connection, user_id: &str, amount: i64) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE wallets SET pending_withdrawals = pending_withdrawals + ?1, updated_at = ?2
         WHERE user_id = ?3 AND balance - freeze_amount - pending_withdrawals >= ?1",
        params![amount, now(), user_id],
    )?;
    Ok(affected > 0)
}

/// Release reserved funds after a rejected request. Balance is untouched;
/// the amount returns to available implicitly.
pub fn try_release_withdrawal(conn: &Connection, user_id: &str, amount: i64) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE wallets SET pending_withdrawals = pending_withdrawals - ?1, updated_at = ?2
         WHERE user_id = ?3 AND pending_withdrawals >= ?1",
        params![amount, now(), user_id],
    )?;
    Ok(affected > 0)
}

/// Settle an approved withdrawal: funds leave both `balance` and
/// `pending_withdrawals` and land in `total_withdrawals`, in one statement.
pub fn try_apply_withdrawal(conn: &Connection, user_id: &str, amount: i64) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE wallets SET balance = balance - ?1, \
         pending_withdrawals = pending_withdrawals - ?1, \
         total_withdrawals = total_withdrawals + ?1, updated_at = ?2
         WHERE user_id = ?3 AND pending_withdrawals >= ?1 AND balance >= ?1",
        params![amount, now(), user_id],
    )?;
    Ok(affected > 0)
}

// ============ Withdrawal Requests ============

pub fn create_withdrawal_request(
    conn: &Connection,
    user_id: &str,
    transaction_id: &str,
    amount: i64,
) -> Result<WithdrawalRequest> {
    let id = gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO withdrawal_requests (id, user_id, transaction_id, amount, status, created_at)
         VALUES (?1, ?2, ?3, ?4, 'pending', ?5)",
        params![&id, user_id, transaction_id, amount, now],
    )?;

    Ok(WithdrawalRequest {
        id,
        user_id: user_id.to_string(),
        transaction_id: transaction_id.to_string(),
        amount,
        status: WithdrawalStatus::Pending,
        admin_notes: None,
        created_at: now,
        processed_at: None,
    })
}

pub fn get_withdrawal_request(conn: &Connection, id: &str) -> Result<Option<WithdrawalRequest>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM withdrawal_requests WHERE id = ?1",
            WITHDRAWAL_REQUEST_COLS
        ),
        &[&id],
    )
}

/// Claim a pending request for processing. Double-processing loses the
/// compare-and-swap and returns false.
pub fn try_process_withdrawal_request(
    conn: &Connection,
    id: &str,
    to: WithdrawalStatus,
    admin_notes: Option<&str>,
) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE withdrawal_requests SET status = ?1, admin_notes = ?2, processed_at = ?3
         WHERE id = ?4 AND status = 'pending'",
        params![to.as_ref(), admin_notes, now(), id],
    )?;
    Ok(affected > 0)
}

pub fn list_withdrawal_requests(
    conn: &Connection,
    status: Option<WithdrawalStatus>,
    limit: i64,
    offset: i64,
) -> Result<(Vec<WithdrawalRequest>, i64)> {
    match status {
        Some(status) => {
            let total: i64 = conn.query_row(
                "SELECT COUNT(*) FROM withdrawal_requests WHERE status = ?1",
                params![status.as_ref()],
                |row| row.get(0),
            )?;
            let items = query_all(
                conn,
                &format!(
                    "SELECT {} FROM withdrawal_requests WHERE status = ?1 \
                     ORDER BY created_at DESC LIMIT ?2 OFFSET ?3",
                    WITHDRAWAL_REQUEST_COLS
                ),
                params![status.as_ref(), limit, offset],
            )?;
            Ok((items, total))
        }
        None => {
            let total: i64 =
                conn.query_row("SELECT COUNT(*) FROM withdrawal_requests", [], |row| {
                    row.get(0)
                })?;
            let items = query_all(
                conn,
                &format!(
                    "SELECT {} FROM withdrawal_requests ORDER BY created_at DESC LIMIT ?1 OFFSET ?2",
                    WITHDRAWAL_REQUEST_COLS
                ),
                params![limit, offset],
            )?;
            Ok((items, total))
        }
    }
}

// ============ Finance Settings ============

/// Global revenue-sharing defaults. The row is seeded at schema setup, so
/// a missing row is a corrupted database, not a normal state.
pub fn get_finance_settings(conn: &Connection) -> Result<RevenueSharingSettings> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM finance_settings WHERE id = 1",
            REVENUE_SETTINGS_COLS
        ),
        [],
    )?
    .ok_or_else(|| crate::error::AppError::Internal("finance_settings row missing".into()))
}

pub fn update_finance_settings(
    conn: &Connection,
    settings: &RevenueSharingSettings,
) -> Result<()> {
    conn.execute(
        "UPDATE finance_settings SET designer_share_percent = ?1, platform_fee_percent = ?2, \
         updated_at = ?3 WHERE id = 1",
        params![
            settings.designer_share_percent,
            settings.platform_fee_percent,
            now()
        ],
    )?;
    Ok(())
}

pub fn get_exam_revenue_settings(
    conn: &Connection,
    exam_id: &str,
) -> Result<Option<RevenueSharingSettings>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM exam_revenue_settings WHERE exam_id = ?1",
            REVENUE_SETTINGS_COLS
        ),
        &[&exam_id],
    )
}

pub fn upsert_exam_revenue_settings(
    conn: &Connection,
    exam_id: &str,
    settings: &RevenueSharingSettings,
) -> Result<()> {
    conn.execute(
        "INSERT INTO exam_revenue_settings (exam_id, designer_share_percent, platform_fee_percent, updated_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(exam_id) DO UPDATE SET designer_share_percent = ?2, \
         platform_fee_percent = ?3, updated_at = ?4",
        params![
            exam_id,
            settings.designer_share_percent,
            settings.platform_fee_percent,
            now()
        ],
    )?;
    Ok(())
}

/// Remove a per-exam override so the exam follows the global default again,
/// including future changes to it.
pub fn delete_exam_revenue_settings(conn: &Connection, exam_id: &str) -> Result<bool> {
    let deleted = conn.execute(
        "DELETE FROM exam_revenue_settings WHERE exam_id = ?1",
        params![exam_id],
    )?;
    Ok(deleted > 0)
}

/// Resolution order: per-exam override, then global default.
pub fn resolve_revenue_settings(
    conn: &Connection,
    exam_id: Option<&str>,
) -> Result<RevenueSharingSettings> {
    if let Some(exam_id) = exam_id {
        if let Some(settings) = get_exam_revenue_settings(conn, exam_id)? {
            return Ok(settings);
        }
    }
    get_finance_settings(conn)
}
