//! Row-to-model mapping helpers.
//!
//! Each model has a column list constant and a [`FromRow`] impl; queries
//! interpolate the constant so SELECT order and mapping stay in one place.

use std::str::FromStr;

use rusqlite::{Connection, Row, types::Type};

use crate::error::Result;
use crate::models::*;

pub trait FromRow: Sized {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

/// Parse a TEXT column into a string-backed enum, reporting the column
/// index on failure instead of panicking.
fn parse_enum<T: FromStr>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            format!("unrecognized enum value: {}", raw).into(),
        )
    })
}

pub fn query_one<T: FromRow, P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> Result<Option<T>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query_map(params, |row| T::from_row(row))?;
    match rows.next() {
        Some(row) => Ok(Some(row?)),
        None => Ok(None),
    }
}

pub fn query_all<T: FromRow, P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, |row| T::from_row(row))?;
    Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
}

pub const USER_COLS: &str = "id, email, name, role, user_type, api_key_hash, created_at, updated_at";

impl FromRow for User {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(User {
            id: row.get(0)?,
            email: row.get(1)?,
            name: row.get(2)?,
            role: parse_enum(row, 3)?,
            user_type: parse_enum(row, 4)?,
            api_key_hash: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }
}

pub const EXAM_COLS: &str = "id, designer_id, title, question_count, created_at, updated_at";

impl FromRow for Exam {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Exam {
            id: row.get(0)?,
            designer_id: row.get(1)?,
            title: row.get(2)?,
            question_count: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }
}

pub const FLASHCARD_COLS: &str = "id, designer_id, title, price, created_at, updated_at";

impl FromRow for Flashcard {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Flashcard {
            id: row.get(0)?,
            designer_id: row.get(1)?,
            title: row.get(2)?,
            price: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }
}

pub const TRANSACTION_COLS: &str = "id, user_id, tx_type, status, amount, reference_id, exam_id, \
     designer_id, related_transaction_id, created_at, updated_at";

impl FromRow for Transaction {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Transaction {
            id: row.get(0)?,
            user_id: row.get(1)?,
            tx_type: parse_enum(row, 2)?,
            status: parse_enum(row, 3)?,
            amount: row.get(4)?,
            reference_id: row.get(5)?,
            exam_id: row.get(6)?,
            designer_id: row.get(7)?,
            related_transaction_id: row.get(8)?,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
        })
    }
}

pub const PAYMENT_SESSION_COLS: &str = "transaction_id, authority, url, return_url, expires_at, created_at";

impl FromRow for PaymentSession {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(PaymentSession {
            transaction_id: row.get(0)?,
            authority: row.get(1)?,
            url: row.get(2)?,
            return_url: row.get(3)?,
            expires_at: row.get(4)?,
            created_at: row.get(5)?,
        })
    }
}

pub const WALLET_COLS: &str = "user_id, balance, total_earnings, total_withdrawals, \
     pending_withdrawals, freeze_amount, updated_at";

impl FromRow for Wallet {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Wallet {
            user_id: row.get(0)?,
            balance: row.get(1)?,
            total_earnings: row.get(2)?,
            total_withdrawals: row.get(3)?,
            pending_withdrawals: row.get(4)?,
            freeze_amount: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }
}

pub const EXAM_ACCESS_COLS: &str = "user_id, exam_id, transaction_id, granted_at";

impl FromRow for ExamAccess {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(ExamAccess {
            user_id: row.get(0)?,
            exam_id: row.get(1)?,
            transaction_id: row.get(2)?,
            granted_at: row.get(3)?,
        })
    }
}

pub const WITHDRAWAL_REQUEST_COLS: &str = "id, user_id, transaction_id, amount, status, admin_notes, created_at, processed_at";

impl FromRow for WithdrawalRequest {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(WithdrawalRequest {
            id: row.get(0)?,
            user_id: row.get(1)?,
            transaction_id: row.get(2)?,
            amount: row.get(3)?,
            status: parse_enum(row, 4)?,
            admin_notes: row.get(5)?,
            created_at: row.get(6)?,
            processed_at: row.get(7)?,
        })
    }
}

pub const REVENUE_SETTINGS_COLS: &str = "designer_share_percent, platform_fee_percent";

impl FromRow for RevenueSharingSettings {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(RevenueSharingSettings {
            designer_share_percent: row.get(0)?,
            platform_fee_percent: row.get(1)?,
        })
    }
}
