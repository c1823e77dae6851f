mod from_row;
pub mod queries;

use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;

use crate::finance::PricingEngine;
use crate::payments::ZarinpalClient;

pub type DbPool = r2d2::Pool<SqliteConnectionManager>;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub pricing: PricingEngine,
    pub gateway: ZarinpalClient,
    pub base_url: String,
    pub success_page_url: String,
    pub payment_link_ttl_secs: i64,
    pub dev_mode: bool,
}

/// Open (or create) the database and run schema setup.
pub fn init_pool(path: &str) -> anyhow::Result<DbPool> {
    let manager = SqliteConnectionManager::file(path).with_init(|conn| {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )
    });
    let pool = r2d2::Pool::builder().build(manager)?;
    init_schema(&*pool.get()?)?;
    Ok(pool)
}

pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA)
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    email TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    role TEXT NOT NULL DEFAULT 'user',
    user_type TEXT NOT NULL DEFAULT 'regular',
    api_key_hash TEXT NOT NULL UNIQUE,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS exams (
    id TEXT PRIMARY KEY,
    designer_id TEXT NOT NULL REFERENCES users(id),
    title TEXT NOT NULL,
    question_count INTEGER NOT NULL,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS flashcards (
    id TEXT PRIMARY KEY,
    designer_id TEXT NOT NULL REFERENCES users(id),
    title TEXT NOT NULL,
    price INTEGER,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS transactions (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES users(id),
    tx_type TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'pending',
    amount INTEGER NOT NULL,
    reference_id TEXT,
    exam_id TEXT,
    designer_id TEXT,
    related_transaction_id TEXT,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_transactions_user
    ON transactions(user_id, tx_type, status);
CREATE INDEX IF NOT EXISTS idx_transactions_reference
    ON transactions(reference_id);

CREATE TABLE IF NOT EXISTS payment_sessions (
    transaction_id TEXT PRIMARY KEY REFERENCES transactions(id),
    authority TEXT NOT NULL UNIQUE,
    url TEXT NOT NULL,
    return_url TEXT,
    expires_at INTEGER NOT NULL,
    created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS exam_access (
    user_id TEXT NOT NULL,
    exam_id TEXT NOT NULL,
    transaction_id TEXT NOT NULL,
    granted_at INTEGER NOT NULL,
    PRIMARY KEY (user_id, exam_id)
);

CREATE TABLE IF NOT EXISTS wallets (
    user_id TEXT PRIMARY KEY,
    balance INTEGER NOT NULL DEFAULT 0,
    total_earnings INTEGER NOT NULL DEFAULT 0,
    total_withdrawals INTEGER NOT NULL DEFAULT 0,
    pending_withdrawals INTEGER NOT NULL DEFAULT 0,
    freeze_amount INTEGER NOT NULL DEFAULT 0,
    updated_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS withdrawal_requests (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    transaction_id TEXT NOT NULL,
    amount INTEGER NOT NULL,
    status TEXT NOT NULL DEFAULT 'pending',
    admin_notes TEXT,
    created_at INTEGER NOT NULL,
    processed_at INTEGER
);

CREATE INDEX IF NOT EXISTS idx_withdrawal_requests_status
    ON withdrawal_requests(status, created_at);

CREATE TABLE IF NOT EXISTS finance_settings (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    designer_share_percent INTEGER NOT NULL,
    platform_fee_percent INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

INSERT OR IGNORE INTO finance_settings
    (id, designer_share_percent, platform_fee_percent, updated_at)
    VALUES (1, 70, 30, 0);

CREATE TABLE IF NOT EXISTS exam_revenue_settings (
    exam_id TEXT PRIMARY KEY,
    designer_share_percent INTEGER NOT NULL,
    platform_fee_percent INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);
";
