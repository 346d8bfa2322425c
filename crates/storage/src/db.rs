use chrono::NaiveDate;
use moneta_core::{Account, AccountId, CanonicalTransaction, ImportId, TransactionType};
use rust_decimal::Decimal;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

pub type DbPool = Pool<Sqlite>;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Metadata serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Stored value failed to decode: {0}")]
    Decode(String),
}

/// One import batch as stored. Deleting a batch cascades to its transactions.
#[derive(Debug, Clone)]
pub struct DataImport {
    pub id: ImportId,
    pub account_id: AccountId,
    pub filename: Option<String>,
    pub created_at: String,
}

pub async fn create_db(path: &Path) -> Result<DbPool, DbError> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA synchronous = NORMAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

async fn run_migrations(pool: &DbPool) -> Result<(), DbError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS accounts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            institution TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS data_imports (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            account_id INTEGER NOT NULL,
            filename TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            FOREIGN KEY (account_id) REFERENCES accounts(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS transactions (
            checksum TEXT PRIMARY KEY,
            account_id INTEGER NOT NULL,
            data_import_id INTEGER NOT NULL,
            transaction_date TEXT NOT NULL,
            post_date TEXT,
            description TEXT NOT NULL,
            bank_category TEXT,
            amount TEXT NOT NULL,
            transaction_type TEXT NOT NULL,
            metadata TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            FOREIGN KEY (account_id) REFERENCES accounts(id),
            FOREIGN KEY (data_import_id) REFERENCES data_imports(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_transactions_account_date
         ON transactions(account_id, transaction_date)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn create_account(
    pool: &DbPool,
    name: &str,
    institution: &str,
    description: &str,
) -> Result<Account, DbError> {
    let result = sqlx::query("INSERT INTO accounts (name, institution, description) VALUES (?, ?, ?)")
        .bind(name)
        .bind(institution)
        .bind(description)
        .execute(pool)
        .await?;

    Ok(Account::new(
        AccountId(result.last_insert_rowid()),
        name,
        institution,
        description,
    ))
}

/// Account directory lookup: name → account (with its institution key).
pub async fn get_account_by_name(pool: &DbPool, name: &str) -> Result<Option<Account>, DbError> {
    let row = sqlx::query_as::<_, (i64, String, String, String)>(
        "SELECT id, name, institution, description FROM accounts WHERE name = ?",
    )
    .bind(name)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| Account::new(AccountId(r.0), &r.1, &r.2, &r.3)))
}

pub async fn get_all_accounts(pool: &DbPool) -> Result<Vec<Account>, DbError> {
    let rows = sqlx::query_as::<_, (i64, String, String, String)>(
        "SELECT id, name, institution, description FROM accounts ORDER BY name",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| Account::new(AccountId(r.0), &r.1, &r.2, &r.3))
        .collect())
}

pub async fn create_data_import(
    pool: &DbPool,
    account_id: AccountId,
    filename: Option<&str>,
) -> Result<ImportId, DbError> {
    let result = sqlx::query("INSERT INTO data_imports (account_id, filename) VALUES (?, ?)")
        .bind(account_id.0)
        .bind(filename)
        .execute(pool)
        .await?;

    Ok(ImportId(result.last_insert_rowid()))
}

pub async fn get_data_imports_for_account(
    pool: &DbPool,
    account_id: AccountId,
) -> Result<Vec<DataImport>, DbError> {
    let rows = sqlx::query_as::<_, (i64, i64, Option<String>, String)>(
        "SELECT id, account_id, filename, created_at FROM data_imports
         WHERE account_id = ? ORDER BY created_at DESC, id DESC",
    )
    .bind(account_id.0)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| DataImport {
            id: ImportId(r.0),
            account_id: AccountId(r.1),
            filename: r.2,
            created_at: r.3,
        })
        .collect())
}

/// Delete an import batch; its transactions go with it via the cascade.
pub async fn delete_data_import(pool: &DbPool, import_id: ImportId) -> Result<u64, DbError> {
    let result = sqlx::query("DELETE FROM data_imports WHERE id = ?")
        .bind(import_id.0)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Insert a transaction under an import batch. `INSERT OR IGNORE` against the
/// checksum primary key makes the check-then-act dedup step atomic even when
/// two processes import the same file concurrently. Returns whether a row was
/// actually written.
pub async fn insert_transaction(
    pool: &DbPool,
    tx: &CanonicalTransaction,
    import_id: ImportId,
) -> Result<bool, DbError> {
    let metadata = if tx.metadata.is_empty() {
        None
    } else {
        Some(serde_json::to_string(&tx.metadata)?)
    };

    let result = sqlx::query(
        "INSERT OR IGNORE INTO transactions (
            checksum, account_id, data_import_id, transaction_date, post_date,
            description, bank_category, amount, transaction_type, metadata
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&tx.checksum)
    .bind(tx.account_id.0)
    .bind(import_id.0)
    .bind(tx.transaction_date)
    .bind(tx.post_date)
    .bind(&tx.description)
    .bind(tx.bank_category.as_deref())
    .bind(tx.amount.to_string())
    .bind(tx.kind.to_string())
    .bind(metadata)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn transaction_exists(pool: &DbPool, checksum: &str) -> Result<bool, DbError> {
    let row = sqlx::query_as::<_, (i64,)>(
        "SELECT COUNT(*) FROM transactions WHERE checksum = ?",
    )
    .bind(checksum)
    .fetch_one(pool)
    .await?;
    Ok(row.0 > 0)
}

type TransactionRow = (
    String,
    i64,
    NaiveDate,
    Option<NaiveDate>,
    String,
    Option<String>,
    String,
    String,
    Option<String>,
);

pub async fn get_transactions_for_account(
    pool: &DbPool,
    account_id: AccountId,
) -> Result<Vec<CanonicalTransaction>, DbError> {
    let rows = sqlx::query_as::<_, TransactionRow>(
        "SELECT checksum, account_id, transaction_date, post_date, description,
                bank_category, amount, transaction_type, metadata
         FROM transactions WHERE account_id = ?
         ORDER BY transaction_date DESC, checksum",
    )
    .bind(account_id.0)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(row_to_transaction).collect()
}

fn row_to_transaction(r: TransactionRow) -> Result<CanonicalTransaction, DbError> {
    let amount = Decimal::from_str(&r.6)
        .map_err(|e| DbError::Decode(format!("amount '{}': {e}", r.6)))?;
    let kind = TransactionType::from_str(&r.7)
        .map_err(|e| DbError::Decode(format!("transaction_type '{}': {e}", r.7)))?;
    let metadata: BTreeMap<String, String> = match r.8 {
        Some(json) => serde_json::from_str(&json)?,
        None => BTreeMap::new(),
    };

    Ok(CanonicalTransaction {
        checksum: r.0,
        account_id: AccountId(r.1),
        transaction_date: r.2,
        post_date: r.3,
        description: r.4,
        bank_category: r.5,
        amount,
        kind,
        metadata,
    })
}
