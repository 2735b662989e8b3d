//! DuckDB account store implementation

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use duckdb::{params, Connection};

use crate::domain::{Account, Context};
use crate::ports::{AccountStore, StoreError, StoreResult};
use crate::services::{MigrationResult, MigrationService};

/// Maximum number of retries when database file is locked
const MAX_RETRIES: u32 = 5;

/// Initial retry delay in milliseconds (doubles each retry: 50, 100, 200, 400, 800ms)
const INITIAL_RETRY_DELAY_MS: u64 = 50;

const ACCOUNT_COLUMNS: &str =
    "id, name, cpf, secret_hash, secret_salt, balance, created_at, updated_at";

/// Check if an error message indicates a file locking issue that should be retried
fn is_retryable_error(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    // Windows error messages
    lower.contains("being used by another process")
        || lower.contains("cannot access the file")
        // Unix/macOS error messages
        || lower.contains("resource temporarily unavailable")
        || lower.contains("database is locked")
        || lower.contains("file is already open")
}

fn is_unique_violation(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    lower.contains("duplicate key") || lower.contains("unique constraint")
}

fn store_error(err: duckdb::Error) -> StoreError {
    let msg = err.to_string();
    if is_unique_violation(&msg) {
        StoreError::UniqueViolation(msg)
    } else {
        StoreError::Database(msg)
    }
}

fn ensure_live(ctx: &Context) -> StoreResult<()> {
    if ctx.is_expired() {
        return Err(StoreError::DeadlineExceeded);
    }
    Ok(())
}

/// DuckDB account store
///
/// Queries run synchronously under the connection mutex, on the calling
/// task's worker thread.
pub struct DuckDbAccountStore {
    conn: Mutex<Connection>,
    db_path: Option<PathBuf>,
}

impl DuckDbAccountStore {
    /// Open (or create) the account database at `db_path`
    ///
    /// Includes retry logic with exponential backoff for file locking errors,
    /// which can occur when several CLI invocations open the file at once.
    pub fn new(db_path: &Path) -> Result<Self> {
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            match Self::try_open_connection(db_path) {
                Ok(conn) => {
                    return Ok(Self {
                        conn: Mutex::new(conn),
                        db_path: Some(db_path.to_path_buf()),
                    });
                }
                Err(e) => {
                    let err_msg = e.to_string();
                    if is_retryable_error(&err_msg) && attempt < MAX_RETRIES - 1 {
                        let delay =
                            Duration::from_millis(INITIAL_RETRY_DELAY_MS * 2u64.pow(attempt));
                        eprintln!(
                            "[conta] Database busy, retrying in {}ms (attempt {}/{}): {}",
                            delay.as_millis(),
                            attempt + 1,
                            MAX_RETRIES,
                            err_msg
                        );
                        thread::sleep(delay);
                        last_error = Some(e);
                        continue;
                    }
                    return Err(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| anyhow!("Failed to open database after {} retries", MAX_RETRIES)))
    }

    /// In-memory database; call [`Self::ensure_schema`] before use
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: Mutex::new(Connection::open_in_memory()?),
            db_path: None,
        })
    }

    fn try_open_connection(db_path: &Path) -> Result<Connection> {
        // Extension autoloading stays off: nothing here needs one
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        Ok(Connection::open_with_flags(db_path, config)?)
    }

    /// Run database migrations
    pub fn run_migrations(&self) -> Result<MigrationResult> {
        let conn = self.conn.lock().map_err(|e| anyhow!("Lock poisoned: {}", e))?;
        MigrationService::new(&conn).run_pending()
    }

    /// Ensure database schema exists (runs pending migrations)
    pub fn ensure_schema(&self) -> Result<()> {
        self.run_migrations()?;
        Ok(())
    }

    /// Path of the database file, `None` for in-memory stores
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    fn connection(&self, ctx: &Context) -> StoreResult<MutexGuard<'_, Connection>> {
        ensure_live(ctx)?;
        self.conn
            .lock()
            .map_err(|e| StoreError::database(format!("Lock poisoned: {}", e)))
    }

    fn row_to_account(row: &duckdb::Row) -> duckdb::Result<Account> {
        let created: String = row.get(6)?;
        let updated: String = row.get(7)?;

        Ok(Account {
            id: row.get(0)?,
            name: row.get(1)?,
            cpf: row.get(2)?,
            secret_hash: row.get(3)?,
            secret_salt: row.get(4)?,
            balance_raw: row.get(5)?,
            created_at: parse_timestamp(&created),
            updated_at: parse_timestamp(&updated),
            ..Account::default()
        })
    }

    fn query_one<P: duckdb::Params>(
        conn: &Connection,
        sql: &str,
        params: P,
        what: String,
    ) -> StoreResult<Account> {
        match conn.query_row(sql, params, Self::row_to_account) {
            Ok(account) => Ok(account),
            Err(duckdb::Error::QueryReturnedNoRows) => Err(StoreError::not_found(what)),
            Err(e) => Err(store_error(e)),
        }
    }
}

#[async_trait]
impl AccountStore for DuckDbAccountStore {
    async fn list(&self, ctx: &Context) -> StoreResult<Vec<Account>> {
        let conn = self.connection(ctx)?;
        let mut stmt = conn
            .prepare(&format!("SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY id"))
            .map_err(store_error)?;

        let accounts = stmt
            .query_map([], Self::row_to_account)
            .map_err(store_error)?
            .collect::<duckdb::Result<Vec<_>>>()
            .map_err(store_error)?;

        Ok(accounts)
    }

    async fn get_by_id(&self, ctx: &Context, id: i64) -> StoreResult<Account> {
        let conn = self.connection(ctx)?;
        Self::query_one(
            &conn,
            &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ?"),
            [id],
            format!("account {}", id),
        )
    }

    async fn get_balance_by_id(&self, ctx: &Context, id: i64) -> StoreResult<Account> {
        let conn = self.connection(ctx)?;
        let result = conn.query_row(
            "SELECT id, balance FROM accounts WHERE id = ?",
            [id],
            |row| {
                Ok(Account {
                    id: row.get(0)?,
                    balance_raw: row.get(1)?,
                    ..Account::default()
                })
            },
        );

        match result {
            Ok(account) => Ok(account),
            Err(duckdb::Error::QueryReturnedNoRows) => {
                Err(StoreError::not_found(format!("account {}", id)))
            }
            Err(e) => Err(store_error(e)),
        }
    }

    async fn get_by_identifier(&self, ctx: &Context, cpf: &str) -> StoreResult<Account> {
        let conn = self.connection(ctx)?;
        Self::query_one(
            &conn,
            &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE cpf = ?"),
            [cpf],
            "account with given cpf".to_string(),
        )
    }

    async fn identifier_exists(&self, ctx: &Context, cpf: &str) -> StoreResult<bool> {
        let conn = self.connection(ctx)?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM accounts WHERE cpf = ?", [cpf], |row| {
                row.get(0)
            })
            .map_err(store_error)?;
        Ok(count > 0)
    }

    async fn create(&self, ctx: &Context, account: &mut Account) -> StoreResult<()> {
        let conn = self.connection(ctx)?;
        let now = Utc::now();
        let timestamp = now.to_rfc3339();
        let balance = account.balance.to_string();

        // Plaintext secret is not a column: only hash and salt are written
        let id: i64 = conn
            .query_row(
                "INSERT INTO accounts (name, cpf, secret_hash, secret_salt, balance, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?)
                 RETURNING id",
                params![
                    account.name,
                    account.cpf,
                    account.secret_hash,
                    account.secret_salt,
                    balance,
                    timestamp,
                    timestamp,
                ],
                |row| row.get(0),
            )
            .map_err(store_error)?;

        account.id = id;
        account.balance_raw = balance;
        account.created_at = now;
        account.updated_at = now;
        Ok(())
    }

    async fn update_balance(&self, ctx: &Context, account: &Account) -> StoreResult<()> {
        let conn = self.connection(ctx)?;
        let updated = conn
            .execute(
                "UPDATE accounts SET balance = ?, updated_at = ? WHERE id = ?",
                params![account.balance.to_string(), Utc::now().to_rfc3339(), account.id],
            )
            .map_err(store_error)?;

        if updated == 0 {
            return Err(StoreError::not_found(format!("account {}", account.id)));
        }
        Ok(())
    }
}

// Helper functions

fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_default()
}
