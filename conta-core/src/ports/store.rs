//! Account store port - persistence abstraction

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Account, Context};

/// Failures reported by a store implementation
///
/// The service never shows these to callers; they go to the log sink and are
/// replaced by a generic domain error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    /// A uniqueness constraint rejected the write
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Deadline exceeded")]
    DeadlineExceeded,

    #[error("Database error: {0}")]
    Database(String),
}

impl StoreError {
    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Durable account storage
///
/// Every method receives the caller's [`Context`] and must fail with
/// [`StoreError::DeadlineExceeded`] instead of touching storage once it has
/// expired.
///
/// Implementations may do blocking I/O inside these methods. The DuckDB store
/// does, and is meant for short local queries.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// All accounts
    async fn list(&self, ctx: &Context) -> StoreResult<Vec<Account>>;

    /// Full account by id, `NotFound` when missing
    async fn get_by_id(&self, ctx: &Context, id: i64) -> StoreResult<Account>;

    /// Account with only `id` and `balance_raw` populated
    async fn get_balance_by_id(&self, ctx: &Context, id: i64) -> StoreResult<Account>;

    /// Full account by cpf, matched exactly as given
    async fn get_by_identifier(&self, ctx: &Context, cpf: &str) -> StoreResult<Account>;

    async fn identifier_exists(&self, ctx: &Context, cpf: &str) -> StoreResult<bool>;

    /// Persist a new account
    ///
    /// On success the implementation must have written the assigned `id`,
    /// `created_at` and `updated_at` into `account`. A cpf that already exists
    /// must be reported as [`StoreError::UniqueViolation`].
    async fn create(&self, ctx: &Context, account: &mut Account) -> StoreResult<()>;

    /// Write `account.balance` for `account.id`, `NotFound` when no row matches
    async fn update_balance(&self, ctx: &Context, account: &Account) -> StoreResult<()>;
}
