//! In-memory adapters for tests and embedding
//!
//! `InMemoryAccountStore` behaves like the DuckDB store (unique cpf, ids from
//! a counter, balance kept as text) and also counts calls and can be told to
//! fail, so service tests can check what reached the store.

use std::collections::BTreeMap;
use std::error::Error;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::{Account, Context};
use crate::ports::{AccountStore, LogSink, StoreError, StoreResult};

#[derive(Default)]
struct State {
    accounts: BTreeMap<i64, Account>,
    next_id: i64,
    fail_next: Option<StoreError>,
}

/// Account store backed by a map
#[derive(Default)]
pub struct InMemoryAccountStore {
    state: Mutex<State>,
    calls: AtomicUsize,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of store methods invoked so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Make the next call fail with `err`
    pub fn fail_next(&self, err: StoreError) {
        if let Ok(mut state) = self.state.lock() {
            state.fail_next = Some(err);
        }
    }

    /// The stored row for `id`, exactly as persisted
    pub fn persisted(&self, id: i64) -> Option<Account> {
        self.state.lock().ok()?.accounts.get(&id).cloned()
    }

    fn begin(&self, ctx: &Context) -> StoreResult<MutexGuard<'_, State>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if ctx.is_expired() {
            return Err(StoreError::DeadlineExceeded);
        }

        let mut state = self
            .state
            .lock()
            .map_err(|e| StoreError::database(format!("Lock poisoned: {}", e)))?;

        match state.fail_next.take() {
            Some(err) => Err(err),
            None => Ok(state),
        }
    }
}

fn not_found(id: i64) -> StoreError {
    StoreError::not_found(format!("account {}", id))
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn list(&self, ctx: &Context) -> StoreResult<Vec<Account>> {
        let state = self.begin(ctx)?;
        Ok(state.accounts.values().cloned().collect())
    }

    async fn get_by_id(&self, ctx: &Context, id: i64) -> StoreResult<Account> {
        let state = self.begin(ctx)?;
        state.accounts.get(&id).cloned().ok_or_else(|| not_found(id))
    }

    async fn get_balance_by_id(&self, ctx: &Context, id: i64) -> StoreResult<Account> {
        let state = self.begin(ctx)?;
        let stored = state.accounts.get(&id).ok_or_else(|| not_found(id))?;
        Ok(Account {
            id: stored.id,
            balance_raw: stored.balance_raw.clone(),
            ..Account::default()
        })
    }

    async fn get_by_identifier(&self, ctx: &Context, cpf: &str) -> StoreResult<Account> {
        let state = self.begin(ctx)?;
        state
            .accounts
            .values()
            .find(|account| account.cpf == cpf)
            .cloned()
            .ok_or_else(|| StoreError::not_found("account with given cpf"))
    }

    async fn identifier_exists(&self, ctx: &Context, cpf: &str) -> StoreResult<bool> {
        let state = self.begin(ctx)?;
        Ok(state.accounts.values().any(|account| account.cpf == cpf))
    }

    async fn create(&self, ctx: &Context, account: &mut Account) -> StoreResult<()> {
        let mut state = self.begin(ctx)?;

        if state.accounts.values().any(|stored| stored.cpf == account.cpf) {
            return Err(StoreError::UniqueViolation(format!(
                "cpf {} already stored",
                account.cpf
            )));
        }

        state.next_id += 1;
        let now = Utc::now();
        account.id = state.next_id;
        account.balance_raw = account.balance.to_string();
        account.created_at = now;
        account.updated_at = now;

        let row = Account {
            id: account.id,
            name: account.name.clone(),
            cpf: account.cpf.clone(),
            secret_hash: account.secret_hash.clone(),
            secret_salt: account.secret_salt.clone(),
            balance_raw: account.balance_raw.clone(),
            created_at: now,
            updated_at: now,
            ..Account::default()
        };
        state.accounts.insert(row.id, row);
        Ok(())
    }

    async fn update_balance(&self, ctx: &Context, account: &Account) -> StoreResult<()> {
        let mut state = self.begin(ctx)?;
        let stored = state
            .accounts
            .get_mut(&account.id)
            .ok_or_else(|| not_found(account.id))?;
        stored.balance_raw = account.balance.to_string();
        stored.updated_at = Utc::now();
        Ok(())
    }
}

/// One error recorded by [`MemoryLogSink`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggedError {
    pub operation: Option<String>,
    pub message: String,
}

/// Log sink that keeps errors in memory
#[derive(Default)]
pub struct MemoryLogSink {
    entries: Mutex<Vec<LoggedError>>,
}

impl MemoryLogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<LoggedError> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LogSink for MemoryLogSink {
    fn error(&self, ctx: &Context, err: &(dyn Error + 'static)) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(LoggedError {
                operation: ctx.operation().map(str::to_string),
                message: err.to_string(),
            });
        }
    }
}
