//! Account service - account lifecycle and balance integrity
//!
//! Every operation checks its own preconditions before touching the store.
//! Validation failures go back to the caller as they are and are not logged.
//! Store and encoder failures are logged with their full cause and then
//! replaced by a generic [`AccountError`], so storage details never reach the
//! caller.

use std::error::Error;
use std::sync::Arc;

use num_traits::Signed;

use crate::domain::result::{AccountError, Result};
use crate::domain::{Account, Context};
use crate::ports::{AccountStore, LogSink, SecretEncoder, StoreError};

/// Account service
pub struct AccountService {
    store: Arc<dyn AccountStore>,
    encoder: Arc<dyn SecretEncoder>,
    log: Arc<dyn LogSink>,
}

impl AccountService {
    pub fn new(
        store: Arc<dyn AccountStore>,
        encoder: Arc<dyn SecretEncoder>,
        log: Arc<dyn LogSink>,
    ) -> Self {
        Self {
            store,
            encoder,
            log,
        }
    }

    /// List all accounts
    pub async fn list(&self, ctx: &Context) -> Result<Vec<Account>> {
        self.store
            .list(ctx)
            .await
            .map_err(|e| self.logged(ctx, &e, AccountError::AccountListFailed))
    }

    /// Fetch a full account
    pub async fn get_by_id(&self, ctx: &Context, id: i64) -> Result<Account> {
        if id <= 0 {
            return Err(AccountError::InvalidId);
        }

        self.store
            .get_by_id(ctx, id)
            .await
            .map_err(|e| self.logged(ctx, &e, AccountError::AccountFetchFailed))
    }

    /// Fetch an account with only its id and `balance_raw` populated
    pub async fn get_balance_by_id(&self, ctx: &Context, id: i64) -> Result<Account> {
        if id <= 0 {
            return Err(AccountError::InvalidId);
        }

        self.store
            .get_balance_by_id(ctx, id)
            .await
            .map_err(|e| self.logged(ctx, &e, AccountError::AccountBalanceFetchFailed))
    }

    /// Fetch an account by cpf
    ///
    /// The cpf is passed to the store as given: no normalization, no
    /// checksum. Only creation validates identifiers.
    pub async fn get_by_identifier(&self, ctx: &Context, cpf: &str) -> Result<Account> {
        if cpf.is_empty() {
            return Err(AccountError::IdentifierRequired);
        }

        self.store
            .get_by_identifier(ctx, cpf)
            .await
            .map_err(|e| self.logged(ctx, &e, AccountError::AccountFetchFailed))
    }

    /// Validate and persist a new account
    ///
    /// On success the store has filled in `id`, `created_at` and `updated_at`
    /// of `account`, and `secret_hash`/`secret_salt` are set. The plaintext
    /// `secret` is left as it was. The secret is hashed on tokio's blocking
    /// pool, so this must run inside a tokio runtime.
    pub async fn create(&self, ctx: &Context, account: &mut Account) -> Result<()> {
        account.validate()?;

        let exists = self
            .store
            .identifier_exists(ctx, &account.cpf)
            .await
            .map_err(|e| self.logged(ctx, &e, AccountError::AccountCreateFailed))?;

        if exists {
            return Err(AccountError::IdentifierAlreadyExists);
        }

        account.secret_salt = self.encoder.salt();

        // hashing is CPU and memory bound, keep it off the async workers
        let encoder = Arc::clone(&self.encoder);
        let secret = account.secret.clone();
        let salt = account.secret_salt.clone();
        account.secret_hash =
            match tokio::task::spawn_blocking(move || encoder.encode(&secret, &salt)).await {
                Ok(Ok(hash)) => hash,
                Ok(Err(e)) => return Err(self.logged(ctx, &e, AccountError::AccountCreateFailed)),
                Err(e) => return Err(self.logged(ctx, &e, AccountError::AccountCreateFailed)),
            };

        match self.store.create(ctx, account).await {
            Ok(()) => Ok(()),
            // lost the race against a concurrent create with the same cpf
            Err(StoreError::UniqueViolation(_)) => Err(AccountError::IdentifierAlreadyExists),
            Err(e) => Err(self.logged(ctx, &e, AccountError::AccountCreateFailed)),
        }
    }

    /// Persist `account.balance` for an existing account
    pub async fn update_balance(&self, ctx: &Context, account: &Account) -> Result<()> {
        if account.id <= 0 {
            return Err(AccountError::InvalidId);
        }

        if account.balance.is_negative() {
            return Err(AccountError::InvalidBalance);
        }

        self.store
            .update_balance(ctx, account)
            .await
            .map_err(|e| self.logged(ctx, &e, AccountError::AccountUpdateBalanceFailed))
    }

    fn logged(
        &self,
        ctx: &Context,
        cause: &(dyn Error + 'static),
        err: AccountError,
    ) -> AccountError {
        self.log.error(ctx, cause);
        err
    }
}
