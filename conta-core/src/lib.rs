//! Conta Core - account validation and balance integrity
//!
//! This crate implements the core domain logic following hexagonal architecture:
//!
//! - **domain**: Account record, CPF validator, error catalogue, call context
//! - **ports**: Trait definitions for external dependencies (AccountStore, SecretEncoder, LogSink)
//! - **services**: Business logic orchestration (AccountService, logging, migrations)
//! - **adapters**: Concrete implementations (DuckDB, Argon2id, in-memory)

pub mod domain;
pub mod ports;
pub mod services;
pub mod adapters;
pub mod config;
pub mod migrations;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use adapters::{Argon2SecretEncoder, DuckDbAccountStore};
use config::Config;
use services::{AccountService, EntryPoint, LoggingService};

// Re-export commonly used types at crate root
pub use domain::{Account, AccountError, Context, ErrorKind, OperationResult};
pub use domain::cpf;

/// Main context for Conta operations
///
/// Opens the account and log databases in the conta directory and wires the
/// account service to them.
pub struct ContaContext {
    pub config: Config,
    pub store: Arc<DuckDbAccountStore>,
    pub logging: Arc<LoggingService>,
    pub account_service: AccountService,
}

impl ContaContext {
    /// Create a new Conta context
    pub fn new(conta_dir: &Path, entry_point: EntryPoint) -> Result<Self> {
        std::fs::create_dir_all(conta_dir)?;
        let config = Config::load(conta_dir)?;

        let store = Arc::new(DuckDbAccountStore::new(&config.database_path(conta_dir))?);

        // Initialize schema
        store.ensure_schema()?;

        let logging = Arc::new(LoggingService::new(
            conta_dir,
            entry_point,
            env!("CARGO_PKG_VERSION"),
        )?);
        let encoder = Arc::new(Argon2SecretEncoder::new(config.secret.clone()));

        let account_service = AccountService::new(
            store.clone(),
            encoder,
            logging.clone(),
        );

        Ok(Self {
            config,
            store,
            logging,
            account_service,
        })
    }

    /// A fresh context carrying the configured operation timeout
    pub fn operation(&self, name: &str) -> Context {
        Context::with_timeout(self.config.operation_timeout()).with_operation(name)
    }
}
