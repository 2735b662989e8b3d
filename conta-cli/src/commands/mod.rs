//! CLI command implementations

pub mod account;
pub mod config;
pub mod logs;

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use serde::Serialize;

use conta_core::services::{EntryPoint, LoggingService};
use conta_core::{AccountError, ContaContext, Context, OperationResult};

/// Get the conta directory from environment or default
pub fn get_conta_dir() -> PathBuf {
    conta_core::config::default_dir()
}

/// Get or create conta context
pub fn get_context() -> Result<ContaContext> {
    let conta_dir = get_conta_dir();

    ContaContext::new(&conta_dir, EntryPoint::Cli)
        .with_context(|| format!("Failed to initialize conta in {}", conta_dir.display()))
}

/// Open the context and start an operation with the configured deadline
///
/// The command is recorded in the log database; a failure to do so is ignored.
pub fn begin(operation: &str) -> Result<(ContaContext, Context)> {
    let conta = get_context()?;
    let _ = conta.logging.log_command(operation);
    let ctx = conta.operation(operation);
    Ok((conta, ctx))
}

/// Get the logging service on its own, for the `logs` commands
pub fn get_logger() -> Result<LoggingService> {
    let conta_dir = get_conta_dir();
    std::fs::create_dir_all(&conta_dir)
        .with_context(|| format!("Failed to create conta directory: {:?}", conta_dir))?;
    LoggingService::new(&conta_dir, EntryPoint::Cli, env!("CARGO_PKG_VERSION"))
}

/// Whether a failed command should be written to the log database
///
/// Domain errors are skipped: the service already logged the internal ones
/// and client errors are never logged.
fn should_record(err: &anyhow::Error) -> bool {
    err.downcast_ref::<AccountError>().is_none()
}

/// Record a command that failed outside the account service
pub fn record_failure(command: &str, err: &anyhow::Error) {
    if !should_record(err) {
        return;
    }
    if let Ok(logger) = get_logger() {
        let details = format!("{:?}", err);
        let _ = logger.log_command_error(command, &err.to_string(), Some(&details));
    }
}

/// Unwrap a service result
///
/// In JSON mode a domain error is printed as a failed [`OperationResult`] and
/// the process exits non-zero; otherwise it becomes the command's error.
pub fn check<T>(result: conta_core::domain::result::Result<T>, json: bool) -> Result<T> {
    match result {
        Ok(value) => Ok(value),
        Err(e) if json => {
            print_json(&OperationResult::<()>::fail(e))?;
            std::process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}

/// Print a successful [`OperationResult`] envelope
pub fn print_ok<T: Serialize>(data: T) -> Result<()> {
    print_json(&OperationResult::ok(data))
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Error for a stored balance that does not parse
pub fn corrupt_balance(account_id: i64) -> anyhow::Error {
    anyhow::anyhow!("Stored balance of account {} is not a number", account_id)
}

/// Report a domain error found by the CLI before any service call
pub fn invalid(err: AccountError, json: bool) -> Result<()> {
    check::<()>(Err(err), json)
}
