//! Result and error types for the core library

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Who is at fault when an operation fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The caller sent something the domain rejects
    InvalidInput,
    /// Something behind the service failed (storage, hashing)
    Internal,
}

/// Account domain error
///
/// Variants carry no payload: the message a caller sees is fixed, and the
/// underlying cause of an internal failure only ever goes to the log sink.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountError {
    #[error("cpf is required")]
    IdentifierRequired,

    #[error("cpf must have 11 characters")]
    IdentifierSizeInvalid,

    #[error("cpf is invalid")]
    IdentifierInvalid,

    #[error("an account with this cpf already exists")]
    IdentifierAlreadyExists,

    #[error("name is required")]
    NameRequired,

    #[error("secret is required")]
    SecretRequired,

    #[error("account id is invalid")]
    InvalidId,

    #[error("balance cannot be negative")]
    InvalidBalance,

    #[error("failed to list accounts")]
    AccountListFailed,

    #[error("failed to fetch account")]
    AccountFetchFailed,

    #[error("failed to fetch account balance")]
    AccountBalanceFetchFailed,

    #[error("failed to create account")]
    AccountCreateFailed,

    #[error("failed to update account balance")]
    AccountUpdateBalanceFailed,
}

impl AccountError {
    /// Classification of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::IdentifierRequired
            | Self::IdentifierSizeInvalid
            | Self::IdentifierInvalid
            | Self::IdentifierAlreadyExists
            | Self::NameRequired
            | Self::SecretRequired
            | Self::InvalidId
            | Self::InvalidBalance => ErrorKind::InvalidInput,
            Self::AccountListFailed
            | Self::AccountFetchFailed
            | Self::AccountBalanceFetchFailed
            | Self::AccountCreateFailed
            | Self::AccountUpdateBalanceFailed => ErrorKind::Internal,
        }
    }

    /// HTTP-style status code for transports that want one
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::InvalidInput => 400,
            ErrorKind::Internal => 500,
        }
    }

    pub fn is_internal(&self) -> bool {
        self.kind() == ErrorKind::Internal
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, AccountError>;

/// Operation result with optional context (for JSON output)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationResult<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub status: u16,
    pub context: Option<HashMap<String, serde_json::Value>>,
}

impl<T> OperationResult<T> {
    /// Create a successful result
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            status: 200,
            context: None,
        }
    }

    /// Create a successful result with context
    pub fn ok_with_context(data: T, context: HashMap<String, serde_json::Value>) -> Self {
        Self {
            context: Some(context),
            ..Self::ok(data)
        }
    }

    /// Create a failed result from a domain error
    pub fn fail(error: AccountError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.to_string()),
            status: error.status_code(),
            context: None,
        }
    }
}

impl<T> From<Result<T>> for OperationResult<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::fail(e),
        }
    }
}
