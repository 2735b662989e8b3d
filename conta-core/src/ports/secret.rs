//! Secret encoder port - salting and hashing of account secrets

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SecretError {
    #[error("Invalid salt: {0}")]
    InvalidSalt(String),

    #[error("Hashing failed: {0}")]
    Hash(String),
}

/// Derives the stored credential material from a plaintext secret
///
/// `encode` may be slow and blocking. The account service runs it on tokio's
/// blocking pool.
pub trait SecretEncoder: Send + Sync {
    /// A fresh random salt on every call
    fn salt(&self) -> String;

    /// Hash `secret` with `salt`; the same inputs always give the same output
    fn encode(&self, secret: &str, salt: &str) -> Result<String, SecretError>;
}
