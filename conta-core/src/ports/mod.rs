//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external dependencies. The account
//! service depends only on these traits, not on concrete implementations.

mod log_sink;
mod secret;
mod store;

pub use log_sink::LogSink;
pub use secret::{SecretEncoder, SecretError};
pub use store::{AccountStore, StoreError, StoreResult};
