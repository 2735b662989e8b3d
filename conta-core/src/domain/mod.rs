//! Core domain entities
//!
//! All business entities are defined here. These are pure data structures
//! with validation logic - no I/O or external dependencies.

mod account;
mod context;
pub mod cpf;
pub mod result;
pub mod secret;

pub use account::Account;
pub use context::Context;
pub use result::{AccountError, ErrorKind, OperationResult};
pub use secret::Argon2Params;
