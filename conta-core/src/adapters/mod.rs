//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - DuckDB for the AccountStore port
//! - Argon2id for the SecretEncoder port
//! - In-memory store and log sink for tests
//!
//! The production LogSink is `services::LoggingService`.

pub mod argon2_encoder;
pub mod duckdb;
pub mod memory;

pub use argon2_encoder::Argon2SecretEncoder;
pub use self::duckdb::DuckDbAccountStore;
pub use memory::{InMemoryAccountStore, LoggedError, MemoryLogSink};
