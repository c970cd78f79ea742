//! Domain errors. Used by ports and use cases.
//!
//! Adapters map infrastructure errors into these.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Discord gateway error: {0}")]
    Gateway(String),

    /// Rate limit still in effect after the client exhausted its own retries.
    #[error("Rate limited: retry after {retry_after_ms} ms")]
    RateLimited { retry_after_ms: u64 },

    #[error("Session error: {0}")]
    Session(String),

    #[error("Time to live must be positive but was {0}")]
    InvalidRetention(String),

    /// The paginator was about to request the same page twice.
    #[error("Attempt to request the same messages twice in channel {channel}, namely before {before}")]
    PaginationLoop { channel: String, before: u64 },

    #[error("Configuration error: {0}")]
    Config(String),
}
