//! Session-specific error types.

use redraft_types::{ConfigError, GatewayError};
use thiserror::Error;

/// Errors from driving a generation request through its lifecycle.
///
/// None of these are fatal: every one leaves the session ready for a
/// fresh `run`.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("A request is already in flight")]
    Busy,

    #[error("Input text is empty")]
    EmptyInput,

    #[error("Too many requests: retry in {wait_ms}ms")]
    RateLimited { wait_ms: u64 },

    #[error("Request cancelled")]
    Cancelled,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}
