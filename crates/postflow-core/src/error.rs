//! PostFlow error taxonomy.
//!
//! Generation errors abort the whole build; approval and orchestration
//! return structured results instead of erroring; dispatch errors are
//! isolated per post so bulk calls never partially throw.

use thiserror::Error;

/// Errors produced by the PostFlow engine.
#[derive(Debug, Error)]
pub enum PostflowError {
    /// Bad generation request — fatal, immediate, no retry.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Operation attempted out of order (e.g. schedule before approve).
    #[error("Precondition error: {0}")]
    Precondition(String),

    /// Retryable sink error (rate limit, timeout, network, 503, 429).
    #[error("Transient dispatch error: {0}")]
    TransientDispatch(String),

    /// Non-retryable sink error — surfaced immediately.
    #[error("Permanent dispatch error: {0}")]
    PermanentDispatch(String),

    /// Content producer failure (usually absorbed by template fallback).
    #[error("Producer error: {0}")]
    Producer(String),

    /// Configuration load/parse failure.
    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result alias used across all PostFlow crates.
pub type Result<T> = std::result::Result<T, PostflowError>;
