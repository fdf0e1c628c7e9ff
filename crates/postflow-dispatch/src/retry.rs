//! Retry classification for sink errors.
//!
//! The sink reports errors as free text, so classification is substring
//! matching against known transient signatures. Rate limiting is the
//! dominant retryable error in practice.

use postflow_core::PostflowError;

/// Error signatures worth retrying.
const RETRYABLE_PATTERNS: &[&str] = &["rate limit", "rate-limit", "timeout", "network", "503", "429"];

/// True if the sink error message looks transient.
pub fn is_retryable(message: &str) -> bool {
    let lower = message.to_lowercase();
    RETRYABLE_PATTERNS.iter().any(|pattern| lower.contains(pattern))
}

/// Classify a sink error message into the dispatch error taxonomy.
pub fn classify(message: &str) -> PostflowError {
    if is_retryable(message) {
        PostflowError::TransientDispatch(message.to_string())
    } else {
        PostflowError::PermanentDispatch(message.to_string())
    }
}
