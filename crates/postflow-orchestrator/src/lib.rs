//! # PostFlow Orchestrator
//!
//! Cross-platform coordination: adapts one post's content per target
//! platform (truncation, hashtag trimming, tone policy, platform fields)
//! and validates whole calendars for scheduling conflicts.
//!
//! All operations are pure — they consume borrowed posts/content and
//! return new values, which keeps bulk validation safe to repeat.

pub mod adapt;
pub mod validate;

pub use adapt::{adapt_for_platform, compose_text, detect_adaptations, truncate_with_ellipsis};
pub use validate::{
    fingerprint, validate_calendar, ValidationIssue, ValidationReport, ValidationWarning,
};
