//! # PostFlow Dispatch
//!
//! Sends approved posts to the external scheduling provider. One bounded
//! pool fans calendar dispatch out across posts; within a post, attempts
//! are sequential with linear backoff and a substring-based transient
//! error classifier. Failures never escape a bulk call as errors — every
//! post comes back with its outcome recorded.

pub mod engine;
pub mod retry;
pub mod sink;

pub use engine::{
    build_request, cancel_scheduled_post, reschedule_post, retry_failed_scheduling,
    schedule_calendar, schedule_post, scheduling_status, DispatchResult, DispatchSummary,
    SchedulingFailure, SchedulingStatus,
};
pub use retry::{classify, is_retryable};
pub use sink::HttpSink;
