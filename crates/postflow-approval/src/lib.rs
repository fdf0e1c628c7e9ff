//! # PostFlow Approval
//!
//! The human review lifecycle for posts: a small state machine with bulk
//! operations, edit tracking, pre-approval validation, auto-approval, and
//! progress reporting. Operations are pure (`Post` in → `Post` out) so
//! bulk calls are safe to repeat and never hold locks.

pub mod validate;
pub mod workflow;

pub use validate::{validate_before_approval, ApprovalCheck};
pub use workflow::{
    approve, auto_approve, bulk_approve, bulk_reject, edit_content, edit_platforms, edit_timing,
    progress, reject, request_revision, ApprovalProgress, ContentEdit, AUTO_APPROVER,
};
