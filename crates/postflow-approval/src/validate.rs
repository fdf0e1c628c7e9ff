//! Pre-approval validation — a precondition check, not a transition.

use chrono::{FixedOffset, Utc};
use serde::Serialize;

use postflow_core::Post;

/// Result of checking whether a post is ready to approve.
#[derive(Debug, Clone, Serialize)]
pub struct ApprovalCheck {
    pub ready: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Parse a "+HH:MM"/"-HH:MM" offset string.
fn parse_offset(offset: &str) -> Option<FixedOffset> {
    let (sign, rest) = match offset.strip_prefix('+') {
        Some(rest) => (1, rest),
        None => (-1, offset.strip_prefix('-')?),
    };
    let (hours, minutes) = rest.split_once(':')?;
    let seconds = sign * (hours.parse::<i32>().ok()? * 3600 + minutes.parse::<i32>().ok()? * 60);
    FixedOffset::east_opt(seconds)
}

/// Wall-clock "now" in the configured offset. Falls back to UTC when the
/// offset string doesn't parse.
fn local_now(utc_offset: &str) -> chrono::NaiveDateTime {
    parse_offset(utc_offset)
        .map(|offset| Utc::now().with_timezone(&offset).naive_local())
        .unwrap_or_else(|| Utc::now().naive_utc())
}

/// Check a post before approval. Errors block; warnings are advisory.
///
/// Scheduled times are local wall-clock values, so the past check compares
/// against "now" shifted by the configured UTC offset.
pub fn validate_before_approval(post: &Post, utc_offset: &str) -> ApprovalCheck {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if post.content.hook.trim().is_empty() {
        errors.push("hook is missing".to_string());
    }
    if post.content.body.trim().is_empty() {
        errors.push("body is missing".to_string());
    }
    if post.platforms.is_empty() {
        errors.push("no platforms selected".to_string());
    }
    match post.scheduled_naive() {
        Some(dt) if dt < local_now(utc_offset) => {
            errors.push(format!("scheduled time {dt} is in the past"));
        }
        Some(_) => {}
        None => errors.push(format!("invalid scheduled time: {}", post.scheduled_time)),
    }

    if post.content.cta.trim().is_empty() {
        warnings.push("no call to action".to_string());
    }
    if post.content_type.is_visual() && post.content.media_urls.is_empty() {
        warnings.push(format!(
            "{} post has no media attached",
            post.content_type
        ));
    }

    ApprovalCheck { ready: errors.is_empty(), errors, warnings }
}
