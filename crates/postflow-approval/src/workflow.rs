//! The approval state machine.
//!
//! ```text
//! pending → {approved, rejected, needs_revision}
//! needs_revision → pending        (via any edit)
//! approved/rejected → pending     (via content or platform edit)
//! ```
//!
//! Every operation is pure: it consumes a `Post` and returns a new one.
//! Callers persist the result; concurrent reviews race last-write-wins
//! unless the host adds version stamps. Each transition and edit appends
//! to the post's revision history — the history is never rewritten.

use chrono::{NaiveDate, Utc};
use serde::Serialize;

use postflow_core::{ApprovalStatus, Calendar, Post, Revision};

/// Machine identity used by auto-approval, kept distinct for audit.
pub const AUTO_APPROVER: &str = "postflow-auto-approver";

fn push_revision(
    post: &mut Post,
    actor: &str,
    change_type: &str,
    before: Option<String>,
    after: Option<String>,
    note: Option<String>,
) {
    post.approval.revisions.push(Revision {
        at: Utc::now(),
        actor: actor.to_string(),
        change_type: change_type.to_string(),
        before,
        after,
        note,
    });
}

fn stamp(post: &mut Post, status: ApprovalStatus, actor: &str, note: Option<String>) {
    post.approval.status = status;
    post.approval.acted_by = Some(actor.to_string());
    post.approval.acted_at = Some(Utc::now());
    post.approval.note = note;
    post.sync_status();
}

/// Approve a post.
pub fn approve(mut post: Post, actor: &str) -> Post {
    let before = status_str(post.approval.status);
    stamp(&mut post, ApprovalStatus::Approved, actor, None);
    push_revision(&mut post, actor, "approval", Some(before), Some("approved".into()), None);
    tracing::debug!("✅ Post {} approved by {actor}", post.id);
    post
}

/// Reject a post with a reason.
pub fn reject(mut post: Post, actor: &str, reason: &str) -> Post {
    let before = status_str(post.approval.status);
    stamp(&mut post, ApprovalStatus::Rejected, actor, Some(reason.to_string()));
    push_revision(
        &mut post,
        actor,
        "rejection",
        Some(before),
        Some("rejected".into()),
        Some(reason.to_string()),
    );
    post
}

/// Send a post back to its author with a revision note.
pub fn request_revision(mut post: Post, actor: &str, note: &str) -> Post {
    let before = status_str(post.approval.status);
    stamp(&mut post, ApprovalStatus::NeedsRevision, actor, Some(note.to_string()));
    push_revision(
        &mut post,
        actor,
        "revision_request",
        Some(before),
        Some("needs_revision".into()),
        Some(note.to_string()),
    );
    post
}

/// Fields a content edit may change; `None` leaves the field alone.
#[derive(Debug, Clone, Default)]
pub struct ContentEdit {
    pub hook: Option<String>,
    pub body: Option<String>,
    pub cta: Option<String>,
    pub hashtags: Option<Vec<String>>,
}

/// Edit a post's content. Invalidates prior sign-off: status resets to
/// pending from any state.
pub fn edit_content(mut post: Post, edit: ContentEdit, actor: &str) -> Post {
    let before = serde_json::json!({
        "hook": post.content.hook,
        "body": post.content.body,
        "cta": post.content.cta,
    })
    .to_string();

    if let Some(hook) = edit.hook {
        post.content.hook = hook;
    }
    if let Some(body) = edit.body {
        post.content.body = body;
    }
    if let Some(cta) = edit.cta {
        post.content.cta = cta;
    }
    if let Some(hashtags) = edit.hashtags {
        post.content.hashtags = hashtags;
    }

    let after = serde_json::json!({
        "hook": post.content.hook,
        "body": post.content.body,
        "cta": post.content.cta,
    })
    .to_string();

    stamp(&mut post, ApprovalStatus::Pending, actor, None);
    push_revision(&mut post, actor, "content", Some(before), Some(after), None);
    post
}

/// Edit a post's schedule. Timing edits do NOT invalidate sign-off.
pub fn edit_timing(mut post: Post, date: NaiveDate, time: &str, actor: &str) -> Post {
    let before = format!("{} {}", post.scheduled_date, post.scheduled_time);
    post.scheduled_date = date;
    post.scheduled_time = time.to_string();
    let after = format!("{date} {time}");
    push_revision(&mut post, actor, "timing", Some(before), Some(after), None);
    post
}

/// Edit a post's target platforms. Invalidates prior sign-off.
pub fn edit_platforms(mut post: Post, platforms: Vec<String>, actor: &str) -> Post {
    let before = post.platforms.join(",");
    let after = platforms.join(",");
    post.platforms = platforms.clone();
    post.orchestration.platforms = platforms;
    stamp(&mut post, ApprovalStatus::Pending, actor, None);
    push_revision(&mut post, actor, "platform", Some(before), Some(after), None);
    post
}

/// Approve every post in the id set; others are untouched. Recomputes
/// calendar status and stats.
pub fn bulk_approve(mut calendar: Calendar, post_ids: &[String], actor: &str) -> Calendar {
    let ids: std::collections::HashSet<&str> = post_ids.iter().map(String::as_str).collect();
    calendar.posts = calendar
        .posts
        .into_iter()
        .map(|post| {
            if ids.contains(post.id.as_str()) {
                approve(post, actor)
            } else {
                post
            }
        })
        .collect();
    calendar.recompute_stats();
    calendar.recompute_status();
    tracing::info!(
        "✅ Bulk approve: {} of {} posts now approved ({:.0}%)",
        calendar.stats.approved_count,
        calendar.posts.len(),
        calendar.approval_rate() * 100.0
    );
    calendar
}

/// Reject every post in the id set; others are untouched.
pub fn bulk_reject(mut calendar: Calendar, post_ids: &[String], actor: &str, reason: &str) -> Calendar {
    let ids: std::collections::HashSet<&str> = post_ids.iter().map(String::as_str).collect();
    calendar.posts = calendar
        .posts
        .into_iter()
        .map(|post| {
            if ids.contains(post.id.as_str()) {
                reject(post, actor, reason)
            } else {
                post
            }
        })
        .collect();
    calendar.recompute_stats();
    calendar.recompute_status();
    calendar
}

/// Approve every pending post that passes pre-approval validation and
/// carries a quality score at or above the threshold.
pub fn auto_approve(
    mut calendar: Calendar,
    min_quality_score: f32,
    utc_offset: &str,
) -> (Calendar, usize) {
    let mut approved = 0;
    calendar.posts = calendar
        .posts
        .into_iter()
        .map(|post| {
            if post.approval.status == ApprovalStatus::Pending
                && post.generation.quality_score >= min_quality_score
                && crate::validate::validate_before_approval(&post, utc_offset).ready
            {
                approved += 1;
                approve(post, AUTO_APPROVER)
            } else {
                post
            }
        })
        .collect();
    calendar.recompute_stats();
    calendar.recompute_status();
    tracing::info!(
        "🤖 Auto-approved {approved} posts (threshold {min_quality_score})"
    );
    (calendar, approved)
}

/// Review progress over a calendar.
#[derive(Debug, Clone, Serialize)]
pub struct ApprovalProgress {
    pub total: usize,
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
    pub needs_revision: usize,
    /// 0.0–1.0.
    pub approval_rate: f32,
}

/// Count posts per approval state.
pub fn progress(calendar: &Calendar) -> ApprovalProgress {
    let mut report = ApprovalProgress {
        total: calendar.posts.len(),
        pending: 0,
        approved: 0,
        rejected: 0,
        needs_revision: 0,
        approval_rate: calendar.approval_rate(),
    };
    for post in &calendar.posts {
        match post.approval.status {
            ApprovalStatus::Pending => report.pending += 1,
            ApprovalStatus::Approved => report.approved += 1,
            ApprovalStatus::Rejected => report.rejected += 1,
            ApprovalStatus::NeedsRevision => report.needs_revision += 1,
        }
    }
    report
}

fn status_str(status: ApprovalStatus) -> String {
    match status {
        ApprovalStatus::Pending => "pending",
        ApprovalStatus::Approved => "approved",
        ApprovalStatus::Rejected => "rejected",
        ApprovalStatus::NeedsRevision => "needs_revision",
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use postflow_core::CalendarStatus;

    fn make_post() -> Post {
        let mut post = Post::new("cal-1", 0, NaiveDate::from_ymd_opt(2026, 9, 1).unwrap());
        post.platforms = vec!["instagram".into()];
        post.content.hook = "A hook".into();
        post.content.body = "A body".into();
        post.content.cta = "A cta".into();
        post
    }

    #[test]
    fn test_single_step_transitions_from_pending() {
        let approved = approve(make_post(), "reviewer");
        assert_eq!(approved.approval.status, ApprovalStatus::Approved);
        assert_eq!(approved.approval.acted_by.as_deref(), Some("reviewer"));

        let rejected = reject(make_post(), "reviewer", "off-brand");
        assert_eq!(rejected.approval.status, ApprovalStatus::Rejected);
        assert_eq!(rejected.approval.note.as_deref(), Some("off-brand"));

        let revise = request_revision(make_post(), "reviewer", "tighten the hook");
        assert_eq!(revise.approval.status, ApprovalStatus::NeedsRevision);
    }

    #[test]
    fn test_content_edit_resets_approved_to_pending() {
        let post = approve(make_post(), "reviewer");
        let edited = edit_content(
            post,
            ContentEdit { hook: Some("New hook".into()), ..Default::default() },
            "author",
        );
        assert_eq!(edited.approval.status, ApprovalStatus::Pending);
        assert_eq!(edited.content.hook, "New hook");
        assert_eq!(edited.content.body, "A body"); // untouched field survives
    }

    #[test]
    fn test_timing_edit_keeps_approval() {
        let post = approve(make_post(), "reviewer");
        let edited = edit_timing(
            post,
            NaiveDate::from_ymd_opt(2026, 9, 3).unwrap(),
            "18:00",
            "author",
        );
        assert_eq!(edited.approval.status, ApprovalStatus::Approved);
        assert_eq!(edited.scheduled_time, "18:00");
        assert_eq!(edited.approval.revisions.last().unwrap().change_type, "timing");
    }

    #[test]
    fn test_platform_edit_resets_and_logs() {
        let post = approve(make_post(), "reviewer");
        let edited = edit_platforms(post, vec!["instagram".into(), "tiktok".into()], "author");

        assert_eq!(edited.approval.status, ApprovalStatus::Pending);
        let last = edited.approval.revisions.last().unwrap();
        assert_eq!(last.change_type, "platform");
        assert_eq!(last.after.as_deref(), Some("instagram,tiktok"));
    }

    #[test]
    fn test_edit_returns_needs_revision_to_pending() {
        let post = request_revision(make_post(), "reviewer", "fix tone");
        let edited = edit_content(
            post,
            ContentEdit { body: Some("Better body".into()), ..Default::default() },
            "author",
        );
        assert_eq!(edited.approval.status, ApprovalStatus::Pending);
    }

    #[test]
    fn test_revision_history_is_append_only() {
        let mut post = make_post();
        post = approve(post, "a");
        post = edit_content(
            post,
            ContentEdit { hook: Some("v2".into()), ..Default::default() },
            "b",
        );
        post = approve(post, "a");
        assert_eq!(post.approval.revisions.len(), 3);
        assert_eq!(post.approval.revisions[0].change_type, "approval");
        assert_eq!(post.approval.revisions[1].change_type, "content");
        assert_eq!(post.approval.revisions[2].change_type, "approval");
    }

    fn make_calendar(posts: usize) -> Calendar {
        let mut cal = Calendar::new("camp-1", 5, vec!["instagram".into()]);
        for day in 0..posts {
            let mut post = make_post();
            post.day_index = day as u32 % 5;
            post.calendar_id = cal.id.clone();
            cal.posts.push(post);
        }
        cal.recompute_stats();
        cal
    }

    #[test]
    fn test_bulk_approve_touches_only_named_ids() {
        let cal = make_calendar(4);
        let ids = vec![cal.posts[0].id.clone(), cal.posts[2].id.clone()];
        let cal = bulk_approve(cal, &ids, "reviewer");

        assert_eq!(cal.stats.approved_count, 2);
        assert_eq!(cal.posts[1].approval.status, ApprovalStatus::Pending);
        assert_eq!(cal.status, CalendarStatus::InReview);
        assert!((cal.approval_rate() - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_bulk_approve_all_moves_calendar_to_approved() {
        let cal = make_calendar(3);
        let ids: Vec<String> = cal.posts.iter().map(|p| p.id.clone()).collect();
        let cal = bulk_approve(cal, &ids, "reviewer");
        assert_eq!(cal.status, CalendarStatus::Approved);
    }

    #[test]
    fn test_auto_approve_respects_threshold_and_identity() {
        let mut cal = make_calendar(3);
        cal.posts[0].generation.quality_score = 90.0;
        cal.posts[1].generation.quality_score = 60.0;
        cal.posts[2].generation.quality_score = 95.0;
        // Past-dated posts fail pre-approval validation, so push dates out.
        for post in &mut cal.posts {
            post.scheduled_date = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
        }

        let (cal, approved) = auto_approve(cal, 80.0, "+00:00");
        assert_eq!(approved, 2);
        assert_eq!(cal.posts[0].approval.acted_by.as_deref(), Some(AUTO_APPROVER));
        assert_eq!(cal.posts[1].approval.status, ApprovalStatus::Pending);
    }

    #[test]
    fn test_progress_counts() {
        let mut cal = make_calendar(4);
        cal.posts[0] = approve(cal.posts[0].clone(), "r");
        cal.posts[1] = reject(cal.posts[1].clone(), "r", "nope");
        cal.posts[2] = request_revision(cal.posts[2].clone(), "r", "rework");

        let report = progress(&cal);
        assert_eq!(report.total, 4);
        assert_eq!(report.approved, 1);
        assert_eq!(report.rejected, 1);
        assert_eq!(report.needs_revision, 1);
        assert_eq!(report.pending, 1);
        assert!((report.approval_rate - 0.25).abs() < f32::EPSILON);
    }
}
