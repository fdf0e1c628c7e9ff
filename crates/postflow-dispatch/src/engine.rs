//! Dispatch engine — sends approved posts to the sink with retries.
//!
//! Each post is an independent asynchronous unit: a bounded pool caps
//! concurrent sink calls, retries within one post are strictly sequential,
//! and failures are converted to results so a bulk call always returns a
//! full per-post result set even under total failure.

use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::collections::HashMap;

use postflow_core::{
    ApprovalStatus, Calendar, DispatchAttempt, PlatformOutcome, PostflowConfig, PostflowError,
    Post, Result, ScheduleRequest, ScheduleResponse, SchedulingSink, SinkContent,
};

use crate::retry::is_retryable;

/// Outcome of dispatching one post.
#[derive(Debug, Clone)]
pub struct DispatchResult {
    pub post: Post,
    pub success: bool,
    pub error: Option<String>,
}

/// Aggregate outcome of a calendar-level dispatch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DispatchSummary {
    pub attempted: usize,
    pub scheduled: usize,
    pub failed: usize,
}

/// Build the sink request for a post.
pub fn build_request(post: &Post, config: &PostflowConfig) -> ScheduleRequest {
    let variants = post
        .content
        .variants
        .iter()
        .map(|(platform, variant)| (platform.clone(), variant.text.clone()))
        .collect();
    ScheduleRequest {
        post_id: post.id.clone(),
        platforms: post.platforms.clone(),
        content: SinkContent {
            hook: post.content.hook.clone(),
            body: post.content.body.clone(),
            cta: post.content.cta.clone(),
            hashtags: post.content.hashtags.clone(),
            variants,
        },
        scheduled_datetime: format!(
            "{}T{}:00{}",
            post.scheduled_date, post.scheduled_time, config.utc_offset
        ),
        timezone: config.timezone.clone(),
        media_urls: post.content.media_urls.clone(),
    }
}

/// Dispatch one approved post to the sink.
///
/// Fails with `PreconditionError` before any sink call if the post is not
/// approved — no attempt is recorded. All sink-side failures come back as
/// `Ok` with the failure captured in the returned post's scheduling state,
/// which is what keeps bulk dispatch total.
pub async fn schedule_post(
    post: &Post,
    sink: &dyn SchedulingSink,
    config: &PostflowConfig,
) -> Result<DispatchResult> {
    if post.approval.status != ApprovalStatus::Approved {
        return Err(PostflowError::Precondition(format!(
            "post {} is not approved (status: {:?})",
            post.id, post.approval.status
        )));
    }

    let mut updated = post.clone();
    let request = build_request(&updated, config);
    let max_attempts = config.dispatch.max_attempts.max(1);
    let mut last_error: Option<String> = None;

    for attempt in 1..=max_attempts {
        match sink.schedule(&request).await {
            Ok(response) => {
                record_attempt(&mut updated, attempt, response.success, None);
                apply_response(&mut updated, &response);
                if response.success {
                    updated.scheduling.scheduled = true;
                    updated.sync_status();
                    tracing::info!(
                        "📤 Post {} scheduled on {:?} (attempt {attempt})",
                        updated.id,
                        updated.platforms
                    );
                    return Ok(DispatchResult { post: updated, success: true, error: None });
                }
                // Structured failure from the sink — per-platform errors are
                // already recorded; not a transport error, so no retry.
                last_error = Some("sink reported failure".to_string());
                break;
            }
            Err(message) => {
                record_attempt(&mut updated, attempt, false, Some(message.clone()));
                let retryable = is_retryable(&message);
                if retryable && attempt < max_attempts {
                    let delay_ms = config.dispatch.retry_delay_ms * attempt as u64;
                    tracing::warn!(
                        "⚠️ Post {} attempt {attempt} failed ({message}) — retrying in {delay_ms}ms",
                        updated.id
                    );
                    tokio::time::sleep(std::time::Duration::from_millis(delay_ms)).await;
                    last_error = Some(message);
                    continue;
                }
                tracing::warn!(
                    "❌ Post {} failed permanently after attempt {attempt}: {message}",
                    updated.id
                );
                last_error = Some(message);
                break;
            }
        }
    }

    // Mark platforms that never got a recorded outcome as failed.
    let error = last_error.unwrap_or_else(|| "dispatch failed".to_string());
    for platform in &updated.platforms {
        let outcome = updated
            .scheduling
            .outcomes
            .entry(platform.clone())
            .or_insert(PlatformOutcome::Pending);
        if *outcome == PlatformOutcome::Pending {
            *outcome = PlatformOutcome::Failed { error: error.clone() };
        }
    }
    updated.scheduling.scheduled = false;
    updated.sync_status();
    Ok(DispatchResult { post: updated, success: false, error: Some(error) })
}

fn record_attempt(post: &mut Post, number: u32, success: bool, error: Option<String>) {
    post.scheduling.attempts.push(DispatchAttempt {
        number,
        at: chrono::Utc::now(),
        success,
        error,
    });
}

fn apply_response(post: &mut Post, response: &ScheduleResponse) {
    for platform in &post.platforms {
        let outcome = match response.platforms.get(platform) {
            Some(result) if result.success => PlatformOutcome::Scheduled {
                external_id: result.external_id.clone().unwrap_or_default(),
            },
            Some(result) => PlatformOutcome::Failed {
                error: result.error.clone().unwrap_or_else(|| "unknown error".into()),
            },
            None => PlatformOutcome::Failed { error: "no result from sink".into() },
        };
        post.scheduling.outcomes.insert(platform.clone(), outcome);
    }
}

async fn dispatch_posts(
    mut calendar: Calendar,
    sink: &dyn SchedulingSink,
    config: &PostflowConfig,
    eligible: Vec<Post>,
) -> (Calendar, DispatchSummary) {
    let mut summary = DispatchSummary { attempted: eligible.len(), ..Default::default() };

    let results: Vec<DispatchResult> = stream::iter(eligible.into_iter().map(|post| async move {
        match schedule_post(&post, sink, config).await {
            Ok(result) => result,
            // Eligibility is filtered above; convert a racing precondition
            // into a per-post failure rather than aborting the bulk call.
            Err(e) => DispatchResult { success: false, error: Some(e.to_string()), post },
        }
    }))
    .buffer_unordered(config.dispatch.max_concurrent.max(1))
    .collect()
    .await;

    let mut by_id: HashMap<String, DispatchResult> = results
        .into_iter()
        .map(|result| (result.post.id.clone(), result))
        .collect();

    for post in calendar.posts.iter_mut() {
        if let Some(result) = by_id.remove(&post.id) {
            if result.success {
                summary.scheduled += 1;
            } else {
                summary.failed += 1;
            }
            *post = result.post;
        }
    }

    calendar.recompute_stats();
    calendar.recompute_status();
    tracing::info!(
        "📦 Dispatch complete: {}/{} scheduled, {} failed",
        summary.scheduled,
        summary.attempted,
        summary.failed
    );
    (calendar, summary)
}

/// Dispatch every approved, unscheduled post in a calendar.
pub async fn schedule_calendar(
    calendar: Calendar,
    sink: &dyn SchedulingSink,
    config: &PostflowConfig,
) -> (Calendar, DispatchSummary) {
    let eligible: Vec<Post> = calendar
        .posts
        .iter()
        .filter(|p| p.approval.status == ApprovalStatus::Approved && !p.scheduling.scheduled)
        .cloned()
        .collect();
    dispatch_posts(calendar, sink, config, eligible).await
}

/// Redrive posts that have at least one failed attempt and remain
/// unscheduled.
pub async fn retry_failed_scheduling(
    calendar: Calendar,
    sink: &dyn SchedulingSink,
    config: &PostflowConfig,
) -> (Calendar, DispatchSummary) {
    let eligible: Vec<Post> = calendar
        .posts
        .iter()
        .filter(|p| p.approval.status == ApprovalStatus::Approved && p.has_failed_dispatch())
        .cloned()
        .collect();
    dispatch_posts(calendar, sink, config, eligible).await
}

/// Cancel a scheduled post at the sink and reset its platform outcomes.
pub async fn cancel_scheduled_post(post: &Post, sink: &dyn SchedulingSink) -> Result<Post> {
    if !post.scheduling.scheduled {
        return Err(PostflowError::Precondition(format!(
            "post {} is not scheduled",
            post.id
        )));
    }
    let external_ids: Vec<String> = post
        .scheduling
        .outcomes
        .values()
        .filter_map(|outcome| match outcome {
            PlatformOutcome::Scheduled { external_id } => Some(external_id.clone()),
            _ => None,
        })
        .collect();

    sink.cancel(&post.id, &external_ids)
        .await
        .map_err(|e| PostflowError::PermanentDispatch(format!("cancel failed: {e}")))?;

    let mut updated = post.clone();
    updated.scheduling.scheduled = false;
    for outcome in updated.scheduling.outcomes.values_mut() {
        *outcome = PlatformOutcome::Pending;
    }
    updated.sync_status();
    Ok(updated)
}

/// Cancel (if needed) and dispatch again at a new date/time.
pub async fn reschedule_post(
    post: &Post,
    new_date: chrono::NaiveDate,
    new_time: &str,
    sink: &dyn SchedulingSink,
    config: &PostflowConfig,
) -> Result<DispatchResult> {
    let current = if post.scheduling.scheduled {
        cancel_scheduled_post(post, sink).await?
    } else {
        post.clone()
    };
    // Timing edits keep approval intact, so the precondition still holds.
    let moved = postflow_approval::edit_timing(current, new_date, new_time, "scheduler");
    schedule_post(&moved, sink, config).await
}

/// One row in the operator triage list.
#[derive(Debug, Clone, Serialize)]
pub struct SchedulingFailure {
    pub post_id: String,
    pub platform: String,
    pub error: String,
    pub attempts: usize,
    pub last_attempt_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Calendar-level scheduling report.
#[derive(Debug, Clone, Serialize)]
pub struct SchedulingStatus {
    pub total: usize,
    pub scheduled: usize,
    pub pending: usize,
    /// 0.0–100.0.
    pub percent_scheduled: f32,
    pub failures: Vec<SchedulingFailure>,
}

/// Summarize scheduling progress and failures for operator triage.
pub fn scheduling_status(calendar: &Calendar) -> SchedulingStatus {
    let total = calendar.posts.len();
    let scheduled = calendar.posts.iter().filter(|p| p.scheduling.scheduled).count();
    let mut failures = Vec::new();

    for post in &calendar.posts {
        if !post.has_failed_dispatch() {
            continue;
        }
        let last_attempt_at = post.scheduling.attempts.last().map(|a| a.at);
        for (platform, outcome) in &post.scheduling.outcomes {
            if let PlatformOutcome::Failed { error } = outcome {
                failures.push(SchedulingFailure {
                    post_id: post.id.clone(),
                    platform: platform.clone(),
                    error: error.clone(),
                    attempts: post.scheduling.attempts.len(),
                    last_attempt_at,
                });
            }
        }
    }
    failures.sort_by(|a, b| a.post_id.cmp(&b.post_id).then(a.platform.cmp(&b.platform)));

    SchedulingStatus {
        total,
        scheduled,
        pending: total - scheduled,
        percent_scheduled: if total == 0 {
            0.0
        } else {
            scheduled as f32 * 100.0 / total as f32
        },
        failures,
    }
}
