//! The content calendar data model.
//!
//! A `Calendar` owns an ordered list of `Post`s. Posts are created once by
//! the generator and then evolve through approval and scheduling — they are
//! never deleted. Revision and dispatch-attempt logs are append-only so the
//! full review/dispatch history survives as an audit trail.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A multi-day, multi-platform content plan for one campaign.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Calendar {
    pub id: String,
    pub campaign_id: String,
    /// Plan length in days (5–14).
    pub duration_days: u32,
    pub platforms: Vec<String>,
    pub posts: Vec<Post>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    pub stats: CalendarStats,
    pub status: CalendarStatus,
    pub created_at: DateTime<Utc>,
}

/// Calendar lifecycle status, derived from its posts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalendarStatus {
    Draft,
    InReview,
    Approved,
    Scheduled,
}

/// Aggregate counters over a calendar's posts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CalendarStats {
    pub total_posts: usize,
    pub posts_by_platform: HashMap<String, usize>,
    pub posts_by_type: HashMap<String, usize>,
    /// Indexed by day (0..duration).
    pub posts_by_day: Vec<usize>,
    pub approved_count: usize,
    pub scheduled_count: usize,
}

/// One scheduled content item, possibly fanned out to multiple platforms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub calendar_id: String,
    /// 0-based day offset within the calendar.
    pub day_index: u32,
    pub scheduled_date: NaiveDate,
    /// Local time-of-day, "HH:MM".
    pub scheduled_time: String,
    pub platforms: Vec<String>,
    pub content_type: ContentType,
    pub content: Content,
    pub orchestration: Orchestration,
    pub approval: Approval,
    pub scheduling: Scheduling,
    pub generation: GenerationMeta,
    pub status: PostStatus,
}

/// Overall post status (coarse view across approval + scheduling).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostStatus {
    Draft,
    InReview,
    Approved,
    Rejected,
    Scheduled,
}

/// Content format for a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Video,
    Image,
    Carousel,
    Story,
    Text,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Video => "video",
            ContentType::Image => "image",
            ContentType::Carousel => "carousel",
            ContentType::Story => "story",
            ContentType::Text => "text",
        }
    }

    /// Formats that need an attached media asset to make sense.
    pub fn is_visual(&self) -> bool {
        !matches!(self, ContentType::Text)
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Base content plus per-platform variants.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Content {
    pub hook: String,
    pub body: String,
    pub cta: String,
    /// Ordered — trimming preserves the front of the list.
    pub hashtags: Vec<String>,
    #[serde(default)]
    pub media_urls: Vec<String>,
    /// Platform → adapted variant.
    #[serde(default)]
    pub variants: HashMap<String, Variant>,
}

/// A platform-specific adaptation of the base content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variant {
    pub text: String,
    pub hashtags: Vec<String>,
    /// Inferred platform-native fields (category, reel flag, permissions…).
    #[serde(default)]
    pub platform_fields: serde_json::Value,
}

/// Cross-platform coordination strategy and its adaptation audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Orchestration {
    pub platforms: Vec<String>,
    pub strategy: CrossPlatformStrategy,
    pub timing: TimingStrategy,
    #[serde(default)]
    pub adaptations: Vec<AdaptationRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossPlatformStrategy {
    Identical,
    Adapted,
    Unique,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimingStrategy {
    Simultaneous,
    Staggered,
    Sequential,
}

/// One recorded change made while adapting content for a platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdaptationRecord {
    pub platform: String,
    pub description: String,
    pub kind: AdaptationKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdaptationKind {
    Shortened,
    Reformatted,
}

/// Human-review state for a post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Approval {
    pub status: ApprovalStatus,
    /// Who last acted (approver/rejecter/editor).
    pub acted_by: Option<String>,
    pub acted_at: Option<DateTime<Utc>>,
    /// Rejection reason or revision note.
    pub note: Option<String>,
    /// Append-only review history.
    #[serde(default)]
    pub revisions: Vec<Revision>,
}

impl Default for Approval {
    fn default() -> Self {
        Self {
            status: ApprovalStatus::Pending,
            acted_by: None,
            acted_at: None,
            note: None,
            revisions: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
    NeedsRevision,
}

/// One entry in a post's append-only revision history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Revision {
    pub at: DateTime<Utc>,
    pub actor: String,
    /// "approval", "rejection", "revision_request", "content", "timing", "platform".
    pub change_type: String,
    pub before: Option<String>,
    pub after: Option<String>,
    pub note: Option<String>,
}

/// Dispatch state for a post.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scheduling {
    /// Aggregate success of the last sink call.
    pub scheduled: bool,
    /// Platform → recorded outcome.
    #[serde(default)]
    pub outcomes: HashMap<String, PlatformOutcome>,
    /// Append-only dispatch attempt log.
    #[serde(default)]
    pub attempts: Vec<DispatchAttempt>,
}

/// Per-platform dispatch outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PlatformOutcome {
    Pending,
    Scheduled { external_id: String },
    Failed { error: String },
}

/// One dispatch attempt, success or failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchAttempt {
    pub number: u32,
    pub at: DateTime<Utc>,
    pub success: bool,
    pub error: Option<String>,
}

/// How the post came to be — useful for review triage and auto-approval.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationMeta {
    pub pillar: String,
    pub hook_type: String,
    /// 0–100 heuristic content quality score.
    pub quality_score: f32,
    /// True when the content producer failed and the template fallback filled in.
    pub used_fallback: bool,
}

impl Post {
    /// Fresh post in pending/draft state.
    pub fn new(calendar_id: &str, day_index: u32, scheduled_date: NaiveDate) -> Self {
        Self {
            id: format!("post-{}", uuid::Uuid::new_v4()),
            calendar_id: calendar_id.to_string(),
            day_index,
            scheduled_date,
            scheduled_time: "12:00".into(),
            platforms: Vec::new(),
            content_type: ContentType::Image,
            content: Content::default(),
            orchestration: Orchestration {
                platforms: Vec::new(),
                strategy: CrossPlatformStrategy::Identical,
                timing: TimingStrategy::Simultaneous,
                adaptations: Vec::new(),
            },
            approval: Approval::default(),
            scheduling: Scheduling::default(),
            generation: GenerationMeta::default(),
            status: PostStatus::Draft,
        }
    }

    /// Naive scheduled datetime (date + local time-of-day).
    pub fn scheduled_naive(&self) -> Option<chrono::NaiveDateTime> {
        let time = chrono::NaiveTime::parse_from_str(&self.scheduled_time, "%H:%M").ok()?;
        Some(self.scheduled_date.and_time(time))
    }

    /// True if any dispatch attempt failed and the post is still unscheduled.
    pub fn has_failed_dispatch(&self) -> bool {
        !self.scheduling.scheduled && self.scheduling.attempts.iter().any(|a| !a.success)
    }

    /// Sync the coarse post status from approval + scheduling state.
    pub fn sync_status(&mut self) {
        self.status = if self.scheduling.scheduled {
            PostStatus::Scheduled
        } else {
            match self.approval.status {
                ApprovalStatus::Approved => PostStatus::Approved,
                ApprovalStatus::Rejected => PostStatus::Rejected,
                ApprovalStatus::Pending => PostStatus::Draft,
                ApprovalStatus::NeedsRevision => PostStatus::InReview,
            }
        };
    }
}

impl Calendar {
    /// Empty calendar shell; posts and stats are filled by the generator.
    pub fn new(campaign_id: &str, duration_days: u32, platforms: Vec<String>) -> Self {
        Self {
            id: format!("cal-{}", uuid::Uuid::new_v4()),
            campaign_id: campaign_id.to_string(),
            duration_days,
            platforms,
            posts: Vec::new(),
            metadata: HashMap::new(),
            stats: CalendarStats::default(),
            status: CalendarStatus::Draft,
            created_at: Utc::now(),
        }
    }

    /// Derive calendar status from its posts:
    /// scheduled if all scheduled; approved if all approved; in_review if
    /// any approved; else draft.
    pub fn recompute_status(&mut self) {
        if self.posts.is_empty() {
            self.status = CalendarStatus::Draft;
            return;
        }
        let all_scheduled = self.posts.iter().all(|p| p.scheduling.scheduled);
        let all_approved = self
            .posts
            .iter()
            .all(|p| p.approval.status == ApprovalStatus::Approved);
        let any_approved = self
            .posts
            .iter()
            .any(|p| p.approval.status == ApprovalStatus::Approved);
        self.status = if all_scheduled {
            CalendarStatus::Scheduled
        } else if all_approved {
            CalendarStatus::Approved
        } else if any_approved {
            CalendarStatus::InReview
        } else {
            CalendarStatus::Draft
        };
    }

    /// Recount aggregate statistics from the post list.
    pub fn recompute_stats(&mut self) {
        let mut stats = CalendarStats {
            total_posts: self.posts.len(),
            posts_by_day: vec![0; self.duration_days as usize],
            ..Default::default()
        };
        for post in &self.posts {
            for platform in &post.platforms {
                *stats.posts_by_platform.entry(platform.clone()).or_insert(0) += 1;
            }
            *stats
                .posts_by_type
                .entry(post.content_type.as_str().to_string())
                .or_insert(0) += 1;
            if let Some(slot) = stats.posts_by_day.get_mut(post.day_index as usize) {
                *slot += 1;
            }
            if post.approval.status == ApprovalStatus::Approved {
                stats.approved_count += 1;
            }
            if post.scheduling.scheduled {
                stats.scheduled_count += 1;
            }
        }
        self.stats = stats;
    }

    /// Fraction of posts approved, 0.0–1.0.
    pub fn approval_rate(&self) -> f32 {
        if self.posts.is_empty() {
            return 0.0;
        }
        let approved = self
            .posts
            .iter()
            .filter(|p| p.approval.status == ApprovalStatus::Approved)
            .count();
        approved as f32 / self.posts.len() as f32
    }
}
