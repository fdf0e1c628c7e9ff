//! Collaborator traits — the seams to the outside world.
//!
//! The content producer fills in hook/body/cta text (template- or
//! LLM-backed); the scheduling sink is the external provider that actually
//! publishes posts. Both are trait objects so tests can inject fakes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::Result;
use crate::model::ContentType;

/// What the generator asks the producer for, one post at a time.
#[derive(Debug, Clone)]
pub struct ProduceRequest {
    pub pillar: String,
    pub day_index: u32,
    pub hook_type: String,
    pub platform: String,
    pub content_type: ContentType,
}

/// Raw content returned by a producer.
#[derive(Debug, Clone)]
pub struct ProducedContent {
    pub hook: String,
    pub body: String,
    pub cta: String,
    pub hashtags: Vec<String>,
}

/// Opaque content producer. Assumed to eventually succeed; the generator
/// falls back to templates when it doesn't.
#[async_trait]
pub trait ContentProducer: Send + Sync {
    async fn produce(&self, request: &ProduceRequest) -> Result<ProducedContent>;
}

/// Request sent to the external scheduling provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleRequest {
    pub post_id: String,
    pub platforms: Vec<String>,
    pub content: SinkContent,
    /// Absolute, timezone-qualified datetime (RFC3339-style).
    pub scheduled_datetime: String,
    pub timezone: String,
    #[serde(default)]
    pub media_urls: Vec<String>,
}

/// Content payload in a sink request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkContent {
    pub hook: String,
    pub body: String,
    pub cta: String,
    pub hashtags: Vec<String>,
    /// Platform → pre-adapted text, when variants exist.
    #[serde(default)]
    pub variants: HashMap<String, String>,
}

/// Response from the scheduling provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleResponse {
    pub success: bool,
    pub post_id: String,
    /// Platform → per-platform result.
    pub platforms: HashMap<String, PlatformResult>,
    /// Echo of the scheduled datetime, as the provider recorded it.
    #[serde(default)]
    pub scheduled_at: Option<String>,
}

/// Per-platform slice of a sink response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformResult {
    pub success: bool,
    #[serde(default)]
    pub external_id: Option<String>,
    #[serde(default)]
    pub scheduled_at: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// External scheduling provider.
///
/// Errors are free-text messages; the dispatch engine's retry classifier
/// inspects them for retryable signatures since the provider exposes no
/// structured codes.
#[async_trait]
pub trait SchedulingSink: Send + Sync {
    async fn schedule(&self, request: &ScheduleRequest) -> std::result::Result<ScheduleResponse, String>;

    /// Cancel previously scheduled platform posts by external id.
    async fn cancel(&self, post_id: &str, external_ids: &[String]) -> std::result::Result<(), String>;
}
