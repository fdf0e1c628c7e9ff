//! HTTP client for the external scheduling provider.
//!
//! Thin JSON-over-HTTP client behind the `SchedulingSink` trait so the
//! dispatch engine stays deterministically testable with a fake sink.

use async_trait::async_trait;
use std::time::Duration;

use postflow_core::{ScheduleRequest, ScheduleResponse, SchedulingSink};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Real sink client — POSTs schedule/cancel requests to the provider.
pub struct HttpSink {
    base_url: String,
    client: reqwest::Client,
}

impl HttpSink {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl SchedulingSink for HttpSink {
    async fn schedule(&self, request: &ScheduleRequest) -> Result<ScheduleResponse, String> {
        let url = format!("{}/v1/schedule", self.base_url);
        let resp = self
            .client
            .post(&url)
            .json(request)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| format!("network error: {e}"))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(format!("sink error {status}: {body}"));
        }

        resp.json::<ScheduleResponse>()
            .await
            .map_err(|e| format!("invalid sink response: {e}"))
    }

    async fn cancel(&self, post_id: &str, external_ids: &[String]) -> Result<(), String> {
        let url = format!("{}/v1/cancel", self.base_url);
        let resp = self
            .client
            .post(&url)
            .json(&serde_json::json!({
                "postId": post_id,
                "externalIds": external_ids,
            }))
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| format!("network error: {e}"))?;

        if resp.status().is_success() {
            tracing::info!("🗑️ Cancelled scheduled post {post_id} ({} platform entries)", external_ids.len());
            Ok(())
        } else {
            let status = resp.status();
            Err(format!("sink error {status}"))
        }
    }
}
