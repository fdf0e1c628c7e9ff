//! PostFlow configuration — platform capability table + dispatch tuning.
//!
//! Every per-platform limit the engine consults (char limit, hashtag
//! limit, posts/day, minimum gap, optimal times, tone policy) lives here
//! so new platforms can be added without code changes.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{PostflowError, Result};

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostflowConfig {
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// UTC offset used to qualify scheduled datetimes (e.g. "+07:00").
    #[serde(default = "default_utc_offset")]
    pub utc_offset: String,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default = "CapabilityTable::defaults")]
    pub platforms: CapabilityTable,
}

fn default_timezone() -> String { "UTC".into() }
fn default_utc_offset() -> String { "+00:00".into() }

impl Default for PostflowConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            utc_offset: default_utc_offset(),
            dispatch: DispatchConfig::default(),
            platforms: CapabilityTable::defaults(),
        }
    }
}

impl PostflowConfig {
    /// Load config from the default path (~/.postflow/config.toml).
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| PostflowError::Config(format!("Failed to read config: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| PostflowError::Config(format!("Failed to parse config: {e}")))?;
        Ok(config)
    }

    /// Save config to the default path.
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| PostflowError::Config(format!("Failed to serialize config: {e}")))?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Get the PostFlow home directory.
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".postflow")
    }
}

/// Dispatch tuning — retry and concurrency limits for sink calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Max attempts per post (first try + retries).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Base backoff in milliseconds; actual delay is `retry_delay_ms × attempt`.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Cap on concurrent sink calls (the sink rate-limits aggressively).
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
    /// Base URL of the external scheduling provider.
    #[serde(default)]
    pub sink_url: String,
}

fn default_max_attempts() -> u32 { 3 }
fn default_retry_delay_ms() -> u64 { 1000 }
fn default_max_concurrent() -> usize { 3 }

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            max_concurrent: default_max_concurrent(),
            sink_url: String::new(),
        }
    }
}

/// Text policy applied when adapting content for a platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TonePolicy {
    /// No rewriting — memes and emoji welcome.
    Casual,
    /// Short-form video platform — also biases generation toward video.
    ShortForm,
    /// Strip emoji runs; biases generation toward text posts.
    Professional,
    /// Location listing (e.g. Google Business) — hashtags are meaningless.
    LocationListing,
}

/// Per-platform limits and scheduling hints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformCaps {
    pub char_limit: usize,
    pub hashtag_limit: usize,
    pub max_posts_per_day: usize,
    pub min_gap_minutes: i64,
    /// Preferred times-of-day ("HH:MM"), cycled per slot.
    pub optimal_times: Vec<String>,
    pub tone: TonePolicy,
}

/// Platform capability table — the single source of per-platform limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapabilityTable {
    entries: HashMap<String, PlatformCaps>,
}

impl CapabilityTable {
    /// Built-in table covering the launch platforms.
    pub fn defaults() -> Self {
        let mut entries = HashMap::new();
        entries.insert("instagram".into(), PlatformCaps {
            char_limit: 2200,
            hashtag_limit: 30,
            max_posts_per_day: 3,
            min_gap_minutes: 120,
            optimal_times: vec!["11:00".into(), "14:00".into(), "19:00".into()],
            tone: TonePolicy::Casual,
        });
        entries.insert("facebook".into(), PlatformCaps {
            char_limit: 63206,
            hashtag_limit: 10,
            max_posts_per_day: 4,
            min_gap_minutes: 90,
            optimal_times: vec!["09:00".into(), "13:00".into(), "20:00".into()],
            tone: TonePolicy::Casual,
        });
        entries.insert("tiktok".into(), PlatformCaps {
            char_limit: 2200,
            hashtag_limit: 8,
            max_posts_per_day: 4,
            min_gap_minutes: 60,
            optimal_times: vec!["12:00".into(), "18:00".into(), "21:00".into()],
            tone: TonePolicy::ShortForm,
        });
        entries.insert("linkedin".into(), PlatformCaps {
            char_limit: 3000,
            hashtag_limit: 5,
            max_posts_per_day: 2,
            min_gap_minutes: 240,
            optimal_times: vec!["08:00".into(), "12:00".into(), "17:00".into()],
            tone: TonePolicy::Professional,
        });
        entries.insert("twitter".into(), PlatformCaps {
            char_limit: 280,
            hashtag_limit: 5,
            max_posts_per_day: 5,
            min_gap_minutes: 30,
            optimal_times: vec!["09:00".into(), "12:00".into(), "17:00".into(), "20:00".into()],
            tone: TonePolicy::Casual,
        });
        entries.insert("google_business".into(), PlatformCaps {
            char_limit: 1500,
            hashtag_limit: 0,
            max_posts_per_day: 2,
            min_gap_minutes: 240,
            optimal_times: vec!["10:00".into(), "15:00".into()],
            tone: TonePolicy::LocationListing,
        });
        Self { entries }
    }

    /// Look up a platform's capabilities.
    pub fn get(&self, platform: &str) -> Option<&PlatformCaps> {
        self.entries.get(platform)
    }

    /// Register or replace a platform entry.
    pub fn insert(&mut self, platform: &str, caps: PlatformCaps) {
        self.entries.insert(platform.to_string(), caps);
    }

    /// All known platform names, sorted for stable output.
    pub fn platform_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort();
        names
    }

    /// The location-bound platform, if one is configured.
    pub fn location_platform(&self) -> Option<(&str, &PlatformCaps)> {
        self.entries
            .iter()
            .find(|(_, caps)| caps.tone == TonePolicy::LocationListing)
            .map(|(name, caps)| (name.as_str(), caps))
    }

    /// True if any of the given platforms is a short-form video platform.
    pub fn any_short_form(&self, platforms: &[String]) -> bool {
        platforms
            .iter()
            .any(|p| self.get(p).is_some_and(|c| c.tone == TonePolicy::ShortForm))
    }

    /// True if any of the given platforms is a professional network.
    pub fn any_professional(&self, platforms: &[String]) -> bool {
        platforms
            .iter()
            .any(|p| self.get(p).is_some_and(|c| c.tone == TonePolicy::Professional))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cover_launch_platforms() {
        let table = CapabilityTable::defaults();
        for name in ["instagram", "facebook", "tiktok", "linkedin", "twitter", "google_business"] {
            assert!(table.get(name).is_some(), "missing platform: {name}");
        }
    }

    #[test]
    fn test_location_platform() {
        let table = CapabilityTable::defaults();
        let (name, caps) = table.location_platform().unwrap();
        assert_eq!(name, "google_business");
        assert_eq!(caps.hashtag_limit, 0);
    }

    #[test]
    fn test_tone_categories() {
        let table = CapabilityTable::defaults();
        assert!(table.any_short_form(&["tiktok".into(), "facebook".into()]));
        assert!(!table.any_short_form(&["facebook".into()]));
        assert!(table.any_professional(&["linkedin".into()]));
    }

    #[test]
    fn test_extensible() {
        let mut table = CapabilityTable::defaults();
        table.insert("pinterest", PlatformCaps {
            char_limit: 500,
            hashtag_limit: 20,
            max_posts_per_day: 5,
            min_gap_minutes: 30,
            optimal_times: vec!["15:00".into()],
            tone: TonePolicy::Casual,
        });
        assert_eq!(table.get("pinterest").unwrap().char_limit, 500);
    }

    #[test]
    fn test_config_roundtrip_toml() {
        let config = PostflowConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: PostflowConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.dispatch.max_attempts, 3);
        assert!(parsed.platforms.get("instagram").is_some());
    }
}
