//! File-based calendar store — lightweight persistence.
//! Calendars saved as one JSON file each — human-readable, git-friendly.

use std::path::{Path, PathBuf};

use crate::error::{PostflowError, Result};
use crate::model::Calendar;

/// File-based calendar store.
pub struct CalendarStore {
    path: PathBuf,
}

impl CalendarStore {
    /// Create a store rooted at the given directory.
    pub fn new(dir: &Path) -> Self {
        std::fs::create_dir_all(dir).ok();
        Self { path: dir.to_path_buf() }
    }

    /// Default store path (~/.postflow/calendars).
    pub fn default_path() -> PathBuf {
        crate::config::PostflowConfig::home_dir().join("calendars")
    }

    fn file_for(&self, calendar_id: &str) -> PathBuf {
        self.path.join(format!("{calendar_id}.json"))
    }

    /// Save a calendar to disk.
    pub fn save(&self, calendar: &Calendar) -> Result<()> {
        let file = self.file_for(&calendar.id);
        let json = serde_json::to_string_pretty(calendar)
            .map_err(|e| PostflowError::Config(format!("Serialize error: {e}")))?;
        std::fs::write(&file, &json)?;
        tracing::debug!("💾 Saved calendar {} ({} posts)", calendar.id, calendar.posts.len());
        Ok(())
    }

    /// Load a calendar by id.
    pub fn load(&self, calendar_id: &str) -> Result<Calendar> {
        let file = self.file_for(calendar_id);
        let json = std::fs::read_to_string(&file).map_err(|e| {
            PostflowError::Config(format!("Calendar {calendar_id} not found: {e}"))
        })?;
        serde_json::from_str(&json)
            .map_err(|e| PostflowError::Config(format!("Failed to parse {calendar_id}.json: {e}")))
    }

    /// List stored calendar ids.
    pub fn list(&self) -> Vec<String> {
        let mut ids = Vec::new();
        if let Ok(entries) = std::fs::read_dir(&self.path) {
            for entry in entries.flatten() {
                let name = entry.file_name().to_string_lossy().to_string();
                if let Some(id) = name.strip_suffix(".json") {
                    ids.push(id.to_string());
                }
            }
        }
        ids.sort();
        ids
    }
}
