//! Calendar conflict validation.
//!
//! Issues block approval-readiness (duplicate content on the same
//! platform+day, platform daily cap exceeded); warnings don't (posts
//! closer together than the platform's minimum gap).

use serde::Serialize;
use std::collections::HashMap;

use postflow_core::{CapabilityTable, Content, Post};

/// Blocking conflict.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationIssue {
    pub message: String,
    pub platform: String,
    pub day_index: u32,
}

/// Non-blocking conflict.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationWarning {
    pub message: String,
    pub platform: String,
}

/// Result of validating a calendar's posts.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub issues: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationWarning>,
    /// 100 − 20×issues − 5×warnings, clamped to [0, 100].
    pub score: u8,
}

/// Cheap content-similarity key: lower-cased, whitespace-stripped
/// hook+body+cta truncated to 50 chars. A prefix heuristic, not a hash:
/// texts that only diverge after the prefix collide.
pub fn fingerprint(content: &Content) -> String {
    let joined = format!("{}{}{}", content.hook, content.body, content.cta);
    joined
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .take(50)
        .collect()
}

/// Validate a set of posts for scheduling conflicts. Pure and idempotent:
/// identical input yields an identical report.
pub fn validate_calendar(posts: &[Post], caps: &CapabilityTable) -> ValidationReport {
    let mut issues = Vec::new();
    let mut warnings = Vec::new();

    // Group post indices by (platform, day).
    let mut by_platform_day: HashMap<(String, u32), Vec<usize>> = HashMap::new();
    for (idx, post) in posts.iter().enumerate() {
        for platform in &post.platforms {
            by_platform_day
                .entry((platform.clone(), post.day_index))
                .or_default()
                .push(idx);
        }
    }

    let mut groups: Vec<(&(String, u32), &Vec<usize>)> = by_platform_day.iter().collect();
    groups.sort_by_key(|(key, _)| (*key).clone());

    for ((platform, day), indices) in groups {
        let max_per_day = caps.get(platform).map(|c| c.max_posts_per_day).unwrap_or(usize::MAX);
        if indices.len() > max_per_day {
            issues.push(ValidationIssue {
                message: format!(
                    "{} posts on {platform} day {day} exceeds the platform max of {max_per_day}",
                    indices.len()
                ),
                platform: platform.clone(),
                day_index: *day,
            });
        }

        let mut seen = HashMap::new();
        for &idx in indices {
            let fp = fingerprint(&posts[idx].content);
            if let Some(first) = seen.get(&fp) {
                issues.push(ValidationIssue {
                    message: format!(
                        "duplicate content on {platform} day {day} (posts {first} and {})",
                        posts[idx].id
                    ),
                    platform: platform.clone(),
                    day_index: *day,
                });
            } else {
                seen.insert(fp, posts[idx].id.clone());
            }
        }
    }

    // Gap check: same platform, sorted by scheduled datetime.
    let mut by_platform: HashMap<&str, Vec<&Post>> = HashMap::new();
    for post in posts {
        for platform in &post.platforms {
            by_platform.entry(platform.as_str()).or_default().push(post);
        }
    }
    let mut platform_names: Vec<&str> = by_platform.keys().copied().collect();
    platform_names.sort();

    for platform in platform_names {
        let Some(min_gap) = caps.get(platform).map(|c| c.min_gap_minutes) else {
            continue;
        };
        let mut scheduled: Vec<(&Post, chrono::NaiveDateTime)> = by_platform[platform]
            .iter()
            .filter_map(|p| p.scheduled_naive().map(|dt| (*p, dt)))
            .collect();
        scheduled.sort_by_key(|(_, dt)| *dt);

        for pair in scheduled.windows(2) {
            let gap = (pair[1].1 - pair[0].1).num_minutes();
            if gap < min_gap {
                warnings.push(ValidationWarning {
                    message: format!(
                        "posts {} and {} on {platform} are {gap} min apart (min gap {min_gap})",
                        pair[0].0.id, pair[1].0.id
                    ),
                    platform: platform.to_string(),
                });
            }
        }
    }

    let score = (100i64 - 20 * issues.len() as i64 - 5 * warnings.len() as i64).clamp(0, 100) as u8;
    tracing::debug!(
        "🔍 Validated {} posts: {} issues, {} warnings (score {score})",
        posts.len(),
        issues.len(),
        warnings.len()
    );
    ValidationReport { is_valid: issues.is_empty(), issues, warnings, score }
}
