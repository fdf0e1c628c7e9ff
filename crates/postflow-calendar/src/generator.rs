//! Calendar generation — the capacity-constrained distribution algorithm.
//!
//! From a campaign brief: compute the date range, split the post budget
//! across platforms and content types, rotate hooks and optimal times,
//! invoke the content producer per post, and assemble a draft calendar.
//!
//! ```text
//! CampaignBrief
//!   → platform quotas (≈15% reserved for a location platform, cap 4)
//!   → content-type quotas (35/25/15/15/10 mix, nudged per platform set)
//!   → per slot: round-robin platform/type, LRU hook, optimal time
//!   → producer fill-in (template fallback on error)
//!   → draft Calendar + aggregate stats
//! ```

use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use postflow_core::{
    Calendar, CalendarStatus, CapabilityTable, ContentProducer, ContentType,
    CrossPlatformStrategy, PostflowError, Post, ProduceRequest, Result, TimingStrategy,
};
use postflow_orchestrator::{adapt_for_platform, detect_adaptations};

use crate::producer::TemplateProducer;

/// Allowed calendar length in days.
pub const MIN_DURATION_DAYS: u32 = 5;
pub const MAX_DURATION_DAYS: u32 = 14;

/// Share of the post budget reserved for a location-bound platform.
const LOCATION_SHARE: f32 = 0.15;
const LOCATION_CAP: usize = 4;

/// Target content-type mix before platform nudges.
const TARGET_MIX: &[(ContentType, f32)] = &[
    (ContentType::Video, 0.35),
    (ContentType::Image, 0.25),
    (ContentType::Carousel, 0.15),
    (ContentType::Story, 0.15),
    (ContentType::Text, 0.10),
];

/// Who the campaign is for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessContext {
    pub name: String,
    pub industry: String,
    /// Local businesses get a slice of the budget on the location platform.
    #[serde(default)]
    pub is_local: bool,
}

/// What the campaign talks about.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentStrategy {
    pub pillars: Vec<String>,
    pub hook_types: Vec<String>,
}

impl Default for ContentStrategy {
    fn default() -> Self {
        Self {
            pillars: vec!["general".into()],
            hook_types: vec![
                "question".into(),
                "statistic".into(),
                "story".into(),
                "tip".into(),
                "behind_the_scenes".into(),
            ],
        }
    }
}

/// How often to post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostingFrequency {
    Conservative,
    Moderate,
    Aggressive,
}

impl PostingFrequency {
    pub fn posts_per_day(&self) -> usize {
        match self {
            PostingFrequency::Conservative => 1,
            PostingFrequency::Moderate => 2,
            PostingFrequency::Aggressive => 3,
        }
    }
}

impl std::str::FromStr for PostingFrequency {
    type Err = PostflowError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "conservative" => Ok(PostingFrequency::Conservative),
            "moderate" => Ok(PostingFrequency::Moderate),
            "aggressive" => Ok(PostingFrequency::Aggressive),
            other => Err(PostflowError::Validation(format!(
                "unknown posting frequency: {other}"
            ))),
        }
    }
}

/// Everything the generator needs to build a calendar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignBrief {
    pub campaign_id: String,
    /// 5–14 days.
    pub duration_days: u32,
    /// 2–3 platforms, in priority order.
    pub platforms: Vec<String>,
    pub business: BusinessContext,
    #[serde(default)]
    pub strategy: ContentStrategy,
    pub frequency: PostingFrequency,
    /// First calendar day; defaults to tomorrow.
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
}

/// Build a draft calendar from a brief.
///
/// The only failure modes are request validation — producer errors are
/// absorbed by the template fallback.
pub async fn generate_calendar(
    brief: &CampaignBrief,
    caps: &CapabilityTable,
    producer: &dyn ContentProducer,
) -> Result<Calendar> {
    validate_brief(brief, caps)?;

    let ppd = brief.frequency.posts_per_day();
    let total = brief.duration_days as usize * ppd;
    let start_date = brief
        .start_date
        .unwrap_or_else(|| Utc::now().date_naive() + Duration::days(1));

    let (rotation, mut platform_quota) = platform_quotas(brief, caps, total);
    let (type_order, mut type_quota) = content_type_quotas(caps, &rotation, total);

    let strategy = if brief.strategy.pillars.is_empty() || brief.strategy.hook_types.is_empty() {
        ContentStrategy {
            pillars: if brief.strategy.pillars.is_empty() {
                ContentStrategy::default().pillars
            } else {
                brief.strategy.pillars.clone()
            },
            hook_types: if brief.strategy.hook_types.is_empty() {
                ContentStrategy::default().hook_types
            } else {
                brief.strategy.hook_types.clone()
            },
        }
    } else {
        brief.strategy.clone()
    };

    let mut hook_rotation = HookRotation::new(&strategy.hook_types);
    let fallback = TemplateProducer::new();

    let mut calendar = Calendar::new(&brief.campaign_id, brief.duration_days, rotation.clone());
    calendar.metadata.insert("business".into(), brief.business.name.clone());
    calendar.metadata.insert("industry".into(), brief.business.industry.clone());
    calendar
        .metadata
        .insert("frequency".into(), format!("{:?}", brief.frequency).to_lowercase());

    for day in 0..brief.duration_days {
        for slot in 0..ppd {
            let index = day as usize * ppd + slot;
            let platform = pick_round_robin(&rotation, &mut platform_quota, index);
            let content_type = pick_round_robin(&type_order, &mut type_quota, index);
            let hook_type = hook_rotation.next(index);
            let pillar = strategy.pillars[index % strategy.pillars.len()].clone();

            let mut post = Post::new(&calendar.id, day, start_date + Duration::days(day as i64));
            post.platforms = vec![platform.clone()];
            post.content_type = content_type;
            post.scheduled_time = optimal_time(caps, &platform, slot);

            let request = ProduceRequest {
                pillar: pillar.clone(),
                day_index: day,
                hook_type: hook_type.clone(),
                platform: platform.clone(),
                content_type,
            };
            let (produced, used_fallback) = match producer.produce(&request).await {
                Ok(content) => (content, false),
                Err(e) => {
                    tracing::warn!(
                        "⚠️ Producer failed for day {day} slot {slot}: {e} — using template fallback"
                    );
                    (fallback.render(&request), true)
                }
            };
            post.content.hook = produced.hook;
            post.content.body = produced.body;
            post.content.cta = produced.cta;
            post.content.hashtags = produced.hashtags;

            // Variant generation folds into generation: adapt per target
            // platform and record every change for the reviewer.
            post.orchestration.platforms = post.platforms.clone();
            post.orchestration.timing = if ppd > 1 {
                TimingStrategy::Staggered
            } else {
                TimingStrategy::Simultaneous
            };
            for target in post.platforms.clone() {
                if let Some(platform_caps) = caps.get(&target) {
                    let variant =
                        adapt_for_platform(&post.content, &target, platform_caps, content_type);
                    let records =
                        detect_adaptations(&post.content, &target, &variant, platform_caps);
                    post.orchestration.adaptations.extend(records);
                    post.content.variants.insert(target, variant);
                }
            }
            post.orchestration.strategy = if post.orchestration.adaptations.is_empty() {
                CrossPlatformStrategy::Identical
            } else {
                CrossPlatformStrategy::Adapted
            };

            post.generation.pillar = pillar;
            post.generation.hook_type = hook_type;
            post.generation.used_fallback = used_fallback;
            post.generation.quality_score = quality_score(&post, used_fallback);

            calendar.posts.push(post);
        }
    }

    calendar.recompute_stats();
    calendar.status = CalendarStatus::Draft;

    tracing::info!(
        "📅 Generated calendar {} — {} posts over {} days on {:?}",
        calendar.id,
        calendar.posts.len(),
        calendar.duration_days,
        calendar.platforms
    );
    Ok(calendar)
}

fn validate_brief(brief: &CampaignBrief, caps: &CapabilityTable) -> Result<()> {
    if !(MIN_DURATION_DAYS..=MAX_DURATION_DAYS).contains(&brief.duration_days) {
        return Err(PostflowError::Validation(format!(
            "duration must be {MIN_DURATION_DAYS}-{MAX_DURATION_DAYS} days, got {}",
            brief.duration_days
        )));
    }
    if !(2..=3).contains(&brief.platforms.len()) {
        return Err(PostflowError::Validation(format!(
            "expected 2-3 platforms, got {}",
            brief.platforms.len()
        )));
    }
    for platform in &brief.platforms {
        if caps.get(platform).is_none() {
            return Err(PostflowError::Validation(format!(
                "unknown platform: {platform}"
            )));
        }
    }
    Ok(())
}

/// Split the post budget across platforms: ≈15% (cap 4) reserved for a
/// location platform when the business is local, the rest split evenly
/// with remainder units going to earliest-listed platforms.
fn platform_quotas(
    brief: &CampaignBrief,
    caps: &CapabilityTable,
    total: usize,
) -> (Vec<String>, HashMap<String, usize>) {
    let mut rotation = brief.platforms.clone();
    let mut quotas = HashMap::new();

    let location = if brief.business.is_local {
        caps.location_platform()
            .map(|(name, _)| name.to_string())
            .filter(|name| !rotation.contains(name))
    } else {
        None
    };

    let reserved = location
        .as_ref()
        .map(|_| {
            let share = (total as f32 * LOCATION_SHARE).round() as usize;
            share.clamp(1, LOCATION_CAP)
        })
        .unwrap_or(0);

    let remaining = total - reserved;
    let base = remaining / brief.platforms.len();
    let remainder = remaining % brief.platforms.len();
    for (i, platform) in brief.platforms.iter().enumerate() {
        quotas.insert(platform.clone(), base + usize::from(i < remainder));
    }
    if let Some(name) = location {
        quotas.insert(name.clone(), reserved);
        rotation.push(name);
    }

    (rotation, quotas)
}

/// Split the post budget across content types from the target mix, nudged
/// toward video when short-form platforms are present and toward text for
/// professional networks. Rounding drift reconciles against video/image.
fn content_type_quotas(
    caps: &CapabilityTable,
    platforms: &[String],
    total: usize,
) -> (Vec<ContentType>, HashMap<ContentType, usize>) {
    let mut shares: Vec<(ContentType, f32)> = TARGET_MIX.to_vec();
    if caps.any_short_form(platforms) {
        nudge(&mut shares, ContentType::Video, 0.05);
        nudge(&mut shares, ContentType::Image, -0.05);
    }
    if caps.any_professional(platforms) {
        nudge(&mut shares, ContentType::Text, 0.05);
        nudge(&mut shares, ContentType::Video, -0.05);
    }

    let order: Vec<ContentType> = shares.iter().map(|(t, _)| *t).collect();
    let mut quotas: HashMap<ContentType, usize> = shares
        .iter()
        .map(|(t, share)| (*t, (total as f32 * share).round() as usize))
        .collect();

    let assigned: usize = quotas.values().sum();
    if assigned < total {
        *quotas.entry(ContentType::Video).or_insert(0) += total - assigned;
    } else if assigned > total {
        let mut drift = assigned - total;
        for bucket in [ContentType::Image, ContentType::Video] {
            let entry = quotas.entry(bucket).or_insert(0);
            let take = drift.min(*entry);
            *entry -= take;
            drift -= take;
        }
    }

    (order, quotas)
}

fn nudge(shares: &mut [(ContentType, f32)], target: ContentType, delta: f32) {
    for (t, share) in shares.iter_mut() {
        if *t == target {
            *share = (*share + delta).max(0.0);
        }
    }
}

/// Round-robin pick at `(day×ppd+slot) mod N`, probing forward past
/// exhausted quotas for even rotation.
fn pick_round_robin<T: Clone + std::hash::Hash + Eq>(
    order: &[T],
    quotas: &mut HashMap<T, usize>,
    index: usize,
) -> T {
    for offset in 0..order.len() {
        let candidate = &order[(index + offset) % order.len()];
        if let Some(quota) = quotas.get_mut(candidate) {
            if *quota > 0 {
                *quota -= 1;
                return candidate.clone();
            }
        }
    }
    // Quotas exhausted (rounding edge) — fall back to plain rotation.
    order[index % order.len()].clone()
}

/// Least-recently-used hook selection over the pool.
struct HookRotation {
    pool: Vec<(String, Option<usize>)>,
}

impl HookRotation {
    fn new(hook_types: &[String]) -> Self {
        Self {
            pool: hook_types.iter().map(|h| (h.clone(), None)).collect(),
        }
    }

    fn next(&mut self, slot: usize) -> String {
        let mut best = 0;
        for (i, (_, last_used)) in self.pool.iter().enumerate() {
            let best_used = self.pool[best].1;
            match (*last_used, best_used) {
                (None, Some(_)) => best = i,
                (Some(a), Some(b)) if a < b => best = i,
                _ => {}
            }
        }
        self.pool[best].1 = Some(slot);
        self.pool[best].0.clone()
    }
}

fn optimal_time(caps: &CapabilityTable, platform: &str, slot: usize) -> String {
    caps.get(platform)
        .map(|c| &c.optimal_times)
        .filter(|times| !times.is_empty())
        .map(|times| times[slot % times.len()].clone())
        .unwrap_or_else(|| "12:00".into())
}

/// Cheap generation-time quality heuristic, 0–100. Feeds auto-approval.
fn quality_score(post: &Post, used_fallback: bool) -> f32 {
    let mut score: f32 = 70.0;
    if !post.content.cta.is_empty() {
        score += 10.0;
    }
    if !post.content.hashtags.is_empty() {
        score += 5.0;
    }
    let hook_len = post.content.hook.chars().count();
    if (10..=120).contains(&hook_len) {
        score += 5.0;
    }
    if !used_fallback {
        score += 10.0;
    }
    score.min(100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use postflow_core::ProducedContent;

    fn brief(duration: u32, platforms: &[&str], frequency: PostingFrequency) -> CampaignBrief {
        CampaignBrief {
            campaign_id: "camp-1".into(),
            duration_days: duration,
            platforms: platforms.iter().map(|p| p.to_string()).collect(),
            business: BusinessContext {
                name: "Crumb & Crust".into(),
                industry: "bakery".into(),
                is_local: false,
            },
            strategy: ContentStrategy::default(),
            frequency,
            start_date: NaiveDate::from_ymd_opt(2026, 9, 7),
        }
    }

    struct FailingProducer;

    #[async_trait]
    impl ContentProducer for FailingProducer {
        async fn produce(&self, _request: &ProduceRequest) -> postflow_core::Result<ProducedContent> {
            Err(PostflowError::Producer("model unavailable".into()))
        }
    }

    #[tokio::test]
    async fn test_moderate_two_platforms_seven_days() {
        // 7 days at 2 posts/day.
        let caps = CapabilityTable::defaults();
        let b = brief(7, &["instagram", "facebook"], PostingFrequency::Moderate);
        let cal = generate_calendar(&b, &caps, &TemplateProducer::new()).await.unwrap();

        assert_eq!(cal.posts.len(), 14);
        assert_eq!(cal.stats.total_posts, 14);
        assert_eq!(cal.stats.posts_by_day.iter().sum::<usize>(), 14);
        assert!(cal.stats.posts_by_platform.values().sum::<usize>() >= 14);
        assert_eq!(cal.status, CalendarStatus::Draft);
        assert_eq!(cal.stats.approved_count, 0);
        assert_eq!(cal.stats.scheduled_count, 0);
    }

    #[tokio::test]
    async fn test_post_count_matches_frequency() {
        let caps = CapabilityTable::defaults();
        for (freq, ppd) in [
            (PostingFrequency::Conservative, 1),
            (PostingFrequency::Moderate, 2),
            (PostingFrequency::Aggressive, 3),
        ] {
            let b = brief(5, &["instagram", "facebook"], freq);
            let cal = generate_calendar(&b, &caps, &TemplateProducer::new()).await.unwrap();
            assert_eq!(cal.posts.len(), 5 * ppd);
        }
    }

    #[tokio::test]
    async fn test_duration_out_of_range_rejected() {
        let caps = CapabilityTable::defaults();
        for duration in [4, 15] {
            let b = brief(duration, &["instagram", "facebook"], PostingFrequency::Moderate);
            let err = generate_calendar(&b, &caps, &TemplateProducer::new()).await.unwrap_err();
            assert!(matches!(err, PostflowError::Validation(_)));
        }
    }

    #[tokio::test]
    async fn test_platform_count_out_of_range_rejected() {
        let caps = CapabilityTable::defaults();
        let b = brief(7, &["instagram"], PostingFrequency::Moderate);
        assert!(matches!(
            generate_calendar(&b, &caps, &TemplateProducer::new()).await,
            Err(PostflowError::Validation(_))
        ));

        let b = brief(7, &["instagram", "facebook", "tiktok", "twitter"], PostingFrequency::Moderate);
        assert!(matches!(
            generate_calendar(&b, &caps, &TemplateProducer::new()).await,
            Err(PostflowError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_local_business_reserves_location_platform() {
        let caps = CapabilityTable::defaults();
        let mut b = brief(10, &["instagram", "facebook"], PostingFrequency::Aggressive);
        b.business.is_local = true;
        let cal = generate_calendar(&b, &caps, &TemplateProducer::new()).await.unwrap();

        // 30 posts → 15% rounds to 5, capped at 4.
        assert_eq!(cal.posts.len(), 30);
        assert_eq!(cal.stats.posts_by_platform["google_business"], 4);
        assert_eq!(
            cal.stats.posts_by_platform["instagram"] + cal.stats.posts_by_platform["facebook"],
            26
        );
        // Earliest-listed platform takes the remainder unit.
        assert!(
            cal.stats.posts_by_platform["instagram"] >= cal.stats.posts_by_platform["facebook"]
        );
    }

    #[tokio::test]
    async fn test_content_type_quota_sums_to_total() {
        let caps = CapabilityTable::defaults();
        let b = brief(14, &["tiktok", "linkedin"], PostingFrequency::Aggressive);
        let cal = generate_calendar(&b, &caps, &TemplateProducer::new()).await.unwrap();
        assert_eq!(cal.stats.posts_by_type.values().sum::<usize>(), 42);
        // Short-form platform present → video leads the mix.
        let video = cal.stats.posts_by_type.get("video").copied().unwrap_or(0);
        let story = cal.stats.posts_by_type.get("story").copied().unwrap_or(0);
        assert!(video > story);
    }

    #[tokio::test]
    async fn test_hook_rotation_is_even() {
        let caps = CapabilityTable::defaults();
        let mut b = brief(5, &["instagram", "facebook"], PostingFrequency::Moderate);
        b.strategy.hook_types = vec!["question".into(), "tip".into()];
        let cal = generate_calendar(&b, &caps, &TemplateProducer::new()).await.unwrap();

        let questions = cal.posts.iter().filter(|p| p.generation.hook_type == "question").count();
        let tips = cal.posts.iter().filter(|p| p.generation.hook_type == "tip").count();
        assert_eq!(questions, 5);
        assert_eq!(tips, 5);
    }

    #[tokio::test]
    async fn test_producer_failure_falls_back_to_template() {
        let caps = CapabilityTable::defaults();
        let b = brief(5, &["instagram", "facebook"], PostingFrequency::Conservative);
        let cal = generate_calendar(&b, &caps, &FailingProducer).await.unwrap();

        assert_eq!(cal.posts.len(), 5);
        for post in &cal.posts {
            assert!(post.generation.used_fallback);
            assert!(!post.content.hook.is_empty());
            assert!(!post.content.body.is_empty());
        }
    }

    #[tokio::test]
    async fn test_posts_carry_variants_and_times() {
        let caps = CapabilityTable::defaults();
        let b = brief(7, &["instagram", "linkedin"], PostingFrequency::Moderate);
        let cal = generate_calendar(&b, &caps, &TemplateProducer::new()).await.unwrap();

        for post in &cal.posts {
            let platform = &post.platforms[0];
            assert!(post.content.variants.contains_key(platform));
            let times = &caps.get(platform).unwrap().optimal_times;
            assert!(times.contains(&post.scheduled_time));
            assert!(post.generation.quality_score >= 70.0);
        }
    }

    #[tokio::test]
    async fn test_dates_follow_start_date() {
        let caps = CapabilityTable::defaults();
        let b = brief(5, &["instagram", "facebook"], PostingFrequency::Conservative);
        let cal = generate_calendar(&b, &caps, &TemplateProducer::new()).await.unwrap();
        let start = NaiveDate::from_ymd_opt(2026, 9, 7).unwrap();
        for post in &cal.posts {
            assert_eq!(post.scheduled_date, start + Duration::days(post.day_index as i64));
        }
    }
}
