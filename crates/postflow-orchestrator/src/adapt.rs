//! Per-platform content adaptation.
//!
//! Makes one post's base content safe for a target platform: truncation at
//! sentence boundaries, hashtag trimming, tone policy, and inferred
//! platform-native fields. Every change is recorded for the reviewer.

use postflow_core::{
    AdaptationKind, AdaptationRecord, Content, ContentType, PlatformCaps, TonePolicy, Variant,
};

/// Adapt base content for one target platform.
pub fn adapt_for_platform(
    content: &Content,
    platform: &str,
    caps: &PlatformCaps,
    content_type: ContentType,
) -> Variant {
    let mut text = compose_text(content);

    if char_len(&text) > caps.char_limit {
        text = truncate_with_ellipsis(&text, caps.char_limit);
        tracing::debug!(
            "✂️ Truncated content for {platform} to fit {} chars",
            caps.char_limit
        );
    }

    // Hashtag trim preserves order — the front of the list carries intent.
    let mut hashtags = content.hashtags.clone();
    hashtags.truncate(caps.hashtag_limit);

    text = apply_tone_policy(&text, caps.tone);

    let platform_fields = infer_platform_fields(content, platform, caps, content_type);

    Variant { text, hashtags, platform_fields }
}

/// Hook + body + CTA joined into the single text a platform receives.
pub fn compose_text(content: &Content) -> String {
    [&content.hook, &content.body, &content.cta]
        .iter()
        .filter(|part| !part.is_empty())
        .map(|part| part.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Truncate to `limit` chars: prefer the last sentence boundary fitting
/// within `limit-3`, append "…". If no boundary yields at least half the
/// limit, hard-truncate at `limit-3` chars instead.
pub fn truncate_with_ellipsis(text: &str, limit: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= limit {
        return text.to_string();
    }
    let budget = limit.saturating_sub(3);

    let mut boundary = None;
    for (i, c) in chars.iter().enumerate().take(budget) {
        if matches!(c, '.' | '!' | '?') {
            boundary = Some(i);
        }
    }

    let cut = match boundary {
        Some(i) if i + 1 >= limit / 2 => i + 1,
        _ => budget,
    };
    let mut out: String = chars[..cut].iter().collect();
    out.push('…');
    out
}

/// Apply the platform's text policy.
fn apply_tone_policy(text: &str, tone: TonePolicy) -> String {
    match tone {
        TonePolicy::Professional => strip_emoji(text),
        TonePolicy::LocationListing => strip_hashtag_mentions(text),
        TonePolicy::Casual | TonePolicy::ShortForm => text.to_string(),
    }
}

/// Remove emoji runs (professional platforms read them as noise).
fn strip_emoji(text: &str) -> String {
    let stripped: String = text.chars().filter(|c| !is_emoji(*c)).collect();
    collapse_spaces(&stripped)
}

fn is_emoji(c: char) -> bool {
    matches!(c as u32,
        0x1F000..=0x1FAFF   // emoticons, symbols, flags, supplemental
        | 0x2600..=0x27BF   // misc symbols + dingbats
        | 0x2B00..=0x2BFF   // arrows/stars used as emoji
        | 0xFE0F            // variation selector
        | 0x200D            // zero-width joiner
    )
}

/// Remove "#tag" tokens — hashtags mean nothing on location listings.
fn strip_hashtag_mentions(text: &str) -> String {
    let stripped = text
        .split(' ')
        .filter(|token| !token.starts_with('#'))
        .collect::<Vec<_>>()
        .join(" ");
    collapse_spaces(&stripped)
}

fn collapse_spaces(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_space = false;
    for c in text.chars() {
        if c == ' ' {
            if !last_space {
                out.push(c);
            }
            last_space = true;
        } else {
            out.push(c);
            last_space = false;
        }
    }
    out.trim_end().to_string()
}

/// Infer platform-native fields from hook+body text and content type.
fn infer_platform_fields(
    content: &Content,
    platform: &str,
    caps: &PlatformCaps,
    content_type: ContentType,
) -> serde_json::Value {
    let text = format!("{} {}", content.hook, content.body).to_lowercase();

    let category = if contains_any(&text, &["sale", "discount", "% off", "deal", "promo", "limited time"]) {
        "promo"
    } else if contains_any(&text, &["event", "join us", "workshop", "webinar", "live", "rsvp"]) {
        "event"
    } else if contains_any(&text, &["new arrival", "launch", "introducing", "now available", "product"]) {
        "product"
    } else {
        "standard"
    };

    let mut fields = serde_json::json!({ "category": category });

    if platform == "instagram" {
        fields["format"] = serde_json::json!(
            if content_type == ContentType::Video { "reel" } else { "post" }
        );
    }
    match caps.tone {
        TonePolicy::ShortForm => {
            fields["duet_enabled"] = serde_json::json!(true);
            fields["comment_enabled"] = serde_json::json!(true);
        }
        TonePolicy::Professional => {
            fields["visibility"] = serde_json::json!("public");
        }
        _ => {}
    }

    fields
}

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|kw| text.contains(kw))
}

/// Diff a variant against the base content and describe every change —
/// this is the reviewer-facing audit trail.
pub fn detect_adaptations(
    content: &Content,
    platform: &str,
    variant: &Variant,
    caps: &PlatformCaps,
) -> Vec<AdaptationRecord> {
    let mut records = Vec::new();
    let base = compose_text(content);
    let base_len = char_len(&base);
    let variant_len = char_len(&variant.text);

    // Truncation and tone rewriting are independent changes; a variant can
    // carry both, and the audit trail must show both.
    let shortened = variant.text.ends_with('…');
    if shortened {
        records.push(AdaptationRecord {
            platform: platform.to_string(),
            description: format!(
                "shortened from {base_len} to {variant_len} chars (limit {})",
                caps.char_limit
            ),
            kind: AdaptationKind::Shortened,
        });
    }

    if apply_tone_policy(&base, caps.tone) != base {
        let policy = match caps.tone {
            TonePolicy::Professional => "removed emoji for professional tone",
            TonePolicy::LocationListing => "removed hashtag mentions",
            _ => "reformatted text",
        };
        records.push(AdaptationRecord {
            platform: platform.to_string(),
            description: policy.to_string(),
            kind: AdaptationKind::Reformatted,
        });
    } else if !shortened && variant.text != base {
        records.push(AdaptationRecord {
            platform: platform.to_string(),
            description: "reformatted text".to_string(),
            kind: AdaptationKind::Reformatted,
        });
    }

    if variant.hashtags.len() < content.hashtags.len() {
        records.push(AdaptationRecord {
            platform: platform.to_string(),
            description: format!(
                "trimmed hashtags from {} to {} (limit {})",
                content.hashtags.len(),
                variant.hashtags.len(),
                caps.hashtag_limit
            ),
            kind: AdaptationKind::Reformatted,
        });
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use postflow_core::CapabilityTable;

    fn base_content(body_len: usize) -> Content {
        Content {
            hook: "Big news for local foodies!".into(),
            body: "x".repeat(body_len),
            cta: "Visit us today.".into(),
            hashtags: (0..12).map(|i| format!("#tag{i}")).collect(),
            ..Default::default()
        }
    }

    fn caps_for(platform: &str) -> PlatformCaps {
        CapabilityTable::defaults().get(platform).unwrap().clone()
    }

    #[test]
    fn test_under_limit_unchanged() {
        let content = base_content(50);
        let caps = caps_for("instagram");
        let variant = adapt_for_platform(&content, "instagram", &caps, ContentType::Image);
        assert_eq!(variant.text, compose_text(&content));
        assert!(!variant.text.ends_with('…'));
    }

    #[test]
    fn test_over_limit_truncated_with_ellipsis() {
        // 500-char body against a 280-char platform.
        let content = base_content(500);
        let caps = caps_for("twitter");
        let variant = adapt_for_platform(&content, "twitter", &caps, ContentType::Text);
        assert!(variant.text.chars().count() <= 280);
        assert!(variant.text.ends_with('…'));
    }

    #[test]
    fn test_sentence_boundary_preferred() {
        let mut content = Content::default();
        content.body = format!("First sentence here. {}", "y".repeat(300));
        let caps = caps_for("twitter");
        let variant = adapt_for_platform(&content, "twitter", &caps, ContentType::Text);
        // Boundary at char 19 is under half the limit, so hard truncation applies.
        assert_eq!(variant.text.chars().count(), 278);

        // A boundary past the midpoint is kept.
        let mut content2 = Content::default();
        content2.body = format!("{}. {}", "a".repeat(200), "b".repeat(200));
        let variant2 = adapt_for_platform(&content2, "twitter", &caps, ContentType::Text);
        assert!(variant2.text.starts_with(&"a".repeat(200)));
        assert!(variant2.text.ends_with(".…"));
    }

    #[test]
    fn test_hashtags_trimmed_in_order() {
        let content = base_content(10);
        let caps = caps_for("linkedin"); // limit 5
        let variant = adapt_for_platform(&content, "linkedin", &caps, ContentType::Text);
        assert_eq!(variant.hashtags.len(), 5);
        assert_eq!(variant.hashtags[0], "#tag0");
        assert_eq!(variant.hashtags[4], "#tag4");
    }

    #[test]
    fn test_professional_strips_emoji() {
        let mut content = Content::default();
        content.body = "Quarterly results are in 🎉🎉 and they look strong 🚀".into();
        let caps = caps_for("linkedin");
        let variant = adapt_for_platform(&content, "linkedin", &caps, ContentType::Text);
        assert!(!variant.text.contains('🎉'));
        assert!(!variant.text.contains('🚀'));
        assert!(variant.text.contains("look strong"));
    }

    #[test]
    fn test_location_listing_strips_hashtags() {
        let mut content = Content::default();
        content.body = "Fresh bread daily #bakery #local come say hi".into();
        let caps = caps_for("google_business");
        let variant = adapt_for_platform(&content, "google_business", &caps, ContentType::Image);
        assert!(!variant.text.contains("#bakery"));
        assert!(variant.text.contains("come say hi"));
        assert!(variant.hashtags.is_empty());
    }

    #[test]
    fn test_platform_fields_inferred() {
        let mut content = Content::default();
        content.hook = "Huge sale this weekend!".into();
        let caps = caps_for("instagram");
        let variant = adapt_for_platform(&content, "instagram", &caps, ContentType::Video);
        assert_eq!(variant.platform_fields["category"], "promo");
        assert_eq!(variant.platform_fields["format"], "reel");

        let caps = caps_for("tiktok");
        let variant = adapt_for_platform(&content, "tiktok", &caps, ContentType::Video);
        assert_eq!(variant.platform_fields["duet_enabled"], true);
    }

    #[test]
    fn test_detect_adaptations() {
        let content = base_content(500);
        let caps = caps_for("twitter");
        let variant = adapt_for_platform(&content, "twitter", &caps, ContentType::Text);
        let records = detect_adaptations(&content, "twitter", &variant, &caps);
        assert!(records.iter().any(|r| r.kind == AdaptationKind::Shortened));
        assert!(records.iter().any(|r| r.description.contains("trimmed hashtags")));
    }

    #[test]
    fn test_detect_truncation_and_tone_rewrite_together() {
        // Long emoji-laden text on a professional platform loses chars to
        // the limit AND emoji to the tone policy; both must be recorded.
        let mut content = Content::default();
        content.body = format!("Exciting update 🎉 {}", "z".repeat(3200));
        let caps = caps_for("linkedin"); // 3000-char limit, Professional
        let variant = adapt_for_platform(&content, "linkedin", &caps, ContentType::Text);
        let records = detect_adaptations(&content, "linkedin", &variant, &caps);

        assert!(records.iter().any(|r| r.kind == AdaptationKind::Shortened));
        assert!(records
            .iter()
            .any(|r| r.description.contains("removed emoji")));
    }

    #[test]
    fn test_detect_no_changes() {
        let mut content = base_content(20);
        content.hashtags.truncate(3);
        let caps = caps_for("facebook");
        let variant = adapt_for_platform(&content, "facebook", &caps, ContentType::Image);
        let records = detect_adaptations(&content, "facebook", &variant, &caps);
        assert!(records.is_empty());
    }
}
