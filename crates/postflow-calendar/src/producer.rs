//! Template-backed content producer.
//!
//! This is both the default offline producer and the fallback when an
//! LLM-backed producer errors out. Deterministic: template choice cycles
//! with the day index so neighbouring posts don't read identically.

use async_trait::async_trait;

use postflow_core::{ContentProducer, ContentType, ProduceRequest, ProducedContent, Result};

/// Deterministic template producer.
#[derive(Debug, Default)]
pub struct TemplateProducer;

impl TemplateProducer {
    pub fn new() -> Self {
        Self
    }

    /// Render content from templates. Infallible — this is what makes it a
    /// safe fallback.
    pub fn render(&self, request: &ProduceRequest) -> ProducedContent {
        let day = request.day_index as usize;
        let pillar = &request.pillar;

        let hook = match request.hook_type.as_str() {
            "question" => pick(day, &[
                format!("Ever wondered how {pillar} actually works?"),
                format!("What's the one thing everyone gets wrong about {pillar}?"),
                format!("How much do you really know about {pillar}?"),
            ]),
            "statistic" => pick(day, &[
                format!("9 out of 10 people overlook this about {pillar}."),
                format!("The numbers behind {pillar} might surprise you."),
            ]),
            "story" => pick(day, &[
                format!("Here's how {pillar} changed things for one of our customers."),
                format!("A quick story about {pillar} we keep coming back to."),
            ]),
            "tip" => pick(day, &[
                format!("One simple {pillar} tip you can use today."),
                format!("Our favorite shortcut for better {pillar}."),
            ]),
            "behind_the_scenes" => pick(day, &[
                format!("A look behind the scenes at our {pillar} process."),
                format!("What {pillar} looks like from the inside."),
            ]),
            _ => format!("Let's talk about {pillar}."),
        };

        let body = match request.content_type {
            ContentType::Video => format!(
                "In this short video we break down {pillar} step by step. \
                 Watch to the end for the part most people miss."
            ),
            ContentType::Carousel => format!(
                "Swipe through for our top takeaways on {pillar}. \
                 Each slide covers one thing you can apply right away."
            ),
            ContentType::Story => format!(
                "Quick update on {pillar} — tap through before it's gone."
            ),
            ContentType::Image | ContentType::Text => format!(
                "We put together our best thinking on {pillar}. \
                 It's practical, it's short, and it works."
            ),
        };

        let cta = pick(day, &[
            "Follow for more.".to_string(),
            "Tell us what you think in the comments.".to_string(),
            "Save this for later.".to_string(),
            "Visit the link in bio to learn more.".to_string(),
        ]);

        let hashtags = pillar
            .split_whitespace()
            .map(|word| format!("#{}", word.to_lowercase()))
            .chain([format!("#{}", request.platform)])
            .collect();

        ProducedContent { hook, body, cta, hashtags }
    }
}

fn pick(day: usize, options: &[String]) -> String {
    options[day % options.len()].clone()
}

#[async_trait]
impl ContentProducer for TemplateProducer {
    async fn produce(&self, request: &ProduceRequest) -> Result<ProducedContent> {
        Ok(self.render(request))
    }
}
