//! # PostFlow Calendar
//!
//! Builds a draft content calendar from a campaign brief: date range,
//! platform/content-type distribution, hook rotation, optimal timing, and
//! producer-backed content fill-in with template fallback.

pub mod generator;
pub mod producer;

pub use generator::{
    generate_calendar, BusinessContext, CampaignBrief, ContentStrategy, PostingFrequency,
    MAX_DURATION_DAYS, MIN_DURATION_DAYS,
};
pub use producer::TemplateProducer;
