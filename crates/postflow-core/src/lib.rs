//! # PostFlow Core
//!
//! Shared foundation for the PostFlow calendar engine: the content
//! calendar data model, the platform capability table, the error
//! taxonomy, collaborator traits, and file persistence.
//!
//! ## Architecture
//! ```text
//! CampaignBrief
//!   → postflow-calendar (generate draft calendar)
//!     → postflow-orchestrator (per-platform variants + conflict checks)
//!       → postflow-approval (human review state machine)
//!         → postflow-dispatch (sink calls, retry/backoff)
//! ```

pub mod config;
pub mod error;
pub mod model;
pub mod store;
pub mod traits;

pub use config::{CapabilityTable, DispatchConfig, PlatformCaps, PostflowConfig, TonePolicy};
pub use error::{PostflowError, Result};
pub use model::{
    AdaptationKind, AdaptationRecord, Approval, ApprovalStatus, Calendar, CalendarStats,
    CalendarStatus, Content, ContentType, CrossPlatformStrategy, DispatchAttempt, GenerationMeta,
    Orchestration, PlatformOutcome, Post, PostStatus, Revision, Scheduling, TimingStrategy,
    Variant,
};
pub use store::CalendarStore;
pub use traits::{
    ContentProducer, PlatformResult, ProduceRequest, ProducedContent, ScheduleRequest,
    ScheduleResponse, SchedulingSink, SinkContent,
};
