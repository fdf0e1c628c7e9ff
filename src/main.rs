//! # PostFlow — Content Calendar Engine
//!
//! Generates multi-platform content calendars, adapts posts per platform,
//! runs the approval workflow, and dispatches approved posts to the
//! external scheduling provider.
//!
//! Usage:
//!   postflow generate --campaign summer --business "Bluebird Cafe" --industry coffee
//!   postflow validate <calendar-id>
//!   postflow approve <calendar-id> --all --by alice
//!   postflow schedule <calendar-id>

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use postflow_calendar::{
    generate_calendar, BusinessContext, CampaignBrief, ContentStrategy, PostingFrequency,
    TemplateProducer,
};
use postflow_core::{CalendarStore, PostflowConfig};
use postflow_dispatch::HttpSink;

#[derive(Parser)]
#[command(
    name = "postflow",
    version,
    about = "📅 PostFlow — Content Calendar Engine"
)]
struct Cli {
    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a draft calendar from a campaign brief
    Generate {
        /// Campaign identifier
        #[arg(long)]
        campaign: String,

        /// Calendar length in days (5-14)
        #[arg(long, default_value = "7")]
        days: u32,

        /// Target platforms, comma-separated, in priority order (2-3)
        #[arg(long, default_value = "instagram,facebook")]
        platforms: String,

        /// Business name
        #[arg(long)]
        business: String,

        /// Business industry
        #[arg(long, default_value = "general")]
        industry: String,

        /// Local business (reserves part of the plan for the location platform)
        #[arg(long)]
        local: bool,

        /// Content pillars, comma-separated
        #[arg(long, default_value = "")]
        pillars: String,

        /// Posting frequency: conservative, moderate, aggressive
        #[arg(long, default_value = "moderate")]
        frequency: String,

        /// First calendar day (YYYY-MM-DD); defaults to tomorrow
        #[arg(long)]
        start_date: Option<NaiveDate>,
    },

    /// List stored calendars
    List,

    /// Check a calendar for scheduling conflicts
    Validate {
        calendar_id: String,
    },

    /// Show approval and scheduling progress for a calendar
    Status {
        calendar_id: String,
    },

    /// Print the platform capability table
    Capabilities,

    /// Approve posts in a calendar
    Approve {
        calendar_id: String,

        /// Post ids, comma-separated
        #[arg(long, default_value = "")]
        posts: String,

        /// Approve every pending post
        #[arg(long)]
        all: bool,

        /// Reviewer name
        #[arg(long, default_value = "cli")]
        by: String,
    },

    /// Reject posts in a calendar
    Reject {
        calendar_id: String,

        /// Post ids, comma-separated
        #[arg(long)]
        posts: String,

        /// Reviewer name
        #[arg(long, default_value = "cli")]
        by: String,

        /// Rejection reason
        #[arg(long)]
        reason: String,
    },

    /// Auto-approve pending posts above a quality threshold
    AutoApprove {
        calendar_id: String,

        /// Minimum quality score (0-100)
        #[arg(long, default_value = "80")]
        min_score: f32,
    },

    /// Dispatch approved posts to the scheduling provider
    Schedule {
        calendar_id: String,

        /// Sink base URL (overrides config)
        #[arg(long)]
        sink_url: Option<String>,

        /// Redrive previously failed posts instead of fresh ones
        #[arg(long)]
        retry: bool,
    },
}

fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "postflow=debug" } else { "postflow=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .init();

    let config = PostflowConfig::load()?;
    tracing::debug!(
        "🔧 Config loaded: timezone {} (offset {}), {} platforms",
        config.timezone,
        config.utc_offset,
        config.platforms.platform_names().len()
    );
    let store = CalendarStore::new(&CalendarStore::default_path());

    match cli.command {
        Command::Generate {
            campaign,
            days,
            platforms,
            business,
            industry,
            local,
            pillars,
            frequency,
            start_date,
        } => {
            let brief = CampaignBrief {
                campaign_id: campaign,
                duration_days: days,
                platforms: split_csv(&platforms),
                business: BusinessContext {
                    name: business,
                    industry,
                    is_local: local,
                },
                strategy: ContentStrategy {
                    pillars: split_csv(&pillars),
                    ..ContentStrategy::default()
                },
                frequency: frequency.parse::<PostingFrequency>()?,
                start_date,
            };

            let producer = TemplateProducer::new();
            let calendar = generate_calendar(&brief, &config.platforms, &producer).await?;
            store.save(&calendar)?;

            println!("📅 Calendar {} generated", calendar.id);
            println!("   Campaign:  {}", calendar.campaign_id);
            println!("   Days:      {}", calendar.duration_days);
            println!("   Posts:     {}", calendar.posts.len());
            for (platform, count) in &calendar.stats.posts_by_platform {
                println!("   {platform}: {count} posts");
            }

            let report =
                postflow_orchestrator::validate_calendar(&calendar.posts, &config.platforms);
            if report.is_valid {
                println!("   ✅ No scheduling conflicts (score {})", report.score);
            } else {
                println!(
                    "   ⚠️ {} conflict(s), {} warning(s) — run `postflow validate {}`",
                    report.issues.len(),
                    report.warnings.len(),
                    calendar.id
                );
            }
        }

        Command::List => {
            let ids = store.list();
            if ids.is_empty() {
                println!("No calendars stored.");
            }
            for id in ids {
                match store.load(&id) {
                    Ok(cal) => println!(
                        "📅 {id}  {:?}  {} posts  campaign={}",
                        cal.status,
                        cal.posts.len(),
                        cal.campaign_id
                    ),
                    Err(e) => println!("⚠️ {id}: {e}"),
                }
            }
        }

        Command::Validate { calendar_id } => {
            let calendar = store.load(&calendar_id)?;
            let report =
                postflow_orchestrator::validate_calendar(&calendar.posts, &config.platforms);
            println!(
                "🔍 Calendar {calendar_id}: score {} ({})",
                report.score,
                if report.is_valid { "valid" } else { "has conflicts" }
            );
            for issue in &report.issues {
                println!("   ❌ [{} day {}] {}", issue.platform, issue.day_index, issue.message);
            }
            for warning in &report.warnings {
                println!("   ⚠️ [{}] {}", warning.platform, warning.message);
            }
        }

        Command::Status { calendar_id } => {
            let calendar = store.load(&calendar_id)?;
            let approval = postflow_approval::progress(&calendar);
            let scheduling = postflow_dispatch::scheduling_status(&calendar);

            println!("📅 Calendar {calendar_id} — {:?}", calendar.status);
            println!(
                "   Approval:   {}/{} approved, {} pending, {} rejected, {} needs revision",
                approval.approved,
                approval.total,
                approval.pending,
                approval.rejected,
                approval.needs_revision
            );
            println!(
                "   Scheduling: {}/{} scheduled ({:.0}%)",
                scheduling.scheduled, scheduling.total, scheduling.percent_scheduled
            );
            for failure in &scheduling.failures {
                println!(
                    "   ❌ {} [{}] after {} attempt(s): {}",
                    failure.post_id, failure.platform, failure.attempts, failure.error
                );
            }
        }

        Command::Capabilities => {
            println!("🔧 Platform capabilities");
            for name in config.platforms.platform_names() {
                if let Some(caps) = config.platforms.get(name) {
                    println!(
                        "   {name}: {} chars, {} hashtags, {}/day, gap {}m, tone {:?}",
                        caps.char_limit,
                        caps.hashtag_limit,
                        caps.max_posts_per_day,
                        caps.min_gap_minutes,
                        caps.tone
                    );
                }
            }
        }

        Command::Approve { calendar_id, posts, all, by } => {
            let calendar = store.load(&calendar_id)?;
            let ids: Vec<String> = if all {
                calendar
                    .posts
                    .iter()
                    .filter(|p| p.approval.status == postflow_core::ApprovalStatus::Pending)
                    .map(|p| p.id.clone())
                    .collect()
            } else {
                split_csv(&posts)
            };
            let count = ids.len();
            let updated = postflow_approval::bulk_approve(calendar, &ids, &by);
            store.save(&updated)?;
            println!("✅ Approved {count} post(s) in {calendar_id} (by {by})");
        }

        Command::Reject { calendar_id, posts, by, reason } => {
            let calendar = store.load(&calendar_id)?;
            let ids = split_csv(&posts);
            let count = ids.len();
            let updated = postflow_approval::bulk_reject(calendar, &ids, &by, &reason);
            store.save(&updated)?;
            println!("🚫 Rejected {count} post(s) in {calendar_id}: {reason}");
        }

        Command::AutoApprove { calendar_id, min_score } => {
            let calendar = store.load(&calendar_id)?;
            let (updated, approved) =
                postflow_approval::auto_approve(calendar, min_score, &config.utc_offset);
            store.save(&updated)?;
            println!("🤖 Auto-approved {approved} post(s) in {calendar_id} (min score {min_score})");
        }

        Command::Schedule { calendar_id, sink_url, retry } => {
            let url = sink_url.unwrap_or_else(|| config.dispatch.sink_url.clone());
            if url.is_empty() {
                anyhow::bail!("no sink URL configured; pass --sink-url or set dispatch.sink_url");
            }
            let sink = HttpSink::new(&url);
            let calendar = store.load(&calendar_id)?;

            let (updated, summary) = if retry {
                postflow_dispatch::retry_failed_scheduling(calendar, &sink, &config).await
            } else {
                postflow_dispatch::schedule_calendar(calendar, &sink, &config).await
            };
            store.save(&updated)?;

            println!(
                "📤 Dispatch: {}/{} scheduled, {} failed",
                summary.scheduled, summary.attempted, summary.failed
            );
            if summary.failed > 0 {
                println!("   Run `postflow status {calendar_id}` for failure details.");
            }
        }
    }

    Ok(())
}
