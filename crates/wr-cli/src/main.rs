//! Offline funnel runner: scores a discovery dump against one role using
//! fixture-backed enrichment providers, no network required.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use clap::Parser;
use dotenvy::dotenv;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use wr_common::enrichment::waterfall::EnrichmentWaterfall;
use wr_common::enrichment::{
    CodeActivity, CodeHostingClient, EnrichmentError, EnrichmentProvider, IdentityKey,
    ProfileRecord, SOURCE_PEOPLE_CACHE, SOURCE_PEOPLE_LIVE, SOURCE_PEOPLE_RICH,
};
use wr_common::graph::{Contact, NetworkGraph};
use wr_common::logging::{init_tracing_subscriber, install_tracing_panic_hook};
use wr_common::pipeline::{FunnelConfig, ScoringOrchestrator};
use wr_common::{JobRequirements, RawRecord};

#[derive(Debug, Clone, Parser)]
#[command(name = "wr-score", about = "Rank sourced candidates for one role")]
struct Cli {
    /// JSON array of raw discovery records
    #[arg(long, env = "WR_RECORDS")]
    records: PathBuf,

    /// JSON job requirements
    #[arg(long, env = "WR_JOB")]
    job: PathBuf,

    /// JSON array of first-degree network contacts
    #[arg(long, env = "WR_CONTACTS")]
    contacts: Option<PathBuf>,

    /// JSON fixture book backing the enrichment tiers
    #[arg(long, env = "WR_FIXTURES")]
    fixtures: Option<PathBuf>,

    /// Total enrichment budget for the day, shared across active searches
    #[arg(long, env = "WR_DAILY_BUDGET_USD", default_value_t = 50.0)]
    daily_budget_usd: f64,

    /// Emit full per-component breakdowns as JSON instead of the table
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("reading {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("parsing {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

fn load_json<T: serde::de::DeserializeOwned>(path: &PathBuf) -> Result<T, CliError> {
    let display = path.display().to_string();
    let raw = fs::read_to_string(path).map_err(|source| CliError::Read {
        path: display.clone(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| CliError::Parse {
        path: display,
        source,
    })
}

/// Canned provider responses, keyed the way live providers would be queried:
/// profiles by identity key (`li:…`, `em:…`, `gh:…`), code activity by
/// normalized profile URL.
#[derive(Debug, Default, Deserialize)]
struct FixtureBook {
    #[serde(default)]
    people_cache: HashMap<String, ProfileRecord>,
    #[serde(default)]
    people_live: HashMap<String, ProfileRecord>,
    #[serde(default)]
    people_rich: HashMap<String, ProfileRecord>,
    #[serde(default)]
    code_activity: HashMap<String, CodeActivity>,
}

struct FixtureTier {
    source: &'static str,
    cost_cents: u32,
    supplies_code_profile: bool,
    profiles: HashMap<String, ProfileRecord>,
}

#[async_trait]
impl EnrichmentProvider for FixtureTier {
    fn name(&self) -> &'static str {
        self.source
    }

    fn cost_cents(&self) -> u32 {
        self.cost_cents
    }

    fn supplies_code_profile(&self) -> bool {
        self.supplies_code_profile
    }

    async fn lookup(&self, key: &IdentityKey) -> Result<ProfileRecord, EnrichmentError> {
        self.profiles
            .get(&key.to_string())
            .cloned()
            .ok_or(EnrichmentError::NotFound)
    }
}

struct FixtureCodeHost {
    by_url: HashMap<String, CodeActivity>,
}

#[async_trait]
impl CodeHostingClient for FixtureCodeHost {
    async fn activity(&self, profile_url: &str) -> Result<CodeActivity, EnrichmentError> {
        self.by_url
            .get(profile_url)
            .cloned()
            .ok_or(EnrichmentError::NotFound)
    }
}

fn build_waterfall(book: &FixtureBook) -> EnrichmentWaterfall {
    // Same tier ladder and price points the hosted pipeline plans around.
    let ladder: [(&'static str, u32, bool, &HashMap<String, ProfileRecord>); 3] = [
        (SOURCE_PEOPLE_CACHE, 2, false, &book.people_cache),
        (SOURCE_PEOPLE_LIVE, 10, false, &book.people_live),
        (SOURCE_PEOPLE_RICH, 25, true, &book.people_rich),
    ];
    let tiers = ladder
        .into_iter()
        .map(|(source, cost_cents, supplies_code_profile, profiles)| {
            Arc::new(FixtureTier {
                source,
                cost_cents,
                supplies_code_profile,
                profiles: profiles.clone(),
            }) as Arc<dyn EnrichmentProvider>
        })
        .collect();
    EnrichmentWaterfall::new(tiers)
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    install_tracing_panic_hook("wr-score");
    init_tracing_subscriber("wr-score");

    let args = Cli::parse();
    let records: Vec<RawRecord> = load_json(&args.records)?;
    let job: JobRequirements = load_json(&args.job)?;
    let contacts: Vec<Contact> = match &args.contacts {
        Some(path) => load_json(path)?,
        None => Vec::new(),
    };
    let book: FixtureBook = match &args.fixtures {
        Some(path) => load_json(path)?,
        None => FixtureBook::default(),
    };
    info!(
        records = records.len(),
        contacts = contacts.len(),
        job = %job.title,
        daily_budget_usd = args.daily_budget_usd,
        "loaded inputs"
    );

    let graph = NetworkGraph::build(contacts);
    let code_host: Option<Arc<dyn CodeHostingClient>> = if book.code_activity.is_empty() {
        None
    } else {
        Some(Arc::new(FixtureCodeHost {
            by_url: book.code_activity.clone(),
        }))
    };
    let orchestrator =
        ScoringOrchestrator::new(build_waterfall(&book), code_host, FunnelConfig::from_env());

    let scores = orchestrator
        .score_batch(&records, &job, &graph, args.daily_budget_usd)
        .await?;

    if args.json {
        let breakdowns: Vec<_> = scores.iter().map(|s| s.breakdown()).collect();
        println!("{}", serde_json::to_string_pretty(&breakdowns)?);
        return Ok(());
    }

    println!(
        "{:<4} {:<28} {:>6} {:>7} {:>7} {:>7} {:>7} {:>5}  {}",
        "#", "name", "total", "skills", "exp", "warmth", "timing", "conf", "sources"
    );
    for (rank, score) in scores.iter().enumerate() {
        let sources = score
            .data_sources
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(",");
        println!(
            "{:<4} {:<28} {:>6.1} {:>7.1} {:>7.1} {:>7.1} {:>7.1} {:>5.2}  {}",
            rank + 1,
            score.full_name.as_deref().unwrap_or("(unknown)"),
            score.total,
            score.skills.score,
            score.experience.score,
            score.warmth.score,
            score.timing.score,
            score.confidence,
            sources,
        );
        if let Some(path) = &score.intro_path {
            println!("     intro via {}", path.describe());
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("wr-score failed: {err}");
        std::process::exit(1);
    }
}
