//! End-to-end funnel orchestration:
//! resolve → cheap-score → gate → enrich → full-score → rank → truncate.
//!
//! Enrichment I/O runs with bounded parallelism; every scoring step is
//! synchronous, so the final order depends only on computed totals and is
//! deterministic given identical inputs and provider responses.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, warn};

use crate::enrichment::budget::BudgetLedger;
use crate::enrichment::gate::{EnrichmentGate, GatePolicy, PoolEntry};
use crate::enrichment::waterfall::{
    apply_record, is_complete, EnrichmentStatus, EnrichmentWaterfall,
};
use crate::enrichment::{CodeActivity, CodeHostingClient, SOURCE_CODE_HOSTING};
use crate::graph::NetworkGraph;
use crate::identity::IdentityResolver;
use crate::matching::cheap::cheap_score;
use crate::matching::{CandidateScorer, MatchScore, ScoringConfig};
use crate::{Candidate, EnrichmentTier, JobRequirements, RawRecord};

#[derive(Debug, Error)]
pub enum FunnelError {
    #[error("job requirements missing title")]
    InvalidJob,
}

#[derive(Debug, Clone)]
pub struct FunnelConfig {
    pub gate: GatePolicy,
    /// Enriched candidates whose skills/experience mean falls below this are
    /// dropped: keyword luck on the cheap pass does not survive real data.
    pub enriched_fit_floor: f64,
    pub top_n: usize,
    /// Bounded parallelism for per-candidate enrichment pipelines; default
    /// matches the slowest provider's safe rate limit.
    pub enrich_concurrency: usize,
    /// Wall-clock budget for the whole batch; walks still in flight when it
    /// expires are cancelled, and those candidates score with reduced
    /// confidence instead of being dropped.
    pub batch_deadline: Duration,
    /// Planning figure for the gate's affordability math.
    pub cost_per_enrichment_usd: f64,
    pub active_searches: u32,
    /// Whether the role requires a code-hosting profile (forces the walk to
    /// tiers that can supply one).
    pub needs_code_profile: bool,
    pub scoring: ScoringConfig,
}

impl Default for FunnelConfig {
    fn default() -> Self {
        Self {
            gate: GatePolicy::default(),
            enriched_fit_floor: 40.0,
            top_n: 20,
            enrich_concurrency: 5,
            batch_deadline: Duration::from_secs(120),
            cost_per_enrichment_usd: 0.10,
            active_searches: 1,
            needs_code_profile: false,
            scoring: ScoringConfig::default(),
        }
    }
}

impl FunnelConfig {
    /// Read tunables from `WR_*` environment variables, falling back to
    /// defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        fn parse_f64(key: &str, default: f64) -> f64 {
            std::env::var(key)
                .ok()
                .and_then(|raw| raw.parse::<f64>().ok())
                .unwrap_or(default)
        }
        fn parse_usize(key: &str, default: usize) -> usize {
            std::env::var(key)
                .ok()
                .and_then(|raw| raw.parse::<usize>().ok())
                .unwrap_or(default)
        }
        fn parse_u32(key: &str, default: u32) -> u32 {
            std::env::var(key)
                .ok()
                .and_then(|raw| raw.parse::<u32>().ok())
                .unwrap_or(default)
        }
        fn parse_bool(key: &str, default: bool) -> bool {
            match std::env::var(key) {
                Ok(val) => matches!(val.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"),
                Err(_) => default,
            }
        }

        let defaults = Self::default();
        let distressed = std::env::var("WR_DISTRESSED_EMPLOYERS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        Self {
            gate: GatePolicy {
                min_batch: parse_usize("WR_GATE_MIN_BATCH", defaults.gate.min_batch),
                max_batch: parse_usize("WR_GATE_MAX_BATCH", defaults.gate.max_batch),
                cheap_score_floor: parse_f64(
                    "WR_CHEAP_SCORE_FLOOR",
                    defaults.gate.cheap_score_floor,
                ),
            },
            enriched_fit_floor: parse_f64("WR_ENRICHED_FIT_FLOOR", defaults.enriched_fit_floor),
            top_n: parse_usize("WR_TOP_N", defaults.top_n),
            enrich_concurrency: parse_usize("WR_ENRICH_CONCURRENCY", defaults.enrich_concurrency),
            batch_deadline: Duration::from_secs(
                parse_usize("WR_BATCH_DEADLINE_SECS", 120) as u64
            ),
            cost_per_enrichment_usd: parse_f64(
                "WR_COST_PER_ENRICHMENT_USD",
                defaults.cost_per_enrichment_usd,
            ),
            active_searches: parse_u32("WR_ACTIVE_SEARCHES", defaults.active_searches),
            needs_code_profile: parse_bool("WR_NEEDS_CODE_PROFILE", defaults.needs_code_profile),
            scoring: ScoringConfig {
                timing: crate::matching::timing::TimingConfig::with_distressed(distressed),
            },
        }
    }
}

struct EnrichmentResult {
    idx: usize,
    candidate: Candidate,
    status: EnrichmentStatus,
    code: Option<CodeActivity>,
}

pub struct ScoringOrchestrator {
    resolver: IdentityResolver,
    gate: EnrichmentGate,
    waterfall: EnrichmentWaterfall,
    code_hosting: Option<Arc<dyn CodeHostingClient>>,
    scorer: CandidateScorer,
    config: FunnelConfig,
}

impl ScoringOrchestrator {
    pub fn new(
        waterfall: EnrichmentWaterfall,
        code_hosting: Option<Arc<dyn CodeHostingClient>>,
        config: FunnelConfig,
    ) -> Self {
        Self {
            resolver: IdentityResolver::default(),
            gate: EnrichmentGate::new(config.gate.clone()),
            scorer: CandidateScorer::new(config.scoring.clone()),
            waterfall,
            code_hosting,
            config,
        }
    }

    /// Run the funnel for one search request.
    ///
    /// `daily_budget_usd` is the day's total enrichment budget; the share
    /// available to this search is `daily / active_searches`. Individual
    /// candidate failures never fail the batch; whatever could be scored is
    /// returned, annotated per candidate.
    pub async fn score_batch(
        &self,
        records: &[RawRecord],
        job: &JobRequirements,
        graph: &NetworkGraph,
        daily_budget_usd: f64,
    ) -> Result<Vec<MatchScore>, FunnelError> {
        if job.title.trim().is_empty() {
            return Err(FunnelError::InvalidJob);
        }
        let today = Utc::now().date_naive();

        // (1) Merge before scoring, never after: the same person must not be
        // scored twice under different identities.
        let resolved = self.resolver.resolve(records);
        info!(
            raw = records.len(),
            resolved = resolved.candidates.len(),
            rejected = resolved.rejected,
            "identity resolution"
        );

        // (2)+(3) Free elimination.
        let mut survivors: Vec<(Candidate, f64)> = Vec::new();
        for mut candidate in resolved.candidates {
            let score = cheap_score(candidate.headline.as_deref().unwrap_or_default(), job);
            if score < self.config.gate.cheap_score_floor {
                debug!(candidate = %candidate.id, score, "dropped by cheap filter");
                continue;
            }
            candidate.enrichment_tier = EnrichmentTier::Cheap;
            survivors.push((candidate, score));
        }
        info!(survivors = survivors.len(), "cheap filter");

        // (4) Warmth is free; computed for every survivor.
        let warmths: Vec<_> = survivors
            .iter()
            .map(|(candidate, _)| graph.warmth(candidate))
            .collect();

        // (5) Budget gate.
        let pool: Vec<PoolEntry> = survivors
            .iter()
            .enumerate()
            .map(|(idx, (_, cheap))| PoolEntry {
                idx,
                cheap_score: *cheap,
                warmth: warmths[idx].score,
            })
            .collect();
        let selected = self.gate.select(
            &pool,
            daily_budget_usd,
            self.config.cost_per_enrichment_usd,
            self.config.active_searches,
        );

        // (6) Bounded-parallel enrichment under one shared ledger.
        let per_search_budget = if self.config.active_searches == 0 {
            daily_budget_usd
        } else {
            daily_budget_usd / self.config.active_searches as f64
        };
        let results = self
            .enrich_selected(&survivors, &selected, per_search_budget)
            .await;

        let mut statuses: HashMap<usize, EnrichmentStatus> = HashMap::new();
        let mut code_by_idx: HashMap<usize, CodeActivity> = HashMap::new();
        for result in results {
            survivors[result.idx].0 = result.candidate;
            statuses.insert(result.idx, result.status);
            if let Some(code) = result.code {
                code_by_idx.insert(result.idx, code);
            }
        }
        info!(
            enriched = statuses
                .values()
                .filter(|s| matches!(s, EnrichmentStatus::Complete { .. }))
                .count(),
            selected = selected.len(),
            "enrichment finished"
        );

        // (7)–(9) Full scoring; enriched keyword-luck candidates are dropped.
        let now = Utc::now();
        let mut scores: Vec<MatchScore> = Vec::new();
        for (idx, (candidate, cheap)) in survivors.iter().enumerate() {
            let status = statuses
                .get(&idx)
                .cloned()
                .unwrap_or(EnrichmentStatus::NotSelected);
            let score = self.scorer.score(
                candidate,
                job,
                &warmths[idx],
                *cheap,
                code_by_idx.get(&idx),
                status,
                today,
                now,
            );
            if candidate.enrichment_tier == EnrichmentTier::Enriched {
                let fit = (score.skills.score + score.experience.score) / 2.0;
                if fit < self.config.enriched_fit_floor {
                    debug!(candidate = %candidate.id, fit, "dropped after enrichment");
                    continue;
                }
            }
            scores.push(score);
        }

        // (10) Deterministic ranking: total descending, id as tie-break.
        scores.sort_by(|a, b| {
            match b.total.partial_cmp(&a.total).unwrap_or(Ordering::Equal) {
                Ordering::Equal => a.candidate_id.cmp(&b.candidate_id),
                other => other,
            }
        });
        scores.truncate(self.config.top_n);
        Ok(scores)
    }

    async fn enrich_selected(
        &self,
        survivors: &[(Candidate, f64)],
        selected: &[usize],
        per_search_budget_usd: f64,
    ) -> Vec<EnrichmentResult> {
        let ledger = BudgetLedger::new_usd(per_search_budget_usd);
        let semaphore = Semaphore::new(self.config.enrich_concurrency.max(1));
        let deadline = Instant::now() + self.config.batch_deadline;

        let tasks = selected.iter().map(|&idx| {
            let candidate = survivors[idx].0.clone();
            let ledger = &ledger;
            let semaphore = &semaphore;
            async move {
                let work = self.enrich_one(idx, candidate.clone(), semaphore, ledger);
                match timeout_at(deadline, work).await {
                    Ok(result) => result,
                    Err(_elapsed) => {
                        warn!(candidate = %candidate.id, "batch deadline cancelled enrichment");
                        EnrichmentResult {
                            idx,
                            candidate,
                            status: EnrichmentStatus::DeadlineExceeded,
                            code: None,
                        }
                    }
                }
            }
        });

        let results = join_all(tasks).await;
        info!(spent_usd = ledger.spent_usd(), "enrichment spend");
        results
    }

    async fn enrich_one(
        &self,
        idx: usize,
        mut candidate: Candidate,
        semaphore: &Semaphore,
        ledger: &BudgetLedger,
    ) -> EnrichmentResult {
        // Closed-semaphore errors cannot happen; treat one as "no permit".
        let _permit = semaphore.acquire().await.ok();

        let outcome = self
            .waterfall
            .enrich(&candidate, self.config.needs_code_profile, ledger)
            .await;
        for (source, record) in &outcome.fetched {
            apply_record(&mut candidate, record, source);
        }
        candidate.enrichment_tier = match &outcome.status {
            EnrichmentStatus::Complete { .. } | EnrichmentStatus::AlreadyComplete => {
                EnrichmentTier::Enriched
            }
            EnrichmentStatus::Partial { .. }
            | EnrichmentStatus::BudgetExhausted { .. }
            | EnrichmentStatus::DeadlineExceeded
            | EnrichmentStatus::NotSelected => {
                if is_complete(&candidate, false) {
                    EnrichmentTier::Enriched
                } else {
                    EnrichmentTier::Cheap
                }
            }
            // All tiers failed outright; the cheap score stands alone and
            // confidence carries the penalty.
            EnrichmentStatus::Failed { .. } => EnrichmentTier::None,
        };

        let code = self.fetch_code_activity(&mut candidate).await;
        EnrichmentResult {
            idx,
            candidate,
            status: outcome.status,
            code,
        }
    }

    async fn fetch_code_activity(&self, candidate: &mut Candidate) -> Option<CodeActivity> {
        let client = self.code_hosting.as_ref()?;
        let url = candidate.code_profile_url.clone()?;
        match client.activity(&url).await {
            Ok(activity) => {
                candidate.data_sources.insert(SOURCE_CODE_HOSTING.into());
                Some(activity)
            }
            Err(err) => {
                warn!(candidate = %candidate.id, error = %err, "code-hosting lookup failed");
                None
            }
        }
    }
}
