//! Provider fallback waterfall: walk the tiers in ascending cost order and
//! stop as soon as the merged profile is complete enough. Tiering exists for
//! unit economics; the cheapest tier hits often enough that the expected cost
//! per candidate stays far below always calling the richest provider.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use tracing::{debug, warn};

use super::budget::BudgetLedger;
use super::{source_richness, EnrichmentProvider, ProfileRecord};
use crate::normalize::normalize_skill_set;
use crate::Candidate;

/// Minimum skill count for a profile to count as complete.
const COMPLETE_MIN_SKILLS: usize = 3;

/// Why the tier walk stopped for one candidate. Surfaced to callers so every
/// response can say which tier was reached and why no further tier was tried.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum EnrichmentStatus {
    /// The gate never selected this candidate for paid enrichment.
    NotSelected,
    /// The candidate already satisfied the completeness check; no spend.
    AlreadyComplete,
    /// A tier completed the profile.
    Complete {
        tier: String,
        tiers_tried: Vec<String>,
        cost_cents: u32,
    },
    /// Some tier returned data but the walk ended before completeness.
    Partial { tiers_tried: Vec<String> },
    /// Every attempted tier failed or timed out; no data obtained.
    Failed { tiers_tried: Vec<String> },
    /// The shared budget ran out mid-walk. Soft signal, not an error.
    BudgetExhausted { tiers_tried: Vec<String> },
    /// The batch deadline cancelled this candidate's walk.
    DeadlineExceeded,
}

#[derive(Debug, Clone)]
pub struct EnrichmentOutcome {
    /// Successful tier responses in call order: (source tag, record).
    pub fetched: Vec<(&'static str, ProfileRecord)>,
    pub status: EnrichmentStatus,
}

impl EnrichmentOutcome {
    pub fn unfetched(status: EnrichmentStatus) -> Self {
        Self {
            fetched: Vec::new(),
            status,
        }
    }
}

/// Completeness check from the funnel contract: a name, at least one dated
/// experience entry, at least three skills, and a code-hosting link when the
/// role requires one.
pub fn is_complete(candidate: &Candidate, needs_code_profile: bool) -> bool {
    let named = candidate
        .full_name
        .as_deref()
        .is_some_and(|n| !n.trim().is_empty());
    let dated_experience = candidate
        .experience
        .iter()
        .any(|e| e.start_date.is_some());
    let skilled = candidate.skills.len() >= COMPLETE_MIN_SKILLS;
    let code_ok = !needs_code_profile || candidate.code_profile_url.is_some();
    named && dated_experience && skilled && code_ok
}

/// Fold a provider record into a candidate. Provider data replaces structured
/// fields when the tier is at least as rich as anything already recorded;
/// otherwise it only fills gaps. Skills always union.
pub fn apply_record(candidate: &mut Candidate, record: &ProfileRecord, source: &str) {
    let current_rank = candidate
        .data_sources
        .iter()
        .map(|s| source_richness(s))
        .max()
        .unwrap_or(0);
    let replace = source_richness(source) >= current_rank;

    apply_scalar(&mut candidate.full_name, &record.full_name, replace);
    apply_scalar(&mut candidate.headline, &record.headline, replace);
    apply_scalar(&mut candidate.code_profile_url, &record.code_profile_url, replace);

    candidate.skills.extend(normalize_skill_set(&record.skills));
    if !record.experience.is_empty() && (replace || candidate.experience.is_empty()) {
        candidate.experience = record.experience.clone();
    }
    if !record.education.is_empty() && (replace || candidate.education.is_empty()) {
        candidate.education = record.education.clone();
    }

    candidate.last_active = candidate.last_active.max(record.last_active);
    candidate.open_to_work |= record.open_to_work.unwrap_or(false);
    candidate.data_sources.insert(source.to_string());
}

fn apply_scalar(target: &mut Option<String>, value: &Option<String>, replace: bool) {
    match value {
        Some(v) if !v.trim().is_empty() && (replace || target.is_none()) => {
            *target = Some(v.clone());
        }
        _ => {}
    }
}

pub struct EnrichmentWaterfall {
    tiers: Vec<Arc<dyn EnrichmentProvider>>,
}

impl EnrichmentWaterfall {
    /// Tier order is always ascending cost, whatever order the caller
    /// supplied the providers in.
    pub fn new(mut tiers: Vec<Arc<dyn EnrichmentProvider>>) -> Self {
        tiers.sort_by_key(|tier| tier.cost_cents());
        Self { tiers }
    }

    pub fn tiers(&self) -> &[Arc<dyn EnrichmentProvider>] {
        &self.tiers
    }

    /// Walk the tiers for one candidate. The candidate itself is not
    /// mutated; the caller applies `fetched` records afterwards so batch
    /// state changes stay single-threaded and deterministic.
    pub async fn enrich(
        &self,
        candidate: &Candidate,
        needs_code_profile: bool,
        ledger: &BudgetLedger,
    ) -> EnrichmentOutcome {
        if is_complete(candidate, needs_code_profile) {
            return EnrichmentOutcome::unfetched(EnrichmentStatus::AlreadyComplete);
        }
        let Some(key) = candidate.primary_key() else {
            // Identity resolution guarantees at least a name, but a name
            // alone cannot be queried against any provider.
            return EnrichmentOutcome::unfetched(EnrichmentStatus::Failed {
                tiers_tried: Vec::new(),
            });
        };

        let mut working = candidate.clone();
        let mut tried: Vec<String> = Vec::new();
        let mut fetched: Vec<(&'static str, ProfileRecord)> = Vec::new();
        let mut cost_cents = 0u32;

        for tier in &self.tiers {
            if needs_code_profile && !tier.supplies_code_profile() {
                // Only the richest tier carries code-hosting links; calling a
                // tier that cannot satisfy the check would be wasted spend.
                debug!(tier = tier.name(), "skipping tier without code profile");
                continue;
            }
            if !ledger.can_afford(tier.cost_cents()) {
                debug!(tier = tier.name(), key = %key, "budget exhausted mid-waterfall");
                return EnrichmentOutcome {
                    fetched,
                    status: EnrichmentStatus::BudgetExhausted { tiers_tried: tried },
                };
            }

            tried.push(tier.name().to_string());
            match timeout(tier.call_timeout(), tier.lookup(&key)).await {
                Ok(Ok(record)) => {
                    ledger.charge(tier.cost_cents());
                    cost_cents += tier.cost_cents();
                    apply_record(&mut working, &record, tier.name());
                    fetched.push((tier.name(), record));
                    if is_complete(&working, needs_code_profile) {
                        return EnrichmentOutcome {
                            fetched,
                            status: EnrichmentStatus::Complete {
                                tier: tier.name().to_string(),
                                tiers_tried: tried,
                                cost_cents,
                            },
                        };
                    }
                }
                Ok(Err(err)) => {
                    warn!(tier = tier.name(), key = %key, error = %err, "tier lookup failed");
                }
                Err(_elapsed) => {
                    warn!(tier = tier.name(), key = %key, "tier lookup timed out");
                }
            }
        }

        let status = if fetched.is_empty() {
            EnrichmentStatus::Failed { tiers_tried: tried }
        } else {
            EnrichmentStatus::Partial { tiers_tried: tried }
        };
        EnrichmentOutcome { fetched, status }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrichment::{
        EnrichmentError, IdentityKey, SOURCE_PEOPLE_CACHE, SOURCE_PEOPLE_LIVE, SOURCE_PEOPLE_RICH,
    };
    use crate::Experience;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum Script {
        Hit(ProfileRecord),
        Miss,
        RateLimited,
    }

    struct FakeTier {
        tag: &'static str,
        cost: u32,
        code_profile: bool,
        script: Script,
        calls: AtomicUsize,
    }

    impl FakeTier {
        fn new(tag: &'static str, cost: u32, script: Script) -> Arc<Self> {
            Arc::new(Self {
                tag,
                cost,
                code_profile: tag == SOURCE_PEOPLE_RICH,
                script,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl EnrichmentProvider for FakeTier {
        fn name(&self) -> &'static str {
            self.tag
        }
        fn cost_cents(&self) -> u32 {
            self.cost
        }
        fn supplies_code_profile(&self) -> bool {
            self.code_profile
        }
        async fn lookup(&self, _key: &IdentityKey) -> Result<ProfileRecord, EnrichmentError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.script {
                Script::Hit(record) => Ok(record.clone()),
                Script::Miss => Err(EnrichmentError::NotFound),
                Script::RateLimited => Err(EnrichmentError::RateLimited),
            }
        }
    }

    fn tiers(fakes: Vec<Arc<FakeTier>>) -> Vec<Arc<dyn EnrichmentProvider>> {
        fakes
            .into_iter()
            .map(|fake| fake as Arc<dyn EnrichmentProvider>)
            .collect()
    }

    fn full_record(code_url: Option<&str>) -> ProfileRecord {
        ProfileRecord {
            full_name: Some("Jane Doe".into()),
            headline: Some("Senior Engineer".into()),
            skills: vec!["python".into(), "postgresql".into(), "aws".into()],
            experience: vec![Experience {
                company: "Stripe".into(),
                title: "Senior Engineer".into(),
                start_date: NaiveDate::from_ymd_opt(2021, 3, 1),
                end_date: None,
            }],
            code_profile_url: code_url.map(Into::into),
            ..ProfileRecord::default()
        }
    }

    fn base_candidate() -> Candidate {
        Candidate {
            id: "li:linkedin.com/in/janedoe".into(),
            linkedin_url: Some("linkedin.com/in/janedoe".into()),
            full_name: Some("Jane Doe".into()),
            ..Candidate::default()
        }
    }

    #[tokio::test]
    async fn cheapest_tier_hit_stops_the_walk() {
        let cache = FakeTier::new(SOURCE_PEOPLE_CACHE, 1, Script::Hit(full_record(None)));
        let live = FakeTier::new(SOURCE_PEOPLE_LIVE, 2, Script::Hit(full_record(None)));
        let waterfall = EnrichmentWaterfall::new(tiers(vec![cache.clone(), live.clone()]));
        let ledger = BudgetLedger::new_usd(10.0);

        let outcome = waterfall.enrich(&base_candidate(), false, &ledger).await;

        assert!(matches!(
            outcome.status,
            EnrichmentStatus::Complete { ref tier, .. } if tier == SOURCE_PEOPLE_CACHE
        ));
        assert_eq!(live.calls.load(Ordering::SeqCst), 0);
        assert_eq!(ledger.remaining_cents(), 999);
    }

    #[tokio::test]
    async fn misses_fall_through_to_richer_tiers() {
        let cache = FakeTier::new(SOURCE_PEOPLE_CACHE, 1, Script::Miss);
        let live = FakeTier::new(SOURCE_PEOPLE_LIVE, 2, Script::RateLimited);
        let rich = FakeTier::new(SOURCE_PEOPLE_RICH, 10, Script::Hit(full_record(Some("github.com/janedoe"))));
        let waterfall = EnrichmentWaterfall::new(tiers(vec![rich.clone(), cache, live]));
        let ledger = BudgetLedger::new_usd(10.0);

        let outcome = waterfall.enrich(&base_candidate(), false, &ledger).await;

        match outcome.status {
            EnrichmentStatus::Complete {
                tier,
                tiers_tried,
                cost_cents,
            } => {
                assert_eq!(tier, SOURCE_PEOPLE_RICH);
                assert_eq!(
                    tiers_tried,
                    vec![SOURCE_PEOPLE_CACHE, SOURCE_PEOPLE_LIVE, SOURCE_PEOPLE_RICH]
                );
                // Failed tiers are never charged.
                assert_eq!(cost_cents, 10);
            }
            other => panic!("unexpected status: {other:?}"),
        }
    }

    #[tokio::test]
    async fn code_profile_roles_skip_straight_to_the_rich_tier() {
        let cache = FakeTier::new(SOURCE_PEOPLE_CACHE, 1, Script::Hit(full_record(None)));
        let rich = FakeTier::new(SOURCE_PEOPLE_RICH, 10, Script::Hit(full_record(Some("github.com/janedoe"))));
        let waterfall = EnrichmentWaterfall::new(tiers(vec![cache.clone(), rich.clone()]));
        let ledger = BudgetLedger::new_usd(10.0);

        let outcome = waterfall.enrich(&base_candidate(), true, &ledger).await;

        assert_eq!(cache.calls.load(Ordering::SeqCst), 0);
        assert!(matches!(
            outcome.status,
            EnrichmentStatus::Complete { ref tier, .. } if tier == SOURCE_PEOPLE_RICH
        ));
    }

    #[tokio::test]
    async fn total_failure_reports_tried_tiers() {
        let cache = FakeTier::new(SOURCE_PEOPLE_CACHE, 1, Script::Miss);
        let live = FakeTier::new(SOURCE_PEOPLE_LIVE, 2, Script::Miss);
        let waterfall = EnrichmentWaterfall::new(tiers(vec![cache, live]));
        let ledger = BudgetLedger::new_usd(10.0);

        let outcome = waterfall.enrich(&base_candidate(), false, &ledger).await;

        assert!(outcome.fetched.is_empty());
        assert!(matches!(
            outcome.status,
            EnrichmentStatus::Failed { ref tiers_tried } if tiers_tried.len() == 2
        ));
        assert_eq!(ledger.remaining_cents(), 1000);
    }

    #[tokio::test]
    async fn exhausted_budget_stops_before_the_call() {
        let cache = FakeTier::new(SOURCE_PEOPLE_CACHE, 1, Script::Miss);
        let rich = FakeTier::new(SOURCE_PEOPLE_RICH, 10, Script::Hit(full_record(None)));
        let waterfall = EnrichmentWaterfall::new(tiers(vec![cache, rich.clone()]));
        let ledger = BudgetLedger::new_usd(0.05);

        let outcome = waterfall.enrich(&base_candidate(), false, &ledger).await;

        assert_eq!(rich.calls.load(Ordering::SeqCst), 0);
        assert!(matches!(outcome.status, EnrichmentStatus::BudgetExhausted { .. }));
    }

    #[tokio::test]
    async fn complete_candidates_cost_nothing() {
        let cache = FakeTier::new(SOURCE_PEOPLE_CACHE, 1, Script::Hit(full_record(None)));
        let waterfall = EnrichmentWaterfall::new(tiers(vec![cache.clone()]));
        let ledger = BudgetLedger::new_usd(10.0);

        let mut candidate = base_candidate();
        apply_record(&mut candidate, &full_record(None), SOURCE_PEOPLE_LIVE);
        let outcome = waterfall.enrich(&candidate, false, &ledger).await;

        assert!(matches!(outcome.status, EnrichmentStatus::AlreadyComplete));
        assert_eq!(cache.calls.load(Ordering::SeqCst), 0);
    }
}
