//! The enrichment gate: decide how many and which candidates are worth a
//! paid call, given the remaining daily budget.

use std::cmp::Ordering;

use tracing::info;

#[derive(Debug, Clone)]
pub struct GatePolicy {
    /// Never enrich fewer than this many (budget floor; applies even when
    /// affordability math says less).
    pub min_batch: usize,
    /// Never enrich more than this many in one search.
    pub max_batch: usize,
    /// Candidates below this cheap score are not worth any spend,
    /// regardless of warmth.
    pub cheap_score_floor: f64,
}

impl Default for GatePolicy {
    fn default() -> Self {
        Self {
            min_batch: 20,
            max_batch: 100,
            cheap_score_floor: 20.0,
        }
    }
}

/// One pooled candidate as seen by the gate: its position in the caller's
/// pool plus the two free signals selection is based on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoolEntry {
    pub idx: usize,
    pub cheap_score: f64,
    pub warmth: f64,
}

impl PoolEntry {
    /// Expected-ROI ordering key: plausible fits that are already
    /// network-connected are enriched first.
    pub fn priority(&self) -> f64 {
        self.cheap_score + 0.5 * self.warmth
    }
}

#[derive(Debug)]
pub struct EnrichmentGate {
    policy: GatePolicy,
}

impl Default for EnrichmentGate {
    fn default() -> Self {
        Self::new(GatePolicy::default())
    }
}

impl EnrichmentGate {
    pub fn new(policy: GatePolicy) -> Self {
        Self { policy }
    }

    /// Select pool indices worth enriching, ordered by priority descending.
    ///
    /// `count = clamp(floor(daily / active / cost), min_batch, max_batch)`,
    /// capped by the filtered pool size. The cheap-score floor is the free
    /// elimination step and runs before any budget math.
    pub fn select(
        &self,
        pool: &[PoolEntry],
        daily_budget_usd: f64,
        cost_per_enrichment_usd: f64,
        active_searches: u32,
    ) -> Vec<usize> {
        let mut eligible: Vec<PoolEntry> = pool
            .iter()
            .filter(|entry| entry.cheap_score >= self.policy.cheap_score_floor)
            .copied()
            .collect();

        eligible.sort_by(|a, b| {
            match b.priority().partial_cmp(&a.priority()).unwrap_or(Ordering::Equal) {
                Ordering::Equal => a.idx.cmp(&b.idx),
                other => other,
            }
        });

        let per_search_budget = if active_searches == 0 {
            daily_budget_usd
        } else {
            daily_budget_usd / active_searches as f64
        };
        let max_affordable = if cost_per_enrichment_usd > 0.0 {
            (per_search_budget / cost_per_enrichment_usd).floor() as usize
        } else {
            self.policy.max_batch
        };

        // Env-supplied bounds can arrive inverted; clamp panics on lo > hi.
        let floor = self.policy.min_batch.min(self.policy.max_batch);
        let ceiling = self.policy.min_batch.max(self.policy.max_batch);
        let count = max_affordable.clamp(floor, ceiling).min(eligible.len());

        info!(
            pool = pool.len(),
            eligible = eligible.len(),
            max_affordable,
            selected = count,
            "enrichment gate"
        );

        eligible.truncate(count);
        eligible.into_iter().map(|entry| entry.idx).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(scores: &[(f64, f64)]) -> Vec<PoolEntry> {
        scores
            .iter()
            .enumerate()
            .map(|(idx, &(cheap_score, warmth))| PoolEntry {
                idx,
                cheap_score,
                warmth,
            })
            .collect()
    }

    #[test]
    fn budget_caps_selection_between_floor_and_ceiling() {
        let gate = EnrichmentGate::default();
        let entries = pool(&vec![(50.0, 0.0); 300]);

        // 50 / 2 searches / $0.10 = 250 affordable, clamped to 100.
        let selected = gate.select(&entries, 50.0, 0.10, 2);
        assert_eq!(selected.len(), 100);

        // $1 / 1 / $0.10 = 10 affordable, floored to 20.
        let selected = gate.select(&entries, 1.0, 0.10, 1);
        assert_eq!(selected.len(), 20);
    }

    #[test]
    fn inverted_batch_bounds_do_not_panic() {
        let gate = EnrichmentGate::new(GatePolicy {
            min_batch: 100,
            max_batch: 20,
            cheap_score_floor: 20.0,
        });
        let entries = pool(&vec![(50.0, 0.0); 300]);

        // $1 / 1 / $0.10 = 10 affordable, pulled up to the effective floor.
        let selected = gate.select(&entries, 1.0, 0.10, 1);
        assert_eq!(selected.len(), 20);
    }

    #[test]
    fn never_exceeds_pool_size() {
        let gate = EnrichmentGate::default();
        let entries = pool(&vec![(50.0, 0.0); 7]);
        let selected = gate.select(&entries, 50.0, 0.10, 1);
        assert_eq!(selected.len(), 7);
    }

    #[test]
    fn warm_candidates_jump_the_queue() {
        let gate = EnrichmentGate::new(GatePolicy {
            min_batch: 1,
            max_batch: 1,
            ..GatePolicy::default()
        });
        // 60 + 0.5*0 = 60 vs 45 + 0.5*70 = 80.
        let entries = pool(&[(60.0, 0.0), (45.0, 70.0)]);
        let selected = gate.select(&entries, 50.0, 0.10, 1);
        assert_eq!(selected, vec![1]);
    }

    #[test]
    fn cheap_floor_excludes_regardless_of_warmth() {
        let gate = EnrichmentGate::default();
        let entries = pool(&[(10.0, 100.0), (25.0, 0.0)]);
        let selected = gate.select(&entries, 50.0, 0.10, 1);
        assert_eq!(selected, vec![1]);
    }

    #[test]
    fn equal_priority_breaks_ties_by_pool_order() {
        let gate = EnrichmentGate::default();
        let entries = pool(&[(40.0, 0.0), (40.0, 0.0), (40.0, 0.0)]);
        let selected = gate.select(&entries, 50.0, 0.10, 1);
        assert_eq!(selected, vec![0, 1, 2]);
    }
}
