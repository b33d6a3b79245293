//! Per-session dollar budget, the one piece of mutable state shared by
//! concurrent enrichment tasks.

use std::sync::atomic::{AtomicI64, Ordering};

use tracing::debug;

/// Atomic spend counter in US cents. Charged per successful paid call,
/// never reserved upfront, so concurrent failures cannot exhaust budget.
#[derive(Debug)]
pub struct BudgetLedger {
    remaining_cents: AtomicI64,
    spent_cents: AtomicI64,
}

impl BudgetLedger {
    pub fn new_usd(budget_usd: f64) -> Self {
        let cents = (budget_usd.max(0.0) * 100.0).round() as i64;
        Self {
            remaining_cents: AtomicI64::new(cents),
            spent_cents: AtomicI64::new(0),
        }
    }

    pub fn remaining_cents(&self) -> i64 {
        self.remaining_cents.load(Ordering::Relaxed)
    }

    pub fn spent_usd(&self) -> f64 {
        self.spent_cents.load(Ordering::Relaxed) as f64 / 100.0
    }

    /// Whether a call of the given cost should be attempted at all.
    /// Advisory only; the charge happens after the call succeeds.
    pub fn can_afford(&self, cost_cents: u32) -> bool {
        self.remaining_cents() >= cost_cents as i64
    }

    /// Record a successful paid call. Under concurrency the counter may dip
    /// slightly below zero (at most K in-flight calls); that is the accepted
    /// cost of not reserving upfront.
    pub fn charge(&self, cost_cents: u32) {
        let after = self
            .remaining_cents
            .fetch_sub(cost_cents as i64, Ordering::Relaxed)
            - cost_cents as i64;
        self.spent_cents.fetch_add(cost_cents as i64, Ordering::Relaxed);
        debug!(cost_cents, remaining_cents = after, "enrichment charge");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn charges_accumulate_and_deplete() {
        let ledger = BudgetLedger::new_usd(0.25);
        assert!(ledger.can_afford(10));

        ledger.charge(10);
        ledger.charge(10);
        assert!(ledger.can_afford(5));
        assert!(!ledger.can_afford(10));
        assert_eq!(ledger.remaining_cents(), 5);
        assert!((ledger.spent_usd() - 0.20).abs() < 1e-9);
    }

    #[test]
    fn failed_calls_cost_nothing() {
        let ledger = BudgetLedger::new_usd(0.02);
        // A failed call is simply never charged.
        assert!(ledger.can_afford(2));
        assert_eq!(ledger.remaining_cents(), 2);
    }

    #[test]
    fn negative_budgets_clamp_to_zero() {
        let ledger = BudgetLedger::new_usd(-5.0);
        assert!(!ledger.can_afford(1));
    }
}
