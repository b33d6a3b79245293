pub mod cheap;
pub mod confidence;
pub mod experience;
pub mod skills;
pub mod timing;
pub mod weights;

mod scoring;

pub use scoring::{CandidateScorer, ComponentBreakdown, MatchScore, ScoreBreakdown, ScoringConfig};

use serde::Serialize;

/// One scored component on the 0–100 scale, with a label and a
/// human-readable explanation. `details` is non-authoritative.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubScore {
    pub score: f64,
    pub status: &'static str,
    pub details: String,
}

impl SubScore {
    pub fn new(score: f64, status: &'static str, details: impl Into<String>) -> Self {
        Self {
            score: score.clamp(0.0, 100.0),
            status,
            details: details.into(),
        }
    }
}

pub(crate) fn status_from_score(score: f64) -> &'static str {
    if score >= 80.0 {
        "PERFECT_MATCH"
    } else if score >= 60.0 {
        "MATCH"
    } else if score >= 30.0 {
        "PARTIAL_MATCH"
    } else {
        "MISS"
    }
}
