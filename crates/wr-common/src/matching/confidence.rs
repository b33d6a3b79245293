//! Confidence: a statement about data completeness, not candidate quality.
//! A confidently-scored weak candidate and an unconfidently-scored strong
//! one are different failure modes and must not be conflated downstream.

use crate::enrichment::{
    SOURCE_CODE_HOSTING, SOURCE_PEOPLE_CACHE, SOURCE_PEOPLE_LIVE, SOURCE_PEOPLE_RICH,
};
use crate::Candidate;

const PRIMARY_KEY_WEIGHT: f64 = 0.25;
const RICH_PROVIDER_WEIGHT: f64 = 0.45;
const RICH_PROVIDER_THIN_WEIGHT: f64 = 0.35;
const LOWER_TIER_WEIGHT: f64 = 0.15;
const CODE_HOSTING_WEIGHT: f64 = 0.20;
const WARMTH_WEIGHT: f64 = 0.10;

/// Estimate data completeness from which sources contributed, `[0, 1]`.
pub fn estimate(candidate: &Candidate, warmth: f64) -> f64 {
    let mut confidence = 0.0;

    if candidate.linkedin_url.is_some() {
        confidence += PRIMARY_KEY_WEIGHT;
    }

    let sources = &candidate.data_sources;
    if sources.contains(SOURCE_PEOPLE_RICH) {
        if candidate.experience.len() >= 2 {
            confidence += RICH_PROVIDER_WEIGHT;
        } else {
            confidence += RICH_PROVIDER_THIN_WEIGHT;
        }
    } else if sources.contains(SOURCE_PEOPLE_CACHE) || sources.contains(SOURCE_PEOPLE_LIVE) {
        confidence += LOWER_TIER_WEIGHT;
    }

    if sources.contains(SOURCE_CODE_HOSTING) {
        confidence += CODE_HOSTING_WEIGHT;
    }

    // Any connection path at all, independent of its strength.
    if warmth > 0.0 {
        confidence += WARMTH_WEIGHT;
    }

    // Fuzzy identity merges cap what the data can be trusted to say.
    (confidence * candidate.merge_confidence.clamp(0.0, 1.0)).min(1.0)
}
