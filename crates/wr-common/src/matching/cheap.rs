//! Headline-only heuristic scoring: zero cost, zero I/O.
//!
//! Deliberately a keyword heuristic, not a classifier. Its job is cheap
//! elimination over hundreds of candidates before any paid call; a false
//! positive only costs one enrichment call later.

use std::collections::BTreeSet;

use crate::normalize::{contains_word, nfkc_lower_trim};
use crate::{JobRequirements, Seniority};

const TITLE_TOKEN_POINTS: f64 = 15.0;
const TITLE_CONTRIBUTION_CAP: f64 = 50.0;
const SKILL_POINTS: f64 = 10.0;
const KEYWORD_CONTRIBUTION_CAP: f64 = 80.0;
const SENIORITY_BONUS: f64 = 20.0;
const SENIORITY_PENALTY: f64 = 20.0;

/// Score a headline against a role, 0–100. Pure function: identical inputs
/// always yield identical output.
pub fn cheap_score(headline: &str, job: &JobRequirements) -> f64 {
    let haystack = nfkc_lower_trim(headline);
    if haystack.is_empty() {
        return 0.0;
    }

    let title_tokens: BTreeSet<String> = job
        .title
        .split_whitespace()
        .map(nfkc_lower_trim)
        .filter(|t| t.chars().count() > 3)
        .collect();
    let mut title_points = 0.0;
    for token in &title_tokens {
        if haystack.contains(token.as_str()) {
            title_points += TITLE_TOKEN_POINTS;
        }
    }
    title_points = title_points.min(TITLE_CONTRIBUTION_CAP);

    let mut keyword_points = title_points;
    for skill in &job.required_skills {
        let skill = nfkc_lower_trim(skill);
        if !skill.is_empty() && haystack.contains(skill.as_str()) {
            keyword_points += SKILL_POINTS;
        }
    }
    keyword_points = keyword_points.min(KEYWORD_CONTRIBUTION_CAP);

    let mut score = keyword_points;
    if let Some(required) = job.seniority {
        score += seniority_adjustment(&haystack, required);
    }

    score.clamp(0.0, 100.0)
}

/// +20 when the required level's keywords appear; −20 when only a strictly
/// lower level's keywords do (e.g. "junior" in a headline for a senior role).
fn seniority_adjustment(haystack: &str, required: Seniority) -> f64 {
    if keyword_present(haystack, required) {
        return SENIORITY_BONUS;
    }
    let lower_present = Seniority::all()
        .iter()
        .filter(|level| level.rank() < required.rank())
        .any(|level| keyword_present(haystack, *level));
    if lower_present {
        -SENIORITY_PENALTY
    } else {
        0.0
    }
}

fn keyword_present(haystack: &str, level: Seniority) -> bool {
    level
        .keywords()
        .iter()
        .any(|keyword| contains_word(haystack, keyword))
}
