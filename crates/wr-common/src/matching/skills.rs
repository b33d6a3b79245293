//! Skills fit: keyword presence, structured skill overlap, and code-hosting
//! validation.

use super::{status_from_score, SubScore};
use crate::enrichment::CodeActivity;
use crate::normalize::{nfkc_lower_trim, normalize_skill};
use crate::{Candidate, EnrichmentTier, JobRequirements};

const KEYWORD_POINTS: f64 = 10.0;
const KEYWORD_CAP: f64 = 40.0;
const OVERLAP_CAP: f64 = 40.0;
const CODE_LANGUAGE_POINTS: f64 = 10.0;
const CODE_ACTIVITY_POINTS: f64 = 5.0;
const CODE_POPULARITY_POINTS: f64 = 5.0;

/// Contribution threshold for "sustained recent activity" on a code profile.
const SUSTAINED_CONTRIBUTIONS: u32 = 30;
const POPULAR_REPO_STARS: u32 = 50;

/// Skills fit, 0–100.
///
/// Non-enriched candidates only have their headline, so their fit is the
/// cheap-score heuristic carried forward with an `UNKNOWN` status; the
/// confidence estimate is what tells the two apart downstream.
pub fn skills_fit(
    candidate: &Candidate,
    job: &JobRequirements,
    code: Option<&CodeActivity>,
    cheap_score: f64,
) -> SubScore {
    if candidate.enrichment_tier != EnrichmentTier::Enriched {
        return SubScore::new(
            cheap_score,
            "UNKNOWN",
            "headline heuristic only (no enriched skill data)",
        );
    }

    let haystack = {
        let headline = candidate.headline.as_deref().unwrap_or_default();
        let title = candidate
            .current_role()
            .map(|role| role.title.as_str())
            .unwrap_or_default();
        nfkc_lower_trim(&format!("{headline} {title}"))
    };
    let mut keyword_matches = 0usize;
    for skill in &job.required_skills {
        let needle = nfkc_lower_trim(skill);
        if !needle.is_empty() && haystack.contains(needle.as_str()) {
            keyword_matches += 1;
        }
    }
    let keyword_points = (keyword_matches as f64 * KEYWORD_POINTS).min(KEYWORD_CAP);

    let required: Vec<String> = job.required_skills.iter().map(|s| normalize_skill(s)).collect();
    let overlap = required
        .iter()
        .filter(|skill| candidate.skills.contains(*skill))
        .count();
    let overlap_points = if required.is_empty() {
        // No requirements to miss; neutral credit rather than free points.
        OVERLAP_CAP / 2.0
    } else {
        overlap as f64 / required.len() as f64 * OVERLAP_CAP
    };

    let (code_points, code_detail) = match code {
        Some(activity) => code_validation(activity, &required),
        None => (0.0, "no code-hosting data".to_string()),
    };

    let score = keyword_points + overlap_points + code_points;
    SubScore::new(
        score,
        status_from_score(score),
        format!(
            "keywords {keyword_matches}/4, skills {overlap}/{} matched, {code_detail}",
            required.len()
        ),
    )
}

fn code_validation(activity: &CodeActivity, required: &[String]) -> (f64, String) {
    let mut points = 0.0;
    let mut notes: Vec<&str> = Vec::new();

    let language_match = activity
        .languages
        .iter()
        .any(|lang| required.contains(&normalize_skill(lang)));
    if language_match {
        points += CODE_LANGUAGE_POINTS;
        notes.push("language match");
    }
    if activity.contributions_last_quarter >= SUSTAINED_CONTRIBUTIONS {
        points += CODE_ACTIVITY_POINTS;
        notes.push("active committer");
    }
    if activity.max_repo_stars >= POPULAR_REPO_STARS {
        points += CODE_POPULARITY_POINTS;
        notes.push("popular repo");
    }

    let detail = if notes.is_empty() {
        "code profile without matching signal".to_string()
    } else {
        format!("code: {}", notes.join(" + "))
    };
    (points, detail)
}
