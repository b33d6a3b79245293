//! The composite scorer: one implementation with named sub-score functions
//! behind a stable interface, composing skills/experience/warmth/timing and
//! confidence into a ranked `MatchScore`.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use super::confidence;
use super::experience::experience_fit;
use super::skills::skills_fit;
use super::timing::{timing_fit, TimingConfig};
use super::weights::{Weights, SCORE_WEIGHTS};
use super::{status_from_score, SubScore};
use crate::enrichment::waterfall::EnrichmentStatus;
use crate::enrichment::CodeActivity;
use crate::graph::{EdgeKind, IntroPath, WarmthResult};
use crate::{Candidate, JobRequirements};

#[derive(Debug, Clone, Default)]
pub struct ScoringConfig {
    pub timing: TimingConfig,
}

/// Scored output for one (candidate, job) pair within one search session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchScore {
    pub candidate_id: String,
    pub full_name: Option<String>,
    /// Weighted sum of the four components, 0–100.
    pub total: f64,
    pub skills: SubScore,
    pub experience: SubScore,
    pub warmth: SubScore,
    pub timing: SubScore,
    /// Data completeness, 0.0–1.0. Independent of fit quality.
    pub confidence: f64,
    pub data_sources: BTreeSet<String>,
    /// Human-readable, non-authoritative.
    pub reasoning: String,
    /// Which enrichment tier was reached and why the walk stopped.
    pub enrichment: EnrichmentStatus,
    pub intro_path: Option<IntroPath>,
}

/// One row of `MatchScore::breakdown()`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentBreakdown {
    pub component: &'static str,
    pub weight: f64,
    pub score: f64,
    pub weighted: f64,
    pub status: &'static str,
    pub details: String,
}

/// Structured breakdown for UI rendering. Formats already-computed values;
/// never recomputes a score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub candidate_id: String,
    pub total: f64,
    pub confidence: f64,
    pub components: Vec<ComponentBreakdown>,
    pub enrichment: EnrichmentStatus,
    pub intro_path: Option<IntroPath>,
}

impl MatchScore {
    pub fn breakdown(&self) -> ScoreBreakdown {
        let weights = SCORE_WEIGHTS;
        let row = |component: &'static str, weight: f64, sub: &SubScore| ComponentBreakdown {
            component,
            weight,
            score: sub.score,
            weighted: sub.score * weight,
            status: sub.status,
            details: sub.details.clone(),
        };
        ScoreBreakdown {
            candidate_id: self.candidate_id.clone(),
            total: self.total,
            confidence: self.confidence,
            components: vec![
                row("skills", weights.skills, &self.skills),
                row("experience", weights.experience, &self.experience),
                row("warmth", weights.warmth, &self.warmth),
                row("timing", weights.timing, &self.timing),
            ],
            enrichment: self.enrichment.clone(),
            intro_path: self.intro_path.clone(),
        }
    }
}

pub struct CandidateScorer {
    config: ScoringConfig,
    weights: Weights,
}

impl Default for CandidateScorer {
    fn default() -> Self {
        Self::new(ScoringConfig::default())
    }
}

impl CandidateScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self {
            config,
            weights: SCORE_WEIGHTS,
        }
    }

    /// Compose the sub-scores for one candidate. All scoring math is
    /// synchronous; enrichment I/O happened upstream.
    #[allow(clippy::too_many_arguments)]
    pub fn score(
        &self,
        candidate: &Candidate,
        job: &JobRequirements,
        warmth: &WarmthResult,
        cheap_score: f64,
        code: Option<&CodeActivity>,
        enrichment: EnrichmentStatus,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> MatchScore {
        let skills = skills_fit(candidate, job, code, cheap_score);
        let experience = experience_fit(candidate, job, today);
        let warmth_sub = warmth_sub_score(warmth);
        let timing = timing_fit(candidate, &self.config.timing, today, now);
        let confidence = confidence::estimate(candidate, warmth.score);

        let total = self
            .weights
            .total(skills.score, experience.score, warmth_sub.score, timing.score);

        let reasoning = format!(
            "skills: {} | experience: {} | warmth: {} | timing: {}",
            skills.details, experience.details, warmth_sub.details, timing.details
        );

        MatchScore {
            candidate_id: candidate.id.clone(),
            full_name: candidate.full_name.clone(),
            total,
            skills,
            experience,
            warmth: warmth_sub,
            timing,
            confidence,
            data_sources: candidate.data_sources.clone(),
            reasoning,
            enrichment,
            intro_path: warmth.path.clone(),
        }
    }
}

fn warmth_sub_score(warmth: &WarmthResult) -> SubScore {
    let details = match &warmth.path {
        Some(path) => match &path.edge {
            EdgeKind::Direct => format!("direct contact: {}", path.contact),
            EdgeKind::Coworker {
                company,
                long_tenure,
            } => format!(
                "intro via {} (coworker at {company}{})",
                path.contact,
                if *long_tenure { ", long tenure" } else { "" }
            ),
            EdgeKind::Alumnus { school } => {
                format!("intro via {} (alumnus of {school})", path.contact)
            }
        },
        None => "no network path".to_string(),
    };
    SubScore::new(warmth.score, status_from_score(warmth.score), details)
}
