pub mod company;
pub mod enrichment;
pub mod graph;
pub mod identity;
pub mod logging;
pub mod matching;
pub mod normalize;
pub mod pipeline;

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// Commonly used data models for the scoring funnel.

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Seniority {
    Junior,
    Mid,
    Senior,
    Staff,
    Principal,
}

impl Seniority {
    /// Ordering rank used when comparing a detected level against a required one.
    pub fn rank(self) -> u8 {
        match self {
            Seniority::Junior => 0,
            Seniority::Mid => 1,
            Seniority::Senior => 2,
            Seniority::Staff => 3,
            Seniority::Principal => 4,
        }
    }

    /// Headline keywords that indicate this level. Matched as whole words so
    /// that short aliases like "sr" do not fire inside unrelated tokens.
    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            Seniority::Junior => &["junior", "jr", "entry", "intern", "graduate", "trainee"],
            Seniority::Mid => &["mid-level", "midlevel", "intermediate"],
            Seniority::Senior => &["senior", "sr", "lead"],
            Seniority::Staff => &["staff"],
            Seniority::Principal => &["principal", "distinguished"],
        }
    }

    pub fn all() -> &'static [Seniority] {
        &[
            Seniority::Junior,
            Seniority::Mid,
            Seniority::Senior,
            Seniority::Staff,
            Seniority::Principal,
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Experience {
    pub company: String,
    #[serde(default)]
    pub title: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl Experience {
    /// Days spent in this role; open-ended roles count up to `today`.
    pub fn tenure_days(&self, today: NaiveDate) -> i64 {
        let Some(start) = self.start_date else {
            return 0;
        };
        let end = self.end_date.unwrap_or(today);
        (end - start).num_days().max(0)
    }

    pub fn is_current(&self) -> bool {
        self.start_date.is_some() && self.end_date.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Education {
    pub school: String,
    pub degree: Option<String>,
    pub field: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrichmentTier {
    #[default]
    None,
    Cheap,
    Enriched,
}

/// One record about a person as it arrived from a single source,
/// before identity resolution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    /// Source tag of whatever produced this record (discovery search,
    /// referral import, enrichment provider, ...).
    pub source: String,
    pub full_name: Option<String>,
    pub headline: Option<String>,
    pub linkedin_url: Option<String>,
    pub email: Option<String>,
    pub github_url: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub experience: Vec<Experience>,
    #[serde(default)]
    pub education: Vec<Education>,
    /// Warmth hint supplied by discovery (e.g. "2nd degree" badges);
    /// merged by max, never replaces graph-derived warmth.
    pub warmth_hint: Option<f64>,
    pub last_active: Option<DateTime<Utc>>,
    pub open_to_work: Option<bool>,
}

/// One real person under consideration, the output of identity resolution.
/// Mutated in place as enrichment tiers complete; treated as immutable once
/// a `MatchScore` exists for the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Deterministic id derived from the strongest identity key present
    /// at resolution time.
    pub id: String,
    pub full_name: Option<String>,
    pub headline: Option<String>,
    pub linkedin_url: Option<String>,
    pub email: Option<String>,
    pub github_url: Option<String>,
    /// Code-hosting profile link; only the richest enrichment tier supplies it.
    pub code_profile_url: Option<String>,
    pub skills: BTreeSet<String>,
    pub experience: Vec<Experience>,
    pub education: Vec<Education>,
    pub data_sources: BTreeSet<String>,
    pub enrichment_tier: EnrichmentTier,
    /// 1.0 for deterministic-key merges; < 1.0 when any constituent record
    /// was merged via the fuzzy name+school fallback.
    pub merge_confidence: f64,
    pub warmth_hint: Option<f64>,
    pub last_active: Option<DateTime<Utc>>,
    pub open_to_work: bool,
}

impl Default for Candidate {
    fn default() -> Self {
        Self {
            id: String::new(),
            full_name: None,
            headline: None,
            linkedin_url: None,
            email: None,
            github_url: None,
            code_profile_url: None,
            skills: BTreeSet::new(),
            experience: Vec::new(),
            education: Vec::new(),
            data_sources: BTreeSet::new(),
            enrichment_tier: EnrichmentTier::None,
            merge_confidence: 1.0,
            warmth_hint: None,
            last_active: None,
            open_to_work: false,
        }
    }
}

impl Candidate {
    /// Total days across dated experience entries.
    pub fn total_experience_days(&self, today: NaiveDate) -> i64 {
        self.experience.iter().map(|e| e.tenure_days(today)).sum()
    }

    /// The role the candidate currently holds, preferring open-ended entries
    /// with the most recent start.
    pub fn current_role(&self) -> Option<&Experience> {
        self.experience
            .iter()
            .filter(|e| e.is_current())
            .max_by_key(|e| e.start_date)
            .or_else(|| self.experience.iter().max_by_key(|e| e.start_date))
    }
}

/// The role being filled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobRequirements {
    pub title: String,
    #[serde(default)]
    pub required_skills: BTreeSet<String>,
    #[serde(default)]
    pub preferred_skills: BTreeSet<String>,
    pub seniority: Option<Seniority>,
    #[serde(default)]
    pub min_years_experience: u32,
    #[serde(default)]
    pub target_companies: BTreeSet<String>,
    pub industry: Option<String>,
    pub location: Option<String>,
}
