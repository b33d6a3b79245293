//! Enrichment collaborators: the paid provider tiers, the free code-hosting
//! lookup, the budget ledger and the selection gate. Vendor HTTP clients are
//! out of scope; everything here is expressed against traits so the waterfall
//! stays provider-agnostic and testable with fakes.

pub mod budget;
pub mod gate;
pub mod waterfall;

use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Education, Experience};

/// Data-source tags recorded on candidates. Confidence estimation keys off
/// these, so provider implementations must report one of the known tags.
pub const SOURCE_DISCOVERY: &str = "discovery";
pub const SOURCE_PEOPLE_CACHE: &str = "people_cache";
pub const SOURCE_PEOPLE_LIVE: &str = "people_live";
pub const SOURCE_PEOPLE_RICH: &str = "people_rich";
pub const SOURCE_CODE_HOSTING: &str = "code_hosting";

/// Field-precedence rank used when merging disagreeing records: structured
/// enrichment providers outrank discovery/search sources.
pub fn source_richness(source: &str) -> u8 {
    match source {
        SOURCE_PEOPLE_RICH => 4,
        SOURCE_PEOPLE_LIVE => 3,
        SOURCE_PEOPLE_CACHE => 2,
        _ => 1,
    }
}

/// A deterministic key a provider can be queried with.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdentityKey {
    Linkedin(String),
    Email(String),
    Github(String),
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityKey::Linkedin(k) => write!(f, "li:{k}"),
            IdentityKey::Email(k) => write!(f, "em:{k}"),
            IdentityKey::Github(k) => write!(f, "gh:{k}"),
        }
    }
}

impl crate::Candidate {
    /// Strongest deterministic key available for provider lookups.
    pub fn primary_key(&self) -> Option<IdentityKey> {
        if let Some(k) = &self.linkedin_url {
            Some(IdentityKey::Linkedin(k.clone()))
        } else if let Some(k) = &self.email {
            Some(IdentityKey::Email(k.clone()))
        } else {
            self.github_url.clone().map(IdentityKey::Github)
        }
    }
}

/// What one provider tier returned for one person.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub full_name: Option<String>,
    pub headline: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub experience: Vec<Experience>,
    #[serde(default)]
    pub education: Vec<Education>,
    pub code_profile_url: Option<String>,
    pub last_active: Option<DateTime<Utc>>,
    pub open_to_work: Option<bool>,
}

#[derive(Debug, Error)]
pub enum EnrichmentError {
    #[error("profile not found")]
    NotFound,
    #[error("provider rate limited")]
    RateLimited,
    #[error("provider call timed out")]
    Timeout,
    #[error("provider error: {0}")]
    Provider(String),
}

/// One enrichment tier. Implementations are supplied by the caller;
/// cost and capabilities drive the waterfall order and tier skipping.
#[async_trait]
pub trait EnrichmentProvider: Send + Sync {
    /// Doubles as the data-source tag recorded on enriched candidates.
    fn name(&self) -> &'static str;

    /// Cost of one successful lookup, in US cents.
    fn cost_cents(&self) -> u32;

    /// Whether this tier can return a code-hosting profile link.
    fn supplies_code_profile(&self) -> bool {
        false
    }

    /// Per-call deadline; a slow call is treated as a failed call.
    fn call_timeout(&self) -> Duration {
        Duration::from_secs(10)
    }

    async fn lookup(&self, key: &IdentityKey) -> Result<ProfileRecord, EnrichmentError>;
}

/// Aggregated signal from a code-hosting profile (free, rate-limited API).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CodeActivity {
    #[serde(default)]
    pub languages: BTreeSet<String>,
    /// Commit-equivalent contributions over the trailing 90 days.
    #[serde(default)]
    pub contributions_last_quarter: u32,
    /// Stars on the candidate's most popular relevant repository.
    #[serde(default)]
    pub max_repo_stars: u32,
}

#[async_trait]
pub trait CodeHostingClient: Send + Sync {
    async fn activity(&self, profile_url: &str) -> Result<CodeActivity, EnrichmentError>;
}
