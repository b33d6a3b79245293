//! Identity resolution: collapse raw records from multiple providers into
//! one candidate per real person before anything is scored.

use std::collections::{BTreeSet, HashMap};

use thiserror::Error;
use tracing::{debug, warn};

use crate::enrichment::source_richness;
use crate::normalize::{
    normalize_email, normalize_name, normalize_profile_url, normalize_skill_set,
};
use crate::{Candidate, RawRecord};

#[derive(Debug, Error)]
#[error("record carries no usable identity key (linkedin/email/github/name)")]
pub struct MissingIdentityKey;

#[derive(Debug, Clone, Default)]
pub struct ResolveOutcome {
    pub candidates: Vec<Candidate>,
    /// Records dropped for lacking any identity key. Counted, never silent.
    pub rejected: usize,
}

#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Confidence assigned when records are merged only via the fuzzy
    /// name+school fallback.
    pub fuzzy_merge_confidence: f64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            fuzzy_merge_confidence: 0.75,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct RecordKeys {
    linkedin: Option<String>,
    email: Option<String>,
    github: Option<String>,
    name: Option<String>,
}

impl RecordKeys {
    fn extract(record: &RawRecord) -> Result<Self, MissingIdentityKey> {
        let keys = Self {
            linkedin: record
                .linkedin_url
                .as_deref()
                .and_then(normalize_profile_url),
            email: record.email.as_deref().and_then(normalize_email),
            github: record.github_url.as_deref().and_then(normalize_profile_url),
            name: record
                .full_name
                .as_deref()
                .map(normalize_name)
                .filter(|n| !n.is_empty()),
        };
        if keys.linkedin.is_none()
            && keys.email.is_none()
            && keys.github.is_none()
            && keys.name.is_none()
        {
            return Err(MissingIdentityKey);
        }
        Ok(keys)
    }

    fn candidate_id(&self) -> String {
        if let Some(k) = &self.linkedin {
            format!("li:{k}")
        } else if let Some(k) = &self.email {
            format!("em:{k}")
        } else if let Some(k) = &self.github {
            format!("gh:{k}")
        } else {
            format!("nm:{}", self.name.as_deref().unwrap_or_default())
        }
    }
}

struct Slot {
    candidate: Candidate,
    /// Richness rank of the source that currently owns the structured
    /// fields; lower-ranked sources may only fill gaps.
    field_rank: u8,
    name_key: Option<String>,
    schools: BTreeSet<String>,
}

pub struct IdentityResolver {
    config: ResolverConfig,
}

impl Default for IdentityResolver {
    fn default() -> Self {
        Self::new(ResolverConfig::default())
    }
}

impl IdentityResolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    /// Merge raw records into canonical candidates.
    ///
    /// Merge key priority, first match wins: linkedin URL, email, github URL,
    /// then normalized name equality plus at least one shared school. Records
    /// matched by the fuzzy rule never overwrite fields set by a
    /// deterministic-key merge. Idempotent: resolving the same multiset twice
    /// yields structurally equal output.
    pub fn resolve(&self, records: &[RawRecord]) -> ResolveOutcome {
        let mut slots: Vec<Slot> = Vec::new();
        let mut by_linkedin: HashMap<String, usize> = HashMap::new();
        let mut by_email: HashMap<String, usize> = HashMap::new();
        let mut by_github: HashMap<String, usize> = HashMap::new();
        let mut rejected = 0usize;

        for record in records {
            let keys = match RecordKeys::extract(record) {
                Ok(keys) => keys,
                Err(err) => {
                    warn!(source = %record.source, error = %err, "raw record rejected");
                    rejected += 1;
                    continue;
                }
            };

            let deterministic_hit = keys
                .linkedin
                .as_ref()
                .and_then(|k| by_linkedin.get(k))
                .or_else(|| keys.email.as_ref().and_then(|k| by_email.get(k)))
                .or_else(|| keys.github.as_ref().and_then(|k| by_github.get(k)))
                .copied();

            let (idx, fuzzy) = match deterministic_hit {
                Some(idx) => (idx, false),
                None => match self.fuzzy_match(&slots, &keys, record) {
                    Some(idx) => (idx, true),
                    None => {
                        slots.push(Slot {
                            candidate: Candidate {
                                id: keys.candidate_id(),
                                ..Candidate::default()
                            },
                            field_rank: 0,
                            name_key: keys.name.clone(),
                            schools: BTreeSet::new(),
                        });
                        (slots.len() - 1, false)
                    }
                },
            };

            if fuzzy {
                debug!(candidate = %slots[idx].candidate.id, source = %record.source,
                    "fuzzy name+school merge");
            }
            merge_into(&mut slots[idx], record, &keys, fuzzy, &self.config);

            if let Some(k) = &keys.linkedin {
                by_linkedin.entry(k.clone()).or_insert(idx);
            }
            if let Some(k) = &keys.email {
                by_email.entry(k.clone()).or_insert(idx);
            }
            if let Some(k) = &keys.github {
                by_github.entry(k.clone()).or_insert(idx);
            }
        }

        if rejected > 0 {
            warn!(rejected, total = records.len(), "records without identity keys dropped");
        }

        ResolveOutcome {
            candidates: slots.into_iter().map(|s| s.candidate).collect(),
            rejected,
        }
    }

    fn fuzzy_match(&self, slots: &[Slot], keys: &RecordKeys, record: &RawRecord) -> Option<usize> {
        let name = keys.name.as_ref()?;
        let record_schools: BTreeSet<String> = record
            .education
            .iter()
            .map(|e| normalize_name(&e.school))
            .filter(|s| !s.is_empty())
            .collect();
        if record_schools.is_empty() {
            return None;
        }
        slots.iter().position(|slot| {
            slot.name_key.as_ref() == Some(name)
                && slot.schools.intersection(&record_schools).next().is_some()
        })
    }
}

fn merge_into(slot: &mut Slot, record: &RawRecord, keys: &RecordKeys, fuzzy: bool, config: &ResolverConfig) {
    let rank = source_richness(&record.source);
    // A richer source may replace structured fields; fuzzy merges and
    // equal-or-poorer sources only fill gaps.
    let replace = !fuzzy && rank > slot.field_rank;
    let c = &mut slot.candidate;

    set_scalar(&mut c.full_name, &record.full_name, replace);
    set_scalar(&mut c.headline, &record.headline, replace);

    // Deterministic identity keys are append-only.
    fill_missing(&mut c.linkedin_url, &keys.linkedin);
    fill_missing(&mut c.email, &keys.email);
    fill_missing(&mut c.github_url, &keys.github);

    c.skills.extend(normalize_skill_set(&record.skills));

    if !record.experience.is_empty() && (replace || c.experience.is_empty()) {
        c.experience = record.experience.clone();
    }
    if !record.education.is_empty() && (replace || c.education.is_empty()) {
        c.education = record.education.clone();
    }
    slot.schools.extend(
        record
            .education
            .iter()
            .map(|e| normalize_name(&e.school))
            .filter(|s| !s.is_empty()),
    );
    if slot.name_key.is_none() {
        slot.name_key = keys.name.clone();
    }

    c.warmth_hint = match (c.warmth_hint, record.warmth_hint) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    };
    c.last_active = c.last_active.max(record.last_active);
    c.open_to_work |= record.open_to_work.unwrap_or(false);
    c.data_sources.insert(record.source.clone());

    if fuzzy {
        c.merge_confidence = c.merge_confidence.min(config.fuzzy_merge_confidence);
    } else {
        slot.field_rank = slot.field_rank.max(rank);
    }
}

fn set_scalar(target: &mut Option<String>, value: &Option<String>, replace: bool) {
    match value {
        Some(v) if !v.trim().is_empty() && (replace || target.is_none()) => {
            *target = Some(v.clone());
        }
        _ => {}
    }
}

fn fill_missing(target: &mut Option<String>, value: &Option<String>) {
    if target.is_none() {
        *target = value.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrichment::{SOURCE_DISCOVERY, SOURCE_PEOPLE_RICH};
    use crate::{Education, Experience};
    use chrono::NaiveDate;

    fn discovery_record(name: &str, linkedin: &str) -> RawRecord {
        RawRecord {
            source: SOURCE_DISCOVERY.into(),
            full_name: Some(name.into()),
            headline: Some("Engineer at Acme".into()),
            linkedin_url: Some(linkedin.into()),
            skills: vec!["Python".into()],
            ..RawRecord::default()
        }
    }

    fn rich_record(name: &str, linkedin: &str) -> RawRecord {
        RawRecord {
            source: SOURCE_PEOPLE_RICH.into(),
            full_name: Some(name.into()),
            headline: Some("Senior Engineer at Acme Robotics".into()),
            linkedin_url: Some(linkedin.into()),
            skills: vec!["python".into(), "k8s".into()],
            experience: vec![Experience {
                company: "Acme Robotics".into(),
                title: "Senior Engineer".into(),
                start_date: NaiveDate::from_ymd_opt(2021, 1, 1),
                end_date: None,
            }],
            ..RawRecord::default()
        }
    }

    #[test]
    fn linkedin_url_variants_merge_to_one_candidate() {
        let resolver = IdentityResolver::default();
        let records = vec![
            discovery_record("Jane Doe", "https://www.linkedin.com/in/janedoe/"),
            rich_record("Jane Doe", "linkedin.com/in/JaneDoe?src=search"),
        ];

        let out = resolver.resolve(&records);
        assert_eq!(out.candidates.len(), 1);
        assert_eq!(out.rejected, 0);

        let c = &out.candidates[0];
        assert_eq!(c.id, "li:linkedin.com/in/janedoe");
        // Richer source owns the headline; skills are unioned and normalized.
        assert_eq!(c.headline.as_deref(), Some("Senior Engineer at Acme Robotics"));
        assert!(c.skills.contains("python"));
        assert!(c.skills.contains("kubernetes"));
        assert_eq!(c.data_sources.len(), 2);
        assert_eq!(c.merge_confidence, 1.0);
    }

    #[test]
    fn poorer_source_arriving_later_only_fills_gaps() {
        let resolver = IdentityResolver::default();
        let records = vec![
            rich_record("Jane Doe", "linkedin.com/in/janedoe"),
            discovery_record("Jane Doe", "linkedin.com/in/janedoe"),
        ];

        let out = resolver.resolve(&records);
        let c = &out.candidates[0];
        assert_eq!(c.headline.as_deref(), Some("Senior Engineer at Acme Robotics"));
        assert_eq!(c.experience.len(), 1);
    }

    #[test]
    fn fuzzy_merge_requires_shared_school_and_lowers_confidence() {
        let resolver = IdentityResolver::default();
        let school = Education {
            school: "MIT".into(),
            ..Education::default()
        };
        let a = RawRecord {
            source: SOURCE_DISCOVERY.into(),
            full_name: Some("Sam Park".into()),
            linkedin_url: Some("linkedin.com/in/sampark".into()),
            headline: Some("Engineer".into()),
            education: vec![school.clone()],
            ..RawRecord::default()
        };
        let b = RawRecord {
            source: "referral".into(),
            full_name: Some("Sam  Park".into()),
            email: Some("sam@park.dev".into()),
            headline: Some("Tinkerer".into()),
            education: vec![school],
            ..RawRecord::default()
        };

        let out = resolver.resolve(&[a, b]);
        assert_eq!(out.candidates.len(), 1);
        let c = &out.candidates[0];
        assert!(c.merge_confidence < 1.0);
        // Fuzzy record fills the missing email but does not take the headline.
        assert_eq!(c.email.as_deref(), Some("sam@park.dev"));
        assert_eq!(c.headline.as_deref(), Some("Engineer"));
    }

    #[test]
    fn same_name_without_shared_school_stays_separate() {
        let resolver = IdentityResolver::default();
        let a = RawRecord {
            source: SOURCE_DISCOVERY.into(),
            full_name: Some("Alex Kim".into()),
            linkedin_url: Some("linkedin.com/in/alexkim1".into()),
            ..RawRecord::default()
        };
        let b = RawRecord {
            source: SOURCE_DISCOVERY.into(),
            full_name: Some("Alex Kim".into()),
            email: Some("alex@elsewhere.io".into()),
            ..RawRecord::default()
        };

        let out = resolver.resolve(&[a, b]);
        assert_eq!(out.candidates.len(), 2);
    }

    #[test]
    fn keyless_records_are_rejected_with_a_count() {
        let resolver = IdentityResolver::default();
        let out = resolver.resolve(&[RawRecord {
            source: SOURCE_DISCOVERY.into(),
            headline: Some("mystery person".into()),
            ..RawRecord::default()
        }]);
        assert!(out.candidates.is_empty());
        assert_eq!(out.rejected, 1);
    }

    #[test]
    fn resolution_is_idempotent_over_duplicate_input() {
        let resolver = IdentityResolver::default();
        let records = vec![
            discovery_record("Jane Doe", "linkedin.com/in/janedoe"),
            rich_record("Jane Doe", "linkedin.com/in/janedoe"),
        ];
        let once = resolver.resolve(&records);

        let mut doubled = records.clone();
        doubled.extend(records);
        let twice = resolver.resolve(&doubled);

        assert_eq!(once.candidates, twice.candidates);
    }
}
