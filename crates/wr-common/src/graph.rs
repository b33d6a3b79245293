//! In-memory graph of the founder's network. Built once per search session
//! from the contact list, read-only during scoring; network changes require
//! a full rebuild.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::company::canonical_company;
use crate::normalize::{normalize_email, normalize_name, normalize_profile_url};
use crate::{Candidate, Education, Experience};

/// Tenure (days) above which a coworker edge counts as a strong vouch.
const STRONG_COWORKER_TENURE_DAYS: i64 = 365;

/// One founder contact as supplied by the (out of scope) contact importer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    pub linkedin_url: Option<String>,
    pub email: Option<String>,
    #[serde(default)]
    pub employment: Vec<Experience>,
    #[serde(default)]
    pub education: Vec<Education>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EdgeKind {
    Direct,
    Coworker {
        company: String,
        /// Whether the contact's own tenure at the company exceeded one year.
        long_tenure: bool,
    },
    Alumnus {
        school: String,
    },
}

/// "Intro via X". Advisory only, never re-verified against the live network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntroPath {
    pub contact: String,
    pub edge: EdgeKind,
}

impl IntroPath {
    /// One-line rendering for ranked output.
    pub fn describe(&self) -> String {
        match &self.edge {
            EdgeKind::Direct => format!("{} (direct contact)", self.contact),
            EdgeKind::Coworker {
                company,
                long_tenure,
            } => format!(
                "{} (coworker at {company}{})",
                self.contact,
                if *long_tenure { ", long tenure" } else { "" }
            ),
            EdgeKind::Alumnus { school } => format!("{} (alumnus of {school})", self.contact),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WarmthResult {
    pub score: f64,
    pub path: Option<IntroPath>,
}

impl WarmthResult {
    fn cold() -> Self {
        Self {
            score: 0.0,
            path: None,
        }
    }
}

#[derive(Debug, Clone)]
struct CompanyStint {
    contact: usize,
    start: NaiveDate,
    end: Option<NaiveDate>,
    tenure_days: i64,
}

pub struct NetworkGraph {
    contacts: Vec<Contact>,
    direct_keys: HashMap<String, usize>,
    by_company: HashMap<String, Vec<CompanyStint>>,
    by_school: HashMap<String, Vec<usize>>,
    today: NaiveDate,
}

impl NetworkGraph {
    pub fn build(contacts: Vec<Contact>) -> Self {
        Self::build_at(contacts, Utc::now().date_naive())
    }

    /// Build with an explicit "today", used for date-overlap math on
    /// open-ended roles. Contacts are sorted by name so edge tie-breaks are
    /// deterministic across rebuilds.
    pub fn build_at(mut contacts: Vec<Contact>, today: NaiveDate) -> Self {
        contacts.sort_by(|a, b| a.name.cmp(&b.name));

        let mut direct_keys = HashMap::new();
        let mut by_company: HashMap<String, Vec<CompanyStint>> = HashMap::new();
        let mut by_school: HashMap<String, Vec<usize>> = HashMap::new();

        for (idx, contact) in contacts.iter().enumerate() {
            if let Some(key) = contact.linkedin_url.as_deref().and_then(normalize_profile_url) {
                direct_keys.entry(key).or_insert(idx);
            }
            if let Some(key) = contact.email.as_deref().and_then(normalize_email) {
                direct_keys.entry(key).or_insert(idx);
            }

            for role in &contact.employment {
                let Some(start) = role.start_date else {
                    // Undated stints cannot establish a day of overlap.
                    continue;
                };
                let company = canonical_company(&role.company);
                if company.is_empty() {
                    continue;
                }
                by_company.entry(company).or_default().push(CompanyStint {
                    contact: idx,
                    start,
                    end: role.end_date,
                    tenure_days: role.tenure_days(today),
                });
            }

            for education in &contact.education {
                let school = normalize_name(&education.school);
                if school.is_empty() {
                    continue;
                }
                let entry = by_school.entry(school).or_default();
                if !entry.contains(&idx) {
                    entry.push(idx);
                }
            }
        }

        info!(
            contacts = contacts.len(),
            companies = by_company.len(),
            schools = by_school.len(),
            "network graph built"
        );

        Self {
            contacts,
            direct_keys,
            by_company,
            by_school,
            today,
        }
    }

    pub fn contact_count(&self) -> usize {
        self.contacts.len()
    }

    /// Warmth ladder, first matching rule wins: direct contact 100, coworker
    /// edge with a long-tenured contact 70, other coworker edge 50, alumnus
    /// edge 25, otherwise 0.
    pub fn warmth(&self, candidate: &Candidate) -> WarmthResult {
        if let Some(idx) = self.direct_contact(candidate) {
            return WarmthResult {
                score: 100.0,
                path: Some(IntroPath {
                    contact: self.contacts[idx].name.clone(),
                    edge: EdgeKind::Direct,
                }),
            };
        }

        // Best coworker edge: strong tenure outranks weak, ties resolved by
        // build order (contacts sorted by name).
        let mut best: Option<(bool, usize, String)> = None;
        for role in &candidate.experience {
            let Some(candidate_start) = role.start_date else {
                continue;
            };
            let company = canonical_company(&role.company);
            let Some(stints) = self.by_company.get(&company) else {
                continue;
            };
            let candidate_end = role.end_date.unwrap_or(self.today);
            for stint in stints {
                let overlap_start = candidate_start.max(stint.start);
                let overlap_end = candidate_end.min(stint.end.unwrap_or(self.today));
                if (overlap_end - overlap_start).num_days() < 1 {
                    continue;
                }
                let strong = stint.tenure_days > STRONG_COWORKER_TENURE_DAYS;
                let replace = match &best {
                    None => true,
                    Some((best_strong, best_contact, _)) => {
                        (strong && !best_strong) || (strong == *best_strong && stint.contact < *best_contact)
                    }
                };
                if replace {
                    best = Some((strong, stint.contact, company.clone()));
                }
            }
        }
        if let Some((long_tenure, idx, company)) = best {
            return WarmthResult {
                score: if long_tenure { 70.0 } else { 50.0 },
                path: Some(IntroPath {
                    contact: self.contacts[idx].name.clone(),
                    edge: EdgeKind::Coworker {
                        company,
                        long_tenure,
                    },
                }),
            };
        }

        for education in &candidate.education {
            let school = normalize_name(&education.school);
            if let Some(indices) = self.by_school.get(&school) {
                if let Some(&idx) = indices.first() {
                    return WarmthResult {
                        score: 25.0,
                        path: Some(IntroPath {
                            contact: self.contacts[idx].name.clone(),
                            edge: EdgeKind::Alumnus {
                                school: education.school.clone(),
                            },
                        }),
                    };
                }
            }
        }

        WarmthResult::cold()
    }

    /// The contact responsible for the highest-scoring edge, for "intro via X".
    pub fn path(&self, candidate: &Candidate) -> Option<IntroPath> {
        self.warmth(candidate).path
    }

    fn direct_contact(&self, candidate: &Candidate) -> Option<usize> {
        if let Some(key) = candidate.linkedin_url.as_deref().and_then(normalize_profile_url) {
            if let Some(&idx) = self.direct_keys.get(&key) {
                return Some(idx);
            }
        }
        if let Some(key) = candidate.email.as_deref().and_then(normalize_email) {
            if let Some(&idx) = self.direct_keys.get(&key) {
                return Some(idx);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn stint(company: &str, start: NaiveDate, end: Option<NaiveDate>) -> Experience {
        Experience {
            company: company.into(),
            title: "Engineer".into(),
            start_date: Some(start),
            end_date: end,
        }
    }

    fn contact(name: &str, employment: Vec<Experience>) -> Contact {
        Contact {
            name: name.into(),
            employment,
            ..Contact::default()
        }
    }

    fn graph(contacts: Vec<Contact>) -> NetworkGraph {
        NetworkGraph::build_at(contacts, day(2026, 6, 1))
    }

    fn candidate_at(company: &str, start: NaiveDate, end: Option<NaiveDate>) -> Candidate {
        Candidate {
            id: "li:test".into(),
            experience: vec![stint(company, start, end)],
            ..Candidate::default()
        }
    }

    #[test]
    fn direct_contacts_score_one_hundred() {
        let g = graph(vec![Contact {
            name: "Ada".into(),
            linkedin_url: Some("https://www.linkedin.com/in/ada/".into()),
            ..Contact::default()
        }]);
        let candidate = Candidate {
            linkedin_url: Some("linkedin.com/in/ada".into()),
            ..Candidate::default()
        };

        let result = g.warmth(&candidate);
        assert_eq!(result.score, 100.0);
        assert_eq!(
            result.path,
            Some(IntroPath {
                contact: "Ada".into(),
                edge: EdgeKind::Direct,
            })
        );
    }

    #[test]
    fn long_tenured_coworker_edge_scores_seventy() {
        let g = graph(vec![contact(
            "Bo",
            vec![stint("Facebook", day(2018, 1, 1), Some(day(2022, 1, 1)))],
        )]);
        // Alias table makes "Meta" and "Facebook" one company identity.
        let candidate = candidate_at("Meta", day(2021, 1, 1), None);

        let result = g.warmth(&candidate);
        assert_eq!(result.score, 70.0);
        match result.path.unwrap().edge {
            EdgeKind::Coworker { company, long_tenure } => {
                assert_eq!(company, "meta");
                assert!(long_tenure);
            }
            other => panic!("unexpected edge: {other:?}"),
        }
    }

    #[test]
    fn short_tenured_coworker_edge_scores_fifty() {
        let g = graph(vec![contact(
            "Cy",
            vec![stint("Stripe", day(2023, 1, 1), Some(day(2023, 6, 1)))],
        )]);
        let candidate = candidate_at("Stripe", day(2023, 3, 1), None);

        assert_eq!(g.warmth(&candidate).score, 50.0);
    }

    #[test]
    fn no_date_overlap_means_no_coworker_edge() {
        let g = graph(vec![contact(
            "Di",
            vec![stint("Stripe", day(2015, 1, 1), Some(day(2017, 1, 1)))],
        )]);
        let candidate = candidate_at("Stripe", day(2020, 1, 1), None);

        assert_eq!(g.warmth(&candidate).score, 0.0);
    }

    #[test]
    fn alumnus_edge_scores_twenty_five() {
        let g = graph(vec![Contact {
            name: "Em".into(),
            education: vec![Education {
                school: "MIT".into(),
                ..Education::default()
            }],
            ..Contact::default()
        }]);
        let candidate = Candidate {
            education: vec![Education {
                school: "mit".into(),
                ..Education::default()
            }],
            ..Candidate::default()
        };

        let result = g.warmth(&candidate);
        assert_eq!(result.score, 25.0);
        assert!(matches!(result.path.unwrap().edge, EdgeKind::Alumnus { .. }));
    }

    #[test]
    fn coworker_edge_outranks_alumnus_edge() {
        let g = graph(vec![
            Contact {
                name: "Alum".into(),
                education: vec![Education {
                    school: "MIT".into(),
                    ..Education::default()
                }],
                ..Contact::default()
            },
            contact(
                "Coworker",
                vec![stint("Stripe", day(2022, 1, 1), None)],
            ),
        ]);
        let candidate = Candidate {
            experience: vec![stint("Stripe", day(2023, 1, 1), None)],
            education: vec![Education {
                school: "MIT".into(),
                ..Education::default()
            }],
            ..Candidate::default()
        };

        let result = g.warmth(&candidate);
        assert_eq!(result.score, 70.0);
        assert_eq!(result.path.unwrap().contact, "Coworker");
    }

    #[test]
    fn unknown_candidates_are_cold() {
        let g = graph(vec![contact(
            "Fi",
            vec![stint("Stripe", day(2022, 1, 1), None)],
        )]);
        let candidate = candidate_at("Acme Robotics", day(2023, 1, 1), None);

        let result = g.warmth(&candidate);
        assert_eq!(result.score, 0.0);
        assert!(result.path.is_none());
    }
}
