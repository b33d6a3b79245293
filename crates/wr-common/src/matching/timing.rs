//! Timing fit: how likely the candidate is to move right now. Each sub-term
//! is independent and additive; the component total is capped at 100.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};

use super::{status_from_score, SubScore};
use crate::company::canonical_company;
use crate::normalize::nfkc_lower_trim;
use crate::Candidate;

const CLIFF_APPROACHING: f64 = 30.0;
const CLIFF_PASSED: f64 = 20.0;
const RECENT_START: f64 = 5.0;
const MID_TENURE: f64 = 10.0;
const DISTRESS_POINTS: f64 = 25.0;
const STABLE_EMPLOYER_POINTS: f64 = 5.0;
const OPEN_TO_WORK_POINTS: f64 = 20.0;
const TRANSITIONAL_POINTS: f64 = 12.0;
const ACTIVE_FORTNIGHT_POINTS: f64 = 20.0;
const ACTIVE_MONTH_POINTS: f64 = 10.0;

/// Headline fragments that read as "between roles".
const TRANSITIONAL_MARKERS: &[&str] = &[
    "ex-",
    "formerly",
    "seeking",
    "looking for",
    "in transition",
    "between roles",
];

#[derive(Debug, Clone, Default)]
pub struct TimingConfig {
    /// Employers with publicly known layoffs or distress, canonical names.
    /// Operational configuration, refreshed outside the funnel.
    pub distressed_employers: BTreeSet<String>,
}

impl TimingConfig {
    pub fn with_distressed<I, S>(employers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            distressed_employers: employers
                .into_iter()
                .map(|e| canonical_company(e.as_ref()))
                .collect(),
        }
    }
}

/// Timing fit, 0–100: tenure-cliff proximity + employer distress +
/// profile status + recent activity.
pub fn timing_fit(
    candidate: &Candidate,
    config: &TimingConfig,
    today: NaiveDate,
    now: DateTime<Utc>,
) -> SubScore {
    let mut notes: Vec<String> = Vec::new();
    let mut score = 0.0;

    let current = candidate.current_role().filter(|role| role.is_current());
    match current {
        Some(role) => {
            let years = role.tenure_days(today) as f64 / 365.25;
            let (points, note) = if (3.0..4.5).contains(&years) {
                (CLIFF_APPROACHING, "approaching vesting cliff")
            } else if years >= 4.5 {
                (CLIFF_PASSED, "past vesting cliff")
            } else if years < 1.0 {
                (RECENT_START, "recently started")
            } else {
                (MID_TENURE, "mid-tenure")
            };
            score += points;
            notes.push(format!("{note} ({years:.1}y)"));

            let company = canonical_company(&role.company);
            if config.distressed_employers.contains(&company) {
                score += DISTRESS_POINTS;
                notes.push(format!("employer distress ({company})"));
            } else {
                score += STABLE_EMPLOYER_POINTS;
            }
        }
        None => notes.push("no current role known".into()),
    }

    let headline = nfkc_lower_trim(candidate.headline.as_deref().unwrap_or_default());
    if candidate.open_to_work || headline.contains("open to work") {
        score += OPEN_TO_WORK_POINTS;
        notes.push("open to work".into());
    } else if TRANSITIONAL_MARKERS.iter().any(|m| headline.contains(m)) {
        score += TRANSITIONAL_POINTS;
        notes.push("transitional headline".into());
    }

    if let Some(last_active) = candidate.last_active {
        let days = (now - last_active).num_days();
        if days <= 14 {
            score += ACTIVE_FORTNIGHT_POINTS;
            notes.push("active in last two weeks".into());
        } else if days <= 30 {
            score += ACTIVE_MONTH_POINTS;
            notes.push("active in last month".into());
        }
    }

    let score = score.min(100.0);
    SubScore::new(score, status_from_score(score), notes.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Experience;
    use chrono::TimeZone;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn today() -> NaiveDate {
        day(2026, 6, 1)
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap()
    }

    fn candidate_started(start: NaiveDate, company: &str) -> Candidate {
        Candidate {
            experience: vec![Experience {
                company: company.into(),
                title: "Engineer".into(),
                start_date: Some(start),
                end_date: None,
            }],
            ..Candidate::default()
        }
    }

    #[test]
    fn vesting_cliff_proximity_scores_highest_tenure_term() {
        let approaching = candidate_started(day(2022, 12, 1), "Acme");
        let passed = candidate_started(day(2020, 1, 1), "Acme");
        let fresh = candidate_started(day(2026, 3, 1), "Acme");

        let config = TimingConfig::default();
        let a = timing_fit(&approaching, &config, today(), now());
        let p = timing_fit(&passed, &config, today(), now());
        let f = timing_fit(&fresh, &config, today(), now());

        assert_eq!(a.score, CLIFF_APPROACHING + STABLE_EMPLOYER_POINTS);
        assert_eq!(p.score, CLIFF_PASSED + STABLE_EMPLOYER_POINTS);
        assert_eq!(f.score, RECENT_START + STABLE_EMPLOYER_POINTS);
    }

    #[test]
    fn distressed_employers_signal_reachability() {
        let candidate = candidate_started(day(2024, 1, 1), "Facebook");
        let config = TimingConfig::with_distressed(["Meta"]);
        let fit = timing_fit(&candidate, &config, today(), now());
        assert_eq!(fit.score, MID_TENURE + DISTRESS_POINTS);
        assert!(fit.details.contains("meta"));
    }

    #[test]
    fn open_to_work_beats_transitional_language() {
        let mut candidate = candidate_started(day(2024, 1, 1), "Acme");
        candidate.headline = Some("Ex-Stripe, seeking next role — open to work".into());
        let fit = timing_fit(&candidate, &TimingConfig::default(), today(), now());
        // Open-to-work takes the 20; transitional markers do not stack.
        assert_eq!(fit.score, MID_TENURE + STABLE_EMPLOYER_POINTS + OPEN_TO_WORK_POINTS);
    }

    #[test]
    fn recent_activity_tiers() {
        let mut candidate = candidate_started(day(2024, 1, 1), "Acme");
        candidate.last_active = Some(Utc.with_ymd_and_hms(2026, 5, 25, 0, 0, 0).unwrap());
        let fortnight = timing_fit(&candidate, &TimingConfig::default(), today(), now());

        candidate.last_active = Some(Utc.with_ymd_and_hms(2026, 5, 10, 0, 0, 0).unwrap());
        let month = timing_fit(&candidate, &TimingConfig::default(), today(), now());

        candidate.last_active = Some(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
        let stale = timing_fit(&candidate, &TimingConfig::default(), today(), now());

        assert_eq!(fortnight.score - stale.score, ACTIVE_FORTNIGHT_POINTS);
        assert_eq!(month.score - stale.score, ACTIVE_MONTH_POINTS);
    }

    #[test]
    fn no_current_role_contributes_no_tenure_or_employer_points() {
        let candidate = Candidate::default();
        let fit = timing_fit(&candidate, &TimingConfig::default(), today(), now());
        assert_eq!(fit.score, 0.0);
        assert!(fit.details.contains("no current role"));
    }
}
