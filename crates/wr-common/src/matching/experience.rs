//! Experience fit: seniority-title alignment, years of experience, and
//! employer signal.

use chrono::NaiveDate;

use super::{status_from_score, SubScore};
use crate::company::{canonical_company, company_industry, is_large_employer};
use crate::normalize::{contains_word, nfkc_lower_trim};
use crate::{Candidate, JobRequirements, Seniority};

const SENIORITY_EXACT: f64 = 40.0;
const SENIORITY_ONE_BELOW: f64 = 25.0;
const SENIORITY_TWO_BELOW: f64 = 10.0;
const TARGET_EMPLOYER_POINTS: f64 = 15.0;
const INDUSTRY_POINTS: f64 = 10.0;
const LARGE_EMPLOYER_POINTS: f64 = 5.0;

/// Experience fit, 0–100: up to 40 for seniority-title match, 30 for years
/// of experience, 30 for company signal.
pub fn experience_fit(candidate: &Candidate, job: &JobRequirements, today: NaiveDate) -> SubScore {
    let (seniority_points, seniority_note) = seniority_points(candidate, job);

    let years = candidate.total_experience_days(today) as f64 / 365.25;
    let years_points = if years >= 5.0 {
        30.0
    } else if years >= 3.0 {
        25.0
    } else if years >= 1.0 {
        15.0
    } else {
        5.0
    };

    let (company_points, company_note) = company_points(candidate, job);

    let score = seniority_points + years_points + company_points;
    SubScore::new(
        score,
        status_from_score(score),
        format!("{seniority_note}, {years:.1}y experience, {company_note}"),
    )
}

fn seniority_points(candidate: &Candidate, job: &JobRequirements) -> (f64, String) {
    let Some(required) = job.seniority else {
        return (SENIORITY_EXACT, "no seniority requirement".into());
    };
    let Some(detected) = detect_seniority(candidate) else {
        // Absent data scores zero rather than being coerced upward.
        return (0.0, "seniority unknown".into());
    };

    let note = format!("seniority {detected:?} vs {required:?}");
    let points = if detected.rank() >= required.rank() {
        SENIORITY_EXACT
    } else if required.rank() - detected.rank() == 1 {
        SENIORITY_ONE_BELOW
    } else {
        SENIORITY_TWO_BELOW
    };
    (points, note)
}

/// Highest seniority level whose keywords appear in the candidate's current
/// title or headline.
fn detect_seniority(candidate: &Candidate) -> Option<Seniority> {
    let haystack = {
        let title = candidate
            .current_role()
            .map(|role| role.title.as_str())
            .unwrap_or_default();
        let headline = candidate.headline.as_deref().unwrap_or_default();
        nfkc_lower_trim(&format!("{title} {headline}"))
    };
    Seniority::all()
        .iter()
        .rev()
        .find(|level| {
            level
                .keywords()
                .iter()
                .any(|keyword| contains_word(&haystack, keyword))
        })
        .copied()
}

fn company_points(candidate: &Candidate, job: &JobRequirements) -> (f64, String) {
    let targets: Vec<String> = job
        .target_companies
        .iter()
        .map(|c| canonical_company(c))
        .collect();
    let job_industry = job.industry.as_deref().map(nfkc_lower_trim);

    let mut target_hit = false;
    let mut industry_hit = false;
    let mut large_hit = false;
    for role in &candidate.experience {
        let company = canonical_company(&role.company);
        if company.is_empty() {
            continue;
        }
        target_hit |= targets.contains(&company);
        if let (Some(required), Some(actual)) = (&job_industry, company_industry(&company)) {
            industry_hit |= required == actual;
        }
        large_hit |= is_large_employer(&company);
    }

    let mut points = 0.0;
    let mut notes: Vec<&str> = Vec::new();
    if target_hit {
        points += TARGET_EMPLOYER_POINTS;
        notes.push("target employer");
    }
    if industry_hit {
        points += INDUSTRY_POINTS;
        notes.push("industry match");
    }
    if large_hit {
        points += LARGE_EMPLOYER_POINTS;
        notes.push("large employer");
    }
    if notes.is_empty() {
        notes.push("no employer signal");
    }
    (points, notes.join(" + "))
}
