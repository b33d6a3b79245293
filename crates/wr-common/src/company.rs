//! Canonical company identities.
//!
//! Employer names arrive in many spellings ("Facebook", "Meta Platforms,
//! Inc.") and the graph must treat them as one node. The alias table is
//! static configuration resolved once at graph build time, not derived data.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use strsim::damerau_levenshtein;

use crate::normalize::nfkc_lower_trim;

static ALIAS_TO_CANONICAL: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    let aliases: &[(&str, &[&str])] = &[
        ("meta", &["facebook", "fb", "meta platforms", "facebook inc"]),
        ("google", &["google llc", "google inc", "alphabet", "alphabet inc"]),
        ("amazon", &["amazon.com", "amazon web services", "aws", "amazon inc"]),
        ("microsoft", &["msft", "microsoft corporation", "microsoft corp"]),
        ("apple", &["apple inc", "apple computer"]),
        ("x", &["twitter", "twitter inc", "x corp"]),
        ("netflix", &["netflix inc"]),
        ("stripe", &["stripe inc", "stripe payments"]),
        ("uber", &["uber technologies", "uber inc"]),
        ("airbnb", &["airbnb inc"]),
        ("salesforce", &["salesforce.com", "sfdc"]),
        ("linkedin", &["linkedin corporation", "linkedin corp"]),
        ("openai", &["open ai", "openai inc"]),
        ("nvidia", &["nvidia corporation", "nvidia corp"]),
        ("oracle", &["oracle corporation", "oracle corp"]),
        ("ibm", &["international business machines", "ibm corp"]),
        ("intel", &["intel corporation", "intel corp"]),
        ("shopify", &["shopify inc"]),
        ("coinbase", &["coinbase global", "coinbase inc"]),
        ("palantir", &["palantir technologies"]),
        ("databricks", &["databricks inc"]),
        ("snowflake", &["snowflake inc", "snowflake computing"]),
    ];

    let mut map = HashMap::new();
    for (canonical, alias_list) in aliases {
        map.insert(*canonical, *canonical);
        for alias in *alias_list {
            map.insert(*alias, *canonical);
        }
    }
    map
});

/// Employers large enough to carry the company-size hiring signal.
static LARGE_EMPLOYERS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "meta", "google", "amazon", "microsoft", "apple", "netflix", "x", "uber", "airbnb",
        "salesforce", "linkedin", "nvidia", "oracle", "ibm", "intel", "stripe", "shopify",
    ]
    .into_iter()
    .collect()
});

static COMPANY_INDUSTRY: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    [
        ("meta", "technology"),
        ("google", "technology"),
        ("amazon", "technology"),
        ("microsoft", "technology"),
        ("apple", "technology"),
        ("netflix", "technology"),
        ("x", "technology"),
        ("uber", "technology"),
        ("airbnb", "technology"),
        ("salesforce", "technology"),
        ("linkedin", "technology"),
        ("nvidia", "technology"),
        ("oracle", "technology"),
        ("ibm", "technology"),
        ("intel", "technology"),
        ("shopify", "technology"),
        ("stripe", "fintech"),
        ("coinbase", "fintech"),
        ("palantir", "technology"),
        ("databricks", "technology"),
        ("snowflake", "technology"),
        ("openai", "technology"),
    ]
    .into_iter()
    .collect()
});

fn strip_corporate_suffix(name: &str) -> &str {
    let mut trimmed = name.trim_end_matches('.');
    for suffix in [
        ", inc", " inc", ", llc", " llc", ", ltd", " ltd", " corporation", " corp", " co", " gmbh",
    ] {
        if let Some(rest) = trimmed.strip_suffix(suffix) {
            trimmed = rest.trim_end_matches([',', '.', ' ']);
            break;
        }
    }
    trimmed
}

/// Resolve a raw employer name to its canonical identity.
///
/// Lookup order: exact alias, suffix-stripped alias, then a conservative
/// Damerau-Levenshtein pass over the alias table for typos ("Gogle").
/// Unknown companies canonicalize to their cleaned lowercase form.
pub fn canonical_company(raw: &str) -> String {
    let lowered = nfkc_lower_trim(raw);
    if lowered.is_empty() {
        return lowered;
    }

    if let Some(canonical) = ALIAS_TO_CANONICAL.get(lowered.as_str()) {
        return (*canonical).to_string();
    }

    let stripped = strip_corporate_suffix(&lowered).to_string();
    if let Some(canonical) = ALIAS_TO_CANONICAL.get(stripped.as_str()) {
        return (*canonical).to_string();
    }

    if let Some(canonical) = fuzzy_alias(&stripped) {
        return canonical.to_string();
    }

    stripped
}

fn fuzzy_alias(name: &str) -> Option<&'static str> {
    // Short names carry too little signal for edit-distance matching.
    if name.len() < 5 {
        return None;
    }
    let mut best: Option<(&'static str, usize)> = None;
    for (alias, canonical) in ALIAS_TO_CANONICAL.iter() {
        if alias.len() < 5 {
            continue;
        }
        let distance = damerau_levenshtein(name, alias);
        if distance > 1 {
            continue;
        }
        match best {
            None => best = Some((canonical, distance)),
            Some((_, d)) if distance < d => best = Some((canonical, distance)),
            _ => {}
        }
    }
    best.map(|(canonical, _)| canonical)
}

pub fn is_large_employer(canonical: &str) -> bool {
    LARGE_EMPLOYERS.contains(canonical)
}

/// Industry of a known employer, when the static table has one.
pub fn company_industry(canonical: &str) -> Option<&'static str> {
    COMPANY_INDUSTRY.get(canonical).copied()
}
