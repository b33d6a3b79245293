use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;

use unicode_normalization::UnicodeNormalization;

/// Skill alias → canonical form mapping (O(1) lookup).
static SKILL_ALIASES: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    let aliases: &[(&str, &[&str])] = &[
        ("javascript", &["js", "ecmascript", "es6"]),
        ("typescript", &["ts"]),
        ("nodejs", &["node.js", "node js", "node"]),
        ("react", &["reactjs", "react.js", "react js"]),
        ("python", &["python3", "python 3", "py"]),
        ("golang", &["go", "go lang"]),
        ("csharp", &["c#", "c sharp", ".net", "dotnet"]),
        ("cplusplus", &["c++", "cpp"]),
        ("postgresql", &["postgres", "pg", "postgre sql"]),
        ("mysql", &["my sql", "mariadb"]),
        ("mongodb", &["mongo", "mongo db"]),
        ("kubernetes", &["k8s", "kube"]),
        ("aws", &["amazon web services", "aws cloud"]),
        ("gcp", &["google cloud platform", "google cloud"]),
        ("azure", &["microsoft azure", "ms azure"]),
        ("terraform", &["infrastructure as code", "iac"]),
        ("machine learning", &["ml"]),
        ("rust", &["rust lang", "rustlang"]),
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

pub fn nfkc_lower_trim(input: &str) -> String {
    input.nfkc().collect::<String>().trim().to_lowercase()
}

/// Normalize a person name for fuzzy identity comparison: NFKC fold,
/// lowercase, punctuation removed, whitespace collapsed.
pub fn normalize_name(input: &str) -> String {
    nfkc_lower_trim(input)
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn normalize_email(input: &str) -> Option<String> {
    let cleaned = nfkc_lower_trim(input);
    if cleaned.contains('@') {
        Some(cleaned)
    } else {
        None
    }
}

/// Normalize a profile URL to a stable comparison key: lowercase, scheme and
/// `www.` stripped, query and fragment dropped, trailing slash removed.
pub fn normalize_profile_url(input: &str) -> Option<String> {
    let mut cleaned = nfkc_lower_trim(input);
    if cleaned.is_empty() {
        return None;
    }
    for prefix in ["https://", "http://"] {
        if let Some(rest) = cleaned.strip_prefix(prefix) {
            cleaned = rest.to_string();
            break;
        }
    }
    if let Some(rest) = cleaned.strip_prefix("www.") {
        cleaned = rest.to_string();
    }
    if let Some((base, _)) = cleaned.split_once(['?', '#']) {
        cleaned = base.to_string();
    }
    let cleaned = cleaned.trim_end_matches('/').to_string();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Normalize a skill string to its canonical form.
pub fn normalize_skill(skill: &str) -> String {
    let normalized = nfkc_lower_trim(skill);
    match SKILL_ALIASES.get(normalized.as_str()) {
        Some(canonical) => (*canonical).to_string(),
        None => normalized,
    }
}

pub fn normalize_skill_set<I, S>(skills: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    skills
        .into_iter()
        .map(|s| normalize_skill(s.as_ref()))
        .filter(|s| !s.is_empty())
        .collect()
}

/// Case-insensitive whole-word containment, used for seniority keywords
/// where substring search would misfire ("sr" inside "srinivasan").
pub fn contains_word(haystack: &str, word: &str) -> bool {
    let lowered = nfkc_lower_trim(haystack);
    if word.contains(' ') || word.contains('-') {
        return lowered.contains(word);
    }
    lowered
        .split(|c: char| !c.is_alphanumeric() && c != '#' && c != '+')
        .any(|token| token == word)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_urls_normalize_to_a_shared_key() {
        let variants = [
            "https://www.linkedin.com/in/jdoe/",
            "http://linkedin.com/in/jdoe",
            "LinkedIn.com/in/JDoe?utm=raisin",
        ];
        let keys: BTreeSet<_> = variants
            .iter()
            .filter_map(|v| normalize_profile_url(v))
            .collect();
        assert_eq!(keys.len(), 1);
        assert!(keys.contains("linkedin.com/in/jdoe"));
    }

    #[test]
    fn skill_aliases_collapse() {
        assert_eq!(normalize_skill("K8s"), "kubernetes");
        assert_eq!(normalize_skill("Postgres"), "postgresql");
        assert_eq!(normalize_skill(" Rust "), "rust");
        assert_eq!(normalize_skill("Erlang"), "erlang");
    }

    #[test]
    fn name_normalization_strips_punctuation_and_width() {
        assert_eq!(normalize_name("  José  O'Neil-Smith "), "josé o neil smith");
        assert_eq!(normalize_name("ＪＯＨＮ　ＤＯＥ"), "john doe");
    }

    #[test]
    fn word_containment_avoids_substring_false_hits() {
        assert!(contains_word("Senior Engineer (SR)", "sr"));
        assert!(!contains_word("Srinivasan, Platform Eng", "sr"));
        assert!(contains_word("entry-level analyst", "entry"));
    }

    #[test]
    fn emails_must_contain_an_at_sign() {
        assert_eq!(normalize_email(" A@B.io "), Some("a@b.io".into()));
        assert_eq!(normalize_email("not-an-email"), None);
    }
}
