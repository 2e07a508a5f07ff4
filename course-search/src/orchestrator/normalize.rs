//! Query normalisation.
//!
//! Canonicalises raw query text before it is used as a cache key and
//! handed to the indexes:
//!
//! 1. Trim and lowercase.
//! 2. Expand slang (`fundies`, `orgo`, ...) when it is the whole query or
//!    its first word. Only the first matching rule applies.
//! 3. Split a subject code from a course number (`cs2500` → `cs 2500`) so
//!    the index tokenizer sees two tokens.
//! 4. Strip university email domains so address fragments match people.

use crate::config::{SearchConfig, SlangRule};
use crate::types::Subject;

/// Normalise `raw` against the subjects of the term being searched.
///
/// # Examples
///
/// ```
/// use course_search::config::SearchConfig;
/// use course_search::orchestrator::normalize::normalize_query;
/// use course_search::types::Subject;
///
/// let subjects = vec![Subject::new("CS", "Computer Science")];
/// let config = SearchConfig::default();
/// assert_eq!(normalize_query("  CS2500 ", &subjects, &config), "cs 2500");
/// ```
pub fn normalize_query(raw: &str, subjects: &[Subject], config: &SearchConfig) -> String {
    let query = raw.trim().to_lowercase();
    let query = apply_slang(query, &config.slang);
    let query = space_subject_prefix(
        query,
        subjects,
        config.subject_suffix_max_len,
        config.subject_suffix_min_digits,
    );
    strip_email_domains(query, &config.email_domains)
}

/// Replace a leading slang word with its expansion.
///
/// A rule matches only the whole query or a first word followed by a space,
/// so `numeri` never fires inside `numerica`.
pub fn apply_slang(query: String, rules: &[SlangRule]) -> String {
    for rule in rules {
        if query == rule.pattern {
            return rule.expansion.clone();
        }
        if let Some(rest) = query.strip_prefix(rule.pattern.as_str()) {
            if rest.starts_with(' ') {
                return format!("{}{rest}", rule.expansion);
            }
        }
    }
    query
}

/// Insert a space between a leading subject code and what looks like a
/// course number.
///
/// The longest subject code that prefixes the query is used. The suffix
/// must be at most `max_suffix_len` characters and contain at least
/// `min_digits` digits; anything else is left alone.
pub fn space_subject_prefix(
    query: String,
    subjects: &[Subject],
    max_suffix_len: usize,
    min_digits: usize,
) -> String {
    let code_len = subjects
        .iter()
        .map(|s| s.code.to_lowercase())
        .filter(|code| !code.is_empty() && query.starts_with(code.as_str()))
        .map(|code| code.len())
        .max();
    let Some(code_len) = code_len else {
        return query;
    };

    let suffix = &query[code_len..];
    if suffix.is_empty() || suffix.starts_with(char::is_whitespace) {
        return query;
    }
    let digits = suffix.chars().filter(char::is_ascii_digit).count();
    if suffix.chars().count() > max_suffix_len || digits < min_digits {
        return query;
    }
    format!("{} {suffix}", &query[..code_len])
}

/// Remove every occurrence of the configured email domains, ignoring case.
pub fn strip_email_domains(query: String, domains: &[String]) -> String {
    domains.iter().fold(query, |acc, domain| {
        let domain = domain.to_lowercase();
        if acc.contains(&domain) {
            acc.replace(&domain, "")
        } else {
            acc
        }
    })
}
