//! Search configuration with sensible defaults.
//!
//! [`SearchConfig`] controls query normalisation (slang table, email
//! domains), the field weights handed to the full-text indexes, cache
//! eviction and the timeouts around external calls. The defaults mirror the
//! production deployment.

use serde::{Deserialize, Serialize};

use crate::error::SearchError;

/// One entry of the slang table: a leading word and what it expands to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlangRule {
    pub pattern: String,
    pub expansion: String,
}

impl SlangRule {
    pub fn new(pattern: impl Into<String>, expansion: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            expansion: expansion.into(),
        }
    }
}

/// Boost applied to one indexed field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldBoost {
    pub field: String,
    pub boost: f64,
}

/// Per-field boosts passed to an index on every search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldWeights {
    pub fields: Vec<FieldBoost>,
    /// Whether the index should expand query tokens to prefix matches.
    pub expand: bool,
}

impl FieldWeights {
    fn from_pairs(pairs: &[(&str, f64)]) -> Self {
        Self {
            fields: pairs
                .iter()
                .map(|(field, boost)| FieldBoost {
                    field: (*field).to_owned(),
                    boost: *boost,
                })
                .collect(),
            expand: true,
        }
    }

    /// Weights for the per-term class index.
    ///
    /// `name` stays low so that `cs2500` ranks CS 2500 above its lab, whose
    /// name mentions "CS 2500".
    pub fn classes() -> Self {
        Self::from_pairs(&[
            ("classId", 4.0),
            ("acronym", 4.0),
            ("subject", 2.0),
            ("desc", 1.0),
            ("name", 1.1),
            ("profs", 1.0),
            ("crns", 1.0),
        ])
    }

    /// Weights for the employee index. Role and department are rarely
    /// searched for, so they stay low.
    pub fn employees() -> Self {
        Self::from_pairs(&[
            ("name", 2.0),
            ("primaryRole", 0.4),
            ("primaryDepartment", 0.4),
            ("emails", 1.0),
            ("phone", 1.0),
        ])
    }

    /// Boost of a named field, if configured.
    pub fn boost(&self, field: &str) -> Option<f64> {
        self.fields.iter().find(|f| f.field == field).map(|f| f.boost)
    }
}

/// Configuration for the search engine.
///
/// Use [`Default::default()`] for the production values, or construct with
/// field overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Ordered slang table. Only the first matching rule is applied.
    pub slang: Vec<SlangRule>,
    /// Email domains stripped from queries so address fragments match people.
    pub email_domains: Vec<String>,
    /// Longest suffix (in characters) after a subject code that still gets
    /// a space inserted, e.g. the `2500` in `cs2500`.
    pub subject_suffix_max_len: usize,
    /// Minimum number of digits the suffix must contain.
    pub subject_suffix_min_digits: usize,
    /// Field weights for the class index.
    pub class_weights: FieldWeights,
    /// Field weights for the employee index.
    pub employee_weights: FieldWeights,
    /// Entries untouched for longer than this are always evicted.
    pub cache_horizon_secs: u64,
    /// Period of the background sweep.
    pub sweep_interval_secs: u64,
    /// Entry count above which a deferred sweep is scheduled.
    pub high_water_mark: usize,
    /// Timeout for each full-text index lookup.
    pub index_timeout_ms: u64,
    /// Timeout for each record lookup during hydration.
    pub hydration_timeout_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            slang: vec![
                SlangRule::new("fundies", "fundamentals of computer science"),
                SlangRule::new("orgo", "organic chemistry"),
                SlangRule::new("chemistry", "chem"),
                SlangRule::new("numerica", "numerical"),
            ],
            email_domains: vec!["@northeastern.edu".into(), "@neu.edu".into()],
            subject_suffix_max_len: 5,
            subject_suffix_min_digits: 3,
            class_weights: FieldWeights::classes(),
            employee_weights: FieldWeights::employees(),
            cache_horizon_secs: 86_400,
            sweep_interval_secs: 86_400,
            high_water_mark: 10_000,
            index_timeout_ms: 2_000,
            hydration_timeout_ms: 1_000,
        }
    }
}

impl SearchConfig {
    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - slang patterns and expansions must be non-empty and lowercase
    /// - email domains must be non-empty
    /// - `cache_horizon_secs`, `sweep_interval_secs` and `high_water_mark` must be > 0
    /// - both timeouts must be > 0
    pub fn validate(&self) -> Result<(), SearchError> {
        for rule in &self.slang {
            if rule.pattern.trim().is_empty() || rule.expansion.trim().is_empty() {
                return Err(SearchError::Config(
                    "slang patterns and expansions must not be empty".into(),
                ));
            }
            if rule.pattern != rule.pattern.to_lowercase() {
                return Err(SearchError::Config(format!(
                    "slang pattern {:?} must be lowercase",
                    rule.pattern
                )));
            }
        }
        if self.email_domains.iter().any(|d| d.is_empty()) {
            return Err(SearchError::Config(
                "email_domains must not contain empty entries".into(),
            ));
        }
        if self.cache_horizon_secs == 0 {
            return Err(SearchError::Config(
                "cache_horizon_secs must be greater than 0".into(),
            ));
        }
        if self.sweep_interval_secs == 0 {
            return Err(SearchError::Config(
                "sweep_interval_secs must be greater than 0".into(),
            ));
        }
        if self.high_water_mark == 0 {
            return Err(SearchError::Config(
                "high_water_mark must be greater than 0".into(),
            ));
        }
        if self.index_timeout_ms == 0 || self.hydration_timeout_ms == 0 {
            return Err(SearchError::Config(
                "index_timeout_ms and hydration_timeout_ms must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}
