//! Core types for refs, hydrated results and per-request analytics.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Deterministic, opaque identifier of a class, section or employee record.
///
/// Produced by a [`KeyHasher`](crate::provider::KeyHasher) from the record's
/// identifying attributes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordRef(String);

impl RecordRef {
    /// Wrap an already-computed ref string.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw ref string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordRef {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for RecordRef {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Which collection a ref points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultKind {
    /// A class offering in a term.
    Class,
    /// A person in the employee directory.
    Employee,
}

impl ResultKind {
    /// Returns the wire name of this kind.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Class => "class",
            Self::Employee => "employee",
        }
    }
}

impl fmt::Display for ResultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single hit returned by a full-text index, before it is tagged with a kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexHit {
    /// Ref of the matched record.
    #[serde(rename = "ref")]
    pub reference: RecordRef,
    /// Relevance score (higher is better).
    pub score: f64,
}

impl IndexHit {
    pub fn new(reference: impl Into<RecordRef>, score: f64) -> Self {
        Self {
            reference: reference.into(),
            score,
        }
    }
}

/// A ranked, kind-tagged ref. Sequences of these are sorted by descending score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRef {
    #[serde(rename = "ref")]
    pub reference: RecordRef,
    #[serde(rename = "type")]
    pub kind: ResultKind,
    pub score: f64,
}

impl ScoredRef {
    pub fn class(reference: impl Into<RecordRef>, score: f64) -> Self {
        Self {
            reference: reference.into(),
            kind: ResultKind::Class,
            score,
        }
    }

    pub fn employee(reference: impl Into<RecordRef>, score: f64) -> Self {
        Self {
            reference: reference.into(),
            kind: ResultKind::Employee,
            score,
        }
    }
}

/// A subject offered in a term, e.g. `CS` / `Computer Science`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    /// Short subject code, e.g. `CS`.
    #[serde(rename = "subject")]
    pub code: String,
    /// Display name, e.g. `Computer Science`.
    #[serde(rename = "text")]
    pub name: String,
}

impl Subject {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }
}

/// Full class record as produced by the ingestion pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassDetail {
    pub host: String,
    pub term_id: String,
    pub subject: String,
    /// Course number, usually numeric (`2500`) but not guaranteed.
    pub class_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pretty_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_credits: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_credits: Option<f32>,
    /// CRNs of the sections of this class, in listing order.
    #[serde(default)]
    pub crns: Vec<String>,
}

/// One section (CRN) of a class with its seat and waitlist counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionDetail {
    pub host: String,
    pub term_id: String,
    pub subject: String,
    pub class_id: String,
    pub crn: String,
    pub seats_capacity: i64,
    pub seats_remaining: i64,
    /// Waitlist counters are only present for sections that expose a waitlist.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait_capacity: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait_remaining: Option<i64>,
    #[serde(default)]
    pub online: bool,
    #[serde(default)]
    pub profs: Vec<String>,
}

impl SectionDetail {
    /// Seats taken plus waitlist spots taken (when a waitlist exists).
    pub fn taken_seats(&self) -> i64 {
        let mut taken = self.seats_capacity - self.seats_remaining;
        if let (Some(capacity), Some(remaining)) = (self.wait_capacity, self.wait_remaining) {
            taken += capacity - remaining;
        }
        taken
    }
}

/// A person in the employee directory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeDetail {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub emails: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_department: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub office_room: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub office_street_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personal_site: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub big_picture_url: Option<String>,
}

impl EmployeeDetail {
    /// Number of attributes that carry a non-empty value.
    pub fn populated_attribute_count(&self) -> usize {
        let strings = [&self.id, &self.name]
            .into_iter()
            .filter(|s| !s.is_empty())
            .count();
        let optionals = [
            &self.first_name,
            &self.last_name,
            &self.phone,
            &self.primary_role,
            &self.primary_department,
            &self.office_room,
            &self.office_street_address,
            &self.url,
            &self.personal_site,
            &self.big_picture_url,
        ]
        .into_iter()
        .filter(|field| field.as_deref().is_some_and(|v| !v.is_empty()))
        .count();
        strings + optionals + usize::from(!self.emails.is_empty())
    }
}

/// The display object behind a hydrated ref.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ResultPayload {
    Class {
        class: ClassDetail,
        sections: Vec<SectionDetail>,
    },
    Employee {
        employee: EmployeeDetail,
    },
}

/// A ref expanded into its full display record. Never cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HydratedResult {
    pub score: f64,
    #[serde(flatten)]
    pub payload: ResultPayload,
}

impl HydratedResult {
    pub fn kind(&self) -> ResultKind {
        match self.payload {
            ResultPayload::Class { .. } => ResultKind::Class,
            ResultPayload::Employee { .. } => ResultKind::Employee,
        }
    }
}

/// Outcome of a search request as reported in analytics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchStatus {
    #[serde(rename = "Success")]
    Success,
    #[serde(rename = "Index range error")]
    IndexRangeError,
    #[serde(rename = "Invalid termId")]
    InvalidTermId,
}

impl SearchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::IndexRangeError => "Index range error",
            Self::InvalidTermId => "Invalid termId",
        }
    }
}

impl fmt::Display for SearchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Observational record describing one search request and its outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsRecord {
    pub status: SearchStatus,
    pub was_subject_match: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_count: Option<usize>,
    pub is_cache_hit: bool,
    /// The query as it was searched: normalised on success, raw otherwise.
    pub query: String,
    pub term_id: String,
    pub min_index: usize,
    pub max_index: usize,
    /// Total refs matching the query, or 0 when the page is empty.
    pub result_count: usize,
}

/// Parameters of a single search call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub query: String,
    pub term_id: String,
    /// First result index to return (inclusive).
    #[serde(default)]
    pub min_index: usize,
    /// End of the page (exclusive).
    #[serde(default = "default_max_index")]
    pub max_index: usize,
}

/// Default upper bound of a page when the caller does not provide one.
pub const DEFAULT_MAX_INDEX: usize = 1000;

fn default_max_index() -> usize {
    DEFAULT_MAX_INDEX
}

impl SearchRequest {
    /// A request for the first page (`0..1000`).
    pub fn new(query: impl Into<String>, term_id: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            term_id: term_id.into(),
            min_index: 0,
            max_index: DEFAULT_MAX_INDEX,
        }
    }

    /// Override the requested page window.
    pub fn with_range(mut self, min_index: usize, max_index: usize) -> Self {
        self.min_index = min_index;
        self.max_index = max_index;
        self
    }
}

/// Results for one page plus the analytics record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<HydratedResult>,
    pub analytics: AnalyticsRecord,
}
