//! Trait seams for the external collaborators the search core consumes.
//!
//! The term datasets, the employee directory and the full-text indexes are
//! built elsewhere (scrapers, prerequisite linker, index builder). The core
//! only sees them through these traits:
//!
//! - [`DataProvider`]: term metadata plus class/section hydration
//! - [`EmployeeMap`]: direct ref to employee lookup
//! - [`ClassIndex`] / [`EmployeeIndex`]: ranked full-text lookups
//! - [`KeyHasher`]: deterministic refs from identifying attributes
//!
//! Async methods are the calls that may do I/O underneath; the orchestrator
//! wraps each of them in a timeout.

use std::collections::HashMap;
use std::future::Future;

use crate::config::FieldWeights;
use crate::error::SearchError;
use crate::types::{ClassDetail, EmployeeDetail, IndexHit, RecordRef, SectionDetail, Subject};

/// Term datasets produced by the ingestion pipeline.
///
/// All implementations must be `Send + Sync` so one provider can serve
/// concurrent searches.
pub trait DataProvider: Send + Sync {
    /// Whether a dataset for `term_id` is loaded.
    fn has_term(&self, term_id: &str) -> bool;

    /// Subjects offered in the term. Small and bounded (a few hundred at most).
    fn subjects(&self, term_id: &str) -> Vec<Subject>;

    /// Refs of every class in a subject, in listing order.
    fn classes_in_subject(&self, subject_code: &str, term_id: &str) -> Vec<RecordRef>;

    /// Resolve a class ref. `Ok(None)` means the ref is unknown.
    fn class_by_ref(
        &self,
        reference: &RecordRef,
    ) -> impl Future<Output = Result<Option<ClassDetail>, SearchError>> + Send;

    /// Resolve a section ref. `Ok(None)` means the ref is unknown.
    fn section_by_ref(
        &self,
        reference: &RecordRef,
    ) -> impl Future<Output = Result<Option<SectionDetail>, SearchError>> + Send;
}

/// The employee directory, keyed by employee ref.
pub trait EmployeeMap: Send + Sync {
    fn employee(&self, reference: &RecordRef) -> Option<EmployeeDetail>;

    fn employee_count(&self) -> usize;
}

impl EmployeeMap for HashMap<RecordRef, EmployeeDetail> {
    fn employee(&self, reference: &RecordRef) -> Option<EmployeeDetail> {
        self.get(reference).cloned()
    }

    fn employee_count(&self) -> usize {
        self.len()
    }
}

/// Full-text index over the classes of every loaded term.
pub trait ClassIndex: Send + Sync {
    /// Search one term's class index. Hits must be sorted by descending score.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Index`] if the term has no index or the lookup fails.
    fn search(
        &self,
        term_id: &str,
        query: &str,
        weights: &FieldWeights,
    ) -> impl Future<Output = Result<Vec<IndexHit>, SearchError>> + Send;
}

/// Full-text index over the employee directory.
pub trait EmployeeIndex: Send + Sync {
    /// Search the directory. Hits must be sorted by descending score.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Index`] if the lookup fails.
    fn search(
        &self,
        query: &str,
        weights: &FieldWeights,
    ) -> impl Future<Output = Result<Vec<IndexHit>, SearchError>> + Send;
}

/// Identifying attributes of a class (`crn: None`) or section record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordKey<'a> {
    pub host: &'a str,
    pub term_id: &'a str,
    pub subject: &'a str,
    pub class_id: &'a str,
    pub crn: Option<&'a str>,
}

impl<'a> RecordKey<'a> {
    /// Key of a class record.
    pub fn class(class: &'a ClassDetail) -> Self {
        Self {
            host: &class.host,
            term_id: &class.term_id,
            subject: &class.subject,
            class_id: &class.class_id,
            crn: None,
        }
    }

    /// Key of one section of a class.
    pub fn section(class: &'a ClassDetail, crn: &'a str) -> Self {
        Self {
            crn: Some(crn),
            ..Self::class(class)
        }
    }

    /// Key of a section record, from its own attributes.
    pub fn of_section(section: &'a SectionDetail) -> Self {
        Self {
            host: &section.host,
            term_id: &section.term_id,
            subject: &section.subject,
            class_id: &section.class_id,
            crn: Some(&section.crn),
        }
    }
}

/// Turns identifying attributes into a ref. Must be deterministic.
pub trait KeyHasher: Send + Sync {
    fn hash(&self, key: &RecordKey<'_>) -> RecordRef;
}

/// Builds path-style refs such as `neu.edu/202110/CS/2500/12345`.
///
/// Each component is percent-encoded so a `/` inside a value can never
/// make two different keys produce the same ref.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathKeyHasher;

impl KeyHasher for PathKeyHasher {
    fn hash(&self, key: &RecordKey<'_>) -> RecordRef {
        let mut parts = vec![
            urlencoding::encode(key.host),
            urlencoding::encode(key.term_id),
            urlencoding::encode(key.subject),
            urlencoding::encode(key.class_id),
        ];
        if let Some(crn) = key.crn {
            parts.push(urlencoding::encode(crn));
        }
        RecordRef::new(parts.join("/"))
    }
}
