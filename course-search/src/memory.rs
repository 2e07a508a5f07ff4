//! In-memory [`DataProvider`] over fully loaded term datasets.
//!
//! Classes and sections are keyed by the refs the configured [`KeyHasher`]
//! derives from their identifying attributes, so the refs stored in the
//! full-text indexes resolve directly. Subject listings keep the order in
//! which classes were added.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::SearchError;
use crate::provider::{DataProvider, KeyHasher, PathKeyHasher, RecordKey};
use crate::types::{ClassDetail, RecordRef, SectionDetail, Subject};

#[derive(Debug, Default)]
struct TermData {
    subjects: Vec<Subject>,
    listings: HashMap<String, Vec<RecordRef>>,
}

/// A [`DataProvider`] backed by hash maps.
pub struct MemoryProvider {
    hasher: Arc<dyn KeyHasher>,
    terms: HashMap<String, TermData>,
    classes: HashMap<RecordRef, ClassDetail>,
    sections: HashMap<RecordRef, SectionDetail>,
}

impl Default for MemoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryProvider {
    /// An empty provider keyed with [`PathKeyHasher`].
    pub fn new() -> Self {
        Self::with_hasher(Arc::new(PathKeyHasher))
    }

    pub fn with_hasher(hasher: Arc<dyn KeyHasher>) -> Self {
        Self {
            hasher,
            terms: HashMap::new(),
            classes: HashMap::new(),
            sections: HashMap::new(),
        }
    }

    /// Register a term with no data yet.
    pub fn add_term(&mut self, term_id: &str) {
        self.terms.entry(term_id.to_owned()).or_default();
    }

    /// Register a subject. Re-adding a known code keeps the first entry.
    pub fn add_subject(&mut self, term_id: &str, subject: Subject) {
        let term = self.terms.entry(term_id.to_owned()).or_default();
        if !term.subjects.iter().any(|s| s.code == subject.code) {
            term.subjects.push(subject);
        }
    }

    /// Store a class and append it to its subject's listing.
    pub fn add_class(&mut self, class: ClassDetail) -> RecordRef {
        let reference = self.hasher.hash(&RecordKey::class(&class));
        let term = self.terms.entry(class.term_id.clone()).or_default();
        let listing = term.listings.entry(class.subject.clone()).or_default();
        if !listing.contains(&reference) {
            listing.push(reference.clone());
        }
        self.classes.insert(reference.clone(), class);
        reference
    }

    /// Store a section under the ref derived from its class and CRN.
    pub fn add_section(&mut self, section: SectionDetail) -> RecordRef {
        let reference = self.hasher.hash(&RecordKey::of_section(&section));
        self.sections.insert(reference.clone(), section);
        reference
    }

    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }
}

impl DataProvider for MemoryProvider {
    fn has_term(&self, term_id: &str) -> bool {
        self.terms.contains_key(term_id)
    }

    fn subjects(&self, term_id: &str) -> Vec<Subject> {
        self.terms
            .get(term_id)
            .map(|t| t.subjects.clone())
            .unwrap_or_default()
    }

    fn classes_in_subject(&self, subject_code: &str, term_id: &str) -> Vec<RecordRef> {
        self.terms
            .get(term_id)
            .and_then(|t| t.listings.get(subject_code))
            .cloned()
            .unwrap_or_default()
    }

    async fn class_by_ref(&self, reference: &RecordRef) -> Result<Option<ClassDetail>, SearchError> {
        Ok(self.classes.get(reference).cloned())
    }

    async fn section_by_ref(
        &self,
        reference: &RecordRef,
    ) -> Result<Option<SectionDetail>, SearchError> {
        Ok(self.sections.get(reference).cloned())
    }
}
