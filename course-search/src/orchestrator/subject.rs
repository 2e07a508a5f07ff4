//! Exact subject matching.
//!
//! A query that names a subject exactly (`cs`, `computer science`) lists
//! every class in that subject instead of running a ranked search. The
//! listing order from the data provider is authoritative, so these refs all
//! carry score 0 and are never business-sorted.

use crate::provider::DataProvider;
use crate::types::{ScoredRef, Subject};

/// Find the subject whose code or display name equals `query`, ignoring case.
///
/// Linear in the number of subjects, which is small and bounded per term.
pub fn find_subject<'a>(query: &str, subjects: &'a [Subject]) -> Option<&'a Subject> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return None;
    }
    subjects
        .iter()
        .find(|s| s.code.to_lowercase() == query || s.name.to_lowercase() == query)
}

/// Every class in `subject` as a score-0 ref, in provider order.
pub fn subject_listing<P: DataProvider>(
    provider: &P,
    subject: &Subject,
    term_id: &str,
) -> Vec<ScoredRef> {
    provider
        .classes_in_subject(&subject.code, term_id)
        .into_iter()
        .map(|reference| ScoredRef::class(reference, 0.0))
        .collect()
}
