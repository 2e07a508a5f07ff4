//! Two-stream ranked merge.
//!
//! The class index and the employee index score independently. Both streams
//! arrive sorted by descending score and are merged into one total order.
//! On equal scores the employee is emitted first, so the merged order is
//! fully reproducible.

use std::iter::Peekable;

use crate::types::{IndexHit, ScoredRef};

/// Merge two descending-score hit lists into one descending sequence.
///
/// The class head is emitted only when its score is strictly greater than
/// the employee head; ties go to the employee. O(n + m), no sorting.
pub fn merge_ranked(classes: Vec<IndexHit>, employees: Vec<IndexHit>) -> Vec<ScoredRef> {
    let mut output = Vec::with_capacity(classes.len() + employees.len());
    let mut classes: Peekable<_> = classes.into_iter().peekable();
    let mut employees: Peekable<_> = employees.into_iter().peekable();

    loop {
        let take_class = match (classes.peek(), employees.peek()) {
            (None, None) => break,
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (Some(class), Some(employee)) => class.score > employee.score,
        };
        let next = if take_class {
            classes.next().map(|hit| ScoredRef::class(hit.reference, hit.score))
        } else {
            employees.next().map(|hit| ScoredRef::employee(hit.reference, hit.score))
        };
        output.extend(next);
    }

    output
}
