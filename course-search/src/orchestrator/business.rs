//! Business-score ordering within tie groups.
//!
//! Full-text relevance decides the order between groups of results with
//! different scores. Inside a group of equal scores, results are ordered by
//! a secondary "real-world demand" score:
//!
//! | result                                  | business score          |
//! |-----------------------------------------|-------------------------|
//! | class without sections                  | 0                       |
//! | class with taken seats or waitlist      | taken + 1,000,000       |
//! | class, no demand, non-numeric class id  | 1                       |
//! | class, no demand, class id over 10,000  | 2                       |
//! | class, no demand                        | 10,000 − class id       |
//! | employee                                | populated attributes    |

use std::cmp::Reverse;

use crate::types::{ClassDetail, HydratedResult, ResultPayload, SectionDetail};

/// Added to a class's taken seats so any demand outranks every other class.
const DEMAND_BONUS: i64 = 1_000_000;

/// Highest class number expected; anything above is clamped.
const MAX_CLASS_NUMBER: i64 = 10_000;

/// Secondary score of a hydrated result. Higher sorts first.
pub fn business_score(result: &HydratedResult) -> i64 {
    match &result.payload {
        ResultPayload::Class { class, sections } => class_score(class, sections),
        ResultPayload::Employee { employee } => {
            i64::try_from(employee.populated_attribute_count()).unwrap_or(i64::MAX)
        }
    }
}

fn class_score(class: &ClassDetail, sections: &[SectionDetail]) -> i64 {
    if sections.is_empty() {
        return 0;
    }

    let taken: i64 = sections.iter().map(SectionDetail::taken_seats).sum();
    if taken > 0 {
        return taken + DEMAND_BONUS;
    }

    // Lower course numbers outrank higher ones among undemanded classes.
    let Ok(number) = class.class_id.trim().parse::<u32>() else {
        return 1;
    };
    let number = i64::from(number);
    if number > MAX_CLASS_NUMBER {
        tracing::warn!(
            subject = %class.subject,
            class_id = %class.class_id,
            "class number is over 10000, clamping business score"
        );
        return 2;
    }
    MAX_CLASS_NUMBER - number
}

/// Stably reorder every run of equal primary score by descending business
/// score. Runs themselves stay where they are.
pub fn sort_tie_groups(results: &mut [HydratedResult]) {
    for group in results.chunk_by_mut(|a, b| a.score == b.score) {
        if group.len() > 1 {
            group.sort_by_cached_key(|r| Reverse(business_score(r)));
        }
    }
}
