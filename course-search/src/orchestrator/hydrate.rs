//! Ref hydration.
//!
//! Expands the refs inside a page window into full display records. Class
//! refs resolve through the data provider, then pull every section by the
//! ref the key hasher derives from the class and CRN. Employee refs are a
//! direct map lookup.
//!
//! Missing or failing records are logged and skipped; a request never fails
//! because one ref could not be resolved.

use std::time::Duration;

use futures::future::join_all;

use crate::provider::{DataProvider, EmployeeMap, KeyHasher, RecordKey};
use crate::types::{ClassDetail, HydratedResult, ResultKind, ResultPayload, ScoredRef, SectionDetail};

use super::with_timeout;

/// Collaborators needed to hydrate refs.
pub struct Hydrator<'a, P> {
    pub provider: &'a P,
    pub employees: &'a dyn EmployeeMap,
    pub hasher: &'a dyn KeyHasher,
    /// Upper bound for each provider call.
    pub timeout: Duration,
}

impl<P: DataProvider> Hydrator<'_, P> {
    /// Hydrate `refs` concurrently.
    ///
    /// The output is aligned with the input: position `i` holds the record
    /// for `refs[i]`, or `None` if it could not be resolved.
    pub async fn hydrate(&self, refs: &[ScoredRef]) -> Vec<Option<HydratedResult>> {
        join_all(refs.iter().map(|r| self.hydrate_one(r))).await
    }

    async fn hydrate_one(&self, scored: &ScoredRef) -> Option<HydratedResult> {
        let payload = match scored.kind {
            ResultKind::Class => {
                let class = self.class(scored).await?;
                let sections = self.sections(&class).await;
                ResultPayload::Class { class, sections }
            }
            ResultKind::Employee => {
                let Some(employee) = self.employees.employee(&scored.reference) else {
                    tracing::warn!(reference = %scored.reference, "employee ref not found");
                    return None;
                };
                ResultPayload::Employee { employee }
            }
        };
        Some(HydratedResult {
            score: scored.score,
            payload,
        })
    }

    async fn class(&self, scored: &ScoredRef) -> Option<ClassDetail> {
        let lookup = self.provider.class_by_ref(&scored.reference);
        match with_timeout(self.timeout, "class lookup", lookup).await {
            Ok(Some(class)) => Some(class),
            Ok(None) => {
                tracing::warn!(reference = %scored.reference, "class ref not found");
                None
            }
            Err(err) => {
                tracing::warn!(reference = %scored.reference, error = %err, "class lookup failed");
                None
            }
        }
    }

    async fn sections(&self, class: &ClassDetail) -> Vec<SectionDetail> {
        let lookups = class.crns.iter().map(|crn| async move {
            let reference = self.hasher.hash(&RecordKey::section(class, crn));
            let lookup = self.provider.section_by_ref(&reference);
            match with_timeout(self.timeout, "section lookup", lookup).await {
                Ok(Some(section)) => Some(section),
                Ok(None) => {
                    tracing::warn!(%reference, crn = %crn, "section ref not found");
                    None
                }
                Err(err) => {
                    tracing::warn!(%reference, error = %err, "section lookup failed");
                    None
                }
            }
        });
        join_all(lookups).await.into_iter().flatten().collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::memory::MemoryProvider;
    use crate::provider::PathKeyHasher;
    use crate::types::{EmployeeDetail, RecordRef};

    fn class() -> ClassDetail {
        ClassDetail {
            host: "neu.edu".into(),
            term_id: "202110".into(),
            subject: "CS".into(),
            class_id: "2500".into(),
            name: "Fundamentals of Computer Science 1".into(),
            desc: None,
            pretty_url: None,
            max_credits: Some(4.0),
            min_credits: Some(4.0),
            crns: vec!["1".into(), "2".into(), "3".into()],
        }
    }

    fn section(crn: &str) -> SectionDetail {
        SectionDetail {
            host: "neu.edu".into(),
            term_id: "202110".into(),
            subject: "CS".into(),
            class_id: "2500".into(),
            crn: crn.into(),
            seats_capacity: 20,
            seats_remaining: 2,
            wait_capacity: None,
            wait_remaining: None,
            online: crn == "2",
            profs: vec![],
        }
    }

    #[tokio::test]
    async fn hydrates_in_input_order_and_skips_unknown_refs() {
        let mut provider = MemoryProvider::new();
        let class_ref = provider.add_class(class());
        provider.add_section(section("1"));
        // CRN 2 has no section record.
        provider.add_section(section("3"));

        let employees: HashMap<RecordRef, EmployeeDetail> = HashMap::from([(
            RecordRef::new("emp/1"),
            EmployeeDetail {
                id: "1".into(),
                name: "Ada".into(),
                ..Default::default()
            },
        )]);

        let hydrator = Hydrator {
            provider: &provider,
            employees: &employees,
            hasher: &PathKeyHasher,
            timeout: Duration::from_secs(1),
        };
        let refs = vec![
            ScoredRef::employee("emp/1", 3.0),
            ScoredRef::class("neu.edu/202110/CS/9999", 2.5),
            ScoredRef::class(class_ref, 2.0),
            ScoredRef::employee("emp/404", 1.0),
        ];

        let hydrated = hydrator.hydrate(&refs).await;
        assert_eq!(hydrated.len(), 4);
        assert!(hydrated[1].is_none());
        assert!(hydrated[3].is_none());

        let employee = hydrated[0].as_ref().expect("employee hydrated");
        assert_eq!(employee.kind(), ResultKind::Employee);
        assert!((employee.score - 3.0).abs() < f64::EPSILON);

        let class = hydrated[2].as_ref().expect("class hydrated");
        let ResultPayload::Class { sections, .. } = &class.payload else {
            panic!("expected a class payload");
        };
        let crns: Vec<&str> = sections.iter().map(|s| s.crn.as_str()).collect();
        assert_eq!(crns, vec!["1", "3"]);
    }
}
