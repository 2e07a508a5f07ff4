//! The public search contract.
//!
//! [`Searcher::search`] runs one request through the whole pipeline:
//!
//! 1. Validate the page range and the term id
//! 2. Normalise the query against the term's subjects
//! 3. Check for an exact subject match
//! 4. Look the `(term, query)` pair up in the result cache
//! 5. On a miss, list the subject or merge both index streams, then cache
//! 6. Widen the page window over tie groups (ranked queries only)
//! 7. Hydrate the refs inside the window
//! 8. Business-sort tie groups (ranked queries only) and trim to the page
//!
//! Validation outcomes and collaborator failures never surface as errors:
//! the caller always gets a [`SearchResponse`] with an analytics record.

use std::sync::Arc;
use std::time::Duration;

use crate::cache::{CacheEntry, CacheKey, Clock, ResultCache, SystemClock};
use crate::config::SearchConfig;
use crate::error::Result;
use crate::provider::{ClassIndex, DataProvider, EmployeeIndex, EmployeeMap, KeyHasher, PathKeyHasher};
use crate::types::{
    AnalyticsRecord, HydratedResult, IndexHit, ScoredRef, SearchRequest, SearchResponse,
    SearchStatus,
};

use super::business::sort_tie_groups;
use super::hydrate::Hydrator;
use super::merge::merge_ranked;
use super::normalize::normalize_query;
use super::subject::{find_subject, subject_listing};
use super::window::{expand_window, PageWindow};
use super::with_timeout;

/// Target of the per-request analytics events.
const ANALYTICS_TARGET: &str = "course_search::analytics";

/// Ranked, cached, paginated search over one data provider and its indexes.
pub struct Searcher<P, C, E> {
    provider: P,
    class_index: C,
    employee_index: E,
    employees: Box<dyn EmployeeMap>,
    hasher: Box<dyn KeyHasher>,
    cache: Arc<ResultCache>,
    config: SearchConfig,
}

/// Builder for [`Searcher`]. Created with [`Searcher::builder`].
pub struct SearcherBuilder<P, C, E> {
    provider: P,
    class_index: C,
    employee_index: E,
    employees: Box<dyn EmployeeMap>,
    hasher: Box<dyn KeyHasher>,
    clock: Arc<dyn Clock>,
    config: SearchConfig,
}

impl<P, C, E> SearcherBuilder<P, C, E>
where
    P: DataProvider,
    C: ClassIndex,
    E: EmployeeIndex,
{
    pub fn config(mut self, config: SearchConfig) -> Self {
        self.config = config;
        self
    }

    /// Clock used for cache timestamps. Defaults to [`SystemClock`].
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Hasher that turns a class and CRN into a section ref. Must match the
    /// one the data provider was keyed with. Defaults to [`PathKeyHasher`].
    pub fn key_hasher(mut self, hasher: impl KeyHasher + 'static) -> Self {
        self.hasher = Box::new(hasher);
        self
    }

    /// Validate the configuration and build the searcher.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`](crate::SearchError::Config) if the
    /// configuration is invalid.
    pub fn build(self) -> Result<Searcher<P, C, E>> {
        self.config.validate()?;
        let cache = Arc::new(ResultCache::from_config(&self.config, self.clock));
        Ok(Searcher {
            provider: self.provider,
            class_index: self.class_index,
            employee_index: self.employee_index,
            employees: self.employees,
            hasher: self.hasher,
            cache,
            config: self.config,
        })
    }
}

impl<P, C, E> Searcher<P, C, E>
where
    P: DataProvider,
    C: ClassIndex,
    E: EmployeeIndex,
{
    pub fn builder(
        provider: P,
        class_index: C,
        employee_index: E,
        employees: impl EmployeeMap + 'static,
    ) -> SearcherBuilder<P, C, E> {
        SearcherBuilder {
            provider,
            class_index,
            employee_index,
            employees: Box::new(employees),
            hasher: Box::new(PathKeyHasher),
            clock: Arc::new(SystemClock),
            config: SearchConfig::default(),
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// The shared result cache.
    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    /// Start the periodic cache sweep. Must be called inside a tokio runtime.
    pub fn start(&self) {
        self.cache.start();
    }

    /// Stop the periodic cache sweep.
    pub fn stop(&self) {
        self.cache.stop();
    }

    /// Search `query` in `term_id` and return results `min_index..max_index`.
    pub async fn search_page(
        &self,
        query: &str,
        term_id: &str,
        min_index: usize,
        max_index: usize,
    ) -> SearchResponse {
        self.search(&SearchRequest::new(query, term_id).with_range(min_index, max_index))
            .await
    }

    /// Run one search request.
    pub async fn search(&self, request: &SearchRequest) -> SearchResponse {
        let SearchRequest {
            query,
            term_id,
            min_index,
            max_index,
        } = request;
        let (min_index, max_index) = (*min_index, *max_index);

        if max_index <= min_index {
            tracing::warn!(min_index, max_index, "max index must be greater than min index");
            return rejected(request, SearchStatus::IndexRangeError);
        }
        if !self.provider.has_term(term_id) {
            tracing::warn!(term_id = %term_id, "search for unknown term");
            return rejected(request, SearchStatus::InvalidTermId);
        }

        let subjects = self.provider.subjects(term_id);
        let normalized = normalize_query(query, &subjects, &self.config);
        let subject = find_subject(&normalized, &subjects);
        let key = CacheKey::new(term_id.as_str(), normalized.as_str());

        let (entry, is_cache_hit) = match self.cache.get(&key) {
            Some(entry) => (entry, true),
            None => {
                let entry = match subject {
                    Some(subject) => {
                        let refs = subject_listing(&self.provider, subject, term_id);
                        let count = refs.len();
                        self.store(key, refs, true, Some(subject.name.clone()), Some(count))
                    }
                    None => match self.ranked_refs(term_id, &normalized).await {
                        Ok(refs) => self.store(key, refs, false, None, None),
                        // A partial stream is served but not remembered.
                        Err(refs) => Arc::new(CacheEntry::new(
                            refs,
                            false,
                            None,
                            None,
                            self.cache.now_millis(),
                        )),
                    },
                };
                (entry, false)
            }
        };

        tracing::debug!(
            term_id = %term_id,
            query = %normalized,
            refs = entry.refs.len(),
            is_cache_hit,
            was_subject_match = entry.was_subject_match,
            "resolved search refs"
        );

        let analytics = |status: SearchStatus, result_count: usize| AnalyticsRecord {
            status,
            was_subject_match: entry.was_subject_match,
            subject_name: entry.subject_name.clone(),
            subject_count: entry.subject_count,
            is_cache_hit,
            query: normalized.clone(),
            term_id: term_id.clone(),
            min_index,
            max_index,
            result_count,
        };

        if entry.refs.is_empty() {
            tracing::info!(target: ANALYTICS_TARGET, term_id = %term_id, "search returned no results");
            return SearchResponse {
                results: Vec::new(),
                analytics: analytics(SearchStatus::Success, 0),
            };
        }

        let window = self.window(&entry, min_index, max_index);
        let Some(window) = window else {
            return SearchResponse {
                results: Vec::new(),
                analytics: analytics(SearchStatus::Success, 0),
            };
        };

        let results = self.page(&entry, window, max_index - min_index).await;
        SearchResponse {
            results,
            analytics: analytics(SearchStatus::Success, entry.refs.len()),
        }
    }

    fn store(
        &self,
        key: CacheKey,
        refs: Vec<ScoredRef>,
        was_subject_match: bool,
        subject_name: Option<String>,
        subject_count: Option<usize>,
    ) -> Arc<CacheEntry> {
        let entry = self
            .cache
            .put(key, refs, was_subject_match, subject_name, subject_count);
        if self.cache.over_high_water_mark() {
            tracing::info!(
                entries = self.cache.len(),
                "search cache over high-water mark, scheduling sweep"
            );
            self.cache.schedule_sweep();
        }
        entry
    }

    /// Query both indexes concurrently and merge their hits.
    ///
    /// `Err` carries the merged refs when either stream failed; those refs
    /// are usable but must not be cached.
    async fn ranked_refs(
        &self,
        term_id: &str,
        query: &str,
    ) -> std::result::Result<Vec<ScoredRef>, Vec<ScoredRef>> {
        let limit = Duration::from_millis(self.config.index_timeout_ms);
        let (classes, employees) = futures::join!(
            with_timeout(
                limit,
                "class index",
                self.class_index
                    .search(term_id, query, &self.config.class_weights),
            ),
            with_timeout(
                limit,
                "employee index",
                self.employee_index
                    .search(query, &self.config.employee_weights),
            ),
        );

        let (classes, classes_ok) = stream_or_empty("class", classes);
        let (employees, employees_ok) = stream_or_empty("employee", employees);
        let merged = merge_ranked(classes, employees);
        if classes_ok && employees_ok {
            Ok(merged)
        } else {
            Err(merged)
        }
    }

    fn window(&self, entry: &CacheEntry, min_index: usize, max_index: usize) -> Option<PageWindow> {
        // `max_index` is exclusive, windows are inclusive.
        let last = max_index - 1;
        if entry.was_subject_match {
            PageWindow::exact(entry.refs.len(), min_index, last)
        } else {
            expand_window(&entry.refs, min_index, last)
        }
    }

    async fn page(&self, entry: &CacheEntry, window: PageWindow, size: usize) -> Vec<HydratedResult> {
        let hydrator = Hydrator {
            provider: &self.provider,
            employees: self.employees.as_ref(),
            hasher: self.hasher.as_ref(),
            timeout: Duration::from_millis(self.config.hydration_timeout_ms),
        };
        let hydrated = hydrator.hydrate(&entry.refs[window.start..=window.end]).await;

        // Refs that failed to hydrate in front of the page shift it forward.
        let leading = hydrated[..window.start_offset()].iter().flatten().count();
        let mut results: Vec<HydratedResult> = hydrated.into_iter().flatten().collect();
        if !entry.was_subject_match {
            sort_tie_groups(&mut results);
        }
        results.into_iter().skip(leading).take(size).collect()
    }
}

fn stream_or_empty(name: &str, outcome: Result<Vec<IndexHit>>) -> (Vec<IndexHit>, bool) {
    match outcome {
        Ok(hits) => (hits, true),
        Err(err) => {
            tracing::warn!(index = name, error = %err, "index lookup failed, continuing without it");
            (Vec::new(), false)
        }
    }
}

fn rejected(request: &SearchRequest, status: SearchStatus) -> SearchResponse {
    SearchResponse {
        results: Vec::new(),
        analytics: AnalyticsRecord {
            status,
            was_subject_match: false,
            subject_name: None,
            subject_count: None,
            is_cache_hit: false,
            query: request.query.clone(),
            term_id: request.term_id.clone(),
            min_index: request.min_index,
            max_index: request.max_index,
            result_count: 0,
        },
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::cache::ManualClock;
    use crate::config::FieldWeights;
    use crate::error::SearchError;
    use crate::memory::MemoryProvider;
    use crate::types::{
        ClassDetail, EmployeeDetail, RecordRef, ResultKind, ResultPayload, SectionDetail, Subject,
    };

    const TERM: &str = "202110";

    #[derive(Default)]
    struct FakeClassIndex {
        hits: HashMap<String, Vec<IndexHit>>,
        delay: Option<Duration>,
        calls: AtomicUsize,
    }

    impl ClassIndex for FakeClassIndex {
        async fn search(
            &self,
            _term_id: &str,
            query: &str,
            _weights: &FieldWeights,
        ) -> Result<Vec<IndexHit>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            Ok(self.hits.get(query).cloned().unwrap_or_default())
        }
    }

    #[derive(Default)]
    struct FakeEmployeeIndex {
        hits: HashMap<String, Vec<IndexHit>>,
        fail: bool,
    }

    impl EmployeeIndex for FakeEmployeeIndex {
        async fn search(&self, query: &str, _weights: &FieldWeights) -> Result<Vec<IndexHit>> {
            if self.fail {
                return Err(SearchError::Index("employee index offline".into()));
            }
            Ok(self.hits.get(query).cloned().unwrap_or_default())
        }
    }

    fn class(class_id: &str, crns: &[&str]) -> ClassDetail {
        ClassDetail {
            host: "neu.edu".into(),
            term_id: TERM.into(),
            subject: "CS".into(),
            class_id: class_id.into(),
            name: format!("CS {class_id}"),
            desc: None,
            pretty_url: None,
            max_credits: Some(4.0),
            min_credits: Some(4.0),
            crns: crns.iter().map(|c| (*c).to_owned()).collect(),
        }
    }

    fn section(class_id: &str, crn: &str, capacity: i64, remaining: i64) -> SectionDetail {
        SectionDetail {
            host: "neu.edu".into(),
            term_id: TERM.into(),
            subject: "CS".into(),
            class_id: class_id.into(),
            crn: crn.into(),
            seats_capacity: capacity,
            seats_remaining: remaining,
            wait_capacity: None,
            wait_remaining: None,
            online: false,
            profs: vec![],
        }
    }

    /// CS 2500 has demand, CS 2510 and CS 3500 have empty sections.
    fn provider() -> MemoryProvider {
        let mut provider = MemoryProvider::new();
        provider.add_subject(TERM, Subject::new("CS", "Computer Science"));
        provider.add_class(class("2500", &["1"]));
        provider.add_class(class("2510", &["2"]));
        provider.add_class(class("3500", &["3"]));
        provider.add_section(section("2500", "1", 30, 10));
        provider.add_section(section("2510", "2", 30, 30));
        provider.add_section(section("3500", "3", 30, 30));
        provider
    }

    fn class_ref(class_id: &str) -> RecordRef {
        RecordRef::new(format!("neu.edu/{TERM}/CS/{class_id}"))
    }

    fn employees() -> HashMap<RecordRef, EmployeeDetail> {
        let mut map = HashMap::new();
        map.insert(
            RecordRef::new("emp/ada"),
            EmployeeDetail {
                id: "ada".into(),
                name: "Ada Lovelace".into(),
                emails: vec!["a.lovelace@northeastern.edu".into()],
                ..Default::default()
            },
        );
        map
    }

    fn searcher(
        classes: FakeClassIndex,
        people: FakeEmployeeIndex,
    ) -> Searcher<MemoryProvider, FakeClassIndex, FakeEmployeeIndex> {
        Searcher::builder(provider(), classes, people, employees())
            .clock(Arc::new(ManualClock::new(0)))
            .build()
            .expect("valid config")
    }

    fn class_ids(response: &SearchResponse) -> Vec<String> {
        response
            .results
            .iter()
            .map(|r| match &r.payload {
                ResultPayload::Class { class, .. } => class.class_id.clone(),
                ResultPayload::Employee { employee } => employee.id.clone(),
            })
            .collect()
    }

    fn ranked(query: &str, hits: Vec<IndexHit>) -> FakeClassIndex {
        FakeClassIndex {
            hits: HashMap::from([(query.to_string(), hits)]),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn second_search_is_served_from_cache() {
        let searcher = searcher(
            ranked("algo", vec![IndexHit::new(class_ref("3500"), 2.0)]),
            FakeEmployeeIndex::default(),
        );

        let first = searcher.search_page("Algo", TERM, 0, 10).await;
        assert!(!first.analytics.is_cache_hit);
        assert_eq!(first.results.len(), 1);

        let second = searcher.search_page("algo", TERM, 0, 10).await;
        assert!(second.analytics.is_cache_hit);
        assert_eq!(second.results, first.results);
        assert_eq!(searcher.class_index.calls.load(Ordering::SeqCst), 1);
        assert_eq!(searcher.cache().len(), 1);
    }

    #[tokio::test]
    async fn subject_query_lists_the_subject() {
        let searcher = searcher(FakeClassIndex::default(), FakeEmployeeIndex::default());

        let response = searcher.search_page("CS", TERM, 0, 1000).await;
        assert!(response.analytics.was_subject_match);
        assert_eq!(response.analytics.subject_name.as_deref(), Some("Computer Science"));
        assert_eq!(response.analytics.subject_count, Some(3));
        assert_eq!(response.analytics.result_count, 3);
        // Provider order, no business sort.
        assert_eq!(class_ids(&response), vec!["2500", "2510", "3500"]);
        assert!(response.results.iter().all(|r| r.score == 0.0));
        assert_eq!(searcher.class_index.calls.load(Ordering::SeqCst), 0);

        let again = searcher.search_page("computer science", TERM, 1, 2).await;
        assert!(again.analytics.was_subject_match);
        assert_eq!(class_ids(&again), vec!["2510"]);
    }

    #[tokio::test]
    async fn first_page_returns_every_ref() {
        let query = "fundamentals of computer science";
        let searcher = searcher(
            ranked(
                query,
                vec![
                    IndexHit::new(class_ref("2500"), 9.0),
                    IndexHit::new(class_ref("2510"), 5.0),
                ],
            ),
            FakeEmployeeIndex {
                hits: HashMap::from([(query.to_string(), vec![IndexHit::new("emp/ada", 1.0)])]),
                fail: false,
            },
        );

        let response = searcher.search_page("fundies", TERM, 0, 1000).await;
        assert_eq!(response.analytics.status, SearchStatus::Success);
        assert_eq!(response.analytics.query, query);
        assert_eq!(response.analytics.result_count, 3);
        assert_eq!(class_ids(&response), vec!["2500", "2510", "ada"]);
        assert_eq!(response.results[2].kind(), ResultKind::Employee);
    }

    #[tokio::test]
    async fn page_past_the_end_is_empty_success() {
        let searcher = searcher(
            ranked("algo", vec![IndexHit::new(class_ref("3500"), 2.0)]),
            FakeEmployeeIndex::default(),
        );

        let response = searcher.search_page("algo", TERM, 5, 10).await;
        assert!(response.results.is_empty());
        assert_eq!(response.analytics.status, SearchStatus::Success);
        assert_eq!(response.analytics.result_count, 0);
    }

    #[tokio::test]
    async fn no_hits_is_empty_success() {
        let searcher = searcher(FakeClassIndex::default(), FakeEmployeeIndex::default());
        let response = searcher.search_page("basket weaving", TERM, 0, 10).await;
        assert!(response.results.is_empty());
        assert_eq!(response.analytics.status, SearchStatus::Success);
        assert_eq!(response.analytics.result_count, 0);
    }

    #[tokio::test]
    async fn inverted_range_is_rejected() {
        let searcher = searcher(FakeClassIndex::default(), FakeEmployeeIndex::default());
        let response = searcher.search_page("CS2500", TERM, 10, 10).await;
        assert!(response.results.is_empty());
        assert_eq!(response.analytics.status, SearchStatus::IndexRangeError);
        assert_eq!(response.analytics.query, "CS2500");
        assert!(searcher.cache().is_empty());
    }

    #[tokio::test]
    async fn unknown_term_is_rejected() {
        let searcher = searcher(FakeClassIndex::default(), FakeEmployeeIndex::default());
        let response = searcher.search_page("cs", "199910", 0, 10).await;
        assert!(response.results.is_empty());
        assert_eq!(response.analytics.status, SearchStatus::InvalidTermId);
        assert_eq!(response.analytics.term_id, "199910");
    }

    #[tokio::test]
    async fn ties_are_broken_by_demand() {
        let searcher = searcher(
            ranked(
                "intro",
                vec![
                    IndexHit::new(class_ref("3500"), 4.0),
                    IndexHit::new(class_ref("2510"), 4.0),
                    IndexHit::new(class_ref("2500"), 4.0),
                ],
            ),
            FakeEmployeeIndex::default(),
        );

        let response = searcher.search_page("intro", TERM, 0, 1000).await;
        // 2500 has taken seats, then lower course numbers first.
        assert_eq!(class_ids(&response), vec!["2500", "2510", "3500"]);
    }

    #[tokio::test]
    async fn tie_group_across_pages_is_split_consistently() {
        let searcher = searcher(
            ranked(
                "intro",
                vec![
                    IndexHit::new(class_ref("3500"), 4.0),
                    IndexHit::new(class_ref("2510"), 4.0),
                    IndexHit::new(class_ref("2500"), 4.0),
                ],
            ),
            FakeEmployeeIndex::default(),
        );

        let first = searcher.search_page("intro", TERM, 0, 2).await;
        let second = searcher.search_page("intro", TERM, 2, 4).await;
        assert_eq!(class_ids(&first), vec!["2500", "2510"]);
        assert_eq!(class_ids(&second), vec!["3500"]);
        assert_eq!(second.analytics.result_count, 3);
    }

    #[tokio::test]
    async fn unresolvable_refs_are_skipped() {
        let searcher = searcher(
            ranked(
                "algo",
                vec![
                    IndexHit::new(class_ref("9999"), 3.0),
                    IndexHit::new(class_ref("3500"), 2.0),
                ],
            ),
            FakeEmployeeIndex::default(),
        );

        let response = searcher.search_page("algo", TERM, 0, 10).await;
        assert_eq!(class_ids(&response), vec!["3500"]);
        assert_eq!(response.analytics.result_count, 2);
    }

    #[tokio::test]
    async fn failed_index_degrades_and_is_not_cached() {
        let searcher = searcher(
            ranked("ada", vec![IndexHit::new(class_ref("3500"), 2.0)]),
            FakeEmployeeIndex {
                fail: true,
                ..Default::default()
            },
        );

        let response = searcher.search_page("ada", TERM, 0, 10).await;
        assert_eq!(response.analytics.status, SearchStatus::Success);
        assert_eq!(class_ids(&response), vec!["3500"]);
        assert!(searcher.cache().is_empty());

        searcher.search_page("ada", TERM, 0, 10).await;
        assert_eq!(searcher.class_index.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_index_times_out() {
        let searcher = searcher(
            FakeClassIndex {
                hits: HashMap::from([(
                    "ada".to_string(),
                    vec![IndexHit::new(class_ref("3500"), 2.0)],
                )]),
                delay: Some(Duration::from_secs(30)),
                ..Default::default()
            },
            FakeEmployeeIndex {
                hits: HashMap::from([("ada".to_string(), vec![IndexHit::new("emp/ada", 1.0)])]),
                fail: false,
            },
        );

        let response = searcher.search_page("ada", TERM, 0, 10).await;
        assert_eq!(class_ids(&response), vec!["ada"]);
        assert!(!response.analytics.is_cache_hit);
        assert!(searcher.cache().is_empty());
    }

    #[test]
    fn build_rejects_invalid_config() {
        let config = SearchConfig {
            high_water_mark: 0,
            ..SearchConfig::default()
        };
        let result = Searcher::builder(
            provider(),
            FakeClassIndex::default(),
            FakeEmployeeIndex::default(),
            employees(),
        )
        .config(config)
        .build();
        assert!(matches!(result, Err(SearchError::Config(_))));
    }
}
