//! # course-search
//!
//! Ranked, cached, paginated search over a university term's classes and
//! the employee directory.
//!
//! The crate sits between a thin request layer and the data built offline
//! (term datasets, the employee directory, full-text indexes). It never
//! talks to the network itself; every collaborator is a trait in
//! [`provider`].
//!
//! ## Design
//!
//! - Queries are normalised (slang, `cs2500` spacing, email domains) before
//!   they are used as cache keys
//! - A query naming a subject exactly lists that subject instead of ranking
//! - Class and employee hits are merged into one score-ordered stream
//! - Ranked refs are cached per `(term, query)` and evicted by mean age
//! - Tie groups are widened across page edges, hydrated, and reordered by
//!   a business score before the page is cut
//! - Collaborator failures degrade the response instead of failing it
//!
//! ## Logging
//!
//! Query text is logged only at debug level. One event per empty result
//! set is emitted under the `course_search::analytics` target.

pub mod cache;
pub mod config;
pub mod error;
pub mod memory;
pub mod orchestrator;
pub mod provider;
pub mod types;

pub use cache::{Clock, ManualClock, ResultCache, SystemClock};
pub use config::{FieldWeights, SearchConfig};
pub use error::{Result, SearchError};
pub use memory::MemoryProvider;
pub use orchestrator::search::{Searcher, SearcherBuilder};
pub use provider::{ClassIndex, DataProvider, EmployeeIndex, EmployeeMap, KeyHasher, PathKeyHasher};
pub use types::{
    AnalyticsRecord, HydratedResult, IndexHit, RecordRef, SearchRequest, SearchResponse,
    SearchStatus,
};
