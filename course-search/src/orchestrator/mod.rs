//! Search orchestrator: normalise, match, merge, cache, page, hydrate, rank.
//!
//! Each stage lives in its own module; [`search`] composes them into the
//! public [`Searcher`](search::Searcher) contract.

pub mod business;
pub mod hydrate;
pub mod merge;
pub mod normalize;
pub mod search;
pub mod subject;
pub mod window;

use std::future::Future;
use std::time::Duration;

use crate::error::SearchError;

/// Run an external call with an upper bound on how long it may take.
pub(crate) async fn with_timeout<T, F>(limit: Duration, what: &str, call: F) -> Result<T, SearchError>
where
    F: Future<Output = Result<T, SearchError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(SearchError::Timeout(format!(
            "{what} after {}ms",
            limit.as_millis()
        ))),
    }
}
