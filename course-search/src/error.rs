//! Error types for the course-search crate.
//!
//! Request validation problems (bad page range, unknown term) are not
//! errors: they come back as an empty response with a descriptive
//! [`SearchStatus`](crate::types::SearchStatus). The variants here cover
//! failures of the external collaborators and invalid configuration.

/// Errors raised by external collaborators or configuration checks.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// An external index or hydration call did not finish in time.
    #[error("timed out: {0}")]
    Timeout(String),

    /// A full-text index lookup failed.
    #[error("index error: {0}")]
    Index(String),

    /// A record could not be resolved from the data provider.
    #[error("hydration error: {0}")]
    Hydration(String),

    /// Invalid search configuration.
    #[error("config error: {0}")]
    Config(String),
}

/// Convenience type alias for course-search results.
pub type Result<T> = std::result::Result<T, SearchError>;
