//! Error types for the search host.

use course_search::SearchError;

/// Errors raised while configuring or loading the search host.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file or logging setup error.
    #[error("config error: {0}")]
    Config(String),

    /// A term dump or employee file is malformed or inconsistent.
    #[error("dataset error: {0}")]
    Dataset(String),

    /// Error from the search core.
    #[error("search error: {0}")]
    Search(#[from] SearchError),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, HostError>;
