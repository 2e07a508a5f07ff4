//! SearchNEU: class and employee search over Northeastern course catalogs.
//!
//! The ranking, caching and pagination logic lives in the
//! [`course_search`] crate. This crate is the host around it:
//!
//! - **Configuration**: a TOML file with `[data]`, `[logging]` and `[search]` tables
//! - **Logging**: `tracing` to stderr plus optional daily rolling files
//! - **Datasets**: JSON term dumps and the employee directory, loaded into memory
//! - **Host**: a [`SearchHost`] that owns the searcher and its cache sweeper

pub mod config;
pub mod dataset;
pub mod error;
pub mod host;
pub mod logging;

pub use config::{DataConfig, HostConfig, LoggingConfig};
pub use error::{HostError, Result};
pub use host::SearchHost;
