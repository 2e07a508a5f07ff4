//! The search host: datasets, configuration and cache lifecycle in one place.
//!
//! The full-text indexes are built elsewhere, so the host is generic over
//! them and only wires them to the loaded term data:
//!
//! ```rust,ignore
//! let config = HostConfig::from_file(&HostConfig::default_config_path())?;
//! let _guard = searchneu::logging::init(&config.logging)?;
//! let host = SearchHost::open(&config, class_index, employee_index)?;
//! host.start();
//! let response = host.search(&SearchRequest::new("cs2500", "202110")).await;
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use course_search::cache::SweepStats;
use course_search::{
    ClassIndex, Clock, EmployeeIndex, MemoryProvider, SearchRequest, SearchResponse, Searcher,
    SystemClock,
};

use crate::config::HostConfig;
use crate::dataset;
use crate::error::Result;

/// Owns a [`Searcher`] over in-memory term data.
pub struct SearchHost<C, E> {
    searcher: Searcher<MemoryProvider, C, E>,
}

impl<C: ClassIndex, E: EmployeeIndex> SearchHost<C, E> {
    /// Validate `config`, load its datasets and build the searcher.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or a dataset cannot
    /// be loaded.
    pub fn open(config: &HostConfig, class_index: C, employee_index: E) -> Result<Self> {
        Self::open_with_clock(config, class_index, employee_index, Arc::new(SystemClock))
    }

    /// Like [`open`](Self::open), with an explicit clock for the result cache.
    ///
    /// # Errors
    ///
    /// Same as [`open`](Self::open).
    pub fn open_with_clock(
        config: &HostConfig,
        class_index: C,
        employee_index: E,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;
        let provider = dataset::load_provider(&config.data.term_dumps)?;
        let employees = match &config.data.employees {
            Some(path) => dataset::load_employees(path)?,
            None => {
                tracing::warn!("no employee directory configured, employee hits will not hydrate");
                HashMap::new()
            }
        };

        let searcher = Searcher::builder(provider, class_index, employee_index, employees)
            .config(config.search.clone())
            .clock(clock)
            .build()?;
        tracing::info!(
            terms = searcher.provider().term_count(),
            classes = searcher.provider().class_count(),
            "search host ready"
        );
        Ok(Self { searcher })
    }

    pub fn searcher(&self) -> &Searcher<MemoryProvider, C, E> {
        &self.searcher
    }

    /// Start the periodic cache sweep. Must be called inside a tokio runtime.
    pub fn start(&self) {
        self.searcher.start();
    }

    pub async fn search(&self, request: &SearchRequest) -> SearchResponse {
        self.searcher.search(request).await
    }

    /// Sweep the result cache immediately.
    pub fn sweep_cache(&self) -> SweepStats {
        self.searcher.cache().sweep_now()
    }

    /// Stop background work. The host can still serve searches afterwards,
    /// but the cache is no longer swept on a timer.
    pub fn shutdown(&self) {
        self.searcher.stop();
        tracing::info!(cached = self.searcher.cache().len(), "search host stopped");
    }
}
