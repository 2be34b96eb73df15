//! Database layer for newsbrief
//!
//! Persists one pipeline run as a single transaction: a summary row, then one row per
//! article keyed by the upstream id. Article inserts use `ON CONFLICT (id) DO NOTHING`
//! so re-running the pipeline over the same articles never fails or duplicates.
//!
//! ## Submodules
//!
//! Methods on [`Database`] are organized by concern:
//! - [`migrations`]: the bundled schema script
//! - [`runs`]: the per-attempt unit of work and its retry loop

use crate::config::StorageConfig;
use crate::error::Result;
use crate::types::{Article, StoreOutcome, Summary};
use async_trait::async_trait;

mod migrations;
mod runs;

pub use migrations::SCHEMA_SQL;

/// Something that can persist the outcome of a run
#[async_trait]
pub trait RunStore: Send + Sync {
    /// Persist `summary` and `articles` as one run
    async fn store_run(&self, summary: &Summary, articles: &[Article]) -> Result<StoreOutcome>;
}

/// Database handle for newsbrief
///
/// Holds configuration only. Every storage attempt opens its own connection and
/// closes it before returning.
#[derive(Clone, Debug)]
pub struct Database {
    config: StorageConfig,
}

impl Database {
    /// Create a handle using the given storage settings
    pub fn new(config: StorageConfig) -> Self {
        Self { config }
    }

    /// Storage settings in use
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }
}

#[async_trait]
impl RunStore for Database {
    async fn store_run(&self, summary: &Summary, articles: &[Article]) -> Result<StoreOutcome> {
        self.store(
            &self.config.database_url,
            summary,
            articles,
            self.config.init_schema,
        )
        .await
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
