//! # newsbrief
//!
//! Scheduled news digest pipeline: fetch today's articles from a news API, summarize
//! them with an Azure OpenAI chat deployment, and persist the summary with its source
//! articles in one database transaction.
//!
//! ## Design Philosophy
//!
//! - **Sequential stages** - fetch, summarize, store; each awaited in turn
//! - **Bounded retries** - every outbound call and every storage attempt has a fixed
//!   attempt budget with exponential backoff
//! - **Idempotent storage** - articles are keyed by their upstream id, so re-running
//!   over the same news never duplicates rows
//! - **Explicit configuration** - read once into [`Config`], never looked up ambiently
//!
//! ## Quick Start
//!
//! ```no_run
//! use newsbrief::{Config, run_pipeline};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let result = run_pipeline(&config).await?;
//!
//!     if result.is_empty() {
//!         println!("No news available");
//!     } else {
//!         println!("{} articles\n{}", result.articles.len(), result.summary);
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Database persistence layer
pub mod db;
/// Error types
pub mod error;
/// Resilient HTTP client
pub mod http;
/// News fetching
pub mod news;
/// Pipeline orchestration
pub mod pipeline;
/// Retry logic with exponential backoff
pub mod retry;
/// Headline summarization
pub mod summarizer;
/// Core records and pipeline stages
pub mod types;

// Re-export commonly used types
pub use config::{Config, NewsConfig, RetryConfig, StorageConfig, SummarizerConfig};
pub use db::{Database, RunStore};
pub use error::{Error, NetworkError, Result, StorageError};
pub use http::{HttpClient, HttpRequest, HttpResponse};
pub use news::{ArticleSource, NewsFetcher};
pub use pipeline::{Pipeline, run_pipeline};
pub use summarizer::{Summarize, Summarizer};
pub use types::{Article, PipelineResult, Stage, StoreOutcome, Summary};
