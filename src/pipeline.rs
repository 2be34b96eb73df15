//! Pipeline orchestration
//!
//! A run walks `Idle → Fetching → (Empty | Summarizing) → Storing → Done`. Stages run
//! strictly one after another; each one owns its own retries, so the orchestrator only
//! sequences, logs and propagates. A failure in any stage ends the run in
//! [`Stage::Error`] and nothing from that run is persisted.

use crate::config::Config;
use crate::db::{Database, RunStore};
use crate::error::Result;
use crate::http::HttpClient;
use crate::news::{ArticleSource, NewsFetcher};
use crate::summarizer::{Summarize, Summarizer};
use crate::types::{PipelineResult, Stage, Summary};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Fetch, summarize and persist one batch of news
#[derive(Clone)]
pub struct Pipeline {
    source: Arc<dyn ArticleSource>,
    summarizer: Arc<dyn Summarize>,
    store: Arc<dyn RunStore>,
}

impl Pipeline {
    /// Assemble a pipeline from its three stages
    pub fn new(
        source: Arc<dyn ArticleSource>,
        summarizer: Arc<dyn Summarize>,
        store: Arc<dyn RunStore>,
    ) -> Self {
        Self {
            source,
            summarizer,
            store,
        }
    }

    /// Production wiring: news API, Azure OpenAI and the configured database
    ///
    /// Both HTTP stages share one retry policy ([`Config::http_retry`]).
    pub fn from_config(config: &Config) -> Self {
        let http = HttpClient::new(config.http_retry.clone());
        Self::new(
            Arc::new(NewsFetcher::new(http.clone(), config.news.clone())),
            Arc::new(Summarizer::new(http, config.summarizer.clone())),
            Arc::new(Database::new(config.storage.clone())),
        )
    }

    /// Execute one run
    ///
    /// Returns [`PipelineResult::empty`] without calling the summarizer or the store when
    /// the source has no articles.
    ///
    /// # Errors
    ///
    /// The first stage error, unchanged, after it has been logged.
    pub async fn run(&self) -> Result<PipelineResult> {
        let mut tracker = StageTracker::default();
        match self.execute(&mut tracker).await {
            Ok(result) => Ok(result),
            Err(e) => {
                let failed_in = tracker.current();
                tracker.enter(Stage::Error);
                error!(stage = %failed_in, error = %e, "Pipeline run failed");
                Err(e)
            }
        }
    }

    async fn execute(&self, tracker: &mut StageTracker) -> Result<PipelineResult> {
        tracker.enter(Stage::Fetching);
        let articles = self.source.fetch_page(None).await?;

        if articles.is_empty() {
            tracker.enter(Stage::Empty);
            warn!("No articles returned; nothing to summarize");
            return Ok(PipelineResult::empty());
        }
        info!(count = articles.len(), "Fetched articles");

        tracker.enter(Stage::Summarizing);
        let text = self.summarizer.summarize(&articles).await?;

        tracker.enter(Stage::Storing);
        let summary = Summary::new(text);
        let outcome = self.store.store_run(&summary, &articles).await?;

        tracker.enter(Stage::Done);
        info!(
            summary_id = outcome.summary_id,
            articles = articles.len(),
            inserted = outcome.inserted_articles,
            "Pipeline run complete"
        );

        Ok(PipelineResult {
            summary: summary.text,
            articles,
        })
    }
}

/// Run the pipeline once with production wiring
///
/// Shorthand for `Pipeline::from_config(config).run()`.
pub async fn run_pipeline(config: &Config) -> Result<PipelineResult> {
    Pipeline::from_config(config).run().await
}

#[derive(Debug, Default)]
struct StageTracker {
    stage: Stage,
}

impl StageTracker {
    fn current(&self) -> Stage {
        self.stage
    }

    fn enter(&mut self, next: Stage) {
        debug_assert!(
            self.stage.can_transition_to(next),
            "illegal stage transition {} -> {}",
            self.stage,
            next
        );
        tracing::debug!(from = %self.stage, to = %next, "Pipeline stage");
        self.stage = next;
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, NetworkError, StorageError};
    use crate::types::{Article, StoreOutcome};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedSource {
        articles: Vec<Article>,
        fail: bool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ArticleSource for FixedSource {
        async fn fetch_page(&self, page: Option<u32>) -> Result<Vec<Article>> {
            assert_eq!(page, None, "a run requests a single default page");
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(Error::config("NEWS_API_KEY", "NEWS_API_KEY is not set"));
            }
            Ok(self.articles.clone())
        }
    }

    struct FixedSummarizer {
        text: Option<String>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Summarize for FixedSummarizer {
        async fn summarize(&self, articles: &[Article]) -> Result<String> {
            assert!(!articles.is_empty());
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.text.clone().ok_or_else(|| {
                Error::Network(NetworkError::Status {
                    status: 503,
                    url: "https://llm.example.com".to_string(),
                    body: String::new(),
                })
            })
        }
    }

    #[derive(Default)]
    struct RecordingStore {
        fail: bool,
        runs: Mutex<Vec<(String, Vec<String>)>>,
    }

    #[async_trait]
    impl RunStore for RecordingStore {
        async fn store_run(&self, summary: &Summary, articles: &[Article]) -> Result<StoreOutcome> {
            if self.fail {
                return Err(StorageError::MissingConnection.into());
            }
            let ids = articles.iter().map(|a| a.id.clone()).collect();
            let mut runs = self.runs.lock().unwrap();
            runs.push((summary.text.clone(), ids));
            Ok(StoreOutcome {
                summary_id: runs.len() as i64,
                inserted_articles: articles.len() as u64,
            })
        }
    }

    fn articles(ids: &[&str]) -> Vec<Article> {
        ids.iter()
            .map(|id| Article::from_raw(&json!({"uuid": id, "title": format!("t{id}")})))
            .collect()
    }

    fn source(articles: Vec<Article>) -> Arc<FixedSource> {
        Arc::new(FixedSource {
            articles,
            fail: false,
            calls: AtomicUsize::new(0),
        })
    }

    fn summarizer(text: Option<&str>) -> Arc<FixedSummarizer> {
        Arc::new(FixedSummarizer {
            text: text.map(str::to_string),
            calls: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn happy_path_stores_summary_with_articles() {
        let store = Arc::new(RecordingStore::default());
        let pipeline = Pipeline::new(
            source(articles(&["a", "b"])),
            summarizer(Some("S")),
            store.clone(),
        );

        let result = pipeline.run().await.unwrap();

        assert_eq!(result.summary, "S");
        let ids: Vec<_> = result.articles.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
        assert_eq!(
            *store.runs.lock().unwrap(),
            vec![("S".to_string(), vec!["a".to_string(), "b".to_string()])]
        );
    }

    #[tokio::test]
    async fn empty_fetch_skips_summarizer_and_store() {
        let src = source(Vec::new());
        let llm = summarizer(Some("unused"));
        let store = Arc::new(RecordingStore::default());
        let pipeline = Pipeline::new(src.clone(), llm.clone(), store.clone());

        let result = pipeline.run().await.unwrap();

        assert!(result.is_empty());
        assert_eq!(src.calls.load(Ordering::SeqCst), 1);
        assert_eq!(llm.calls.load(Ordering::SeqCst), 0);
        assert!(store.runs.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn fetch_failure_propagates() {
        let src = Arc::new(FixedSource {
            articles: Vec::new(),
            fail: true,
            calls: AtomicUsize::new(0),
        });
        let llm = summarizer(Some("unused"));
        let pipeline = Pipeline::new(src, llm.clone(), Arc::new(RecordingStore::default()));

        let err = pipeline.run().await.unwrap_err();

        assert!(matches!(err, Error::Config { .. }));
        assert_eq!(llm.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn summarizer_failure_persists_nothing() {
        let store = Arc::new(RecordingStore::default());
        let pipeline = Pipeline::new(source(articles(&["a"])), summarizer(None), store.clone());

        let err = pipeline.run().await.unwrap_err();

        assert!(matches!(
            err,
            Error::Network(NetworkError::Status { status: 503, .. })
        ));
        assert!(store.runs.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn storage_failure_propagates() {
        let store = Arc::new(RecordingStore {
            fail: true,
            ..RecordingStore::default()
        });
        let pipeline = Pipeline::new(source(articles(&["a"])), summarizer(Some("S")), store);

        let err = pipeline.run().await.unwrap_err();

        assert!(matches!(
            err,
            Error::Storage(StorageError::MissingConnection)
        ));
    }

    #[test]
    fn tracker_follows_legal_transitions() {
        let mut tracker = StageTracker::default();
        assert_eq!(tracker.current(), Stage::Idle);
        for next in [Stage::Fetching, Stage::Summarizing, Stage::Storing, Stage::Done] {
            tracker.enter(next);
            assert_eq!(tracker.current(), next);
        }
        assert!(tracker.current().is_terminal());
    }
}
