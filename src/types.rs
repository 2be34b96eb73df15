//! Core records carried through the pipeline

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// One normalized news item
///
/// Created by the news fetcher from an upstream item and never modified afterwards.
/// `id` is the natural key used to deduplicate articles at storage time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Article {
    /// Upstream identifier (`uuid`, falling back to `id`)
    pub id: String,
    /// Headline
    pub title: String,
    /// Short description or lede
    pub description: String,
    /// Canonical article URL
    pub url: String,
    /// ISO-8601 publication timestamp, empty when unknown
    pub published_at: String,
    /// Publisher
    pub source: String,
    /// The full upstream item, kept for storage
    pub raw: Value,
}

impl Article {
    /// Convert one upstream item into an [`Article`]
    ///
    /// This is the only place that deals with absent or null upstream fields: missing
    /// strings become empty, numeric identifiers are stringified.
    pub fn from_raw(item: &Value) -> Self {
        let id = [item.get("uuid"), item.get("id")]
            .into_iter()
            .flatten()
            .map(scalar_to_string)
            .find(|s| !s.is_empty())
            .unwrap_or_default();

        Self {
            id,
            title: string_field(item, "title"),
            description: string_field(item, "description"),
            url: string_field(item, "url"),
            published_at: string_field(item, "published_at"),
            source: string_field(item, "source"),
            raw: item.clone(),
        }
    }

    /// Published timestamp for storage: `None` when the upstream left it empty
    pub fn published_at_opt(&self) -> Option<&str> {
        Some(self.published_at.as_str()).filter(|s| !s.is_empty())
    }
}

fn string_field(item: &Value, key: &str) -> String {
    item.get(key).map(scalar_to_string).unwrap_or_default()
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

/// Language-model synthesis of one run's article batch
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// Generated text, trimmed
    pub text: String,
}

impl Summary {
    /// Wrap generated text
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// What a successful storage attempt committed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct StoreOutcome {
    /// Surrogate id assigned to the summary row
    pub summary_id: i64,
    /// Article rows actually inserted (ids already present are skipped)
    pub inserted_articles: u64,
}

/// Externally observable outcome of one pipeline run
///
/// An empty summary together with no articles means "no news available", which is a
/// successful run.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PipelineResult {
    /// Generated summary text
    pub summary: String,
    /// Articles in upstream order
    pub articles: Vec<Article>,
}

impl PipelineResult {
    /// The "no news available" result
    pub fn empty() -> Self {
        Self::default()
    }

    /// True for the "no news available" result
    pub fn is_empty(&self) -> bool {
        self.summary.is_empty() && self.articles.is_empty()
    }
}

/// Pipeline state machine
///
/// `Idle → Fetching → (Empty | Summarizing) → Storing → Done`, with `Error` reachable
/// from every working stage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Not started
    #[default]
    Idle,
    /// Requesting articles from the news source
    Fetching,
    /// The news source returned nothing; terminal, successful
    Empty,
    /// Waiting for the language model
    Summarizing,
    /// Writing the run to the database
    Storing,
    /// Terminal, successful
    Done,
    /// Terminal, failed
    Error,
}

impl Stage {
    /// Whether `next` is a legal successor of `self`
    pub fn can_transition_to(self, next: Stage) -> bool {
        use Stage::*;
        matches!(
            (self, next),
            (Idle, Fetching)
                | (Fetching, Empty)
                | (Fetching, Summarizing)
                | (Summarizing, Storing)
                | (Storing, Done)
                | (Fetching | Summarizing | Storing, Error)
        )
    }

    /// Terminal stages end a run
    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Empty | Stage::Done | Stage::Error)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Idle => "idle",
            Stage::Fetching => "fetching",
            Stage::Empty => "empty",
            Stage::Summarizing => "summarizing",
            Stage::Storing => "storing",
            Stage::Done => "done",
            Stage::Error => "error",
        };
        f.write_str(name)
    }
}
