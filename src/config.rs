//! Configuration types for newsbrief
//!
//! [`Config`] is built once at process start, usually by [`Config::from_env`], and
//! handed to the pipeline by reference. Components never read the environment.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

/// Default news API endpoint
pub const NEWS_API_BASE_URL: &str = "https://api.thenewsapi.com/v1/news/all";
/// Default news categories
pub const DEFAULT_CATEGORIES: &str = "business,tech";
/// Default number of articles requested per run
pub const DEFAULT_LIMIT: u32 = 50;
/// Default Azure OpenAI API version
pub const DEFAULT_API_VERSION: &str = "2024-02-15-preview";

/// Retry behavior for one component
///
/// The delay before attempt `k + 1` is `initial_delay * backoff_multiplier^(k - 1)`,
/// capped at `max_delay`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total number of attempts, including the first one (default: 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay after the first failed attempt (default: 800 milliseconds)
    #[serde(default = "default_initial_delay", with = "duration_ms_serde")]
    pub initial_delay: Duration,

    /// Maximum delay between attempts (default: 60 seconds)
    #[serde(default = "default_max_delay", with = "duration_ms_serde")]
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: false)
    #[serde(default)]
    pub jitter: bool,
}

impl RetryConfig {
    /// Policy used by the HTTP client: 3 attempts, 800ms base delay
    pub fn http() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: false,
        }
    }

    /// Policy used by the persistence layer: 3 attempts, 2s base delay
    pub fn storage() -> Self {
        Self {
            initial_delay: Duration::from_secs(2),
            ..Self::http()
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::http()
    }
}

/// News API settings
#[derive(Clone, Serialize, Deserialize)]
pub struct NewsConfig {
    /// API token (required to fetch)
    #[serde(default)]
    pub api_key: String,

    /// Comma-separated categories (default: "business,tech")
    #[serde(default = "default_categories")]
    pub categories: String,

    /// Number of articles to request (default: 50)
    #[serde(default = "default_limit")]
    pub limit: u32,

    /// Endpoint queried for articles
    #[serde(default = "default_news_base_url")]
    pub base_url: String,

    /// Per-request timeout (default: 30 seconds)
    #[serde(default = "default_news_timeout", with = "duration_ms_serde")]
    pub timeout: Duration,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            categories: default_categories(),
            limit: default_limit(),
            base_url: default_news_base_url(),
            timeout: default_news_timeout(),
        }
    }
}

impl fmt::Debug for NewsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewsConfig")
            .field("api_key", &redact(&self.api_key))
            .field("categories", &self.categories)
            .field("limit", &self.limit)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Azure OpenAI chat completion settings
#[derive(Clone, Serialize, Deserialize)]
pub struct SummarizerConfig {
    /// Resource endpoint, e.g. `https://my-resource.openai.azure.com`
    #[serde(default)]
    pub endpoint: String,

    /// API key sent in the `api-key` header
    #[serde(default)]
    pub api_key: String,

    /// Deployment name
    #[serde(default)]
    pub deployment: String,

    /// `api-version` query parameter (default: "2024-02-15-preview")
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Per-request timeout (default: 60 seconds)
    #[serde(default = "default_summarizer_timeout", with = "duration_ms_serde")]
    pub timeout: Duration,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: String::new(),
            deployment: String::new(),
            api_version: default_api_version(),
            timeout: default_summarizer_timeout(),
        }
    }
}

impl fmt::Debug for SummarizerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SummarizerConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &redact(&self.api_key))
            .field("deployment", &self.deployment)
            .field("api_version", &self.api_version)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Database settings
#[derive(Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// sqlx connection string, e.g. `sqlite://newsbrief.db?mode=rwc`
    #[serde(default)]
    pub database_url: String,

    /// Apply the bundled schema script before writing (default: false)
    #[serde(default)]
    pub init_schema: bool,

    /// Retry policy for whole storage attempts
    #[serde(default = "RetryConfig::storage")]
    pub retry: RetryConfig,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            init_schema: false,
            retry: RetryConfig::storage(),
        }
    }
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Connection strings may embed credentials
        f.debug_struct("StorageConfig")
            .field("database_url", &redact(&self.database_url))
            .field("init_schema", &self.init_schema)
            .field("retry", &self.retry)
            .finish()
    }
}

/// Top-level pipeline configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// News API settings
    #[serde(default)]
    pub news: NewsConfig,

    /// Language model settings
    #[serde(default)]
    pub summarizer: SummarizerConfig,

    /// Database settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// Retry policy shared by every outbound HTTP call
    #[serde(default = "RetryConfig::http")]
    pub http_retry: RetryConfig,
}

impl Config {
    /// Build configuration from the process environment
    ///
    /// Secrets that are absent are left empty; the component that needs them reports
    /// [`Error::Config`] when invoked. Unparsable numbers fail here.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(std::env::vars())
    }

    /// Build configuration from arbitrary key/value pairs
    ///
    /// Recognized keys:
    /// - `NEWS_API_KEY`, `NEWS_API_CATEGORIES`, `NEWS_API_LIMIT`, `NEWS_API_BASE_URL`
    /// - `AZURE_OPENAI_ENDPOINT`, `AZURE_OPENAI_API_KEY`, `AZURE_OPENAI_DEPLOYMENT`,
    ///   `AZURE_OPENAI_API_VERSION`
    /// - `DATABASE_URL`, `DATABASE_INIT_SCHEMA`
    /// - `HTTP_MAX_ATTEMPTS`, `DB_MAX_ATTEMPTS`
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        let get = |key: &str| vars.get(key).cloned().unwrap_or_default();
        let get_or = |key: &str, default: String| {
            vars.get(key)
                .filter(|v| !v.is_empty())
                .cloned()
                .unwrap_or(default)
        };

        let mut config = Config::default();

        config.news.api_key = get("NEWS_API_KEY");
        config.news.categories = get_or("NEWS_API_CATEGORIES", default_categories());
        config.news.base_url = get_or("NEWS_API_BASE_URL", default_news_base_url());
        if let Some(limit) = parse_number::<u32>(&vars, "NEWS_API_LIMIT")? {
            config.news.limit = limit;
        }

        config.summarizer.endpoint = get("AZURE_OPENAI_ENDPOINT");
        config.summarizer.api_key = get("AZURE_OPENAI_API_KEY");
        config.summarizer.deployment = get("AZURE_OPENAI_DEPLOYMENT");
        config.summarizer.api_version = get_or("AZURE_OPENAI_API_VERSION", default_api_version());

        config.storage.database_url = get("DATABASE_URL");
        config.storage.init_schema = vars
            .get("DATABASE_INIT_SCHEMA")
            .map(|v| parse_flag(v))
            .unwrap_or(false);

        if let Some(attempts) = parse_number::<u32>(&vars, "HTTP_MAX_ATTEMPTS")? {
            config.http_retry.max_attempts = attempts;
        }
        if let Some(attempts) = parse_number::<u32>(&vars, "DB_MAX_ATTEMPTS")? {
            config.storage.retry.max_attempts = attempts;
        }

        Ok(config)
    }
}

/// `1`, `true` and `yes` (any case) enable a flag; anything else disables it
pub fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes"
    )
}

fn parse_number<T: std::str::FromStr>(
    vars: &HashMap<String, String>,
    key: &str,
) -> Result<Option<T>> {
    match vars.get(key).map(|v| v.trim()).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| Error::config(key, format!("{key} must be a number, got {raw:?}"))),
    }
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() {
        "<unset>"
    } else {
        "<redacted>"
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay() -> Duration {
    Duration::from_millis(800)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(60)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_categories() -> String {
    DEFAULT_CATEGORIES.to_string()
}

fn default_limit() -> u32 {
    DEFAULT_LIMIT
}

fn default_news_base_url() -> String {
    NEWS_API_BASE_URL.to_string()
}

fn default_news_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_summarizer_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

// Durations are written as integer milliseconds
mod duration_ms_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
