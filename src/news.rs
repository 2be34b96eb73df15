//! News fetching from thenewsapi.com
//!
//! [`NewsFetcher::fetch`] issues one page request for today's English-language
//! articles and converts each item of the `data` array with [`Article::from_raw`].

use crate::config::NewsConfig;
use crate::error::{Error, Result};
use crate::http::{HttpClient, HttpRequest};
use crate::types::Article;
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

/// Locale preference sent with every query
pub const LOCALES: &str = "us,ca,au,gb,cn,de,fr,it,jp";

/// Something that can produce the article batch for a run
#[async_trait]
pub trait ArticleSource: Send + Sync {
    /// Fetch one page of articles (`None` lets the upstream pick its first page)
    async fn fetch_page(&self, page: Option<u32>) -> Result<Vec<Article>>;
}

/// News API client
#[derive(Clone, Debug)]
pub struct NewsFetcher {
    http: HttpClient,
    config: NewsConfig,
}

impl NewsFetcher {
    /// Create a fetcher for the configured endpoint
    pub fn new(http: HttpClient, config: NewsConfig) -> Self {
        Self { http, config }
    }

    /// Fetch one page of today's articles
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if `api_key` is empty (no request is made)
    /// - [`Error::Network`] when the HTTP layer gives up
    /// - [`Error::ResponseShape`] if the body is not JSON or `data` is not an array
    pub async fn fetch(
        &self,
        api_key: &str,
        categories: &str,
        limit: u32,
        page: Option<u32>,
    ) -> Result<Vec<Article>> {
        if api_key.is_empty() {
            return Err(Error::config("NEWS_API_KEY", "NEWS_API_KEY is not set"));
        }

        let published_on = chrono::Local::now().format("%Y-%m-%d").to_string();

        let mut request = HttpRequest::get(&self.config.base_url)
            .param("api_token", api_key)
            .param("categories", categories)
            .param("limit", limit)
            .param("language", "en")
            .param("published_on", &published_on)
            .param("locale", LOCALES)
            .timeout(self.config.timeout);
        if let Some(page) = page {
            request = request.param("page", page);
        }

        debug!(categories, limit, ?page, %published_on, "Requesting news page");
        let response = self.http.send(&request).await?;
        let payload: Value = response.json()?;
        let articles = parse_articles(&payload, &response.body)?;

        let missing_ids = articles.iter().filter(|a| a.id.is_empty()).count();
        if missing_ids > 0 {
            warn!(count = missing_ids, "Articles without an upstream identifier");
        }

        Ok(articles)
    }

    /// Fetch pages `1..=pages` one after another and concatenate them in page order
    ///
    /// No deduplication across pages. Intended for ad-hoc inspection; a pipeline run
    /// only ever requests a single page.
    pub async fn fetch_pages(&self, pages: u32) -> Result<Vec<Article>> {
        let mut all = Vec::new();
        for page in 1..=pages {
            let batch = self
                .fetch(
                    &self.config.api_key,
                    &self.config.categories,
                    self.config.limit,
                    Some(page),
                )
                .await?;
            info!(page, count = batch.len(), "Fetched news page");
            all.extend(batch);
        }
        Ok(all)
    }
}

#[async_trait]
impl ArticleSource for NewsFetcher {
    async fn fetch_page(&self, page: Option<u32>) -> Result<Vec<Article>> {
        self.fetch(
            &self.config.api_key,
            &self.config.categories,
            self.config.limit,
            page,
        )
        .await
    }
}

fn parse_articles(payload: &Value, body: &str) -> Result<Vec<Article>> {
    match payload.get("data") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items.iter().map(Article::from_raw).collect()),
        Some(_) => Err(Error::response_shape("`data` is not an array", body)),
    }
}
