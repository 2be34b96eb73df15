//! Headline synthesis through Azure OpenAI chat completions

use crate::config::SummarizerConfig;
use crate::error::{Error, Result};
use crate::http::{HttpClient, HttpRequest};
use crate::types::Article;
use async_trait::async_trait;
use serde_json::{Value, json};

/// System role sent with every request
pub const SYSTEM_PROMPT: &str = "You are a market news analyst.";
/// Sampling temperature
pub const TEMPERATURE: f64 = 0.2;
/// Upper bound on generated tokens
pub const MAX_TOKENS: u32 = 600;

const INSTRUCTION: &str = "Summarize the main market-relevant themes across these headlines. \
Return 5-8 bullet points and a 1-sentence overall takeaway.";

/// Something that can turn an article batch into summary text
#[async_trait]
pub trait Summarize: Send + Sync {
    /// Produce the summary text for `articles`
    async fn summarize(&self, articles: &[Article]) -> Result<String>;
}

/// Build the user prompt: one `- title (source)` line per article, in input order
pub fn format_prompt(articles: &[Article]) -> String {
    let headlines = articles
        .iter()
        .map(|a| format!("- {} ({})", a.title, a.source))
        .collect::<Vec<_>>()
        .join("\n");
    format!("{INSTRUCTION}\n\nHeadlines:\n{headlines}")
}

/// Azure OpenAI summarizer
#[derive(Clone, Debug)]
pub struct Summarizer {
    http: HttpClient,
    config: SummarizerConfig,
}

impl Summarizer {
    /// Create a summarizer for the configured deployment
    pub fn new(http: HttpClient, config: SummarizerConfig) -> Self {
        Self { http, config }
    }

    /// Ask the deployment for a summary of `articles`
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if `endpoint`, `api_key` or `deployment` is empty, or the
    ///   endpoint is not a URL (no request is made)
    /// - [`Error::Network`] when the HTTP layer gives up
    /// - [`Error::ResponseShape`] if `choices[0].message.content` is missing
    pub async fn synthesize(
        &self,
        endpoint: &str,
        api_key: &str,
        deployment: &str,
        articles: &[Article],
        api_version: &str,
    ) -> Result<String> {
        if endpoint.is_empty() || api_key.is_empty() || deployment.is_empty() {
            return Err(Error::Config {
                message: "AZURE_OPENAI_ENDPOINT, AZURE_OPENAI_API_KEY, or AZURE_OPENAI_DEPLOYMENT is not set"
                    .to_string(),
                key: None,
            });
        }
        let url = completions_url(endpoint, deployment)?;

        let body = json!({
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": format_prompt(articles)},
            ],
            "temperature": TEMPERATURE,
            "max_tokens": MAX_TOKENS,
        });
        let request = HttpRequest::post(url)
            .param("api-version", api_version)
            .header("api-key", api_key)
            .json(body)
            .timeout(self.config.timeout);

        let response = self.http.send(&request).await?;
        let payload: Value = response.json()?;
        extract_content(&payload, &response.body)
    }
}

#[async_trait]
impl Summarize for Summarizer {
    async fn summarize(&self, articles: &[Article]) -> Result<String> {
        self.synthesize(
            &self.config.endpoint,
            &self.config.api_key,
            &self.config.deployment,
            articles,
            &self.config.api_version,
        )
        .await
    }
}

fn completions_url(endpoint: &str, deployment: &str) -> Result<String> {
    let base = endpoint.trim_end_matches('/');
    let url = format!("{base}/openai/deployments/{deployment}/chat/completions");
    url::Url::parse(&url).map_err(|e| {
        Error::config(
            "AZURE_OPENAI_ENDPOINT",
            format!("invalid endpoint {endpoint:?}: {e}"),
        )
    })?;
    Ok(url)
}

fn extract_content(payload: &Value, body: &str) -> Result<String> {
    match payload
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
    {
        Some(content) => Ok(content.trim().to_string()),
        None => {
            let err = Error::response_shape("missing choices[0].message.content", body);
            if let Error::ResponseShape { payload, .. } = &err {
                tracing::error!(%payload, "Unexpected chat completion response");
            }
            Err(err)
        }
    }
}
