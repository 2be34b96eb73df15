//! # newsbrief CLI
//!
//! | Command | Description |
//! |---------|-------------|
//! | `newsbrief run` | One full pipeline run (fetch, summarize, store) |
//! | `newsbrief fetch` | Fetch articles only and print them as JSON |
//!
//! Configuration comes from the environment; a `.env` file in the working directory is
//! loaded first when present. Log verbosity follows `RUST_LOG` (default `info`).

use clap::{Parser, Subcommand};
use newsbrief::config::DEFAULT_CATEGORIES;
use newsbrief::{Article, Config, HttpClient, NewsFetcher, PipelineResult, Result, run_pipeline};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Daily news digest: fetch, summarize, store.
#[derive(Parser)]
#[command(name = "newsbrief", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline once.
    Run,

    /// Fetch articles without summarizing or storing them.
    Fetch {
        /// Comma-separated news categories.
        #[arg(long, default_value = DEFAULT_CATEGORIES)]
        categories: String,

        /// Articles per page.
        #[arg(long, default_value_t = 3)]
        limit: u32,

        /// Number of pages to fetch, starting at page 1.
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        pages: u32,

        /// Write the JSON to this file instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

/// Fields printed by `fetch`; the raw upstream document is left out.
#[derive(Serialize)]
struct ArticleView<'a> {
    id: &'a str,
    title: &'a str,
    description: &'a str,
    url: &'a str,
    published_at: &'a str,
    source: &'a str,
}

impl<'a> From<&'a Article> for ArticleView<'a> {
    fn from(article: &'a Article) -> Self {
        Self {
            id: &article.id,
            title: &article.title,
            description: &article.description,
            url: &article.url,
            published_at: &article.published_at,
            source: &article.source,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match execute(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "newsbrief failed");
            ExitCode::FAILURE
        }
    }
}

async fn execute(command: Commands) -> Result<()> {
    let config = Config::from_env()?;
    match command {
        Commands::Run => {
            let result = run_pipeline(&config).await?;
            info!(articles = result.articles.len(), "Pipeline run succeeded");
            println!("{}", run_report(&result));
            Ok(())
        }
        Commands::Fetch {
            categories,
            limit,
            pages,
            out,
        } => fetch(config, categories, limit, pages, out.as_deref()).await,
    }
}

/// Stdout report for `run`: the article count, then the summary
fn run_report(result: &PipelineResult) -> String {
    if result.is_empty() {
        return "No news available (0 articles)".to_string();
    }
    format!("Articles: {}\n\n{}", result.articles.len(), result.summary)
}

async fn fetch(
    mut config: Config,
    categories: String,
    limit: u32,
    pages: u32,
    out: Option<&Path>,
) -> Result<()> {
    config.news.categories = categories;
    config.news.limit = limit;

    let fetcher = NewsFetcher::new(HttpClient::new(config.http_retry.clone()), config.news);
    let articles = fetcher.fetch_pages(pages).await?;

    let views: Vec<ArticleView<'_>> = articles.iter().map(ArticleView::from).collect();
    let json = serde_json::to_string_pretty(&views)?;

    match out {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(path, json).await?;
            info!(count = articles.len(), path = %path.display(), "Saved articles");
        }
        None => println!("{json}"),
    }
    Ok(())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn run_report_leads_with_article_count() {
        let result = PipelineResult {
            summary: "- rates hold\n- oil slips".to_string(),
            articles: vec![
                Article::from_raw(&json!({"uuid": "a"})),
                Article::from_raw(&json!({"uuid": "b"})),
            ],
        };
        assert_eq!(
            run_report(&result),
            "Articles: 2\n\n- rates hold\n- oil slips"
        );
    }

    #[test]
    fn run_report_for_empty_run() {
        assert_eq!(
            run_report(&PipelineResult::empty()),
            "No news available (0 articles)"
        );
    }

    #[test]
    fn fetch_view_omits_raw_document() {
        let article = Article::from_raw(&json!({"uuid": "a", "title": "T", "extra": 1}));
        let value = serde_json::to_value(ArticleView::from(&article)).unwrap();
        assert_eq!(value["id"], "a");
        assert_eq!(value["title"], "T");
        assert!(value.get("raw").is_none());
        assert!(value.get("extra").is_none());
    }
}
