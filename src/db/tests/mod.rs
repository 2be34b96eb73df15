use crate::config::{RetryConfig, StorageConfig};
use crate::types::{Article, Summary};
use sqlx::{Connection, SqliteConnection};
use std::time::Duration;
use tempfile::TempDir;


/// A fresh database file inside `dir`, created on first connect
pub(super) fn database_url(dir: &TempDir) -> String {
    format!("sqlite://{}?mode=rwc", dir.path().join("news.db").display())
}

pub(super) fn fast_retry(max_attempts: u32) -> RetryConfig {
    RetryConfig {
        max_attempts,
        initial_delay: Duration::from_millis(5),
        max_delay: Duration::from_millis(20),
        backoff_multiplier: 2.0,
        jitter: false,
    }
}

pub(super) fn storage_config(url: &str, init_schema: bool, max_attempts: u32) -> StorageConfig {
    StorageConfig {
        database_url: url.to_string(),
        init_schema,
        retry: fast_retry(max_attempts),
    }
}

pub(super) fn article(id: &str, published_at: &str) -> Article {
    Article::from_raw(&serde_json::json!({
        "uuid": id,
        "title": format!("Headline {id}"),
        "url": format!("https://news.example.com/{id}"),
        "source": "news.example.com",
        "published_at": published_at,
    }))
}

pub(super) fn summary(text: &str) -> Summary {
    Summary::new(text)
}

pub(super) async fn count_rows(url: &str, table: &str) -> i64 {
    let mut conn = SqliteConnection::connect(url).await.unwrap();
    let count = sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(&mut conn)
        .await
        .unwrap();
    conn.close().await.unwrap();
    count
}
