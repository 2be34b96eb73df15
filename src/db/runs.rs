//! Persisting one pipeline run.

use crate::error::{Result, StorageError};
use crate::retry::retry_with_backoff;
use crate::types::{Article, StoreOutcome, Summary};
use sqlx::{Connection, SqliteConnection};

use super::Database;

type AttemptResult<T> = std::result::Result<T, StorageError>;

impl Database {
    /// Persist a summary and its articles atomically
    ///
    /// Each attempt opens a fresh connection, runs one transaction (schema first when
    /// `init_schema` is set), and closes the connection whatever the outcome. A failed
    /// attempt leaves nothing behind, so the retry can never produce a second summary
    /// row. Articles whose id is already stored are skipped and keep their original
    /// `summary_id`.
    ///
    /// # Errors
    ///
    /// - [`StorageError::MissingConnection`] if `conn_str` is empty (no attempt is made)
    /// - [`StorageError::Database`] with the last driver error once the retry budget
    ///   in [`StorageConfig::retry`](crate::config::StorageConfig::retry) is spent
    pub async fn store(
        &self,
        conn_str: &str,
        summary: &Summary,
        articles: &[Article],
        init_schema: bool,
    ) -> Result<StoreOutcome> {
        if conn_str.is_empty() {
            return Err(StorageError::MissingConnection.into());
        }

        let outcome = retry_with_backoff(&self.config.retry, "store run", || {
            Self::store_attempt(conn_str, summary, articles, init_schema)
        })
        .await?;

        tracing::info!(
            summary_id = outcome.summary_id,
            articles = articles.len(),
            inserted = outcome.inserted_articles,
            "Stored pipeline run"
        );
        Ok(outcome)
    }

    /// One storage attempt on its own connection
    pub(crate) async fn store_attempt(
        conn_str: &str,
        summary: &Summary,
        articles: &[Article],
        init_schema: bool,
    ) -> AttemptResult<StoreOutcome> {
        let mut conn = SqliteConnection::connect(conn_str).await?;
        let result = Self::write_run(&mut conn, summary, articles, init_schema).await;

        if let Err(e) = conn.close().await {
            tracing::warn!(error = %e, "Failed to close database connection");
        }
        result
    }

    async fn write_run(
        conn: &mut SqliteConnection,
        summary: &Summary,
        articles: &[Article],
        init_schema: bool,
    ) -> AttemptResult<StoreOutcome> {
        // Dropping the transaction on an early return rolls it back
        let mut tx = conn.begin().await?;

        if init_schema {
            Self::apply_schema(&mut *tx).await?;
        }

        let summary_id = Self::insert_summary(&mut *tx, &summary.text).await?;

        let mut inserted_articles = 0;
        for article in articles {
            inserted_articles += Self::insert_article(&mut *tx, summary_id, article).await?;
        }

        tx.commit().await?;

        Ok(StoreOutcome {
            summary_id,
            inserted_articles,
        })
    }

    /// Insert the summary row and return its generated id
    pub(crate) async fn insert_summary(
        conn: &mut SqliteConnection,
        text: &str,
    ) -> AttemptResult<i64> {
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO news_summaries (summary) VALUES (?) RETURNING id",
        )
        .bind(text)
        .fetch_one(&mut *conn)
        .await?;
        Ok(id)
    }

    /// Insert one article unless its id is already stored; returns rows written (0 or 1)
    pub(crate) async fn insert_article(
        conn: &mut SqliteConnection,
        summary_id: i64,
        article: &Article,
    ) -> AttemptResult<u64> {
        let raw = serde_json::to_string(&article.raw).map_err(|source| StorageError::Encode {
            id: article.id.clone(),
            source,
        })?;

        let result = sqlx::query(
            r#"
            INSERT INTO news_articles (id, summary_id, title, url, source, published_at, raw)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(&article.id)
        .bind(summary_id)
        .bind(&article.title)
        .bind(&article.url)
        .bind(&article.source)
        .bind(article.published_at_opt())
        .bind(raw)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected())
    }
}
