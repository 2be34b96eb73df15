//! Bundled schema script.

use sqlx::{Executor, SqliteConnection};

use super::Database;

/// Schema for `news_summaries` and `news_articles`
///
/// Every statement is `IF NOT EXISTS`, so applying it to an initialized database is a
/// no-op.
pub const SCHEMA_SQL: &str = include_str!("../../migrations/001_create_tables.sql");

impl Database {
    /// Apply [`SCHEMA_SQL`] on `conn`
    ///
    /// Executed unprepared as one opaque multi-statement script. Called inside the storage
    /// transaction so a failed attempt also discards schema changes.
    pub(crate) async fn apply_schema(conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        tracing::info!("Applying database schema");
        Executor::execute(&mut *conn, SCHEMA_SQL).await?;
        Ok(())
    }
}
