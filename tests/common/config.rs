//! Test configuration pointing every stage at local mocks

use newsbrief::Config;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::MockServer;

use super::fixtures::{DEPLOYMENT, NEWS_PATH};

/// SQLite connection string for a fresh database file inside `dir`
pub fn database_url(dir: &TempDir) -> String {
    format!("sqlite://{}?mode=rwc", dir.path().join("news.db").display())
}

/// Environment-style variables for a run against `server` and a database in `dir`
pub fn test_vars(server: &MockServer, dir: &TempDir) -> Vec<(String, String)> {
    [
        ("NEWS_API_KEY", "news-token".to_string()),
        ("NEWS_API_BASE_URL", format!("{}{NEWS_PATH}", server.uri())),
        ("AZURE_OPENAI_ENDPOINT", server.uri()),
        ("AZURE_OPENAI_API_KEY", "llm-key".to_string()),
        ("AZURE_OPENAI_DEPLOYMENT", DEPLOYMENT.to_string()),
        ("DATABASE_URL", database_url(dir)),
        ("DATABASE_INIT_SCHEMA", "true".to_string()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

/// Build a [`Config`] from `vars` with retry delays shrunk for tests
pub fn fast_config(vars: Vec<(String, String)>) -> Config {
    let mut config = Config::from_vars(vars).unwrap();
    for retry in [&mut config.http_retry, &mut config.storage.retry] {
        retry.initial_delay = Duration::from_millis(5);
        retry.max_delay = Duration::from_millis(20);
    }
    config
}
