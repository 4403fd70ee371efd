use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

/// Worker configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub engine_url: String,
    pub engine_api_key: String,
    pub discovery_concurrency: usize,
    pub analysis_concurrency: usize,
    pub maintenance_concurrency: usize,
    pub poll_interval: Duration,
    pub audit_retention_days: i64,
    pub scheduler_enabled: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            engine_url: env::var("ENGINE_URL")
                .unwrap_or_else(|_| "http://localhost:8000".to_string()),
            engine_api_key: env::var("ENGINE_API_KEY").context("ENGINE_API_KEY must be set")?,
            discovery_concurrency: parse_var("DISCOVERY_CONCURRENCY", 2)?,
            analysis_concurrency: parse_var("ANALYSIS_CONCURRENCY", 1)?,
            maintenance_concurrency: parse_var("MAINTENANCE_CONCURRENCY", 4)?,
            poll_interval: Duration::from_millis(parse_var("WORKER_POLL_INTERVAL_MS", 1000)?),
            audit_retention_days: parse_var("AUDIT_RETENTION_DAYS", 90)?,
            scheduler_enabled: parse_var("SCHEDULER_ENABLED", true)?,
        })
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{name} must be a valid value, got {raw:?}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_var_uses_default_when_unset() {
        let value: usize = parse_var("WORKER_TEST_UNSET_VARIABLE", 7).unwrap();
        assert_eq!(value, 7);
    }

    #[test]
    fn test_parse_var_reports_bad_values() {
        env::set_var("WORKER_TEST_BAD_CONCURRENCY", "lots");
        let err = parse_var::<usize>("WORKER_TEST_BAD_CONCURRENCY", 1).unwrap_err();
        assert!(err.to_string().contains("WORKER_TEST_BAD_CONCURRENCY"));
        env::remove_var("WORKER_TEST_BAD_CONCURRENCY");
    }
}
