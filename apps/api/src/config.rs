use std::time::Duration;

use anyhow::{Context, Result};

use crate::extraction::PollSettings;

pub const DEFAULT_WHISPERER_BASE_URL: &str =
    "https://llmwhisperer-api.us-central.unstract.com/api/v2";
pub const DEFAULT_OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_RESUME_TEXT_LIMIT: usize = 3000;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
///
/// The two third-party API keys are optional so the service can boot (and report
/// them as missing on `/api/health`) before they are provisioned.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub llmwhisperer_api_key: Option<String>,
    pub llmwhisperer_base_url: String,
    pub openrouter_api_key: Option<String>,
    pub openrouter_base_url: String,
    pub resume_text_limit: usize,
    pub poll_interval_secs: u64,
    pub poll_max_attempts: u32,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            s3_bucket: require_env("S3_BUCKET")?,
            s3_endpoint: require_env("S3_ENDPOINT")?,
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            llmwhisperer_api_key: optional_env("LLMWHISPERER_API_KEY"),
            llmwhisperer_base_url: optional_env("LLMWHISPERER_BASE_URL")
                .unwrap_or_else(|| DEFAULT_WHISPERER_BASE_URL.to_string()),
            openrouter_api_key: optional_env("OPENROUTER_API_KEY"),
            openrouter_base_url: optional_env("OPENROUTER_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENROUTER_BASE_URL.to_string()),
            resume_text_limit: parse_env("RESUME_TEXT_LIMIT", DEFAULT_RESUME_TEXT_LIMIT)?,
            poll_interval_secs: parse_env("EXTRACTION_POLL_INTERVAL_SECS", 3)?,
            poll_max_attempts: parse_env("EXTRACTION_MAX_ATTEMPTS", 40)?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Polling schedule for the extraction service. The initial delay matches the interval.
    pub fn poll_settings(&self) -> PollSettings {
        let interval = Duration::from_secs(self.poll_interval_secs);
        PollSettings {
            initial_delay: interval,
            interval,
            max_attempts: self.poll_max_attempts,
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Empty values are treated as unset.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Config {
        Config {
            database_url: "postgres://localhost/recruiter".to_string(),
            s3_bucket: "resumes".to_string(),
            s3_endpoint: "http://localhost:9000".to_string(),
            aws_access_key_id: "minio".to_string(),
            aws_secret_access_key: "minio123".to_string(),
            llmwhisperer_api_key: None,
            llmwhisperer_base_url: DEFAULT_WHISPERER_BASE_URL.to_string(),
            openrouter_api_key: None,
            openrouter_base_url: DEFAULT_OPENROUTER_BASE_URL.to_string(),
            resume_text_limit: DEFAULT_RESUME_TEXT_LIMIT,
            poll_interval_secs: 3,
            poll_max_attempts: 40,
            port: 8080,
            rust_log: "info".to_string(),
        }
    }

    #[test]
    fn test_poll_settings_use_interval_for_initial_delay() {
        let settings = sample().poll_settings();
        assert_eq!(settings.initial_delay, Duration::from_secs(3));
        assert_eq!(settings.interval, Duration::from_secs(3));
        assert_eq!(settings.max_attempts, 40);
    }

    #[test]
    fn test_parse_env_falls_back_to_default() {
        let value: usize = parse_env("RECRUITER_TEST_UNSET_VARIABLE", 3000).unwrap();
        assert_eq!(value, 3000);
    }
}
