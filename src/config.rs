use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::AppError;
use crate::models::center::CenterMatching;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format: {other}, expected compact/json")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub event_buffer_size: usize,
    pub refund_timeout: Duration,
    pub notify_timeout: Duration,
    pub center_matching: CenterMatching,
    pub requeue_failed_assignments: bool,
    pub default_page_size: usize,
    pub max_page_size: usize,
    pub seed_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_port: 3000,
            log_level: "info".to_string(),
            log_format: LogFormat::Compact,
            event_buffer_size: 1024,
            refund_timeout: Duration::from_millis(5_000),
            notify_timeout: Duration::from_millis(2_000),
            center_matching: CenterMatching::Tolerant,
            requeue_failed_assignments: false,
            default_page_size: 20,
            max_page_size: 100,
            seed_file: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();
        let defaults = Self::default();

        let config = Self {
            http_port: parse_or_default("HTTP_PORT", defaults.http_port)?,
            log_level: env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_format: parse_or_default("LOG_FORMAT", defaults.log_format)?,
            event_buffer_size: parse_or_default("EVENT_BUFFER_SIZE", defaults.event_buffer_size)?,
            refund_timeout: Duration::from_millis(parse_or_default("REFUND_TIMEOUT_MS", 5_000)?),
            notify_timeout: Duration::from_millis(parse_or_default("NOTIFY_TIMEOUT_MS", 2_000)?),
            center_matching: parse_or_default("CENTER_MATCHING", defaults.center_matching)?,
            requeue_failed_assignments: parse_or_default(
                "REQUEUE_FAILED_ASSIGNMENTS",
                defaults.requeue_failed_assignments,
            )?,
            default_page_size: parse_or_default("DEFAULT_PAGE_SIZE", defaults.default_page_size)?,
            max_page_size: parse_or_default("MAX_PAGE_SIZE", defaults.max_page_size)?,
            seed_file: env::var("SEED_FILE").ok().map(PathBuf::from),
        };

        if config.event_buffer_size == 0 {
            return Err(AppError::Internal("EVENT_BUFFER_SIZE must be > 0".to_string()));
        }
        if config.max_page_size == 0 || config.default_page_size > config.max_page_size {
            return Err(AppError::Internal(
                "page sizes must satisfy 0 < DEFAULT_PAGE_SIZE <= MAX_PAGE_SIZE".to_string(),
            ));
        }

        Ok(config)
    }

    /// Resolves a requested page size against the configured default and cap.
    pub fn page_size(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_page_size)
            .clamp(1, self.max_page_size)
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::{Config, LogFormat};

    #[test]
    fn page_size_is_clamped() {
        let config = Config::default();
        assert_eq!(config.page_size(None), 20);
        assert_eq!(config.page_size(Some(0)), 1);
        assert_eq!(config.page_size(Some(500)), 100);
    }

    #[test]
    fn log_format_parses() {
        assert_eq!("JSON".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert!("xml".parse::<LogFormat>().is_err());
    }
}
