//! Configuration management for the cadence poster
//!
//! This module handles loading and validating configuration from environment
//! variables and TOML files. Configuration is read once at startup and treated
//! as immutable for the process lifetime.

use anyhow::{Context, Result};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::content::SourceSpec;
use crate::utils::RetryConfig;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Slot planning configuration
    pub schedule: ScheduleConfig,

    /// Posting endpoint and per-post metadata
    pub poster: PosterConfig,

    /// Content source configuration
    pub content: ContentConfig,

    /// Delivery retry configuration
    pub retry: RetrySettings,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Notification configuration
    pub notify: NotifyConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Slot planning configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Fixed daily post time in local HH:MM
    pub fixed_time: String,

    /// Number of randomly distributed posts per day
    pub random_posts_per_day: usize,

    /// Minimum minutes between random posts
    pub min_interval_minutes: u32,

    /// Maximum minutes between random posts
    pub max_interval_minutes: u32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            fixed_time: String::from("12:00"),
            random_posts_per_day: 5,
            min_interval_minutes: 30,
            max_interval_minutes: 240,
        }
    }
}

/// Posting endpoint and fixed per-post metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PosterConfig {
    /// Posting API endpoint URL
    pub endpoint: String,

    /// API key sent in the `x-api-key` header
    pub api_key: String,

    /// Posting user id
    pub user_id: u32,

    /// Post category id
    pub category_id: u32,

    /// State/region field
    pub state: String,

    /// City field
    pub city: String,

    /// Device tag
    pub device: String,

    /// ISO country codes the post targets
    pub countries_iso: Vec<String>,

    /// Request timeout in seconds for delivery calls
    pub request_timeout_secs: u64,
}

impl Default for PosterConfig {
    fn default() -> Self {
        Self {
            endpoint: String::from("http://localhost:8080/posts"),
            api_key: String::new(),
            user_id: 1,
            category_id: 1,
            state: String::from("California"),
            city: String::from("San Francisco"),
            device: format!("cadence/{}", env!("CARGO_PKG_VERSION")),
            countries_iso: vec![String::from("US")],
            request_timeout_secs: 30,
        }
    }
}

/// Content source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    /// Per-source fetch timeout in seconds
    pub source_timeout_secs: u64,

    /// Ordered source catalog, tried first to last
    pub sources: Vec<SourceSpec>,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            source_timeout_secs: 10,
            sources: SourceSpec::default_catalog(),
        }
    }
}

/// Delivery retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Maximum delivery attempts per trigger (including the first)
    pub max_attempts: u32,

    /// Base backoff delay in milliseconds
    pub base_delay_ms: u64,

    /// Maximum backoff delay in milliseconds
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
            max_delay_ms: 30_000,
        }
    }
}

impl RetrySettings {
    /// Convert to the retry helper's configuration
    pub fn to_retry_config(&self) -> RetryConfig {
        RetryConfig::with_delays(self.max_attempts, self.base_delay_ms, self.max_delay_ms)
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite database path
    pub sqlite_path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            sqlite_path: PathBuf::from("data/cadence.db"),
        }
    }
}

/// Notification configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Webhook URL for best-effort notifications (disabled when unset)
    pub webhook_url: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schedule: ScheduleConfig::default(),
            poster: PosterConfig::default(),
            content: ContentConfig::default(),
            retry: RetrySettings::default(),
            database: DatabaseConfig::default(),
            notify: NotifyConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables over defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Apply `CADENCE_*` environment overrides
    fn apply_env(&mut self) {
        if let Ok(v) = std::env::var("CADENCE_ENDPOINT") {
            self.poster.endpoint = v;
        }
        if let Ok(v) = std::env::var("CADENCE_API_KEY") {
            self.poster.api_key = v;
        }
        if let Some(v) = env_parse::<u32>("CADENCE_USER_ID") {
            self.poster.user_id = v;
        }
        if let Some(v) = env_parse::<u32>("CADENCE_CATEGORY_ID") {
            self.poster.category_id = v;
        }
        if let Ok(v) = std::env::var("CADENCE_COUNTRIES_ISO") {
            self.poster.countries_iso = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(v) = std::env::var("CADENCE_FIXED_TIME") {
            self.schedule.fixed_time = v;
        }
        if let Some(v) = env_parse::<usize>("CADENCE_RANDOM_POSTS_PER_DAY") {
            self.schedule.random_posts_per_day = v;
        }
        if let Some(v) = env_parse::<u32>("CADENCE_MIN_INTERVAL_MINUTES") {
            self.schedule.min_interval_minutes = v;
        }
        if let Some(v) = env_parse::<u32>("CADENCE_MAX_INTERVAL_MINUTES") {
            self.schedule.max_interval_minutes = v;
        }
        if let Some(v) = env_parse::<u32>("CADENCE_MAX_ATTEMPTS") {
            self.retry.max_attempts = v;
        }
        if let Ok(v) = std::env::var("CADENCE_SQLITE_PATH") {
            self.database.sqlite_path = v.into();
        }
        if let Ok(v) = std::env::var("CADENCE_WEBHOOK_URL") {
            self.notify.webhook_url = Some(v);
        }
        if let Ok(v) = std::env::var("CADENCE_LOG_LEVEL") {
            self.logging.level = v;
        }
        if let Ok(v) = std::env::var("CADENCE_LOG_FORMAT") {
            self.logging.format = v;
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if NaiveTime::parse_from_str(&self.schedule.fixed_time, "%H:%M").is_err() {
            anyhow::bail!(
                "fixed_time '{}' is not a valid HH:MM time",
                self.schedule.fixed_time
            );
        }

        if self.schedule.min_interval_minutes == 0 {
            anyhow::bail!("min_interval_minutes must be greater than 0");
        }

        if self.schedule.max_interval_minutes < self.schedule.min_interval_minutes {
            anyhow::bail!("max_interval_minutes must be >= min_interval_minutes");
        }

        if self.retry.max_attempts == 0 {
            anyhow::bail!("max_attempts must be greater than 0");
        }

        if self.poster.endpoint.is_empty() {
            anyhow::bail!("poster endpoint must not be empty");
        }

        if self.content.source_timeout_secs == 0 {
            anyhow::bail!("source_timeout_secs must be greater than 0");
        }

        Ok(())
    }

    /// Parse the fixed daily post time
    pub fn fixed_time(&self) -> Result<NaiveTime> {
        NaiveTime::parse_from_str(&self.schedule.fixed_time, "%H:%M")
            .with_context(|| format!("Invalid fixed_time: {}", self.schedule.fixed_time))
    }

    /// Get per-source fetch timeout as Duration
    #[must_use]
    pub fn source_timeout(&self) -> Duration {
        Duration::from_secs(self.content.source_timeout_secs)
    }

    /// Get delivery request timeout as Duration
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.poster.request_timeout_secs)
    }

    /// Minimum random-slot spacing as chrono duration
    #[must_use]
    pub fn min_interval(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.schedule.min_interval_minutes))
    }

    /// Maximum random-slot spacing as chrono duration
    #[must_use]
    pub fn max_interval(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.schedule.max_interval_minutes))
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse::<T>().ok())
}
