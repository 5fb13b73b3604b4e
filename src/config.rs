//! Configuration management for the bulk dispatch engine.
//!
//! This module handles loading and validating configuration from environment variables.
//! Every pacing, retry and timeout value the engine uses lives in
//! [`DispatchSettings`]; nothing in the dispatch path carries its own constants.

use crate::domain::CountryCode;
use crate::error::{ConfigError, ConfigResult};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Pacing, batching and retry knobs consumed by the dispatch engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchSettings {
    /// Contacts per batch when the job does not say (default: 20)
    pub batch_size: usize,

    /// Pause after each target that reached the transport (default: 800ms)
    pub contact_delay: Duration,

    /// Pause between batches, skipped after the last one (default: 1s)
    pub batch_delay: Duration,

    /// Upper bound for the readiness watchdog (default: 120s)
    pub ready_timeout: Duration,

    /// Interval between readiness probes (default: 5s)
    pub ready_poll_interval: Duration,

    /// Pause after the session reports ready, before the first contact (default: 2s)
    pub ready_settle: Duration,

    /// Navigation attempts per target, first one included (default: 3)
    pub navigation_max_attempts: u32,

    /// Pause between navigation attempts (default: 5s)
    pub navigation_backoff: Duration,

    /// Country code applied to 10-digit numbers (default: 91)
    pub default_country_code: CountryCode,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        DispatchSettings {
            batch_size: 20,
            contact_delay: Duration::from_millis(800),
            batch_delay: Duration::from_millis(1000),
            ready_timeout: Duration::from_secs(120),
            ready_poll_interval: Duration::from_secs(5),
            ready_settle: Duration::from_millis(2000),
            navigation_max_attempts: 3,
            navigation_backoff: Duration::from_millis(5000),
            default_country_code: CountryCode::default(),
        }
    }
}

/// Configuration for the bulk dispatch binary.
#[derive(Debug, Clone)]
pub struct Config {
    /// Engine settings
    pub dispatch: DispatchSettings,

    /// WebDriver endpoint driving the browser (e.g. http://localhost:9515)
    pub webdriver_url: String,

    /// Messaging surface base URL (default: https://web.whatsapp.com)
    pub messaging_base_url: String,

    /// Browser profile directory holding the persisted login (default: ./whatsapp_session)
    pub session_dir: PathBuf,

    /// How long strategies wait for a UI post-condition, in seconds (default: 45)
    pub element_wait_secs: u64,

    /// HTTP request timeout for WebDriver calls, in seconds (default: 30)
    pub request_timeout: u64,

    /// Log level (default: "info")
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required environment variables:
    /// - `WEBDRIVER_URL`: WebDriver endpoint
    ///
    /// Optional environment variables:
    /// - `MESSAGING_BASE_URL`, `SESSION_DIR`, `ELEMENT_WAIT_SECS`, `REQUEST_TIMEOUT`
    /// - `BATCH_SIZE`, `CONTACT_DELAY_MS`, `BATCH_DELAY_MS`
    /// - `READY_TIMEOUT_SECS`, `READY_POLL_INTERVAL_SECS`, `READY_SETTLE_MS`
    /// - `NAVIGATION_MAX_ATTEMPTS`, `NAVIGATION_BACKOFF_MS`
    /// - `DEFAULT_COUNTRY_CODE`
    /// - `LOG_LEVEL`: Logging level (default: "info")
    pub fn from_env() -> ConfigResult<Self> {
        // Try to load .env file if it exists (but don't fail if it doesn't)
        let _ = dotenvy::dotenv();

        let webdriver_url = env::var("WEBDRIVER_URL")
            .map_err(|_| ConfigError::MissingVar("WEBDRIVER_URL".to_string()))?;
        Self::validate_url("WEBDRIVER_URL", &webdriver_url)?;

        let messaging_base_url = env::var("MESSAGING_BASE_URL")
            .unwrap_or_else(|_| "https://web.whatsapp.com".to_string());
        Self::validate_url("MESSAGING_BASE_URL", &messaging_base_url)?;

        let session_dir = env::var("SESSION_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./whatsapp_session"));

        let dispatch = Self::dispatch_settings_from_env()?;
        let element_wait_secs = Self::parse_env_u64("ELEMENT_WAIT_SECS", 45)?;
        let request_timeout = Self::parse_env_u64("REQUEST_TIMEOUT", 30)?;
        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Config {
            dispatch,
            webdriver_url,
            messaging_base_url,
            session_dir,
            element_wait_secs,
            request_timeout,
            log_level,
        })
    }

    /// Load only the engine settings, every value optional.
    pub fn dispatch_settings_from_env() -> ConfigResult<DispatchSettings> {
        let defaults = DispatchSettings::default();

        let batch_size = Self::parse_env_usize("BATCH_SIZE", defaults.batch_size)?;
        if batch_size == 0 {
            return Err(ConfigError::InvalidValue {
                var: "BATCH_SIZE".to_string(),
                reason: "Must be at least 1".to_string(),
            });
        }

        let ready_poll_interval = Duration::from_secs(Self::parse_env_u64(
            "READY_POLL_INTERVAL_SECS",
            defaults.ready_poll_interval.as_secs(),
        )?);
        if ready_poll_interval.is_zero() {
            return Err(ConfigError::InvalidValue {
                var: "READY_POLL_INTERVAL_SECS".to_string(),
                reason: "Must be at least 1".to_string(),
            });
        }

        let navigation_max_attempts = Self::parse_env_u64(
            "NAVIGATION_MAX_ATTEMPTS",
            u64::from(defaults.navigation_max_attempts),
        )?;
        if !(1..=10).contains(&navigation_max_attempts) {
            return Err(ConfigError::InvalidValue {
                var: "NAVIGATION_MAX_ATTEMPTS".to_string(),
                reason: "Must be between 1 and 10".to_string(),
            });
        }

        let default_country_code = match env::var("DEFAULT_COUNTRY_CODE") {
            Ok(val) => CountryCode::new(val).map_err(|e| ConfigError::InvalidValue {
                var: "DEFAULT_COUNTRY_CODE".to_string(),
                reason: e.to_string(),
            })?,
            Err(_) => defaults.default_country_code,
        };

        Ok(DispatchSettings {
            batch_size,
            contact_delay: Self::parse_env_millis("CONTACT_DELAY_MS", defaults.contact_delay)?,
            batch_delay: Self::parse_env_millis("BATCH_DELAY_MS", defaults.batch_delay)?,
            ready_timeout: Duration::from_secs(Self::parse_env_u64(
                "READY_TIMEOUT_SECS",
                defaults.ready_timeout.as_secs(),
            )?),
            ready_poll_interval,
            ready_settle: Self::parse_env_millis("READY_SETTLE_MS", defaults.ready_settle)?,
            navigation_max_attempts: navigation_max_attempts as u32,
            navigation_backoff: Self::parse_env_millis(
                "NAVIGATION_BACKOFF_MS",
                defaults.navigation_backoff,
            )?,
            default_country_code,
        })
    }

    fn validate_url(var_name: &str, url: &str) -> ConfigResult<()> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ConfigError::InvalidValue {
                var: var_name.to_string(),
                reason: "Must start with http:// or https://".to_string(),
            });
        }
        Ok(())
    }

    /// Parse an environment variable as u64 with a default value.
    fn parse_env_u64(var_name: &str, default: u64) -> ConfigResult<u64> {
        match env::var(var_name) {
            Ok(val) => val.parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                var: var_name.to_string(),
                reason: format!("Must be a positive number, got: {}", val),
            }),
            Err(_) => Ok(default),
        }
    }

    /// Parse an environment variable as usize with a default value.
    fn parse_env_usize(var_name: &str, default: usize) -> ConfigResult<usize> {
        match env::var(var_name) {
            Ok(val) => val.parse::<usize>().map_err(|_| ConfigError::InvalidValue {
                var: var_name.to_string(),
                reason: format!("Must be a positive number, got: {}", val),
            }),
            Err(_) => Ok(default),
        }
    }

    /// Parse an environment variable holding milliseconds.
    fn parse_env_millis(var_name: &str, default: Duration) -> ConfigResult<Duration> {
        Self::parse_env_u64(var_name, default.as_millis() as u64).map(Duration::from_millis)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            dispatch: DispatchSettings::default(),
            webdriver_url: "http://localhost:9515".to_string(),
            messaging_base_url: "https://web.whatsapp.com".to_string(),
            session_dir: PathBuf::from("./whatsapp_session"),
            element_wait_secs: 45,
            request_timeout: 30,
            log_level: "info".to_string(),
        }
    }
}
