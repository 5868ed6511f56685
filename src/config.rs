// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Configuration for the contact relay.
//!
//! Every section has serde defaults; [`Config::from_env`] overlays the
//! process environment (after `.env` has been loaded by the binary).

use axum::http::HeaderValue;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Configuration for the contact relay service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address (default: 0.0.0.0:5002)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Use the first `X-Forwarded-For` entry as the client identity (default: false)
    #[serde(default)]
    pub trust_forwarded_for: bool,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Validation configuration
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Outbound mail configuration
    #[serde(default)]
    pub mail: MailConfig,

    /// CORS configuration
    #[serde(default)]
    pub cors: CorsConfig,

    /// Metrics configuration
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Fixed-window rate limiting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Window length in seconds (default: 900)
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// Accepted submissions per client per window (default: 5)
    #[serde(default = "default_max_requests")]
    pub max_requests_per_window: u32,

    /// Interval between sweeps of expired windows in seconds (default: 60)
    #[serde(default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,
}

/// Submission validation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Canonicalize provider-specific aliases (gmail dots, `+tag`) (default: true)
    #[serde(default = "default_true")]
    pub normalize_email: bool,
}

/// SMTP relay and notification configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct MailConfig {
    /// SMTP relay host (default: smtp.gmail.com)
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,

    /// SMTP port; the relay default is used when unset
    #[serde(default)]
    pub smtp_port: Option<u16>,

    /// SMTP user, also used as the sender address
    #[serde(default)]
    pub username: String,

    #[serde(default, skip_serializing)]
    pub password: String,

    /// Address that receives contact messages
    #[serde(default)]
    pub recipient: String,

    /// Sender display name (default: "Portfolio Contact")
    #[serde(default = "default_from_name")]
    pub from_name: String,

    /// Upper bound on a single send in milliseconds (default: 5000)
    #[serde(default = "default_dispatch_timeout_ms")]
    pub dispatch_timeout_ms: u64,
}

/// CORS configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Allowed origins; `*` allows any (default: ["*"])
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable Prometheus metrics endpoint (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Metrics endpoint path (default: /metrics)
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

// Default value functions
fn default_bind_addr() -> String {
    "0.0.0.0:5002".to_string()
}

fn default_window_secs() -> u64 {
    900 // 15 minutes
}

fn default_max_requests() -> u32 {
    5
}

fn default_cleanup_interval_secs() -> u64 {
    60
}

fn default_smtp_host() -> String {
    "smtp.gmail.com".to_string()
}

fn default_from_name() -> String {
    "Portfolio Contact".to_string()
}

fn default_dispatch_timeout_ms() -> u64 {
    5000
}

fn default_allowed_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_true() -> bool {
    true
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            trust_forwarded_for: false,
            rate_limit: RateLimitConfig::default(),
            validation: ValidationConfig::default(),
            mail: MailConfig::default(),
            cors: CorsConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_secs: default_window_secs(),
            max_requests_per_window: default_max_requests(),
            cleanup_interval_secs: default_cleanup_interval_secs(),
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            normalize_email: default_true(),
        }
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            smtp_host: default_smtp_host(),
            smtp_port: None,
            username: String::new(),
            password: String::new(),
            recipient: String::new(),
            from_name: default_from_name(),
            dispatch_timeout_ms: default_dispatch_timeout_ms(),
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_allowed_origins(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            path: default_metrics_path(),
        }
    }
}

impl std::fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("recipient", &self.recipient)
            .field("from_name", &self.from_name)
            .field("dispatch_timeout_ms", &self.dispatch_timeout_ms)
            .finish()
    }
}

impl RateLimitConfig {
    /// Get the window duration
    pub fn window_duration(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    /// Get the cleanup interval
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }
}

impl MailConfig {
    /// Get the dispatch timeout
    pub fn dispatch_timeout(&self) -> Duration {
        Duration::from_millis(self.dispatch_timeout_ms)
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let bind_addr = match lookup("BIND_ADDR") {
            Some(addr) => addr,
            None => match parse_var::<u16, _>(&lookup, "PORT")? {
                Some(port) => format!("0.0.0.0:{port}"),
                None => defaults.bind_addr,
            },
        };

        let rate_limit = RateLimitConfig {
            window_secs: parse_var(&lookup, "RATE_LIMIT_WINDOW_SECS")?
                .unwrap_or(defaults.rate_limit.window_secs),
            max_requests_per_window: parse_var(&lookup, "RATE_LIMIT_MAX")?
                .unwrap_or(defaults.rate_limit.max_requests_per_window),
            cleanup_interval_secs: parse_var(&lookup, "RATE_LIMIT_CLEANUP_SECS")?
                .unwrap_or(defaults.rate_limit.cleanup_interval_secs),
        };
        if rate_limit.window_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "RATE_LIMIT_WINDOW_SECS",
                value: "0".to_string(),
            });
        }
        if rate_limit.cleanup_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "RATE_LIMIT_CLEANUP_SECS",
                value: "0".to_string(),
            });
        }

        let validation = ValidationConfig {
            normalize_email: parse_var(&lookup, "NORMALIZE_EMAIL")?
                .unwrap_or(defaults.validation.normalize_email),
        };

        let mail = MailConfig {
            smtp_host: lookup("SMTP_HOST").unwrap_or(defaults.mail.smtp_host),
            smtp_port: parse_var(&lookup, "SMTP_PORT")?,
            username: required(&lookup, "EMAIL_USER")?,
            password: required(&lookup, "EMAIL_PASS")?,
            recipient: required(&lookup, "EMAIL_TO")?,
            from_name: lookup("EMAIL_FROM_NAME").unwrap_or(defaults.mail.from_name),
            dispatch_timeout_ms: parse_var(&lookup, "DISPATCH_TIMEOUT_MS")?
                .unwrap_or(defaults.mail.dispatch_timeout_ms),
        };

        let cors = match lookup("ALLOWED_ORIGINS") {
            Some(origins) => CorsConfig {
                allowed_origins: parse_origins(&origins)?,
            },
            None => defaults.cors,
        };

        let metrics = MetricsConfig {
            enabled: parse_var(&lookup, "METRICS_ENABLED")?.unwrap_or(defaults.metrics.enabled),
            ..defaults.metrics
        };

        Ok(Config {
            bind_addr,
            trust_forwarded_for: parse_var(&lookup, "TRUST_FORWARDED_FOR")?.unwrap_or(false),
            rate_limit,
            validation,
            mail,
            cors,
            metrics,
        })
    }
}

fn required<F>(lookup: &F, key: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(key)),
    }
}

/// Comma separated origins, each `*` or a bare `scheme://host[:port]`.
fn parse_origins(raw: &str) -> Result<Vec<String>, ConfigError> {
    let origins: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect();

    if origins.is_empty() {
        return Err(ConfigError::Invalid {
            key: "ALLOWED_ORIGINS",
            value: raw.to_string(),
        });
    }
    if let Some(bad) = origins.iter().find(|o| !is_valid_origin(o)) {
        return Err(ConfigError::Invalid {
            key: "ALLOWED_ORIGINS",
            value: bad.clone(),
        });
    }
    Ok(origins)
}

/// Whether `origin` can match a browser `Origin` header.
pub fn is_valid_origin(origin: &str) -> bool {
    if origin == "*" {
        return true;
    }
    let Some((scheme, authority)) = origin.split_once("://") else {
        return false;
    };
    matches!(scheme, "http" | "https")
        && !authority.is_empty()
        && !authority.contains(&['/', '?', '#'][..])
        && HeaderValue::from_str(origin).is_ok()
}

fn parse_var<T, F>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
    }
}
