// Copyright (c) 2025 - Cowboy AI, Inc.
//! Configuration
//!
//! Settings come from code (`Default`, struct literals) or the environment:
//!
//! | Variable             | Setting                       | Default  |
//! |----------------------|-------------------------------|----------|
//! | `BIGIP_HOST`         | management address (required) | -        |
//! | `BIGIP_USER`         | user name                     | `admin`  |
//! | `BIGIP_PASSWORD`     | password (required)           | -        |
//! | `BIGIP_TIMEOUT_SECS` | per-call timeout              | `30`     |
//! | `BIGIP_VERIFY_TLS`   | verify device certificate     | `true`   |
//! | `BIGIP_PARTITION`    | fixture partition (CLI only)  | `Common` |

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::ConfigError;

/// Connection settings for a BIG-IP management interface
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Management address, with or without scheme (e.g. `10.1.1.245`)
    pub host: String,

    pub username: String,

    #[serde(default, skip_serializing)]
    pub password: String,

    /// Per-call timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Verify the device certificate; lab devices often run self-signed
    #[serde(default = "default_verify_tls")]
    pub verify_tls: bool,
}

fn default_timeout() -> u64 {
    30
}

fn default_verify_tls() -> bool {
    true
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            host: "https://192.168.1.245".to_string(),
            username: "admin".to_string(),
            password: String::new(),
            timeout_secs: default_timeout(),
            verify_tls: default_verify_tls(),
        }
    }
}

impl DeviceConfig {
    /// Load settings from `BIGIP_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load settings through an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = lookup("BIGIP_HOST").ok_or(ConfigError::Missing("BIGIP_HOST"))?;
        let password = lookup("BIGIP_PASSWORD").ok_or(ConfigError::Missing("BIGIP_PASSWORD"))?;
        let username = lookup("BIGIP_USER").unwrap_or_else(|| "admin".to_string());

        let timeout_secs = match lookup("BIGIP_TIMEOUT_SECS") {
            Some(value) => value.parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::Invalid {
                    name: "BIGIP_TIMEOUT_SECS",
                    value,
                    reason: e.to_string(),
                }
            })?,
            None => default_timeout(),
        };

        let verify_tls = match lookup("BIGIP_VERIFY_TLS") {
            Some(value) => parse_bool("BIGIP_VERIFY_TLS", value)?,
            None => default_verify_tls(),
        };

        Ok(Self {
            host,
            username,
            password,
            timeout_secs,
            verify_tls,
        })
    }

    /// Base URL of the management interface, `https://` when no scheme given
    pub fn base_url(&self) -> String {
        let host = self.host.trim_end_matches('/');
        if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("https://{}", host)
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn parse_bool(name: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(ConfigError::Invalid {
            name,
            value,
            reason: "expected true or false".to_string(),
        }),
    }
}

/// Caller-side retry of transient failures
///
/// The engine itself never retries; the harness wraps whole operations in
/// this policy when one is configured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub initial_interval: Duration,
    pub max_interval: Duration,
    /// Give up once this much time has been spent retrying
    pub max_elapsed: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_millis(500),
            max_interval: Duration::from_secs(5),
            max_elapsed: Duration::from_secs(60),
        }
    }
}

/// Scenario harness settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Substituted for `${partition}` in fixture text
    pub partition: String,

    /// `None` runs every operation exactly once
    #[serde(default)]
    pub retry: Option<RetryPolicy>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            partition: "Common".to_string(),
            retry: None,
        }
    }
}

impl HarnessConfig {
    pub fn with_retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(policy);
        self
    }
}
