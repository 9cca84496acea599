//! HTTP transport configuration and client construction.
//!
//! The gateway client holds a single shared [`reqwest::Client`] built once at
//! construction time from [`HttpConfig`]. The hardened-vs-plain session choice
//! is part of that configuration: it selects how the client is built, never a
//! runtime branch inside request logic.

use std::time::Duration;

use serde::Deserialize;

use crate::error::{CsobError, Result};

/// Transport session hardening mode.
///
/// [`Hardened`](Self::Hardened) is the default and refuses plain-HTTP
/// gateways at the TLS layer (`https_only`, TLS 1.2 minimum).
/// [`Plain`](Self::Plain) places no scheme restriction and exists for
/// sandboxes and local test servers.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    /// HTTPS-only with a TLS 1.2 floor.
    #[default]
    Hardened,
    /// No scheme restriction.
    Plain,
}

/// HTTP transport configuration.
///
/// All fields carry defaults, so an empty TOML table is a valid
/// configuration.
///
/// # Examples
///
/// ```toml
/// [http]
/// timeout_secs = 20
/// connect_timeout_secs = 5
/// session = "hardened"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Maximum idle connections kept per host.
    #[serde(default = "default_pool_max_idle")]
    pub pool_max_idle_per_host: usize,

    /// Session hardening mode.
    #[serde(default)]
    pub session: SessionMode,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            pool_max_idle_per_host: default_pool_max_idle(),
            session: SessionMode::default(),
        }
    }
}

impl HttpConfig {
    /// Validates configuration values are within acceptable bounds.
    ///
    /// # Errors
    ///
    /// Returns [`CsobError::Config`] if timeout values are outside valid
    /// ranges: `timeout_secs` must be 1-300, `connect_timeout_secs` 1-60.
    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 || self.timeout_secs > 300 {
            return Err(CsobError::Config(
                "timeout_secs must be between 1 and 300".to_owned(),
            ));
        }
        if self.connect_timeout_secs == 0 || self.connect_timeout_secs > 60 {
            return Err(CsobError::Config(
                "connect_timeout_secs must be between 1 and 60".to_owned(),
            ));
        }
        Ok(())
    }

    /// Returns the request timeout as a Duration.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Returns the connect timeout as a Duration.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Builds the shared HTTP client for this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CsobError::Transport`] if the TLS backend cannot be
    /// initialized.
    pub fn build_client(&self) -> Result<reqwest::Client> {
        let builder = reqwest::Client::builder()
            .timeout(self.timeout())
            .connect_timeout(self.connect_timeout())
            .pool_max_idle_per_host(self.pool_max_idle_per_host);

        let builder = match self.session {
            SessionMode::Hardened => builder
                .https_only(true)
                .min_tls_version(reqwest::tls::Version::TLS_1_2),
            SessionMode::Plain => builder,
        };

        Ok(builder.build()?)
    }
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_pool_max_idle() -> usize {
    10
}
