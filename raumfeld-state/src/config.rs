//! Configuration types for the state layer
//!
//! [`HostConfig`] names the host web service to talk to and
//! [`UpdaterConfig`] controls how often and how patiently the background
//! updater refreshes its snapshot.

use std::net::Ipv6Addr;
use std::time::Duration;

use raumfeld_webservice::{location, DEFAULT_PORT};

use crate::error::{Result, StateError};

/// Environment variable naming the host
pub const ENV_HOST: &str = "RAUMFELD_HOST";
/// Environment variable overriding the web service port
pub const ENV_PORT: &str = "RAUMFELD_PORT";

/// Address of the host web service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostConfig {
    /// Host name or IP address
    pub host: String,
    /// Default: 47365
    pub port: u16,
}

impl HostConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Read `RAUMFELD_HOST` and optionally `RAUMFELD_PORT`
    pub fn from_env() -> Result<Self> {
        let host = std::env::var(ENV_HOST)
            .map_err(|_| StateError::InvalidConfig(format!("{} is not set", ENV_HOST)))?;

        let port = match std::env::var(ENV_PORT) {
            Ok(value) => value.trim().parse::<u16>().map_err(|_| {
                StateError::InvalidConfig(format!("{} is not a port: {:?}", ENV_PORT, value))
            })?,
            Err(_) => DEFAULT_PORT,
        };

        let config = Self { host, port };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let host = self.host.trim();
        if host.is_empty() {
            return Err(StateError::InvalidConfig("Host must not be empty".to_string()));
        }
        if host.contains(['/', ' ', '?', '#']) {
            return Err(StateError::InvalidConfig(format!(
                "Host must be a bare name or address: {:?}",
                self.host
            )));
        }
        if host.contains(':') && !is_ipv6_literal(host) {
            return Err(StateError::InvalidConfig(format!(
                "Host must not carry a port, use the port setting: {:?}",
                self.host
            )));
        }
        if self.port == 0 {
            return Err(StateError::InvalidConfig("Port must be greater than 0".to_string()));
        }
        Ok(())
    }

    /// Base location `http://{host}:{port}`
    pub fn location(&self) -> String {
        location(self.host.trim(), self.port)
    }
}

/// `fe80::1` or `[fe80::1]`
fn is_ipv6_literal(host: &str) -> bool {
    let inner = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    inner.parse::<Ipv6Addr>().is_ok()
}

/// Configuration for the background updater
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdaterConfig {
    /// Pause between successful refreshes
    /// Default: 5 seconds
    pub interval: Duration,

    /// First retry delay after a failed refresh, doubled per further failure
    /// Default: 1 second
    pub backoff_base: Duration,

    /// Upper bound for the retry delay
    /// Default: 60 seconds
    pub backoff_max: Duration,

    /// How long the host may hold each long-poll request open; zero sends no
    /// `Prefer` header
    /// Default: 0
    pub long_poll_wait: Duration,

    /// Timeout for a single HTTP request, on top of `long_poll_wait`
    /// Default: 10 seconds
    pub request_timeout: Duration,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            backoff_base: Duration::from_secs(1),
            backoff_max: Duration::from_secs(60),
            long_poll_wait: Duration::ZERO,
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl UpdaterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refresh often, retry quickly
    pub fn responsive() -> Self {
        Self {
            interval: Duration::from_secs(1),
            backoff_base: Duration::from_millis(250),
            backoff_max: Duration::from_secs(10),
            ..Default::default()
        }
    }

    /// Let the host hold requests open and refresh right after it answers
    ///
    /// The async source polls the four state documents at once, so a quiet
    /// round takes about one `long_poll_wait`. The blocking source polls them
    /// one after another and a quiet round can take four times as long.
    pub fn long_polling() -> Self {
        Self {
            interval: Duration::from_millis(100),
            long_poll_wait: Duration::from_secs(2),
            ..Default::default()
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_backoff(mut self, base: Duration, max: Duration) -> Self {
        self.backoff_base = base;
        self.backoff_max = max;
        self
    }

    pub fn with_long_poll_wait(mut self, wait: Duration) -> Self {
        self.long_poll_wait = wait;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.interval.is_zero() {
            return Err(StateError::InvalidConfig(
                "Update interval must be greater than 0".to_string(),
            ));
        }
        if self.backoff_base.is_zero() {
            return Err(StateError::InvalidConfig(
                "Backoff base must be greater than 0".to_string(),
            ));
        }
        if self.backoff_max < self.backoff_base {
            return Err(StateError::InvalidConfig(
                "Invalid backoff: max must not be less than base".to_string(),
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(StateError::InvalidConfig(
                "Request timeout must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Delay before the next attempt after `failures` consecutive failures
    pub fn backoff(&self, failures: u32) -> Duration {
        if failures == 0 {
            return self.interval;
        }
        let factor = 1u32.checked_shl(failures - 1).unwrap_or(u32::MAX);
        self.backoff_base
            .checked_mul(factor)
            .map_or(self.backoff_max, |delay| delay.min(self.backoff_max))
    }
}
