//! Monitor configuration.

use std::time::Duration;

use boxmon_transport::ReconnectConfig;

/// Runtime configuration for the monitor.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Base URL of the request/response API
    pub api_base_url: String,
    /// URL of the persistent push channel
    pub channel_url: String,
    /// Base delay for reconnect backoff
    pub reconnect_base_delay: Duration,
    /// Maximum delay between reconnect attempts
    pub reconnect_max_delay: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:5000".to_string(),
            channel_url: "ws://localhost:5000/ws".to_string(),
            reconnect_base_delay: Duration::from_millis(500),
            reconnect_max_delay: Duration::from_secs(30),
        }
    }
}

impl MonitorConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_base_url: std::env::var("BOXMON_API_URL").unwrap_or(defaults.api_base_url),
            channel_url: std::env::var("BOXMON_CHANNEL_URL").unwrap_or(defaults.channel_url),
            reconnect_base_delay: std::env::var("BOXMON_RECONNECT_BASE_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.reconnect_base_delay),
            reconnect_max_delay: std::env::var("BOXMON_RECONNECT_MAX_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.reconnect_max_delay),
        }
    }

    /// Backoff settings for the channel client.
    pub fn reconnect(&self) -> ReconnectConfig {
        ReconnectConfig {
            base_delay: self.reconnect_base_delay,
            max_delay: self.reconnect_max_delay,
        }
    }
}
