//! Service configuration.

use std::time::Duration;

/// Runtime configuration, assembled from CLI arguments and environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address to bind the HTTP listener on.
    pub address: String,
    /// Port to bind the HTTP listener on.
    pub port: u16,
    /// Timeout for fetching source images.
    pub fetch_timeout: Duration,
    /// Emit logs as JSON instead of human-readable lines.
    pub log_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".to_string(),
            port: 3010,
            fetch_timeout: Duration::from_secs(30),
            log_json: false,
        }
    }
}

impl Config {
    /// The `PORT` environment variable overrides the configured port,
    /// matching common container platform conventions.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(port) = std::env::var("PORT") {
            if let Ok(port) = port.parse() {
                self.port = port;
            }
        }
        self
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}
