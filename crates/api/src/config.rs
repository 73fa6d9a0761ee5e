//! Server configuration loaded from the environment.

/// Bind address and logging defaults for the API server.
///
/// Environment variables, all optional:
/// - `FULFILLMENT_HOST` — bind address (default: `"0.0.0.0"`)
/// - `FULFILLMENT_PORT` — listen port (default: `3000`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

impl Config {
    /// Loads configuration from environment variables, falling back to
    /// defaults. An unparseable port falls back rather than failing.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("FULFILLMENT_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_port(std::env::var("FULFILLMENT_PORT").ok()),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
        }
    }
}

fn parse_port(value: Option<String>) -> u16 {
    value.and_then(|p| p.parse().ok()).unwrap_or(3000)
}
