//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

use crate::lobby::directory::DEFAULT_MAX_ROOMS;
use crate::util::rate_limit::INPUT_RATE_LIMIT;

/// Log output format
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(ConfigError::Invalid("LOG_FORMAT")),
        }
    }
}

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    pub log_format: LogFormat,

    /// Allowed client origins for CORS; empty means any origin
    pub client_origins: Vec<String>,

    /// Inbound WebSocket messages allowed per second per socket
    pub input_rate_limit: u32,
    /// Cap on concurrently live rooms
    pub max_rooms: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // PORT is what hosting platforms hand us; it wins over SERVER_ADDR
        let server_addr = match var("PORT") {
            Some(port) => format!("0.0.0.0:{}", port.trim()),
            None => var("SERVER_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string()),
        };

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::Invalid("SERVER_ADDR"))?,

            log_level: var("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            log_format: var("LOG_FORMAT")
                .map(|f| f.parse::<LogFormat>())
                .transpose()?
                .unwrap_or(LogFormat::Pretty),

            client_origins: var("CLIENT_ORIGIN")
                .map(|raw| {
                    raw.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),

            input_rate_limit: parse_or(&var, "INPUT_RATE_LIMIT", INPUT_RATE_LIMIT)?,
            max_rooms: parse_or(&var, "MAX_ROOMS", DEFAULT_MAX_ROOMS)?,
        })
    }
}

fn parse_or<T: FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match var(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
