use std::net::SocketAddr;

use thiserror::Error;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

const LISTEN_ADDR_VAR: &str = "HORIZON_LISTEN_ADDR";
const LOG_FORMAT_VAR: &str = "HORIZON_LOG_FORMAT";
const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{var} is not a valid socket address: '{value}'")]
    InvalidListenAddr { var: &'static str, value: String },
    #[error("{var} must be 'text' or 'json', got '{value}'")]
    InvalidLogFormat { var: &'static str, value: String },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let raw_addr = lookup(LISTEN_ADDR_VAR).unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());
        let listen_addr: SocketAddr =
            raw_addr
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidListenAddr {
                    var: LISTEN_ADDR_VAR,
                    value: raw_addr.clone(),
                })?;

        let log_format = match lookup(LOG_FORMAT_VAR) {
            None => LogFormat::Text,
            Some(v) if v.eq_ignore_ascii_case("text") => LogFormat::Text,
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            Some(v) => {
                return Err(ConfigError::InvalidLogFormat {
                    var: LOG_FORMAT_VAR,
                    value: v,
                });
            }
        };

        Ok(Self {
            listen_addr,
            log_format,
        })
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.listen_addr.set_port(port);
        self
    }
}

/// Installs the global subscriber. `RUST_LOG` controls filtering.
pub fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(false))
            .init(),
        LogFormat::Text => registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init(),
    }
}
