//! Server configuration.
//!
//! | Variable | Meaning | Default |
//! |----------|---------|---------|
//! | `LEADFLOW_BIND_ADDR` | listen address | `0.0.0.0:8080` |
//! | `DATABASE_URL` | Postgres URL; unset means the in-memory store | unset |
//! | `LEADFLOW_DB_MAX_CONNECTIONS` | pool size when `DATABASE_URL` is set | `10` |
//!
//! Engine settings (`LEADFLOW_DEFAULT_CAP` etc.) are read by
//! [`EngineConfig::from_lookup`] from the same source.

use std::net::SocketAddr;

use leadflow_infra::{ConfigError, EngineConfig};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub engine: EngineConfig,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let raw_addr = lookup("LEADFLOW_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = raw_addr.trim().parse().map_err(|e: std::net::AddrParseError| {
            ConfigError::Invalid {
                key: "LEADFLOW_BIND_ADDR",
                value: raw_addr.clone(),
                reason: e.to_string(),
            }
        })?;

        let database_url = lookup("DATABASE_URL")
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());

        let max_connections = match lookup("LEADFLOW_DB_MAX_CONNECTIONS") {
            None => DEFAULT_MAX_CONNECTIONS,
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "LEADFLOW_DB_MAX_CONNECTIONS",
                        value: raw,
                        reason: "expected a positive integer".to_string(),
                    });
                }
            },
        };

        Ok(Self {
            bind_addr,
            database_url,
            max_connections,
            engine: EngineConfig::from_lookup(&lookup)?,
        })
    }
}
