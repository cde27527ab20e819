//! Runtime settings read from the environment (`.env` is loaded by the binary via dotenvy).

use crate::error::ConfigError;
use std::net::SocketAddr;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Which backing store serves the row accessor.
#[derive(Clone, Debug, PartialEq)]
pub enum StoreBackend {
    Postgrest {
        url: String,
        api_key: Option<String>,
    },
    Postgres {
        database_url: String,
        max_connections: u32,
        auto_migrate: bool,
    },
    Memory,
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub bind_addr: SocketAddr,
    pub backend: StoreBackend,
    pub max_body_bytes: usize,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_raw = get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.into());
        let bind_addr = bind_raw.parse().map_err(|e| ConfigError::Invalid {
            key: "BIND_ADDR",
            reason: format!("{}: {}", bind_raw, e),
        })?;

        let max_body_bytes = match get("MAX_BODY_BYTES") {
            Some(v) => v.parse().map_err(|_| ConfigError::Invalid {
                key: "MAX_BODY_BYTES",
                reason: format!("{} is not a byte count", v),
            })?,
            None => DEFAULT_MAX_BODY_BYTES,
        };

        let kind = match get("STORE_BACKEND") {
            Some(k) => k.to_lowercase(),
            None if get("POSTGREST_URL").is_some() => "postgrest".into(),
            None if get("DATABASE_URL").is_some() => "postgres".into(),
            None => "memory".into(),
        };

        let backend = match kind.as_str() {
            "postgrest" => StoreBackend::Postgrest {
                url: get("POSTGREST_URL").ok_or(ConfigError::Missing("POSTGREST_URL"))?,
                api_key: get("POSTGREST_API_KEY"),
            },
            "postgres" | "postgresql" => {
                let max_connections = match get("DATABASE_MAX_CONNECTIONS") {
                    Some(v) => v.parse().map_err(|_| ConfigError::Invalid {
                        key: "DATABASE_MAX_CONNECTIONS",
                        reason: format!("{} is not a positive integer", v),
                    })?,
                    None => DEFAULT_MAX_CONNECTIONS,
                };
                let auto_migrate = match get("AUTO_MIGRATE") {
                    Some(v) => parse_flag(&v).ok_or_else(|| ConfigError::Invalid {
                        key: "AUTO_MIGRATE",
                        reason: format!("{} is not a boolean", v),
                    })?,
                    None => true,
                };
                StoreBackend::Postgres {
                    database_url: get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?,
                    max_connections,
                    auto_migrate,
                }
            }
            "memory" => StoreBackend::Memory,
            other => {
                return Err(ConfigError::Invalid {
                    key: "STORE_BACKEND",
                    reason: format!("{} (expected postgrest, postgres or memory)", other),
                })
            }
        };

        Ok(Settings {
            bind_addr,
            backend,
            max_body_bytes,
        })
    }
}

fn parse_flag(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
