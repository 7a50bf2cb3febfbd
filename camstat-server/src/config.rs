//! Server configuration read from the environment.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::cache::CacheConfig;
use crate::domain::{OffsetMode, TimeChainFormat};

pub const DATA_VAR: &str = "CAMSTAT_DATA";
pub const ADDR_VAR: &str = "CAMSTAT_ADDR";
pub const OFFSET_MODE_VAR: &str = "CAMSTAT_OFFSET_MODE";
pub const CACHE_TTL_VAR: &str = "CAMSTAT_CACHE_TTL_SECS";
pub const CACHE_CAPACITY_VAR: &str = "CAMSTAT_CACHE_CAPACITY";

/// Errors in server configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A required variable is not set
    #[error("{0} is not set")]
    Missing(&'static str),

    /// A variable is set to something unusable
    #[error("invalid {var}={value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// Everything the server needs to start.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Journeys CSV to load.
    pub data_path: PathBuf,

    /// Address to listen on.
    pub addr: SocketAddr,

    /// How stored time text is laid out.
    pub format: TimeChainFormat,

    pub cache: CacheConfig,
}

impl ServerConfig {
    /// Read configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read configuration through `lookup`, which returns a variable's value
    /// if set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_path = lookup(DATA_VAR)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .ok_or(ConfigError::Missing(DATA_VAR))?;

        let addr = match lookup(ADDR_VAR) {
            Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid {
                var: ADDR_VAR,
                value: v.clone(),
                reason: "expected host:port",
            })?,
            None => SocketAddr::from(([127, 0, 0, 1], 3000)),
        };

        let offsets = match lookup(OFFSET_MODE_VAR) {
            Some(v) => parse_offset_mode(&v).ok_or_else(|| ConfigError::Invalid {
                var: OFFSET_MODE_VAR,
                value: v.clone(),
                reason: "expected cumulative or per-leg",
            })?,
            None => OffsetMode::default(),
        };

        let defaults = CacheConfig::default();
        let ttl = match lookup(CACHE_TTL_VAR) {
            Some(v) => Duration::from_secs(parse_number(CACHE_TTL_VAR, &v)?),
            None => defaults.ttl,
        };
        let max_capacity = match lookup(CACHE_CAPACITY_VAR) {
            Some(v) => parse_number(CACHE_CAPACITY_VAR, &v)?,
            None => defaults.max_capacity,
        };

        Ok(Self {
            data_path,
            addr,
            format: TimeChainFormat {
                offsets,
                ..TimeChainFormat::default()
            },
            cache: CacheConfig { ttl, max_capacity },
        })
    }
}

fn parse_offset_mode(s: &str) -> Option<OffsetMode> {
    match s.trim().to_ascii_lowercase().as_str() {
        "cumulative" => Some(OffsetMode::Cumulative),
        "per-leg" | "per_leg" => Some(OffsetMode::PerLeg),
        _ => None,
    }
}

fn parse_number(var: &'static str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason: "expected a non-negative integer",
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_apply() {
        let c = config(&[(DATA_VAR, "/data/journeys.csv")]).unwrap();
        assert_eq!(c.data_path, PathBuf::from("/data/journeys.csv"));
        assert_eq!(c.addr, SocketAddr::from(([127, 0, 0, 1], 3000)));
        assert_eq!(c.format, TimeChainFormat::default());
        assert_eq!(c.cache.ttl, Duration::from_secs(300));
        assert_eq!(c.cache.max_capacity, 256);
    }

    #[test]
    fn data_path_is_required() {
        assert_eq!(config(&[]).unwrap_err(), ConfigError::Missing(DATA_VAR));
        assert_eq!(
            config(&[(DATA_VAR, "  ")]).unwrap_err(),
            ConfigError::Missing(DATA_VAR)
        );
    }

    #[test]
    fn overrides() {
        let c = config(&[
            (DATA_VAR, "j.csv"),
            (ADDR_VAR, "0.0.0.0:8080"),
            (OFFSET_MODE_VAR, "per-leg"),
            (CACHE_TTL_VAR, "10"),
            (CACHE_CAPACITY_VAR, "5"),
        ])
        .unwrap();
        assert_eq!(c.addr.port(), 8080);
        assert_eq!(c.format.offsets, OffsetMode::PerLeg);
        assert!(c.format.first_site_implicit);
        assert_eq!(c.cache.ttl, Duration::from_secs(10));
        assert_eq!(c.cache.max_capacity, 5);
    }

    #[test]
    fn invalid_values_are_named() {
        let err = config(&[(DATA_VAR, "j.csv"), (OFFSET_MODE_VAR, "hourly")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: OFFSET_MODE_VAR, .. }));

        let err = config(&[(DATA_VAR, "j.csv"), (CACHE_TTL_VAR, "-1")]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid CAMSTAT_CACHE_TTL_SECS=\"-1\": expected a non-negative integer"
        );
    }
}
