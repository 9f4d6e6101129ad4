//! Engine configuration.
//!
//! Defaults can be overridden from the environment:
//!
//! | Variable | Meaning | Default |
//! |----------|---------|---------|
//! | `LEADFLOW_DEFAULT_CAP` | cap for regions without a configured row | `10` |
//! | `LEADFLOW_DEFAULT_REGIONS` | comma-separated regions used when an order names none | `CA,TX,FL,NY,IL` |
//! | `LEADFLOW_BATCH_LIMIT` | max leads assigned per region per order | `5` |

use serde::{Deserialize, Serialize};
use thiserror::Error;

use leadflow_core::RegionCode;

pub const DEFAULT_CAP: i64 = 10;
pub const DEFAULT_BATCH_LIMIT: i64 = 5;
pub const DEFAULT_REGIONS: [&str; 5] = ["CA", "TX", "FL", "NY", "IL"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub default_cap: i64,
    pub default_regions: Vec<RegionCode>,
    pub batch_limit: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_cap: DEFAULT_CAP,
            default_regions: DEFAULT_REGIONS
                .iter()
                .filter_map(|r| RegionCode::parse(r).ok())
                .collect(),
            batch_limit: DEFAULT_BATCH_LIMIT,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (unset keys keep their default).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(raw) = lookup("LEADFLOW_DEFAULT_CAP") {
            config.default_cap = parse_non_negative("LEADFLOW_DEFAULT_CAP", &raw)?;
        }
        if let Some(raw) = lookup("LEADFLOW_BATCH_LIMIT") {
            config.batch_limit = parse_non_negative("LEADFLOW_BATCH_LIMIT", &raw)?;
        }
        if let Some(raw) = lookup("LEADFLOW_DEFAULT_REGIONS") {
            let regions = raw
                .split(',')
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(RegionCode::parse)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| invalid("LEADFLOW_DEFAULT_REGIONS", &raw, e.to_string()))?;
            if regions.is_empty() {
                return Err(invalid(
                    "LEADFLOW_DEFAULT_REGIONS",
                    &raw,
                    "at least one region is required".to_string(),
                ));
            }
            config.default_regions = regions;
        }

        Ok(config)
    }
}

fn invalid(key: &'static str, value: &str, reason: String) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason,
    }
}

fn parse_non_negative(key: &'static str, raw: &str) -> Result<i64, ConfigError> {
    match raw.trim().parse::<i64>() {
        Ok(v) if v >= 0 => Ok(v),
        Ok(_) => Err(invalid(key, raw, "must not be negative".to_string())),
        Err(e) => Err(invalid(key, raw, e.to_string())),
    }
}
