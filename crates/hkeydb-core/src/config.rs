//! Module: config
//! Responsibility: execution settings shared by every cursor of one context.
//! Does not own: schema metadata or storage handles.
//! Boundary: loaded once from TOML, then read-only behind `Arc`.


use crate::{
    MAX_HKEY_DEPTH,
    error::{ErrorClass, ErrorOrigin, InternalError},
};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("config parse error: {0}")]
    Parse(String),

    #[error("max_hkey_depth {depth} must be in 1..={max}")]
    HKeyDepthOutOfRange { depth: usize, max: usize },

    #[error("sort.max_insertion_limit must be positive")]
    ZeroInsertionLimit,
}

impl From<ConfigError> for InternalError {
    fn from(err: ConfigError) -> Self {
        Self::new(
            ErrorClass::InvariantViolation,
            ErrorOrigin::Config,
            err.to_string(),
        )
    }
}

///
/// ExecConfig
///
/// Execution settings. Every field has a default so a partial (or empty)
/// TOML document is valid.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExecConfig {
    /// Verify that each Intersect input never goes backwards in its compared fields.
    pub verify_input_order: bool,

    /// Deepest table (in hkey segments) the writer accepts.
    pub max_hkey_depth: usize,

    pub sort: SortConfig,
}

impl ExecConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_hkey_depth == 0 || self.max_hkey_depth > MAX_HKEY_DEPTH {
            return Err(ConfigError::HKeyDepthOutOfRange {
                depth: self.max_hkey_depth,
                max: MAX_HKEY_DEPTH,
            });
        }
        if self.sort.max_insertion_limit == 0 {
            return Err(ConfigError::ZeroInsertionLimit);
        }

        Ok(())
    }
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            verify_input_order: true,
            max_hkey_depth: MAX_HKEY_DEPTH,
            sort: SortConfig::default(),
        }
    }
}

///
/// SortConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SortConfig {
    /// Largest limit accepted by the in-memory top-K sort.
    pub max_insertion_limit: usize,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            max_insertion_limit: 10_000,
        }
    }
}
