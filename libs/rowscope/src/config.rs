//! Engine selection from configuration.
//!
//! One DSN string picks the storage backend; the scheme is the switch.
//! Configuration is read through figment so files, environment variables,
//! and programmatic defaults layer the usual way.

use std::sync::Arc;

use figment::Figment;
use figment::providers::{Env, Serialized};
use serde::{Deserialize, Serialize};
use url::Url;

#[cfg(feature = "memory")]
use crate::engine::MemoryEngine;
use crate::engine::StorageEngine;

/// Environment variable prefix recognized by [`StoreConfig::from_env`].
pub const ENV_PREFIX: &str = "ROWSCOPE_";

/// Failures while reading configuration or selecting an engine.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The DSN scheme names no known engine.
    #[error("Unknown storage DSN: {0}")]
    UnknownDsn(String),

    /// The DSN names an engine that was not compiled in.
    #[error("Feature not enabled: {0}")]
    FeatureDisabled(&'static str),

    /// The DSN is not a valid URL.
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Figment could not produce a [`StoreConfig`].
    #[error("Configuration error: {0}")]
    Figment(#[from] Box<figment::Error>),
}

/// Storage configuration for the scoping layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Storage DSN. `memory://` selects the bundled in-process engine.
    #[serde(default = "default_dsn")]
    pub dsn: String,
}

fn default_dsn() -> String {
    "memory://".to_owned()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { dsn: default_dsn() }
    }
}

impl StoreConfig {
    /// Extract a configuration from an assembled figment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Figment`] when extraction fails.
    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        Ok(figment.extract().map_err(Box::new)?)
    }

    /// Configuration from `ROWSCOPE_`-prefixed environment variables layered
    /// over the defaults (`ROWSCOPE_DSN=...`).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Figment`] when extraction fails.
    pub fn from_env() -> Result<Self, ConfigError> {
        let figment =
            Figment::from(Serialized::defaults(Self::default())).merge(Env::prefixed(ENV_PREFIX));
        Self::from_figment(&figment)
    }

    /// Build the engine this configuration selects.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownDsn`] for schemes no engine claims,
    /// [`ConfigError::FeatureDisabled`] when the selected engine is not
    /// compiled in, [`ConfigError::UrlParse`] for malformed DSNs.
    pub fn connect(&self) -> Result<Arc<dyn StorageEngine>, ConfigError> {
        let url = Url::parse(&self.dsn)?;
        match url.scheme() {
            "memory" => {
                #[cfg(feature = "memory")]
                {
                    Ok(Arc::new(MemoryEngine::new()))
                }
                #[cfg(not(feature = "memory"))]
                {
                    Err(ConfigError::FeatureDisabled("memory"))
                }
            }
            _ => Err(ConfigError::UnknownDsn(self.dsn.clone())),
        }
    }
}
