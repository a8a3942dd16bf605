//! Process startup: logging, configuration, then the frontend.

use std::fmt;
use std::sync::Arc;

use hcp_database::DocumentStore;

use crate::config::loader::{DEFAULT_CONFIG_FILE, load_config};
use crate::error::{FrontendError, Result};
use crate::frontend::Frontend;
use crate::observability;

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_ENV: &str = "HCP_CONFIG";

/// Where the configuration path came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    Explicit,
    EnvironmentVariable,
    Default,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Explicit => write!(f, "explicit path"),
            Self::EnvironmentVariable => write!(f, "environment variable ({CONFIG_PATH_ENV})"),
            Self::Default => write!(f, "default"),
        }
    }
}

/// An explicit path wins over `HCP_CONFIG`, which wins over the default.
pub fn resolve_config_path(explicit: Option<&str>) -> (String, ConfigSource) {
    if let Some(path) = explicit {
        return (path.to_string(), ConfigSource::Explicit);
    }
    match std::env::var(CONFIG_PATH_ENV) {
        Ok(path) if !path.is_empty() => (path, ConfigSource::EnvironmentVariable),
        _ => (DEFAULT_CONFIG_FILE.to_string(), ConfigSource::Default),
    }
}

/// Installs tracing, loads the configuration, applies its log level and
/// builds a frontend over `store`.
pub fn start(config_path: Option<&str>, store: Arc<dyn DocumentStore>) -> Result<Frontend> {
    observability::init_tracing();

    let (path, source) = resolve_config_path(config_path);
    let config = load_config(Some(path.as_str())).map_err(|message| {
        tracing::error!(path = %path, source = %source, error = %message, "configuration rejected");
        FrontendError::config(message)
    })?;
    tracing::info!(path = %path, source = %source, "configuration loaded");

    if !observability::apply_logging_level(&config.logging.level) {
        tracing::warn!(level = %config.logging.level, "configured log level not applied");
    }
    Frontend::from_config(config, store)
}
