use hcp_database::client::{DEFAULT_MAX_CONFLICT_RETRIES, DEFAULT_OPERATIONS_PARTITION_KEY};
use hcp_database::ClientOptions;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        if self.database.max_conflict_retries == 0 {
            return Err("database.max_conflict_retries must be > 0".into());
        }
        if self.database.operations_partition_key.trim().is_empty() {
            return Err("database.operations_partition_key must not be empty".into());
        }
        if self.api.location.trim().is_empty() {
            return Err("api.location must not be empty".into());
        }
        if self.api.enabled_versions.as_ref().is_some_and(Vec::is_empty) {
            return Err("api.enabled_versions must list at least one version when set".into());
        }
        Ok(())
    }

    /// Document client settings derived from the `[database]` section.
    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            operations_partition_key: self.database.operations_partition_key.clone(),
            max_conflict_retries: self.database.max_conflict_retries,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}
fn default_log_level() -> String {
    "info".into()
}
impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_max_conflict_retries")]
    pub max_conflict_retries: u32,
    #[serde(default = "default_operations_partition_key")]
    pub operations_partition_key: String,
}
fn default_max_conflict_retries() -> u32 {
    DEFAULT_MAX_CONFLICT_RETRIES
}
fn default_operations_partition_key() -> String {
    DEFAULT_OPERATIONS_PARTITION_KEY.into()
}
impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            max_conflict_retries: default_max_conflict_retries(),
            operations_partition_key: default_operations_partition_key(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Azure region this frontend serves; stamped on operation status ids.
    #[serde(default = "default_location")]
    pub location: String,
    /// Serve only these `api-version`s. All registered versions when unset.
    #[serde(default)]
    pub enabled_versions: Option<Vec<String>>,
}
fn default_location() -> String {
    "eastus".into()
}
impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            location: default_location(),
            enabled_versions: None,
        }
    }
}

pub mod loader {
    use super::AppConfig;
    use ::config::{Config, Environment, File};
    use std::path::{Path, PathBuf};

    pub const DEFAULT_CONFIG_FILE: &str = "hcp-frontend.toml";

    pub fn load_config(path: Option<&str>) -> Result<AppConfig, String> {
        let mut builder = Config::builder();
        let pathbuf = PathBuf::from(path.unwrap_or(DEFAULT_CONFIG_FILE));
        if pathbuf.exists() {
            builder = builder.add_source(File::from(pathbuf));
        }
        // Environment variable overrides, e.g., HCP__API__LOCATION=westus3
        builder = builder.add_source(
            Environment::with_prefix("HCP")
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: AppConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        merged.validate()?;
        Ok(merged)
    }

    pub fn load_config_with_default_path<P: AsRef<Path>>(
        path: Option<P>,
    ) -> Result<AppConfig, String> {
        let p = path
            .as_ref()
            .map(|p| p.as_ref().to_string_lossy().to_string());
        load_config(p.as_deref())
    }
}
