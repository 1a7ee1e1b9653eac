//! Configuration management for iconpack

pub mod schema;

pub use schema::{
    CacheConfig, Config, GeneralConfig, Mode, PipelineConfig, RasterParams, ResolveConfig,
    TrackingConfig, VectorParams,
};

use crate::error::{IconpackError, IconpackResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// File name looked up in the project directory and its parents
pub const LOCAL_CONFIG_FILE: &str = "iconpack.toml";

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default (user-level) config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("iconpack")
            .join("config.toml")
    }

    /// Walk up from `start` looking for `iconpack.toml`
    pub fn find_local_config(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .map(|dir| dir.join(LOCAL_CONFIG_FILE))
            .find(|candidate| candidate.is_file())
    }

    /// Load configuration, using defaults if the file does not exist
    pub async fn load(&self) -> IconpackResult<Config> {
        if !self.config_path.exists() {
            debug!("Config file not found, using defaults");
            return Ok(Config::default());
        }

        self.load_from_file(&self.config_path).await
    }

    /// Load configuration from a specific file
    ///
    /// The result is validated; a file that parses but cannot work is
    /// reported as invalid rather than failing later at first use.
    pub async fn load_from_file(&self, path: &Path) -> IconpackResult<Config> {
        let content = fs::read_to_string(path).await.map_err(|e| {
            IconpackError::io(format!("reading config from {}", path.display()), e)
        })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|e| IconpackError::ConfigInvalid {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        // Relative search roots are relative to the config file, not the cwd
        if let Some(base) = path.parent() {
            for dir in [
                &mut config.resolve.source_dir,
                &mut config.resolve.fallback_dir,
            ] {
                if let Some(relative) = dir.as_ref().filter(|d| d.is_relative()) {
                    *dir = Some(base.join(relative));
                }
            }
        }

        config
            .validate()
            .map_err(|reason| IconpackError::ConfigInvalid {
                path: path.to_path_buf(),
                reason,
            })?;

        Ok(config)
    }

    /// Save configuration to file
    pub async fn save(&self, config: &Config) -> IconpackResult<()> {
        self.ensure_config_dir().await?;

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).await.map_err(|e| {
            IconpackError::io(
                format!("writing config to {}", self.config_path.display()),
                e,
            )
        })?;

        info!("Configuration saved to {}", self.config_path.display());
        Ok(())
    }

    /// Ensure the config directory exists
    async fn ensure_config_dir(&self) -> IconpackResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| IconpackError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        Ok(())
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}
