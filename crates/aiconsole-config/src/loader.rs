use std::path::{Path, PathBuf};

use aiconsole_common::{Error, Result};
use tracing::info;

use crate::model::AppConfig;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Directory holding the config file and, by default, the database.
    pub fn default_config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".aiconsole")
    }

    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    pub fn default_database_path() -> PathBuf {
        Self::default_config_dir().join("console.db")
    }

    /// Loads the TOML config at `path`, falling back to defaults when the
    /// file does not exist. Environment overrides are applied last.
    pub fn load(path: &Path) -> Result<AppConfig> {
        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(path)
                .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;
            let config: AppConfig = toml::from_str(&raw)
                .map_err(|e| Error::Config(format!("failed to parse {}: {e}", path.display())))?;
            info!("loaded config from {}", path.display());
            config
        } else {
            info!("no config file at {}, using defaults", path.display());
            AppConfig::default()
        };

        apply_env_overrides(&mut config);
        Ok(config)
    }
}

fn apply_env_overrides(config: &mut AppConfig) {
    if let Ok(key) = std::env::var("AICONSOLE_API_KEY") {
        if !key.is_empty() {
            config.llm.api_key = Some(key);
        }
    }
    if let Ok(url) = std::env::var("AICONSOLE_BASE_URL") {
        if !url.is_empty() {
            config.llm.base_url = Some(url);
        }
    }
}
