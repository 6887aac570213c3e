use color_eyre::eyre::eyre;
use color_eyre::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cli::{AdminLevel, Language};

/// Manages config directory and config file operations
#[derive(Clone)]
pub struct ConfigManager {
    pub(crate) config_dir: PathBuf,
}

impl ConfigManager {
    /// Create a ConfigManager with a custom config directory (primarily for testing)
    pub fn with_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// Create a new ConfigManager for the given app name
    pub fn new(app_name: &str) -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| eyre!("Could not determine config directory"))?
            .join(app_name);

        Ok(Self { config_dir })
    }

    /// Get the config directory path
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Get path to a specific config file or subdirectory
    pub fn config_path(&self, path: &str) -> PathBuf {
        self.config_dir.join(path)
    }

    /// Ensure the config directory exists
    pub fn ensure_config_dir(&self) -> Result<()> {
        if !self.config_dir.exists() {
            std::fs::create_dir_all(&self.config_dir)?;
        }
        Ok(())
    }

    /// Write default configuration to config file
    pub fn write_default_config(&self, force: bool) -> Result<PathBuf> {
        let config_path = self.config_path("config.toml");

        if config_path.exists() && !force {
            return Err(eyre!(
                "Config file already exists at {}",
                config_path.display()
            ));
        }

        self.ensure_config_dir()?;
        std::fs::write(&config_path, DEFAULT_CONFIG_TEMPLATE)?;

        Ok(config_path)
    }
}

/// Application configuration; every field is optional and overridable
/// from the command line
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Directory holding the dataset Parquet files
    pub data_dir: Option<PathBuf>,
    /// Default UI language ("en" or "pl")
    pub language: Option<String>,
    /// Default administrative level ("district", "region" or "city")
    pub level: Option<String>,
    /// Directory CSV exports are written to when none is given on the CLI
    pub export_dir: Option<PathBuf>,
}

impl AppConfig {
    /// Load the config file, returning defaults when it does not exist
    pub fn load(manager: &ConfigManager) -> Result<Self> {
        let path = manager.config_path("config.toml");
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(&path)?;
        let config = toml::from_str(&contents)
            .map_err(|e| eyre!("Invalid config file {}: {}", path.display(), e))?;
        Ok(config)
    }

    pub fn language(&self) -> Option<Language> {
        match self.language.as_deref()?.to_lowercase().as_str() {
            "en" | "english" => Some(Language::En),
            "pl" | "polish" => Some(Language::Pl),
            _ => None,
        }
    }

    pub fn level(&self) -> Option<AdminLevel> {
        match self.level.as_deref()?.to_lowercase().as_str() {
            "district" => Some(AdminLevel::District),
            "region" => Some(AdminLevel::Region),
            "city" => Some(AdminLevel::City),
            _ => None,
        }
    }
}

const DEFAULT_CONFIG_TEMPLATE: &str = r#"# polstat configuration
# Values here are defaults; command-line flags take precedence.

# Directory holding the dataset Parquet files
# data_dir = "/path/to/data"

# UI language: "en" or "pl"
# language = "en"

# Administrative level: "district", "region" or "city"
# level = "district"

# Directory CSV exports are written to
# export_dir = "/path/to/exports"
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_config_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::with_dir(dir.path().to_path_buf());
        let config = AppConfig::load(&manager).unwrap();
        assert!(config.data_dir.is_none());
        assert!(config.language().is_none());
    }

    #[test]
    fn test_load_config_values() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::with_dir(dir.path().to_path_buf());
        manager.ensure_config_dir().unwrap();
        std::fs::write(
            manager.config_path("config.toml"),
            "language = \"pl\"\nlevel = \"region\"\n",
        )
        .unwrap();

        let config = AppConfig::load(&manager).unwrap();
        assert_eq!(config.language(), Some(Language::Pl));
        assert_eq!(config.level(), Some(AdminLevel::Region));
    }

    #[test]
    fn test_write_default_config_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::with_dir(dir.path().to_path_buf());
        manager.write_default_config(false).unwrap();
        assert!(manager.write_default_config(false).is_err());
        assert!(manager.write_default_config(true).is_ok());
    }
}
