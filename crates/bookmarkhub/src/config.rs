//! Configuration management for bookmarkhub.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::category::is_valid_color;
use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "bookmarkhub";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "bookmarkhub.db";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `BOOKMARKHUB_`, `__` between levels)
/// 2. TOML config file at `~/.config/bookmarkhub/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Listing and rendering configuration.
    pub display: DisplayConfig,
    /// Privacy space configuration.
    pub privacy: PrivacyConfig,
    /// Backup configuration.
    pub backup: BackupConfig,
    /// Category configuration.
    pub categories: CategoriesConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/bookmarkhub/bookmarkhub.db`
    pub database_path: Option<PathBuf>,
}

/// Listing-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Bookmarks shown per page.
    pub items_per_page: usize,
    /// Favicon lookup service; the bookmark host is appended.
    pub favicon_service: String,
}

/// Privacy-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrivacyConfig {
    /// Minimum length of a privacy space password.
    pub min_password_length: usize,
}

/// Backup-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupConfig {
    /// File name prefix for exported backups.
    pub file_prefix: String,
    /// Largest backup file accepted by import, in bytes.
    pub max_file_size: u64,
}

/// Category-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoriesConfig {
    /// Categories created for a fresh library.
    pub defaults: Vec<DefaultCategory>,
}

/// A category seeded into a fresh library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultCategory {
    /// Stable identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Hex colour.
    pub color: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            items_per_page: 30,
            favicon_service: "https://www.google.com/s2/favicons?domain=".to_string(),
        }
    }
}

impl Default for PrivacyConfig {
    fn default() -> Self {
        Self {
            min_password_length: 4,
        }
    }
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            file_prefix: "bookmarkhub-backup-".to_string(),
            max_file_size: 10 * 1024 * 1024, // 10MB
        }
    }
}

impl Default for CategoriesConfig {
    fn default() -> Self {
        Self {
            defaults: default_categories(),
        }
    }
}

/// Categories a fresh library starts with.
fn default_categories() -> Vec<DefaultCategory> {
    [
        ("work", "Work", "#2196F3"),
        ("study", "Study", "#4CAF50"),
        ("entertainment", "Entertainment", "#FF9800"),
        ("tools", "Tools", "#9C27B0"),
        ("news", "News", "#F44336"),
    ]
    .into_iter()
    .map(|(id, name, color)| DefaultCategory {
        id: id.to_string(),
        name: name.to_string(),
        color: color.to_string(),
    })
    .collect()
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file).nested())
            .merge(Env::prefixed("BOOKMARKHUB_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.display.items_per_page == 0 {
            return Err(Error::ConfigValidation {
                message: "items_per_page must be greater than 0".to_string(),
            });
        }

        if self.privacy.min_password_length == 0 {
            return Err(Error::ConfigValidation {
                message: "min_password_length must be greater than 0".to_string(),
            });
        }

        if self.backup.max_file_size == 0 {
            return Err(Error::ConfigValidation {
                message: "max_file_size must be greater than 0".to_string(),
            });
        }

        for category in &self.categories.defaults {
            if category.id.trim().is_empty() || category.name.trim().is_empty() {
                return Err(Error::ConfigValidation {
                    message: "default categories need an id and a name".to_string(),
                });
            }
            if !is_valid_color(&category.color) {
                return Err(Error::ConfigValidation {
                    message: format!(
                        "invalid colour '{}' for default category '{}'",
                        category.color, category.id
                    ),
                });
            }
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the file name used for a backup exported on `date`.
    #[must_use]
    pub fn backup_file_name(&self, date: chrono::NaiveDate) -> String {
        format!("{}{}.json", self.backup.file_prefix, date.format("%Y-%m-%d"))
    }
}
