//! Engine and application configuration.
//!
//! Every tunable of the progression rules is supplied from here rather than
//! hard-coded in the engine: level curves, the points ratio, level-up
//! bonuses and streak parameters. Stored as TOML in the platform data dir.

use crate::progression::leveling::LevelCurve;
use crate::progression::streak::StreakRules;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Rules that turn completions into XP, points and levels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionRules {
    /// Points granted per XP (floored)
    pub points_to_xp_ratio: f64,
    /// Points per level reached on a user level-up, multiplied by the level
    pub level_up_bonus: u64,
    /// Points per level reached on an area level-up, multiplied by the level
    pub area_level_up_bonus: u64,
    /// Curve for the global user level
    pub user_curve: LevelCurve,
    /// Curve shared by all life areas
    pub area_curve: LevelCurve,
    /// Streak window and multiplier settings
    pub streak: StreakRules,
}

impl Default for ProgressionRules {
    fn default() -> Self {
        Self {
            points_to_xp_ratio: 0.5,
            level_up_bonus: 10,
            area_level_up_bonus: 5,
            user_curve: LevelCurve::default(),
            area_curve: LevelCurve {
                base_xp_per_level: 100,
                multiplier: 1.15,
                max_level: 50,
            },
            streak: StreakRules::default(),
        }
    }
}

impl ProgressionRules {
    /// Reject rule sets that would break leveling or streak invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.user_curve
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("user_curve: {}", e)))?;
        self.area_curve
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("area_curve: {}", e)))?;

        if !self.points_to_xp_ratio.is_finite() || self.points_to_xp_ratio < 0.0 {
            return Err(ConfigError::Invalid(
                "points_to_xp_ratio must be a non-negative number".to_string(),
            ));
        }

        self.streak
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("streak: {}", e)))
    }
}

/// Storage-related settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Database file name, relative to the data directory
    pub database_file: String,
    /// How long a writer waits for the lock before failing, in milliseconds
    pub busy_timeout_ms: u64,
    /// Attempts made for an operation that hits a transient store error
    pub retry_attempts: u32,
    /// Delay before the first retry, doubled on each attempt
    pub retry_base_delay_ms: u64,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            database_file: "habitquest.db".to_string(),
            busy_timeout_ms: 5000,
            retry_attempts: 3,
            retry_base_delay_ms: 50,
        }
    }
}

impl StorageSettings {
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Application version
    pub version: String,
    /// Data directory path
    #[serde(skip)]
    pub data_dir: PathBuf,
    /// Progression rules
    pub progression: ProgressionRules,
    /// Storage settings
    pub storage: StorageSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            data_dir: PathBuf::new(),
            progression: ProgressionRules::default(),
            storage: StorageSettings::default(),
        }
    }
}

impl AppConfig {
    /// Full path of the database file.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.storage.database_file)
    }
}

/// Get the application data directory.
pub fn get_data_dir() -> PathBuf {
    directories::ProjectDirs::from("com", "habitquest", "HabitQuest")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Get the configuration file path.
pub fn get_config_path() -> PathBuf {
    get_data_dir().join("config.toml")
}

/// Load application configuration from the default location.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from(&get_config_path())
}

/// Load application configuration from a specific file.
///
/// A missing file yields the defaults. The data directory is the file's
/// parent directory.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    let data_dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(get_data_dir);

    if !path.exists() {
        tracing::debug!("No config at {}, using defaults", path.display());
        return Ok(AppConfig {
            data_dir,
            ..Default::default()
        });
    }

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

    let mut config: AppConfig =
        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;

    config.progression.validate()?;
    config.data_dir = data_dir;

    Ok(config)
}

/// Save application configuration to the default location.
pub fn save_config(config: &AppConfig) -> Result<(), ConfigError> {
    save_config_to(config, &get_config_path())
}

/// Save application configuration to a specific file.
pub fn save_config_to(config: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
    }

    let content =
        toml::to_string_pretty(config).map_err(|e| ConfigError::SerializeError(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

    Ok(())
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
