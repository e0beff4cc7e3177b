//! Operator Configuration
//!
//! Loads and saves the CLI configuration from TOML files.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use shade_fill::FillConfig;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Config not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Full operator configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShadeConfig {
    /// Circuit key settings
    #[serde(default)]
    pub artifacts: ArtifactSettings,

    /// Proof generation settings
    #[serde(default)]
    pub prover: ProverSettings,

    /// Fill lifecycle settings
    #[serde(default)]
    pub fill: FillSettings,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl ShadeConfig {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if given, else the data directory's config if present,
    /// else defaults
    pub fn resolve(path: Option<&Path>, data_dir: &Path) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let default_path = default_config_path(data_dir);
                if default_path.exists() {
                    Self::load(&default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    /// Key directory, falling back to the data directory layout
    pub fn artifact_dir(&self, data_dir: &Path) -> PathBuf {
        self.artifacts
            .dir
            .clone()
            .unwrap_or_else(|| shade_zk::artifact_dir(data_dir))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.prover.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "Prover timeout must be greater than 0".to_string(),
            ));
        }

        let fill = &self.fill;
        for (name, secs) in [
            ("authorization_timeout_secs", fill.authorization_timeout_secs),
            ("approval_timeout_secs", fill.approval_timeout_secs),
            ("execution_timeout_secs", fill.execution_timeout_secs),
            ("confirmation_timeout_secs", fill.confirmation_timeout_secs),
        ] {
            if secs == 0 {
                return Err(ConfigError::Invalid(format!("{} must be greater than 0", name)));
            }
        }

        // a proof that outlives the authorization can never be executed
        if fill.authorization_ttl_secs <= fill.authorization_timeout_secs {
            return Err(ConfigError::Invalid(
                "Authorization TTL must exceed the authorization timeout".to_string(),
            ));
        }

        if !matches!(self.logging.format.as_str(), "text" | "json") {
            return Err(ConfigError::Invalid(format!(
                "Unknown log format: {}",
                self.logging.format
            )));
        }

        Ok(())
    }
}

/// Circuit key settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtifactSettings {
    /// Key directory; defaults to `<data-dir>/keys`
    pub dir: Option<PathBuf>,

    /// Setup seed for reproducible development keys
    pub seed: Option<u64>,
}

/// Proof generation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProverSettings {
    /// Upper bound on a single proof, in seconds
    pub timeout_secs: u64,
}

impl Default for ProverSettings {
    fn default() -> Self {
        Self { timeout_secs: 120 }
    }
}

impl ProverSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Fill lifecycle settings, in seconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillSettings {
    pub authorization_timeout_secs: u64,
    pub approval_timeout_secs: u64,
    pub execution_timeout_secs: u64,
    pub confirmation_timeout_secs: u64,
    pub authorization_ttl_secs: u64,
}

impl Default for FillSettings {
    fn default() -> Self {
        let defaults = FillConfig::default();
        Self {
            authorization_timeout_secs: defaults.authorization_timeout.as_secs(),
            approval_timeout_secs: defaults.approval_timeout.as_secs(),
            execution_timeout_secs: defaults.execution_timeout.as_secs(),
            confirmation_timeout_secs: defaults.confirmation_timeout.as_secs(),
            authorization_ttl_secs: defaults.authorization_ttl.as_secs(),
        }
    }
}

impl FillSettings {
    pub fn to_fill_config(&self) -> FillConfig {
        FillConfig {
            authorization_timeout: Duration::from_secs(self.authorization_timeout_secs),
            approval_timeout: Duration::from_secs(self.approval_timeout_secs),
            execution_timeout: Duration::from_secs(self.execution_timeout_secs),
            confirmation_timeout: Duration::from_secs(self.confirmation_timeout_secs),
            authorization_ttl: Duration::from_secs(self.authorization_ttl_secs),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level
    pub level: String,

    /// Output format (text, json)
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

/// Get default data directory
pub fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("xyz", "shade", "shade")
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".shade"))
}

/// Get default config file path
pub fn default_config_path(data_dir: &Path) -> PathBuf {
    data_dir.join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = ShadeConfig::default();
        assert_eq!(config.prover.timeout_secs, 120);
        assert_eq!(config.fill.to_fill_config(), FillConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_save_load_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = ShadeConfig::default();
        config.artifacts.seed = Some(7);
        config.logging.format = "json".to_string();
        config.save(&path).unwrap();

        let loaded = ShadeConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[prover]\ntimeout_secs = 30\n").unwrap();

        let loaded = ShadeConfig::load(&path).unwrap();
        assert_eq!(loaded.prover.timeout(), Duration::from_secs(30));
        assert_eq!(loaded.fill, FillSettings::default());
    }

    #[test]
    fn test_resolve_without_file() {
        let dir = tempdir().unwrap();
        let config = ShadeConfig::resolve(None, dir.path()).unwrap();
        assert_eq!(config, ShadeConfig::default());
        assert_eq!(config.artifact_dir(dir.path()), dir.path().join("keys"));

        let missing = dir.path().join("missing.toml");
        assert!(matches!(
            ShadeConfig::resolve(Some(&missing), dir.path()),
            Err(ConfigError::NotFound(_))
        ));
    }

    #[test]
    fn test_invalid_ttl() {
        let config = ShadeConfig {
            fill: FillSettings {
                authorization_ttl_secs: 30, // shorter than the authorization timeout
                ..Default::default()
            },
            ..Default::default()
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_log_format() {
        let mut config = ShadeConfig::default();
        config.logging.format = "xml".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
