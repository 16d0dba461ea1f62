//! Configuration module
//!
//! `AppConfig` is read from a TOML file
//! (`~/.config/onboarding-engine/config.toml` by default, or the path in
//! `ONBOARDING_CONFIG`). Every section and key is optional.
//!
//! ```toml
//! [logging]
//! level = "debug"
//! format = "json"
//!
//! [persistence]
//! data_dir = "/var/lib/onboarding"
//! debounce_ms = 500
//!
//! [autosave]
//! enabled = true
//! debounce_ms = 2000
//!
//! [calculator]
//! margin = 0.2
//!
//! [validation]
//! presentationOverride = ["fees"]
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::application::{
    AutoFillConfig, AutoSaveConfig, CalculatorConfig, LocalCacheConfig, SessionSettings,
    ValidationPolicy,
};
use crate::shared::{InfraError, InfraResult};

pub const CONFIG_ENV: &str = "ONBOARDING_CONFIG";
const APP_DIR: &str = "onboarding-engine";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, overridden by `RUST_LOG`
    pub level: String,
    /// `text` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    /// Directory of the file store; the user data dir when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    /// Debounce of ordinary local writes
    pub debounce_ms: u64,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            debounce_ms: LocalCacheConfig::default().debounce_ms,
        }
    }
}

impl PersistenceConfig {
    pub fn local_cache(&self) -> LocalCacheConfig {
        LocalCacheConfig {
            debounce_ms: self.debounce_ms,
        }
    }

    /// `data_dir`, or the per-user data directory
    pub fn resolved_data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(default_data_dir)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub dispose_timeout_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            dispose_timeout_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub persistence: PersistenceConfig,
    pub autosave: AutoSaveConfig,
    pub calculator: CalculatorConfig,
    pub autofill: AutoFillConfig,
    pub validation: ValidationPolicy,
    pub session: SessionConfig,
}

impl AppConfig {
    /// Read the config at `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> InfraResult<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e.into()),
        };
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> InfraResult<Self> {
        toml::from_str(content).map_err(|e| InfraError::Config(e.to_string()))
    }

    pub fn to_toml(&self) -> InfraResult<String> {
        toml::to_string_pretty(self).map_err(|e| InfraError::Config(e.to_string()))
    }

    /// Settings handed to the session builder
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            local_cache: self.persistence.local_cache(),
            auto_save: self.autosave.clone(),
            calculator: self.calculator.clone(),
            auto_fill: self.autofill.clone(),
            validation: self.validation.clone(),
            dispose_timeout: Duration::from_secs(self.session.dispose_timeout_secs),
        }
    }
}

/// `ONBOARDING_CONFIG` if set, else the file under the user config dir
pub fn config_path_from_env() -> PathBuf {
    std::env::var(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| default_config_path())
}

pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("config.toml")
}

pub fn default_data_dir() -> PathBuf {
    dirs_next::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OnboardingStep;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.session_settings().dispose_timeout, Duration::from_secs(5));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(
            br#"
            [logging]
            level = "debug"

            [persistence]
            data_dir = "/tmp/onboarding"
            debounce_ms = 250

            [calculator]
            margin = 0.35

            [validation]
            presentationOverride = ["fees", "consents"]
            "#,
        )
        .unwrap();

        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "text");
        assert_eq!(
            config.persistence.resolved_data_dir(),
            PathBuf::from("/tmp/onboarding")
        );

        let settings = config.session_settings();
        assert_eq!(settings.local_cache.debounce_ms, 250);
        assert_eq!(settings.calculator.margin, 0.35);
        assert_eq!(settings.calculator.debounce_ms, 300);
        assert!(settings.auto_save.enabled);
        assert!(settings.validation.overrides(OnboardingStep::Fees));
        assert!(!settings.validation.overrides(OnboardingStep::Contact));
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"[logging\nlevel = ").unwrap();
        assert!(matches!(
            AppConfig::load(file.path()),
            Err(InfraError::Config(_))
        ));
    }

    #[test]
    fn defaults_survive_a_toml_round_trip() {
        let config = AppConfig::default();
        let parsed = AppConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }
}
