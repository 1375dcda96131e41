//! Configuration loading and management

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Backend service configuration
    #[serde(default)]
    pub backend: BackendConfig,

    /// Feature flags
    #[serde(default)]
    pub features: FeatureFlags,

    /// Session persistence settings
    #[serde(default)]
    pub session: SessionConfig,

    /// Default accreditation scope for commands that do not pass one
    #[serde(default)]
    pub scope: Option<ScopeConfig>,
}

impl Config {
    /// Load configuration from file or default locations
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = path
            .map(PathBuf::from)
            .or_else(|| {
                // Try .recycling-notes/config.toml in current directory
                let local = PathBuf::from(".recycling-notes/config.toml");
                if local.exists() {
                    return Some(local);
                }

                // Try ~/.recycling-notes/config.toml
                dirs::home_dir().map(|h| h.join(".recycling-notes/config.toml"))
            });

        match config_path {
            Some(p) if p.exists() => {
                let content = std::fs::read_to_string(&p)?;
                let config: Config = toml::from_str(&content)?;
                Ok(config)
            }
            _ => Ok(Config::default()),
        }
    }

    /// Where the CLI persists the per-user session between invocations
    pub fn session_path(&self) -> PathBuf {
        self.session.directory.join("session.json")
    }

    /// The feature-flag gate, checked once at the dispatch boundary. A
    /// disabled feature behaves as if the pages do not exist.
    pub fn ensure_notes_enabled(&self) -> Result<()> {
        if self.features.notes {
            Ok(())
        } else {
            Err(Error::NotFound("page".to_string()))
        }
    }
}

/// Backend service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the EPR backend resource API
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_base_url() -> String {
    "http://localhost:3001".to_string()
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

/// Feature flags
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureFlags {
    /// Whether the note issuance pages are available at all
    #[serde(default = "default_true")]
    pub notes: bool,
}

fn default_true() -> bool {
    true
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            notes: default_true(),
        }
    }
}

/// Session persistence settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Directory the session file lives in
    #[serde(default = "default_session_dir")]
    pub directory: PathBuf,
}

fn default_session_dir() -> PathBuf {
    PathBuf::from(".recycling-notes")
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            directory: default_session_dir(),
        }
    }
}

/// Default accreditation scope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopeConfig {
    pub organisation_id: String,
    pub registration_id: String,
    pub accreditation_id: String,
}

/// Initialize .recycling-notes directory
pub fn init() -> Result<()> {
    let config_dir = PathBuf::from(".recycling-notes");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
    }

    // Create default config if it doesn't exist
    let config_path = config_dir.join("config.toml");
    if !config_path.exists() {
        let default_config = Config::default();
        let config_str =
            toml::to_string_pretty(&default_config).map_err(|e| Error::Config(e.to_string()))?;
        std::fs::write(&config_path, config_str)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_enable_notes() {
        let config = Config::default();
        assert!(config.features.notes);
        assert!(config.ensure_notes_enabled().is_ok());
    }

    #[test]
    fn test_disabled_flag_maps_to_not_found() {
        let config = Config {
            features: FeatureFlags { notes: false },
            ..Config::default()
        };
        assert!(matches!(
            config.ensure_notes_enabled(),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_parses_partial_config() {
        let config: Config = toml::from_str(
            r#"
            [backend]
            base_url = "https://epr-backend.internal"

            [features]
            notes = false
            "#,
        )
        .unwrap();

        assert_eq!(config.backend.base_url, "https://epr-backend.internal");
        assert!(!config.features.notes);
        assert_eq!(config.session.directory, PathBuf::from(".recycling-notes"));
    }

    #[test]
    fn test_load_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config.backend.base_url, "http://localhost:3001");
    }

    #[test]
    fn test_scope_section_is_optional() {
        let config: Config = toml::from_str(
            r#"
            [scope]
            organisation_id = "org-1"
            registration_id = "reg-2"
            accreditation_id = "acc-3"
            "#,
        )
        .unwrap();

        let scope = config.scope.unwrap();
        assert_eq!(scope.organisation_id, "org-1");
    }
}
