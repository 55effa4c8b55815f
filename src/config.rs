use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Directory name used under the platform configuration directory.
const APP_DIR: &str = "achievement-log";

/// Environment variable overriding [`PipelineConfig::repo_path`].
pub const REPO_ENV: &str = "ACHIEVEMENT_LOG_REPO";

/// Cross-platform configuration directory manager
pub struct ConfigManager;

impl ConfigManager {
    /// Get the main configuration directory path following platform conventions:
    /// - Linux: $XDG_CONFIG_HOME/achievement-log or ~/.config/achievement-log
    /// - macOS: ~/Library/Application Support/achievement-log
    /// - Windows: %APPDATA%\achievement-log
    pub fn config_dir() -> Result<PathBuf> {
        #[cfg(target_os = "linux")]
        {
            if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
                Ok(PathBuf::from(xdg_config).join(APP_DIR))
            } else {
                let home = dirs::home_dir().context("Failed to get home directory")?;
                Ok(home.join(".config").join(APP_DIR))
            }
        }

        #[cfg(not(target_os = "linux"))]
        {
            Ok(dirs::config_dir()
                .context("Failed to get config directory")?
                .join(APP_DIR))
        }
    }

    /// Get the pipeline config file path (config.toml)
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Get the log file path
    pub fn log_file_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("achievement-log.log"))
    }

    /// Ensure the configuration directory exists
    pub fn ensure_config_dir() -> Result<PathBuf> {
        let config_dir = Self::config_dir()?;
        fs::create_dir_all(&config_dir)
            .with_context(|| format!("Failed to create {}", config_dir.display()))?;
        Ok(config_dir)
    }
}

/// Author identity written into commits when the repository has none configured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

impl Default for Identity {
    fn default() -> Self {
        Identity {
            name: "Achievement Log".to_string(),
            email: "achievement-log@localhost".to_string(),
        }
    }
}

/// Everything the commit pipeline needs to know about its repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Working tree of the log repository
    #[serde(default = "default_repo_path")]
    pub repo_path: PathBuf,

    /// Branch entries are committed to and pushed from
    #[serde(default = "default_branch")]
    pub branch: String,

    /// Name of the remote pushed to
    #[serde(default = "default_remote_name")]
    pub remote_name: String,

    /// URL of the remote, without credentials.
    /// When unset, an existing remote is used as-is.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_url: Option<String>,

    /// Environment variable holding the push token
    #[serde(default = "default_token_env")]
    pub token_env: String,

    #[serde(default)]
    pub identity: Identity,
}

fn default_repo_path() -> PathBuf {
    PathBuf::from(".")
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_remote_name() -> String {
    "origin".to_string()
}

fn default_token_env() -> String {
    "GITHUB_TOKEN".to_string()
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            repo_path: default_repo_path(),
            branch: default_branch(),
            remote_name: default_remote_name(),
            remote_url: None,
            token_env: default_token_env(),
            identity: Identity::default(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from the default location, applying environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&ConfigManager::config_file_path()?)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a file, returning defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<()> {
        self.save_to(&ConfigManager::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(repo) = std::env::var(REPO_ENV) {
            if !repo.trim().is_empty() {
                self.repo_path = PathBuf::from(repo);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_config_paths() {
        let config_dir = ConfigManager::config_dir().unwrap();
        assert!(config_dir.to_string_lossy().contains("achievement-log"));

        let config = ConfigManager::config_file_path().unwrap();
        assert!(config.to_string_lossy().ends_with("config.toml"));

        let log = ConfigManager::log_file_path().unwrap();
        assert!(log.to_string_lossy().ends_with("achievement-log.log"));
    }

    #[test]
    #[serial]
    #[cfg(target_os = "linux")]
    fn test_xdg_config_home_respected() {
        std::env::set_var("XDG_CONFIG_HOME", "/tmp/test-xdg-config");
        let config_dir = ConfigManager::config_dir().unwrap();
        assert!(config_dir
            .to_string_lossy()
            .contains("/tmp/test-xdg-config/achievement-log"));
        std::env::remove_var("XDG_CONFIG_HOME");
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let config = PipelineConfig::load_from(&temp.path().join("nope.toml")).unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.branch, "main");
        assert_eq!(config.remote_name, "origin");
        assert_eq!(config.token_env, "GITHUB_TOKEN");
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(
            &path,
            "repo_path = \"/srv/logs\"\nremote_url = \"https://github.com/o/r.git\"\n",
        )
        .unwrap();

        let config = PipelineConfig::load_from(&path).unwrap();
        assert_eq!(config.repo_path, PathBuf::from("/srv/logs"));
        assert_eq!(
            config.remote_url.as_deref(),
            Some("https://github.com/o/r.git")
        );
        assert_eq!(config.branch, "main");
        assert_eq!(config.identity, Identity::default());
    }

    #[test]
    fn test_save_then_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.toml");

        let config = PipelineConfig {
            repo_path: PathBuf::from("/data/achievements"),
            branch: "trunk".to_string(),
            identity: Identity {
                name: "Someone".to_string(),
                email: "someone@example.com".to_string(),
            },
            ..Default::default()
        };
        config.save_to(&path).unwrap();

        assert_eq!(PipelineConfig::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "branch = [").unwrap();
        assert!(PipelineConfig::load_from(&path).is_err());
    }

    #[test]
    #[serial]
    fn test_repo_env_override() {
        let mut config = PipelineConfig::default();
        std::env::set_var(REPO_ENV, "/from/env");
        config.apply_env_overrides();
        std::env::remove_var(REPO_ENV);
        assert_eq!(config.repo_path, PathBuf::from("/from/env"));
    }
}
