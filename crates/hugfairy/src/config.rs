//! Configuration management for hugfairy.
//!
//! Configuration is loaded from multiple sources with precedence:
//! 1. Environment variables (HUGFAIRY_*, HEALTHCHECKS_ENDPOINT)
//! 2. Config file (platform config dir, or HUGFAIRY_CONFIG)
//! 3. Default values
//!
//! The account password is never read from the config file.

use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use hugfairy_core::agent::Credentials;
use hugfairy_core::template::Selector;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// PDS connection settings
    #[serde(default)]
    pub service: ServiceConfig,

    /// Hashtag search settings
    #[serde(default)]
    pub search: SearchConfig,

    /// Reply template settings
    #[serde(default)]
    pub templates: TemplatesConfig,

    /// Paths
    #[serde(default)]
    pub paths: PathsConfig,

    /// Completion ping settings
    #[serde(default)]
    pub healthcheck: HealthcheckConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base URL of the PDS
    #[serde(default = "default_service_url")]
    pub url: String,

    /// Account identifier; HUGFAIRY_IDENTIFIER overrides
    pub identifier: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Hashtag to search, without the leading '#'
    #[serde(default = "default_tag")]
    pub tag: String,

    /// Results requested per page (API maximum is 100)
    #[serde(default = "default_page_limit")]
    pub limit: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplatesConfig {
    /// Template definitions file
    #[serde(default = "default_templates_path")]
    pub path: PathBuf,

    /// Template selection policy: "first" or "random"
    #[serde(default = "default_selection")]
    pub selection: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Base directory for hugfairy data
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Exported session file
    #[serde(default = "default_session_file")]
    pub session_file: PathBuf,

    /// Processed-up-to-here marker file
    #[serde(default = "default_cursor_file")]
    pub cursor_file: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HealthcheckConfig {
    /// Endpoint pinged after a completed run; HEALTHCHECKS_ENDPOINT overrides
    pub url: Option<String>,
}

// Default value functions
fn default_service_url() -> String {
    "https://bsky.social".to_string()
}

fn default_tag() -> String {
    "ineedahug".to_string()
}

fn default_page_limit() -> u8 {
    100
}

fn default_templates_path() -> PathBuf {
    default_data_dir().join("templates.json")
}

fn default_selection() -> String {
    "first".to_string()
}

fn default_data_dir() -> PathBuf {
    if let Some(proj_dirs) = ProjectDirs::from("app", "hugfairy", "hugfairy") {
        proj_dirs.data_dir().to_path_buf()
    } else {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".hugfairy")
    }
}

fn default_session_file() -> PathBuf {
    default_data_dir().join("session.json")
}

fn default_cursor_file() -> PathBuf {
    default_data_dir().join("latest.txt")
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            url: default_service_url(),
            identifier: None,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            tag: default_tag(),
            limit: default_page_limit(),
        }
    }
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            path: default_templates_path(),
            selection: default_selection(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            session_file: default_session_file(),
            cursor_file: default_cursor_file(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceConfig::default(),
            search: SearchConfig::default(),
            templates: TemplatesConfig::default(),
            paths: PathsConfig::default(),
            healthcheck: HealthcheckConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        let mut config = if config_path.exists() {
            let content =
                std::fs::read_to_string(&config_path).context("Failed to read config file")?;
            toml::from_str(&content).context("Failed to parse config file")?
        } else {
            Config::default()
        };

        if let Ok(url) = std::env::var("HEALTHCHECKS_ENDPOINT") {
            config.healthcheck.url = Some(url);
        }

        Ok(config)
    }

    /// Get the config file path.
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("HUGFAIRY_CONFIG") {
            PathBuf::from(path)
        } else {
            default_data_dir().join("config.toml")
        }
    }

    /// Parsed template selection policy.
    pub fn selector(&self) -> Result<Selector> {
        Selector::from_str(&self.templates.selection)
            .context("Invalid [templates] selection in config")
    }

    /// Resolve the login credentials. CLI/env values win over the file;
    /// the password has no file fallback.
    pub fn credentials(
        &self,
        identifier: Option<String>,
        password: Option<String>,
    ) -> Result<Credentials> {
        let Some(identifier) = identifier.or_else(|| self.service.identifier.clone()) else {
            bail!("No account identifier configured. Set HUGFAIRY_IDENTIFIER or [service] identifier.");
        };
        let Some(password) = password else {
            bail!("No password configured. Set HUGFAIRY_PASSWORD.");
        };
        Ok(Credentials {
            identifier,
            password,
        })
    }

    /// Ensure all required directories exist.
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.paths.data_dir)
            .context("Failed to create data directory")?;
        for file in [&self.paths.session_file, &self.paths.cursor_file] {
            if let Some(parent) = file.parent() {
                std::fs::create_dir_all(parent).context("Failed to create state directory")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.service.url, "https://bsky.social");
        assert_eq!(config.search.tag, "ineedahug");
        assert_eq!(config.search.limit, 100);
        assert_eq!(config.templates.selection, "first");
        assert!(config.healthcheck.url.is_none());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [search]
            tag = "hugsplease"

            [healthcheck]
            url = "https://hc-ping.example/uuid"
            "#,
        )
        .expect("Failed to parse config");

        assert_eq!(config.search.tag, "hugsplease");
        assert_eq!(config.search.limit, 100);
        assert_eq!(config.service.url, "https://bsky.social");
        assert_eq!(
            config.healthcheck.url.as_deref(),
            Some("https://hc-ping.example/uuid")
        );
    }

    #[test]
    fn test_selector_parsing() {
        let mut config = Config::default();
        assert_eq!(config.selector().unwrap(), Selector::First);

        config.templates.selection = "random".to_string();
        assert_eq!(config.selector().unwrap(), Selector::Random);

        config.templates.selection = "newest".to_string();
        assert!(config.selector().is_err());
    }

    #[test]
    fn test_credentials_precedence() {
        let mut config = Config::default();
        config.service.identifier = Some("file.example".to_string());

        let creds = config
            .credentials(Some("cli.example".to_string()), Some("pw".to_string()))
            .unwrap();
        assert_eq!(creds.identifier, "cli.example");

        let creds = config.credentials(None, Some("pw".to_string())).unwrap();
        assert_eq!(creds.identifier, "file.example");
    }

    #[test]
    fn test_credentials_require_password() {
        let config = Config::default();
        assert!(config
            .credentials(Some("cli.example".to_string()), None)
            .is_err());
    }

    #[test]
    fn test_ensure_dirs_creates_directories() {
        let temp = tempdir().expect("Failed to create temp dir");
        let config = Config {
            paths: PathsConfig {
                data_dir: temp.path().join("data"),
                session_file: temp.path().join("state").join("session.json"),
                cursor_file: temp.path().join("state").join("latest.txt"),
            },
            ..Config::default()
        };

        config.ensure_dirs().expect("Failed to create directories");

        assert!(config.paths.data_dir.exists());
        assert!(temp.path().join("state").exists());
    }
}
