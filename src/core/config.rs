//! Application configuration management
//!
//! Handles loading and saving application settings including:
//! - Travis API endpoint
//! - GitHub OAuth app credentials and scopes
//! - Where credentials and tracked repositories are stored

use std::fs;
use std::path::PathBuf;

use directories::ProjectDirs;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::{BuildTrackerError, Result};

/// Environment variable overriding the configured GitHub client secret
pub const CLIENT_SECRET_ENV: &str = "BT_GITHUB_CLIENT_SECRET";

/// Where credentials are persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum CredentialBackend {
    /// System keyring (default)
    #[default]
    Keyring,
    /// JSON files in the data directory, for machines without a keyring
    File,
}

impl CredentialBackend {
    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "keyring" => Some(CredentialBackend::Keyring),
            "file" => Some(CredentialBackend::File),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CredentialBackend::Keyring => "keyring",
            CredentialBackend::File => "file",
        }
    }
}

impl std::fmt::Display for CredentialBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Travis API root
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// GitHub OAuth app client id
    #[serde(default)]
    pub github_client_id: String,

    /// GitHub OAuth app client secret
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_client_secret: Option<String>,

    /// Space separated scopes requested during login
    #[serde(default = "default_oauth_scopes")]
    pub oauth_scopes: String,

    #[serde(default)]
    pub credential_backend: CredentialBackend,

    /// Overrides the platform data directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

fn default_api_base_url() -> String {
    "https://api.travis-ci.com/".to_string()
}

fn default_oauth_scopes() -> String {
    "read:org repo_deployment repo:status user:email repo".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            github_client_id: String::new(),
            github_client_secret: None,
            oauth_scopes: default_oauth_scopes(),
            credential_backend: CredentialBackend::default(),
            data_dir: None,
        }
    }
}

impl Config {
    /// Load configuration from file, or create default if not exists
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let contents = fs::read_to_string(&config_path)?;
            let config: Config = toml::from_str(&contents)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(&config_path, contents)?;

        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    /// Directory holding tracked repositories and file-backed credentials
    ///
    /// Priority: explicit override > `data_dir` setting > platform default
    pub fn data_dir(&self, override_dir: Option<PathBuf>) -> Result<PathBuf> {
        if let Some(dir) = override_dir.or_else(|| self.data_dir.clone()) {
            return Ok(dir);
        }
        Ok(Self::project_dirs()?.data_dir().to_path_buf())
    }

    /// GitHub client id, or a hint on how to set one
    pub fn require_client_id(&self) -> Result<&str> {
        if self.github_client_id.is_empty() {
            return Err(BuildTrackerError::Config(
                "GitHub OAuth client id is not set.\n\n  → Run 'bt config set github-client-id <id>'."
                    .to_string(),
            ));
        }
        Ok(&self.github_client_id)
    }

    /// GitHub client secret, environment variable first
    pub fn client_secret(&self) -> Option<SecretString> {
        if let Ok(secret) = std::env::var(CLIENT_SECRET_ENV) {
            if !secret.is_empty() {
                return Some(SecretString::from(secret));
            }
        }
        self.github_client_secret
            .clone()
            .filter(|s| !s.is_empty())
            .map(SecretString::from)
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("com", "build-tracker", "build-tracker")
            .ok_or_else(|| BuildTrackerError::Config("Could not determine config directory".into()))
    }
}
