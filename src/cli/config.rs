//! Configuration CLI command handlers

use std::path::PathBuf;

use url::Url;

use crate::cli::commands::{ConfigCommand, ConfigKey};
use crate::core::config::{Config, CredentialBackend, CLIENT_SECRET_ENV};
use crate::core::credentials::mask_token;
use crate::error::{BuildTrackerError, Result};

/// Handle configuration commands
pub fn handle_config(command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Set { key, value } => handle_set(key, value),
        ConfigCommand::Get { key } => handle_get(key),
        ConfigCommand::Remove { key } => handle_remove(key),
        ConfigCommand::Path => {
            println!("{}", Config::config_path()?.display());
            Ok(())
        }
    }
}

/// Handle setting a configuration value
fn handle_set(key: ConfigKey, value: String) -> Result<()> {
    let mut config = Config::load()?;
    apply(&mut config, key, value)?;
    config.save()?;
    println!("✓ {} updated.", key_name(key));
    Ok(())
}

/// Validate and store `value` under `key`
fn apply(config: &mut Config, key: ConfigKey, value: String) -> Result<()> {
    match key {
        ConfigKey::ApiBaseUrl => {
            Url::parse(&value).map_err(|e| {
                BuildTrackerError::InvalidInput(format!("Invalid URL '{}': {}", value, e))
            })?;
            // Url::join drops the last segment without a trailing slash
            config.api_base_url = if value.ends_with('/') {
                value
            } else {
                format!("{}/", value)
            };
        }
        ConfigKey::GithubClientId => config.github_client_id = value,
        ConfigKey::GithubClientSecret => config.github_client_secret = Some(value),
        ConfigKey::OauthScopes => config.oauth_scopes = value,
        ConfigKey::CredentialBackend => {
            config.credential_backend = CredentialBackend::from_str(&value).ok_or_else(|| {
                BuildTrackerError::InvalidInput(format!(
                    "Invalid credential backend '{}'. Available backends: keyring, file",
                    value
                ))
            })?;
        }
        ConfigKey::DataDir => config.data_dir = Some(PathBuf::from(value)),
    }
    Ok(())
}

/// Handle getting a configuration value
fn handle_get(key: ConfigKey) -> Result<()> {
    let config = Config::load()?;
    println!("{}: {}", key_name(key), describe(&config, key));
    Ok(())
}

fn describe(config: &Config, key: ConfigKey) -> String {
    match key {
        ConfigKey::ApiBaseUrl => config.api_base_url.clone(),
        ConfigKey::GithubClientId if config.github_client_id.is_empty() => {
            "Not configured".to_string()
        }
        ConfigKey::GithubClientId => config.github_client_id.clone(),
        ConfigKey::GithubClientSecret => match config.client_secret() {
            Some(secret) => mask_token(&secret),
            None => format!("Not configured (or set {})", CLIENT_SECRET_ENV),
        },
        ConfigKey::OauthScopes => config.oauth_scopes.clone(),
        ConfigKey::CredentialBackend => config.credential_backend.to_string(),
        ConfigKey::DataDir => match config.data_dir(None) {
            Ok(dir) => dir.display().to_string(),
            Err(e) => e.to_string(),
        },
    }
}

/// Handle resetting a configuration value
fn handle_remove(key: ConfigKey) -> Result<()> {
    let mut config = Config::load()?;
    let defaults = Config::default();
    match key {
        ConfigKey::ApiBaseUrl => config.api_base_url = defaults.api_base_url,
        ConfigKey::GithubClientId => config.github_client_id = defaults.github_client_id,
        ConfigKey::GithubClientSecret => config.github_client_secret = None,
        ConfigKey::OauthScopes => config.oauth_scopes = defaults.oauth_scopes,
        ConfigKey::CredentialBackend => config.credential_backend = defaults.credential_backend,
        ConfigKey::DataDir => config.data_dir = None,
    }
    config.save()?;
    println!("✓ {} reset to default.", key_name(key));
    Ok(())
}

fn key_name(key: ConfigKey) -> &'static str {
    match key {
        ConfigKey::ApiBaseUrl => "API base URL",
        ConfigKey::GithubClientId => "GitHub client id",
        ConfigKey::GithubClientSecret => "GitHub client secret",
        ConfigKey::OauthScopes => "OAuth scopes",
        ConfigKey::CredentialBackend => "Credential backend",
        ConfigKey::DataDir => "Data directory",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_base_url_adds_trailing_slash() {
        let mut config = Config::default();
        apply(&mut config, ConfigKey::ApiBaseUrl, "http://localhost:8080/api".into()).unwrap();
        assert_eq!(config.api_base_url, "http://localhost:8080/api/");
    }

    #[test]
    fn test_apply_rejects_bad_values() {
        let mut config = Config::default();
        assert!(apply(&mut config, ConfigKey::ApiBaseUrl, "not a url".into()).is_err());
        assert!(apply(&mut config, ConfigKey::CredentialBackend, "vault".into()).is_err());
        assert_eq!(config.credential_backend, CredentialBackend::Keyring);
    }

    #[test]
    fn test_apply_backend() {
        let mut config = Config::default();
        apply(&mut config, ConfigKey::CredentialBackend, "file".into()).unwrap();
        assert_eq!(config.credential_backend, CredentialBackend::File);
    }
}
