//! Durable credential storage
//!
//! Holds the three pieces of identity state:
//! - GitHub (source host) OAuth token
//! - Travis (CI) API token
//! - The authenticated Travis account profile
//!
//! Each setter persists its field before returning. Reads treat the two
//! tokens as one unit: a half-written pair restores as logged out.

use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::api::auth::{CiToken, SourceHostToken, StoredCiToken, StoredSourceHostToken};
use crate::api::models::AccountProfile;
use crate::core::storage::Storage;
use crate::error::{BuildTrackerError, Result};

pub const SOURCE_HOST_TOKEN_KEY: &str = "source-host-token";
pub const CI_TOKEN_KEY: &str = "ci-token";
pub const ACCOUNT_PROFILE_KEY: &str = "account-profile";

/// Credential store for token and profile management
pub struct CredentialStore<S: Storage> {
    storage: S,
    source_host_token: Option<SourceHostToken>,
    ci_token: Option<CiToken>,
    account_profile: Option<AccountProfile>,
}

impl<S: Storage> CredentialStore<S> {
    /// Create an empty store on top of `storage`; call [`load`](Self::load) to restore
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            source_host_token: None,
            ci_token: None,
            account_profile: None,
        }
    }

    /// Create a store and restore persisted state
    pub fn open(storage: S) -> Self {
        let mut store = Self::new(storage);
        store.load();
        store
    }

    /// Restore tokens and profile from storage
    ///
    /// Missing or unreadable tokens leave the whole store logged out.
    pub fn load(&mut self) {
        self.source_host_token = None;
        self.ci_token = None;
        self.account_profile = None;

        let source_host: Option<StoredSourceHostToken> = self.read_entry(SOURCE_HOST_TOKEN_KEY);
        let ci: Option<StoredCiToken> = self.read_entry(CI_TOKEN_KEY);
        let (Some(source_host), Some(ci)) = (source_host, ci) else {
            tracing::debug!("no complete credential pair stored");
            return;
        };

        self.source_host_token = Some(SourceHostToken::from_stored(source_host));
        self.ci_token = Some(CiToken::from_stored(ci));
        self.account_profile = self.read_entry(ACCOUNT_PROFILE_KEY);
    }

    /// Read and decode one entry, degrading any failure to `None`
    fn read_entry<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.storage.read(key) {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(key, error = %e, "credential entry unreadable");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key, error = %e, "credential entry undecodable");
                None
            }
        }
    }

    fn write_entry<T: Serialize>(&self, key: &str, value: Option<&T>) -> Result<()> {
        match value {
            Some(value) => {
                let json = serde_json::to_string(value).map_err(|e| {
                    BuildTrackerError::Storage(format!("Failed to serialize {}: {}", key, e))
                })?;
                self.storage.write(key, &json)
            }
            None => self.storage.remove(key),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Setters
    // ─────────────────────────────────────────────────────────────────────────

    /// Store (or with `None`, delete) the GitHub token
    pub fn set_source_host_token(&mut self, token: Option<SourceHostToken>) -> Result<()> {
        self.write_entry(
            SOURCE_HOST_TOKEN_KEY,
            token.as_ref().map(SourceHostToken::to_stored).as_ref(),
        )?;
        self.source_host_token = token;
        Ok(())
    }

    /// Store (or with `None`, delete) the Travis token
    pub fn set_ci_token(&mut self, token: Option<CiToken>) -> Result<()> {
        self.write_entry(CI_TOKEN_KEY, token.as_ref().map(CiToken::to_stored).as_ref())?;
        self.ci_token = token;
        Ok(())
    }

    /// Store (or with `None`, delete) the account profile
    pub fn set_account_profile(&mut self, profile: Option<AccountProfile>) -> Result<()> {
        self.write_entry(ACCOUNT_PROFILE_KEY, profile.as_ref())?;
        self.account_profile = profile;
        Ok(())
    }

    /// Forget all credentials
    ///
    /// In-memory state is cleared even if a storage delete fails; the first
    /// failure is returned.
    pub fn logout(&mut self) -> Result<()> {
        self.source_host_token = None;
        self.ci_token = None;
        self.account_profile = None;

        let results = [
            self.storage.remove(SOURCE_HOST_TOKEN_KEY),
            self.storage.remove(CI_TOKEN_KEY),
            self.storage.remove(ACCOUNT_PROFILE_KEY),
        ];
        results.into_iter().collect::<Result<Vec<()>>>()?;

        tracing::info!("credentials cleared");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn is_authenticated(&self) -> bool {
        self.source_host_token.is_some() && self.ci_token.is_some()
    }

    pub fn source_host_token(&self) -> Option<&SourceHostToken> {
        self.source_host_token.as_ref()
    }

    pub fn ci_token(&self) -> Option<&CiToken> {
        self.ci_token.as_ref()
    }

    pub fn account_profile(&self) -> Option<&AccountProfile> {
        self.account_profile.as_ref()
    }

    /// Get the Travis token, returning an error if not authenticated
    pub fn require_ci_token(&self) -> Result<&CiToken> {
        self.ci_token.as_ref().ok_or(BuildTrackerError::Unauthenticated)
    }
}

/// Get a masked version of a token for display (shows first 4 and last 4 chars)
pub fn mask_token(token: &SecretString) -> String {
    let chars: Vec<char> = token.expose_secret().chars().collect();
    if chars.len() <= 8 {
        "*".repeat(chars.len())
    } else {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    }
}
