//! OAuth web flow with GitHub, followed by the Travis token exchange
//!
//! GitHub issues a one-time code to the redirect URL after the user approves
//! the app. That code is traded for a GitHub access token, which Travis in
//! turn accepts in exchange for a Travis API token.
//! See: https://docs.github.com/en/apps/oauth-apps/building-oauth-apps/authorizing-oauth-apps#web-application-flow

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::core::config::Config;
use crate::error::{BuildTrackerError, Result};

/// GitHub authorization page
pub const AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";

/// GitHub OAuth token endpoint
pub const TOKEN_URL: &str = "https://github.com/login/oauth/access_token";

/// Travis endpoint exchanging a GitHub token for a Travis token
pub const TRAVIS_AUTH_PATH: &str = "auth/github";

/// Access token issued by the source host (GitHub)
#[derive(Debug, Clone)]
pub struct SourceHostToken {
    pub token: SecretString,
    /// Token type (usually "bearer")
    pub token_type: String,
    /// Granted scopes
    pub scope: String,
}

/// Access token issued by the CI provider (Travis)
#[derive(Debug, Clone)]
pub struct CiToken {
    pub token: SecretString,
}

/// Serializable form of [`SourceHostToken`]
///
/// Uses plain strings since SecretString doesn't implement Serialize.
/// Field names match GitHub's token response so it doubles as the decoder.
#[derive(Debug, Serialize, Deserialize)]
pub struct StoredSourceHostToken {
    pub access_token: String,
    pub token_type: String,
    pub scope: String,
}

/// Serializable form of [`CiToken`], also Travis' token response
#[derive(Debug, Serialize, Deserialize)]
pub struct StoredCiToken {
    pub access_token: String,
}

impl SourceHostToken {
    pub fn to_stored(&self) -> StoredSourceHostToken {
        StoredSourceHostToken {
            access_token: self.token.expose_secret().to_string(),
            token_type: self.token_type.clone(),
            scope: self.scope.clone(),
        }
    }

    pub fn from_stored(stored: StoredSourceHostToken) -> Self {
        Self {
            token: SecretString::from(stored.access_token),
            token_type: stored.token_type,
            scope: stored.scope,
        }
    }
}

impl CiToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: SecretString::from(token.into()),
        }
    }

    pub fn to_stored(&self) -> StoredCiToken {
        StoredCiToken {
            access_token: self.token.expose_secret().to_string(),
        }
    }

    pub fn from_stored(stored: StoredCiToken) -> Self {
        Self::new(stored.access_token)
    }
}

/// Code exchange request body (GitHub)
#[derive(Serialize)]
pub(crate) struct CodeExchangeRequest<'a> {
    pub client_id: &'a str,
    pub client_secret: &'a str,
    pub code: &'a str,
    pub state: &'a str,
}

/// Token exchange request body (Travis)
#[derive(Serialize)]
pub(crate) struct TravisAuthRequest<'a> {
    pub github_token: &'a str,
}

/// Error response from GitHub's token endpoint
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorResponse {
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
}

/// Generate a fresh anti-forgery state token
pub fn new_state_token() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Build the GitHub authorization URL the user has to visit
pub fn authorize_url(config: &Config, state: &str) -> Result<Url> {
    let mut url = Url::parse(AUTHORIZE_URL)
        .map_err(|e| BuildTrackerError::Config(format!("Invalid authorize URL: {}", e)))?;
    url.query_pairs_mut()
        .append_pair("allow_signup", "false")
        .append_pair("client_id", &config.github_client_id)
        .append_pair("state", state)
        .append_pair("scope", &config.oauth_scopes);
    Ok(url)
}

/// Authorization code and echoed state from the OAuth redirect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationCallback {
    pub code: String,
    pub state: String,
}

/// Extract `code` and `state` from the redirect URL GitHub sent the user to
pub fn parse_callback(redirect: &str) -> Result<AuthorizationCallback> {
    let url = Url::parse(redirect.trim())
        .map_err(|e| BuildTrackerError::InvalidInput(format!("Not a valid URL: {}", e)))?;

    let mut code = None;
    let mut state = None;
    let mut error = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            _ => {}
        }
    }

    if let Some(error) = error {
        if error == "access_denied" {
            return Err(BuildTrackerError::Cancelled);
        }
        return Err(BuildTrackerError::InvalidInput(format!(
            "GitHub returned an error: {}",
            error
        )));
    }

    match (code, state) {
        (Some(code), Some(state)) => Ok(AuthorizationCallback { code, state }),
        _ => Err(BuildTrackerError::InvalidInput(
            "The redirect URL must contain both 'code' and 'state'".to_string(),
        )),
    }
}
