//! Custom error types for build-tracker
//!
//! User-friendly error messages for all failure scenarios.

use thiserror::Error;

/// Main error type for the build-tracker application
#[derive(Error, Debug)]
pub enum BuildTrackerError {
    /// No connectivity, timeout or unreachable host
    #[error("Cannot reach the server: {0}\n\n  → Check your internet connection and try again.")]
    NetworkUnavailable(String),

    /// Anti-forgery state token did not round-trip during the OAuth handshake
    #[error("Login was rejected: the authorization response did not match this login attempt.\n\n  → Run 'bt auth login' again.")]
    StateMismatch,

    /// Response did not match the expected schema
    #[error("Failed to parse response: {0}")]
    DecodeFailure(String),

    /// Operation needs a token that is not present or was rejected
    #[error("You are not logged in to Travis CI.\n\n  → Run 'bt auth login' to authenticate.")]
    Unauthenticated,

    /// Remote resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Remote API answered with an unexpected status
    #[error("Travis API request failed ({status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body or reason phrase
        message: String,
    },

    /// Credential storage error
    #[error("Cannot access secure storage: {0}\n\n  → On macOS: Make sure Keychain Access is available.\n  → On Linux: Ensure a secret service (like gnome-keyring) is running.\n  → Or run 'bt config set credential-backend file'.")]
    Credential(String),

    /// Local persistence error
    #[error("Cannot write local data: {0}")]
    Storage(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("File operation failed: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("Failed to encode data: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML serialization/deserialization error
    #[error("Configuration file is invalid: {0}")]
    Toml(String),

    /// Invalid input from user
    #[error("{0}")]
    InvalidInput(String),

    /// Operation cancelled by user
    #[error("Operation cancelled.")]
    Cancelled,
}

impl BuildTrackerError {
    /// True when the failure is a connectivity problem rather than a server answer
    pub fn is_offline(&self) -> bool {
        matches!(self, BuildTrackerError::NetworkUnavailable(_))
    }
}

impl From<keyring::Error> for BuildTrackerError {
    fn from(err: keyring::Error) -> Self {
        BuildTrackerError::Credential(err.to_string())
    }
}

impl From<toml::de::Error> for BuildTrackerError {
    fn from(err: toml::de::Error) -> Self {
        BuildTrackerError::Toml(err.to_string())
    }
}

impl From<toml::ser::Error> for BuildTrackerError {
    fn from(err: toml::ser::Error) -> Self {
        BuildTrackerError::Toml(err.to_string())
    }
}

impl From<reqwest::Error> for BuildTrackerError {
    fn from(err: reqwest::Error) -> Self {
        // Use the error handler to map transport failures onto the taxonomy
        crate::api::error_handler::classify_reqwest_error(err)
    }
}

/// Why a handshake attempt ended in `Failed`
///
/// A cloneable projection of [`BuildTrackerError`] so the reason can live in
/// the state machine and be broadcast to every listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    NetworkUnavailable,
    StateMismatch,
    DecodeFailure,
    Unauthenticated,
    Rejected(String),
    Storage(String),
}

impl From<&BuildTrackerError> for FailureReason {
    fn from(err: &BuildTrackerError) -> Self {
        match err {
            BuildTrackerError::NetworkUnavailable(_) => FailureReason::NetworkUnavailable,
            BuildTrackerError::StateMismatch => FailureReason::StateMismatch,
            BuildTrackerError::DecodeFailure(_) | BuildTrackerError::Json(_) => {
                FailureReason::DecodeFailure
            }
            BuildTrackerError::Unauthenticated => FailureReason::Unauthenticated,
            BuildTrackerError::Credential(msg) | BuildTrackerError::Storage(msg) => {
                FailureReason::Storage(msg.clone())
            }
            BuildTrackerError::Io(e) => FailureReason::Storage(e.to_string()),
            other => FailureReason::Rejected(other.to_string()),
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureReason::NetworkUnavailable => write!(f, "network unavailable"),
            FailureReason::StateMismatch => write!(f, "state mismatch"),
            FailureReason::DecodeFailure => write!(f, "unexpected response"),
            FailureReason::Unauthenticated => write!(f, "not authenticated"),
            FailureReason::Rejected(msg) => write!(f, "rejected: {}", msg),
            FailureReason::Storage(msg) => write!(f, "storage failure: {}", msg),
        }
    }
}

/// Result type alias using BuildTrackerError
pub type Result<T> = std::result::Result<T, BuildTrackerError>;
