//! Transport error classification
//!
//! Maps reqwest failures and non-success HTTP statuses onto the
//! [`BuildTrackerError`] taxonomy so callers can branch on
//! offline / rejected / malformed instead of parsing messages.

use reqwest::StatusCode;

use crate::error::BuildTrackerError;

/// Classifies a reqwest error into a more specific BuildTrackerError
pub fn classify_reqwest_error(err: reqwest::Error) -> BuildTrackerError {
    if err.is_timeout() || err.is_connect() {
        return BuildTrackerError::NetworkUnavailable(err.to_string());
    }

    if err.is_decode() {
        return BuildTrackerError::DecodeFailure(err.to_string());
    }

    if let Some(status) = err.status() {
        return classify_status(status, &err.to_string());
    }

    if err.is_builder() {
        return BuildTrackerError::Config(format!("Invalid request: {}", err));
    }

    // Request/body errors without a status are connection level
    BuildTrackerError::NetworkUnavailable(err.to_string())
}

/// Classifies a non-success HTTP status
pub fn classify_status(status: StatusCode, body: &str) -> BuildTrackerError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => BuildTrackerError::Unauthenticated,
        StatusCode::NOT_FOUND => BuildTrackerError::NotFound(summarize_body(body)),
        StatusCode::REQUEST_TIMEOUT
        | StatusCode::BAD_GATEWAY
        | StatusCode::SERVICE_UNAVAILABLE
        | StatusCode::GATEWAY_TIMEOUT => {
            BuildTrackerError::NetworkUnavailable(format!("server answered {}", status))
        }
        _ => BuildTrackerError::Api {
            status: status.as_u16(),
            message: summarize_body(body),
        },
    }
}

/// Keep error bodies readable on a terminal
fn summarize_body(body: &str) -> String {
    const MAX_LEN: usize = 200;
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "empty response".to_string();
    }
    if trimmed.chars().count() <= MAX_LEN {
        trimmed.to_string()
    } else {
        let mut short: String = trimmed.chars().take(MAX_LEN - 1).collect();
        short.push('…');
        short
    }
}
