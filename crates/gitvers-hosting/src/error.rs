//! Error types for gitvers-hosting

use thiserror::Error;

/// Errors that can occur while talking to the hosting service
#[derive(Error, Debug)]
pub enum HostingError {
    /// Credential rejected (HTTP 401)
    #[error("hosting service rejected the credential")]
    Unauthorized,

    /// Credential accepted but lacks permission, or rate limited (HTTP 403)
    #[error("hosting service refused the request: {0}")]
    Forbidden(String),

    /// Any other non-success status
    #[error("hosting service returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Connection, TLS or timeout failure
    #[error("hosting request failed: {0}")]
    Transport(String),

    /// Response body did not match the expected shape
    #[error("unexpected hosting response: {0}")]
    Decode(String),
}

impl HostingError {
    /// Whether the error means the credential itself is bad.
    pub fn is_authentication(&self) -> bool {
        matches!(self, HostingError::Unauthorized)
    }
}

impl From<reqwest::Error> for HostingError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            HostingError::Decode(err.without_url().to_string())
        } else {
            HostingError::Transport(err.without_url().to_string())
        }
    }
}
