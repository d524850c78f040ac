//! Error types shared by the providers and controllers.
//!
//! Provider errors never reach the presentation layer: the controllers turn
//! them into user-facing strings. They exist as types so the providers can
//! report what went wrong and the logs can say it.

use thiserror::Error;

/// A failed call to a news or subscription provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The request never produced a response (connect error, timeout, ...).
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("server returned {status}{}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    Status { status: u16, message: Option<String> },

    /// The response body did not match the expected shape.
    #[error("undecodable response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// Any other provider-side rejection, mostly produced by in-memory providers.
    #[error("{0}")]
    Other(String),
}

impl ProviderError {
    /// The human-readable message the server attached to its error body, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ProviderError::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

/// Why a subscription form may not be submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationFailure {
    #[error("email address is missing or malformed")]
    InvalidEmail,
    #[error("at least one category must be selected")]
    NoCategories,
}
