//! Backend error type

use thiserror::Error;

/// Message shown when auth is attempted without a configured backend
pub const NOT_CONFIGURED_MESSAGE: &str =
    "Authentication is not configured. Please set up Supabase credentials.";

/// Errors from the hosted backend
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("{}", NOT_CONFIGURED_MESSAGE)]
    NotConfigured,

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("invalid response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{0}")]
    Unauthorized(String),
}

impl BackendError {
    /// Build an API error from a response status and body.
    ///
    /// The message is taken from the first of `msg`, `message`,
    /// `error_description` or `error` in a JSON body, falling back to the raw text.
    pub fn from_response(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|json| {
                ["msg", "message", "error_description", "error"]
                    .iter()
                    .find_map(|key| json.get(*key).and_then(|v| v.as_str()).map(str::to_string))
            })
            .unwrap_or_else(|| {
                let text = body.trim();
                if text.is_empty() {
                    format!("backend returned status {}", status)
                } else {
                    text.chars().take(200).collect()
                }
            });

        BackendError::Api { status, message }
    }

    /// True when the service refused the credentials themselves, as opposed
    /// to failing to answer
    pub fn is_auth_rejection(&self) -> bool {
        match self {
            BackendError::NotConfigured | BackendError::Unauthorized(_) => true,
            BackendError::Api { status, .. } => matches!(status, 401 | 403),
            BackendError::Http(_) | BackendError::Decode(_) => false,
        }
    }

    /// Message suitable for showing in a form
    pub fn user_message(&self) -> String {
        match self {
            BackendError::Http(_) | BackendError::Decode(_) => {
                "An unexpected error occurred".to_string()
            }
            other => other.to_string(),
        }
    }
}
