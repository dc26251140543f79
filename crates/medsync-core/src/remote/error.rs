//! Remote API errors

use thiserror::Error;

use super::wire::ErrorEnvelope;

/// Errors returned by a `RemoteClient`
#[derive(Error, Debug)]
pub enum RemoteError {
    /// Connectivity problem or timeout
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The record (or collection) does not exist on the server
    #[error("Not found on server: {message}")]
    NotFound { message: String },

    /// The server rejected the request with a structured error
    #[error("HTTP {status} {code}: {message}")]
    Server {
        status: u16,
        code: String,
        message: String,
    },

    /// Unexpected status without a structured error body
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The response did not have the expected shape
    #[error("Decoding error: {message}")]
    Decode { message: String, body: String },

    /// The configured API URL cannot be used
    #[error("Invalid API URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },
}

impl RemoteError {
    /// Classify a non-accepted response
    ///
    /// A 404 is always `NotFound`, whether or not the body carries an
    /// error envelope.
    pub fn from_status(status: u16, body: String) -> Self {
        let envelope = serde_json::from_str::<ErrorEnvelope>(&body).ok();

        if status == 404 {
            let message = match envelope {
                Some(env) => format!("{}: {}", env.error.code, env.error.message),
                None if body.trim().is_empty() => "404".to_string(),
                None => body,
            };
            return RemoteError::NotFound { message };
        }

        match envelope {
            Some(env) => RemoteError::Server {
                status,
                code: env.error.code,
                message: env.error.message,
            },
            None => RemoteError::Http { status, body },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RemoteError::NotFound { .. })
    }

    /// Machine-readable error code, when the server sent one
    pub fn code(&self) -> Option<&str> {
        match self {
            RemoteError::Server { code, .. } => Some(code),
            _ => None,
        }
    }
}
