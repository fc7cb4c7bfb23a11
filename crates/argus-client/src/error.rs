//! Error types for argus-client

use argus_notifier_core::SendError;
use thiserror::Error;

/// Errors that can occur talking to Argus
#[derive(Error, Debug)]
pub enum ArgusClientError {
    /// Login returned success but no usable token
    #[error("Argus login returned no access token")]
    MissingToken,

    /// Argus answered with a non-success status
    #[error("Argus {endpoint} returned {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// Argus accepted the request but reported errors for its entries
    #[error("Argus {endpoint} reported {errors} error(s): {}", .messages.join("; "))]
    Rejected {
        endpoint: String,
        status: u16,
        errors: u64,
        messages: Vec<String>,
    },

    /// Request could not be built or sent
    #[error("HTTP error: {0}")]
    Http(String),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for ArgusClientError {
    fn from(err: reqwest::Error) -> Self {
        ArgusClientError::Http(err.to_string())
    }
}

impl From<ArgusClientError> for SendError {
    fn from(err: ArgusClientError) -> Self {
        match err {
            ArgusClientError::MissingToken => {
                SendError::Auth("login returned no access token".to_string())
            }
            ArgusClientError::Status {
                endpoint,
                status,
                body,
            } if status == 401 || status == 403 => SendError::Auth(format!(
                "{} returned {}: {}",
                endpoint, status, body
            )),
            ArgusClientError::Status {
                endpoint,
                status,
                body,
            } => SendError::Rejected {
                what: endpoint,
                status,
                body,
            },
            ArgusClientError::Rejected {
                endpoint,
                status,
                errors,
                messages,
            } => SendError::Rejected {
                what: endpoint,
                status,
                body: format!("{} error(s): {}", errors, messages.join("; ")),
            },
            ArgusClientError::Http(msg) => SendError::Transport(msg),
            ArgusClientError::Json(e) => SendError::Transport(e.to_string()),
        }
    }
}
