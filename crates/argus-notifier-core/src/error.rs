//! Error taxonomy for the notifier.
//!
//! None of these ever reach the build: the listener logs them and moves on.

use thiserror::Error;

/// Failures a sender reports when delivery to Argus does not go through.
#[derive(Error, Debug)]
pub enum SendError {
    /// Login was refused or returned no token.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The endpoint answered with a non-success status.
    #[error("argus rejected {what} with status {status}: {body}")]
    Rejected {
        what: String,
        status: u16,
        body: String,
    },

    /// Connection, TLS or timeout problem.
    #[error("transport error: {0}")]
    Transport(String),
}

/// Reasons a build-completion event produced no delivery.
#[derive(Error, Debug)]
pub enum NotifyError {
    /// The host context was gone when the event arrived.
    #[error("host context unavailable")]
    HostUnavailable,

    #[error("invalid notifier configuration: {0}")]
    Config(String),

    #[error("credentials not found for id: {0}")]
    CredentialsNotFound(String),

    #[error("delivery failed: {0}")]
    Delivery(#[from] SendError),
}

/// Result type for notifier operations
pub type Result<T> = std::result::Result<T, NotifyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notify_error_display() {
        let err = NotifyError::CredentialsNotFound("build-bot".to_string());
        assert!(err.to_string().contains("build-bot"));

        let err = NotifyError::Config("argus_url is not set".to_string());
        assert!(err.to_string().contains("invalid notifier configuration"));
    }

    #[test]
    fn test_send_error_converts_to_delivery() {
        let err: NotifyError = SendError::Rejected {
            what: "metrics".to_string(),
            status: 500,
            body: "boom".to_string(),
        }
        .into();
        let msg = err.to_string();
        assert!(msg.starts_with("delivery failed"));
        assert!(msg.contains("500"));
        assert!(msg.contains("metrics"));
    }
}
