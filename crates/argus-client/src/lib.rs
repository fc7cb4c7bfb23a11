//! Argus Client: REST delivery for the Argus notifier
//!
//! Implements [`argus_notifier_core::ArgusSender`] over the Argus web
//! service: log in for a bearer token, submit metrics, then submit the
//! annotations that reference them.

pub mod client;
pub mod error;
pub mod wire;

pub use client::{ArgusClient, AuthTokens, ClientConfig, SubmissionSummary};
pub use error::ArgusClientError;

/// Result type for Argus client operations
pub type Result<T> = std::result::Result<T, ArgusClientError>;
