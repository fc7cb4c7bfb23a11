//! Notifier configuration and credentials.
//!
//! Configuration is owned by the host; the notifier only reads it. The
//! environment-backed constructors mirror what a pipeline step sees.

use crate::error::{NotifyError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

pub const DEFAULT_SCOPE: &str = "ci";
pub const DEFAULT_SOURCE: &str = "argus-notifier";

/// Where and as whom to report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotifierConfig {
    /// Base URL of the Argus web service, e.g. `https://argus.example.com/argusws`.
    pub argus_url: String,

    /// Scope every metric and annotation is filed under.
    pub scope: String,

    /// Source recorded on annotations.
    pub source: String,

    /// Identifier the host resolves to a username/password pair.
    pub credentials_id: String,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        NotifierConfig {
            argus_url: std::env::var("ARGUS_URL").unwrap_or_default(),
            scope: std::env::var("ARGUS_SCOPE").unwrap_or_else(|_| DEFAULT_SCOPE.to_string()),
            source: std::env::var("ARGUS_SOURCE").unwrap_or_else(|_| DEFAULT_SOURCE.to_string()),
            credentials_id: std::env::var("ARGUS_CREDENTIALS_ID").unwrap_or_default(),
        }
    }
}

impl NotifierConfig {
    /// Read `ARGUS_URL`, `ARGUS_SCOPE`, `ARGUS_SOURCE` and
    /// `ARGUS_CREDENTIALS_ID`.
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Config for a specific endpoint with the default scope and source.
    pub fn new(argus_url: &str, credentials_id: &str) -> Self {
        NotifierConfig {
            argus_url: argus_url.to_string(),
            scope: DEFAULT_SCOPE.to_string(),
            source: DEFAULT_SOURCE.to_string(),
            credentials_id: credentials_id.to_string(),
        }
    }

    pub fn with_scope(mut self, scope: &str) -> Self {
        self.scope = scope.to_string();
        self
    }

    pub fn with_source(mut self, source: &str) -> Self {
        self.source = source.to_string();
        self
    }

    /// Reject configurations that could not possibly deliver.
    pub fn validate(&self) -> Result<()> {
        let url = self.argus_url.trim();
        if url.is_empty() {
            return Err(NotifyError::Config("argus_url is not set".to_string()));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(NotifyError::Config(format!(
                "argus_url must be an http(s) URL: {}",
                url
            )));
        }
        if self.scope.trim().is_empty() {
            return Err(NotifyError::Config("scope must not be empty".to_string()));
        }
        if self.source.trim().is_empty() {
            return Err(NotifyError::Config("source must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Username/password pair for the Argus endpoint.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: &str, password: &str) -> Self {
        Credentials {
            username: username.to_string(),
            password: password.to_string(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Resolves a credentials identifier to a username/password pair.
pub trait CredentialsProvider: Send + Sync {
    fn credentials(&self, id: &str) -> Option<Credentials>;
}

/// Credentials stored in environment variables.
///
/// Id `build-bot` resolves to `ARGUS_CREDENTIALS_BUILD_BOT_USERNAME` and
/// `ARGUS_CREDENTIALS_BUILD_BOT_PASSWORD`.
#[derive(Debug, Clone)]
pub struct EnvCredentialsProvider {
    prefix: String,
}

impl Default for EnvCredentialsProvider {
    fn default() -> Self {
        Self {
            prefix: "ARGUS_CREDENTIALS".to_string(),
        }
    }
}

impl EnvCredentialsProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
        }
    }

    /// Environment variable holding `field` for credentials `id`.
    pub fn variable_name(&self, id: &str, field: &str) -> String {
        let id: String = id
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_uppercase()
                } else {
                    '_'
                }
            })
            .collect();
        format!("{}_{}_{}", self.prefix, id, field)
    }
}

impl CredentialsProvider for EnvCredentialsProvider {
    fn credentials(&self, id: &str) -> Option<Credentials> {
        if id.trim().is_empty() {
            return None;
        }
        let username = std::env::var(self.variable_name(id, "USERNAME")).ok()?;
        let password = std::env::var(self.variable_name(id, "PASSWORD")).ok()?;
        Some(Credentials { username, password })
    }
}

/// Fixed id → credentials table.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentialsProvider {
    entries: HashMap<String, Credentials>,
}

impl StaticCredentialsProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, id: &str, credentials: Credentials) -> Self {
        self.entries.insert(id.to_string(), credentials);
        self
    }
}

impl CredentialsProvider for StaticCredentialsProvider {
    fn credentials(&self, id: &str) -> Option<Credentials> {
        self.entries.get(id).cloned()
    }
}
