//! Argus web service client
//!
//! Speaks the subset of the Argus REST API the notifier needs:
//! `v2/auth/login`, `collection/metrics` and `collection/annotations`.

use std::fmt;
use std::time::Duration;

use argus_notifier_core::{Annotation, ArgusSender, Credentials, Metric, SendError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ArgusClientError;
use crate::wire::{WireAnnotation, WireMetric};
use crate::Result;

const LOGIN_PATH: &str = "v2/auth/login";
const METRICS_PATH: &str = "collection/metrics";
const ANNOTATIONS_PATH: &str = "collection/annotations";

/// HTTP client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Per-request timeout in seconds (0 disables the timeout)
    pub timeout_secs: u64,
    /// User-Agent header sent with every request
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            timeout_secs: std::env::var("ARGUS_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            user_agent: format!("argus-notifier/{}", argus_notifier_core::VERSION),
        }
    }
}

impl ClientConfig {
    /// Create a new config from environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

/// Tokens returned by a successful login
#[derive(Clone, Deserialize)]
pub struct AuthTokens {
    #[serde(rename = "accessToken", default)]
    pub access_token: String,
    #[serde(rename = "refreshToken", default)]
    pub refresh_token: Option<String>,
}

impl fmt::Debug for AuthTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthTokens")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Counts Argus reports back for a collection submission
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct SubmissionSummary {
    #[serde(rename = "Success", default)]
    pub success: u64,
    #[serde(rename = "Errors", default)]
    pub errors: u64,
    #[serde(rename = "Error Messages", default)]
    pub error_messages: Vec<String>,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

/// Argus client for metric and annotation delivery
pub struct ArgusClient {
    config: ClientConfig,
    http_client: reqwest::Client,
}

impl ArgusClient {
    /// Create a new Argus client
    pub fn new(config: ClientConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if config.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout_secs));
        }
        let http_client = builder.build()?;

        Ok(ArgusClient {
            config,
            http_client,
        })
    }

    /// Create client from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env())
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Exchange credentials for a bearer token
    pub async fn login(&self, base_url: &str, credentials: &Credentials) -> Result<AuthTokens> {
        let url = endpoint(base_url, LOGIN_PATH);
        debug!("Logging in to Argus at {} as {}", url, credentials.username);

        let response = self
            .http_client
            .post(&url)
            .json(&LoginRequest {
                username: &credentials.username,
                password: &credentials.password,
            })
            .send()
            .await?;
        let body = read_success(response, LOGIN_PATH).await?;

        let tokens: AuthTokens = serde_json::from_str(&body)?;
        if tokens.access_token.is_empty() {
            return Err(ArgusClientError::MissingToken);
        }
        Ok(tokens)
    }

    /// Submit metric data points
    ///
    /// A response that counts any errors is an [`ArgusClientError::Rejected`].
    pub async fn submit_metrics(
        &self,
        base_url: &str,
        token: &str,
        metrics: &[Metric],
    ) -> Result<SubmissionSummary> {
        let body: Vec<WireMetric> = metrics.iter().map(WireMetric::from).collect();
        self.post_collection(base_url, token, METRICS_PATH, &body)
            .await
    }

    /// Submit annotations (their metrics must already exist)
    pub async fn submit_annotations(
        &self,
        base_url: &str,
        token: &str,
        annotations: &[Annotation],
    ) -> Result<SubmissionSummary> {
        let body: Vec<WireAnnotation> = annotations.iter().map(WireAnnotation::from).collect();
        self.post_collection(base_url, token, ANNOTATIONS_PATH, &body)
            .await
    }

    async fn post_collection<T: Serialize + ?Sized>(
        &self,
        base_url: &str,
        token: &str,
        path: &str,
        body: &T,
    ) -> Result<SubmissionSummary> {
        let response = self
            .http_client
            .post(endpoint(base_url, path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = read_success(response, path).await?;

        // Older Argus versions answer with an empty body.
        let summary = if body.trim().is_empty() {
            SubmissionSummary::default()
        } else {
            serde_json::from_str::<SubmissionSummary>(&body)?
        };
        if summary.errors > 0 {
            warn!(
                "Argus reported {} error(s) for {}: {:?}",
                summary.errors, path, summary.error_messages
            );
            return Err(ArgusClientError::Rejected {
                endpoint: path.to_string(),
                status,
                errors: summary.errors,
                messages: summary.error_messages,
            });
        }
        Ok(summary)
    }
}

#[async_trait]
impl ArgusSender for ArgusClient {
    async fn send(
        &self,
        argus_url: &str,
        credentials: &Credentials,
        metrics: &[Metric],
        annotations: &[Annotation],
    ) -> std::result::Result<(), SendError> {
        let tokens = self.login(argus_url, credentials).await?;

        if !metrics.is_empty() {
            let summary = self
                .submit_metrics(argus_url, &tokens.access_token, metrics)
                .await?;
            debug!("Submitted {} metric(s)", summary.success);
        }
        if !annotations.is_empty() {
            let summary = self
                .submit_annotations(argus_url, &tokens.access_token, annotations)
                .await?;
            debug!("Submitted {} annotation(s)", summary.success);
        }
        Ok(())
    }
}

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path)
}

async fn read_success(response: reqwest::Response, path: &str) -> Result<String> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(ArgusClientError::Status {
            endpoint: path.to_string(),
            status: status.as_u16(),
            body,
        });
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_config_default() {
        let config = ClientConfig::default();
        assert!(config.user_agent.starts_with("argus-notifier/"));
    }

    #[test]
    fn test_client_config_with_timeout() {
        let config = ClientConfig::default().with_timeout_secs(5);
        assert_eq!(config.timeout_secs, 5);
        assert!(ArgusClient::new(config).is_ok());
    }

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        assert_eq!(
            endpoint("https://argus.example.com/argusws/", METRICS_PATH),
            "https://argus.example.com/argusws/collection/metrics"
        );
        assert_eq!(
            endpoint("https://argus.example.com/argusws", LOGIN_PATH),
            "https://argus.example.com/argusws/v2/auth/login"
        );
    }

    #[test]
    fn test_auth_tokens_debug_redacts() {
        let tokens = AuthTokens {
            access_token: "abc".to_string(),
            refresh_token: Some("def".to_string()),
        };
        let debug = format!("{:?}", tokens);
        assert!(!debug.contains("abc"));
        assert!(!debug.contains("def"));
    }

    #[test]
    fn test_submission_summary_parses_argus_keys() {
        let summary: SubmissionSummary =
            serde_json::from_str(r#"{"Success":3,"Errors":1,"Error Messages":["bad scope"]}"#)
                .expect("parse");
        assert_eq!(summary.success, 3);
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.error_messages, vec!["bad scope".to_string()]);
    }
}
