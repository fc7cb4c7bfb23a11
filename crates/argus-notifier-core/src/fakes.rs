//! In-memory fakes for the host and sender seams (testing only)
//!
//! `MemoryHost`, `RecordingSender` and `FailingSender` satisfy the trait
//! contracts without a CI server or an Argus endpoint.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::build::BuildResult;
use crate::config::{Credentials, CredentialsProvider, NotifierConfig, StaticCredentialsProvider};
use crate::error::SendError;
use crate::host::HostContext;
use crate::record::{Annotation, Metric};
use crate::sender::ArgusSender;

// ---------------------------------------------------------------------------
// MemoryHost
// ---------------------------------------------------------------------------

/// Host with a fixed configuration and an in-memory build history.
#[derive(Debug)]
pub struct MemoryHost {
    config: NotifierConfig,
    credentials: StaticCredentialsProvider,
    instance_name: Option<String>,
    history: Mutex<HashMap<String, BTreeMap<u64, Option<BuildResult>>>>,
}

impl MemoryHost {
    pub fn new(config: NotifierConfig) -> Self {
        Self {
            config,
            credentials: StaticCredentialsProvider::new(),
            instance_name: None,
            history: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_credentials(mut self, id: &str, credentials: Credentials) -> Self {
        self.credentials = self.credentials.with(id, credentials);
        self
    }

    pub fn with_instance_name(mut self, name: &str) -> Self {
        self.instance_name = Some(name.to_string());
        self
    }

    /// Record a finished build so later builds of `job` can see it.
    pub fn record(&self, job: &str, number: u64, result: Option<BuildResult>) {
        let mut history = self.history.lock().unwrap();
        history
            .entry(job.to_string())
            .or_default()
            .insert(number, result);
    }
}

impl HostContext for MemoryHost {
    fn notifier_config(&self) -> NotifierConfig {
        self.config.clone()
    }

    fn credentials(&self, id: &str) -> Option<Credentials> {
        self.credentials.credentials(id)
    }

    fn previous_result(&self, job: &str, number: u64) -> Option<BuildResult> {
        let history = self.history.lock().unwrap();
        history
            .get(job)?
            .range(..number)
            .next_back()
            .and_then(|(_, result)| *result)
    }

    fn instance_name(&self) -> Option<String> {
        self.instance_name.clone()
    }
}

// ---------------------------------------------------------------------------
// RecordingSender
// ---------------------------------------------------------------------------

/// One call to [`ArgusSender::send`], as captured by [`RecordingSender`].
#[derive(Debug, Clone)]
pub struct Delivery {
    pub argus_url: String,
    pub username: String,
    pub metrics: Vec<Metric>,
    pub annotations: Vec<Annotation>,
}

/// Sender that accepts everything and remembers what it was given.
#[derive(Debug, Default)]
pub struct RecordingSender {
    deliveries: Mutex<Vec<Delivery>>,
}

impl RecordingSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.lock().unwrap().clone()
    }
}

#[async_trait]
impl ArgusSender for RecordingSender {
    async fn send(
        &self,
        argus_url: &str,
        credentials: &Credentials,
        metrics: &[Metric],
        annotations: &[Annotation],
    ) -> Result<(), SendError> {
        let mut deliveries = self.deliveries.lock().unwrap();
        deliveries.push(Delivery {
            argus_url: argus_url.to_string(),
            username: credentials.username.clone(),
            metrics: metrics.to_vec(),
            annotations: annotations.to_vec(),
        });
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FailingSender
// ---------------------------------------------------------------------------

/// Sender whose every delivery fails with a transport error.
#[derive(Debug, Clone)]
pub struct FailingSender {
    message: String,
}

impl FailingSender {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

#[async_trait]
impl ArgusSender for FailingSender {
    async fn send(
        &self,
        _argus_url: &str,
        _credentials: &Credentials,
        _metrics: &[Metric],
        _annotations: &[Annotation],
    ) -> Result<(), SendError> {
        Err(SendError::Transport(self.message.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_host_previous_result() {
        let host = MemoryHost::new(NotifierConfig::new("https://argus.example.com", "bot"));
        assert_eq!(host.previous_result("svc", 1), None);

        host.record("svc", 1, Some(BuildResult::Failure));
        host.record("svc", 2, None);
        host.record("svc", 3, Some(BuildResult::Success));

        assert_eq!(host.previous_result("svc", 2), Some(BuildResult::Failure));
        // Immediate predecessor had no result.
        assert_eq!(host.previous_result("svc", 3), None);
        assert_eq!(host.previous_result("svc", 4), Some(BuildResult::Success));
        assert_eq!(host.previous_result("other", 4), None);
    }
}
