//! Build-completion handling.
//!
//! [`ArgusBuildListener`] is what a host registers to hear about finished
//! builds. For each build it:
//! 1. asks the host for configuration, credentials and the previous result
//! 2. classifies the build and assembles metrics and annotations
//! 3. hands them to an [`ArgusSender`]
//!
//! Reporting is a side channel. `on_completed` never fails; problems are
//! logged and the event is dropped.

use std::sync::{Arc, Weak};
use std::time::Instant;

use async_trait::async_trait;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::Instrument;
use uuid::Uuid;

use crate::build::CompletedBuild;
use crate::error::{NotifyError, Result};
use crate::factory::assemble_payload;
use crate::host::HostContext;
use crate::obs::{
    build_span, emit_host_unavailable, emit_notify_failed, emit_notify_sending, emit_notify_sent,
};
use crate::resolver::ContextualStatus;
use crate::sender::ArgusSender;

/// Callback a host invokes once per completed build.
#[async_trait]
pub trait BuildListener: Send + Sync {
    async fn on_completed(&self, build: &CompletedBuild);
}

/// What was delivered for one build.
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryReport {
    pub event_id: Uuid,
    pub status: ContextualStatus,
    pub metrics: usize,
    pub annotations: usize,
    pub elapsed_ms: u64,
}

/// Sends a metric and annotation set to Argus for every completed build.
pub struct ArgusBuildListener {
    host: Weak<dyn HostContext>,
    sender: Arc<dyn ArgusSender>,
}

impl ArgusBuildListener {
    /// Create a listener bound to `host`.
    ///
    /// Only a weak reference is kept; the listener never extends the
    /// host's lifetime.
    pub fn new<H: HostContext + 'static>(host: &Arc<H>, sender: Arc<dyn ArgusSender>) -> Self {
        let host = Arc::downgrade(host);
        let host: Weak<dyn HostContext> = host;
        Self { host, sender }
    }

    /// Report `build`, returning what was delivered or why nothing was.
    pub async fn notify(&self, build: &CompletedBuild) -> Result<DeliveryReport> {
        let event_id = Uuid::new_v4();
        self.deliver(build, event_id)
            .instrument(build_span(&build.job, build.number, &event_id))
            .await
    }

    /// Report `build` on a background task, off the caller's path.
    pub fn dispatch(self: &Arc<Self>, build: CompletedBuild) -> JoinHandle<()> {
        let listener = Arc::clone(self);
        tokio::spawn(async move { listener.on_completed(&build).await })
    }

    async fn deliver(&self, build: &CompletedBuild, event_id: Uuid) -> Result<DeliveryReport> {
        let started = Instant::now();

        // The host handle is released before any network I/O.
        let (config, credentials, payload) = {
            let host = self.host.upgrade().ok_or(NotifyError::HostUnavailable)?;
            let config = host.notifier_config();
            config.validate()?;
            let credentials = host
                .credentials(&config.credentials_id)
                .ok_or_else(|| NotifyError::CredentialsNotFound(config.credentials_id.clone()))?;
            let previous = host.previous_result(&build.job, build.number);
            let instance = host.instance_name();
            let payload = assemble_payload(build, previous, &config, instance.as_deref());
            (config, credentials, payload)
        };

        emit_notify_sending(
            &config.argus_url,
            &credentials.username,
            payload.metrics.len(),
            payload.annotations.len(),
        );
        self.sender
            .send(
                &config.argus_url,
                &credentials,
                &payload.metrics,
                &payload.annotations,
            )
            .await?;

        Ok(DeliveryReport {
            event_id,
            status: payload.classification.status,
            metrics: payload.metrics.len(),
            annotations: payload.annotations.len(),
            elapsed_ms: started.elapsed().as_millis() as u64,
        })
    }
}

#[async_trait]
impl BuildListener for ArgusBuildListener {
    async fn on_completed(&self, build: &CompletedBuild) {
        let event_id = Uuid::new_v4();
        async {
            match self.deliver(build, event_id).await {
                Ok(report) => emit_notify_sent(
                    report.status.as_str(),
                    report.metrics,
                    report.annotations,
                    report.elapsed_ms,
                ),
                Err(NotifyError::HostUnavailable) => emit_host_unavailable(),
                Err(err) => emit_notify_failed(&err),
            }
        }
        .instrument(build_span(&build.job, build.number, &event_id))
        .await
    }
}
