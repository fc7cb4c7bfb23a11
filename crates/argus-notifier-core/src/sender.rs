//! Delivery seam between the notifier and the Argus transport.

use async_trait::async_trait;

use crate::config::Credentials;
use crate::error::SendError;
use crate::record::{Annotation, Metric};

/// Delivers metrics and annotations to an Argus endpoint.
///
/// Implementations own transport, authentication and response handling.
/// Metrics must be accepted before the annotations that reference them
/// are submitted.
#[async_trait]
pub trait ArgusSender: Send + Sync {
    async fn send(
        &self,
        argus_url: &str,
        credentials: &Credentials,
        metrics: &[Metric],
        annotations: &[Annotation],
    ) -> std::result::Result<(), SendError>;
}
