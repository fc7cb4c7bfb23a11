//! Capabilities the CI host lends the notifier.

use crate::build::BuildResult;
use crate::config::{Credentials, NotifierConfig};

/// The running host as seen from a build-completion handler.
///
/// Handlers hold this behind a `Weak` reference; once the host shuts down
/// the upgrade fails and events are skipped.
pub trait HostContext: Send + Sync {
    /// Current notifier configuration.
    fn notifier_config(&self) -> NotifierConfig;

    /// Resolve a credentials id from the host's credential store.
    fn credentials(&self, id: &str) -> Option<Credentials>;

    /// Result of the build immediately before `number` in `job`.
    ///
    /// `None` when there is no earlier build or it recorded no result.
    fn previous_result(&self, job: &str, number: u64) -> Option<BuildResult>;

    /// Name of this host instance, attached to metrics as the `host` tag.
    fn instance_name(&self) -> Option<String> {
        None
    }
}
