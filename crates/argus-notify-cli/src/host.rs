//! The pipeline step as a notifier host.

use argus_notifier_core::{
    BuildResult, Credentials, CredentialsProvider, HostContext, NotifierConfig,
};

use crate::history::BuildHistory;

/// Where the previous build's result comes from.
#[derive(Debug, Clone)]
pub enum PreviousResult {
    /// Given on the command line.
    Explicit(Option<BuildResult>),
    /// Looked up in the history file.
    History(BuildHistory),
    /// Nothing known; every build reads as the first of its job.
    Unknown,
}

pub struct PipelineHost {
    config: NotifierConfig,
    credentials: Box<dyn CredentialsProvider>,
    previous: PreviousResult,
    instance_name: Option<String>,
}

impl PipelineHost {
    pub fn new(
        config: NotifierConfig,
        credentials: Box<dyn CredentialsProvider>,
        previous: PreviousResult,
        instance_name: Option<String>,
    ) -> Self {
        Self {
            config,
            credentials,
            previous,
            instance_name,
        }
    }
}

impl HostContext for PipelineHost {
    fn notifier_config(&self) -> NotifierConfig {
        self.config.clone()
    }

    fn credentials(&self, id: &str) -> Option<Credentials> {
        self.credentials.credentials(id)
    }

    fn previous_result(&self, job: &str, number: u64) -> Option<BuildResult> {
        match &self.previous {
            PreviousResult::Explicit(result) => *result,
            PreviousResult::History(history) => history.previous_result(job, number),
            PreviousResult::Unknown => None,
        }
    }

    fn instance_name(&self) -> Option<String> {
        self.instance_name.clone()
    }
}
