//! Settings file for the pipeline step.
//!
//! A TOML file supplies defaults; command-line flags and their environment
//! variables override it.
//!
//! ```toml
//! argus_url = "https://argus.example.com/argusws"
//! scope = "ci.prod"
//! source = "jenkins-east"
//! credentials_id = "build-bot"
//! instance_name = "ci-east-1"
//! history = ".argus/history.json"
//! timeout_secs = 10
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use argus_notifier_core::config::{DEFAULT_SCOPE, DEFAULT_SOURCE};
use argus_notifier_core::NotifierConfig;
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct FileSettings {
    pub argus_url: Option<String>,
    pub scope: Option<String>,
    pub source: Option<String>,
    pub credentials_id: Option<String>,
    pub instance_name: Option<String>,
    pub history: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
}

impl FileSettings {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse settings file {}", path.display()))
    }
}

/// Values given on the command line (or through their env variables).
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub argus_url: Option<String>,
    pub scope: Option<String>,
    pub source: Option<String>,
    pub credentials_id: Option<String>,
    pub instance_name: Option<String>,
    pub history: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
}

/// Settings after merging flags over the file over built-in defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub notifier: NotifierConfig,
    pub instance_name: Option<String>,
    pub history: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
}

impl Settings {
    pub fn merge(file: FileSettings, overrides: Overrides) -> Self {
        let notifier = NotifierConfig {
            argus_url: overrides.argus_url.or(file.argus_url).unwrap_or_default(),
            scope: overrides
                .scope
                .or(file.scope)
                .unwrap_or_else(|| DEFAULT_SCOPE.to_string()),
            source: overrides
                .source
                .or(file.source)
                .unwrap_or_else(|| DEFAULT_SOURCE.to_string()),
            credentials_id: overrides
                .credentials_id
                .or(file.credentials_id)
                .unwrap_or_default(),
        };
        Settings {
            notifier,
            instance_name: overrides.instance_name.or(file.instance_name),
            history: overrides.history.or(file.history),
            timeout_secs: overrides.timeout_secs.or(file.timeout_secs),
        }
    }
}
