//! Build history file.
//!
//! A pipeline step has no CI server to ask for the previous build's result,
//! so the last reported build of each job is kept in a small JSON file:
//!
//! ```json
//! { "svc/main": { "number": 41, "result": "FAILURE", "recorded_at": "..." } }
//! ```

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use argus_notifier_core::{BuildResult, CompletedBuild};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("history file I/O failed for {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("history file {} is not valid JSON: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, HistoryError>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryEntry {
    pub number: u64,
    pub result: Option<BuildResult>,
    pub recorded_at: DateTime<Utc>,
}

/// Last reported build per job, backed by a JSON file.
#[derive(Debug, Clone)]
pub struct BuildHistory {
    path: PathBuf,
    jobs: BTreeMap<String, HistoryEntry>,
}

impl BuildHistory {
    /// Load the history at `path`; a missing file is an empty history.
    pub fn load(path: &Path) -> Result<Self> {
        let jobs = match std::fs::read_to_string(path) {
            Ok(content) if content.trim().is_empty() => BTreeMap::new(),
            Ok(content) => serde_json::from_str(&content).map_err(|source| HistoryError::Json {
                path: path.to_path_buf(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => {
                return Err(HistoryError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        debug!("Loaded build history for {} job(s) from {:?}", jobs.len(), path);
        Ok(Self {
            path: path.to_path_buf(),
            jobs,
        })
    }

    /// Result of build `number - 1` of `job`.
    ///
    /// Only the last reported build is kept, so when a build in between was
    /// never reported the predecessor is unknown and this returns `None`.
    pub fn previous_result(&self, job: &str, number: u64) -> Option<BuildResult> {
        let previous = number.checked_sub(1)?;
        self.jobs
            .get(job)
            .filter(|entry| entry.number == previous)
            .and_then(|entry| entry.result)
    }

    pub fn entry(&self, job: &str) -> Option<&HistoryEntry> {
        self.jobs.get(job)
    }

    /// Remember `build` unless a later build of the job is already recorded.
    pub fn record(&mut self, build: &CompletedBuild) {
        if let Some(existing) = self.jobs.get(&build.job) {
            if existing.number > build.number {
                debug!(
                    "Not recording {}: build #{} already recorded",
                    build.display_name(),
                    existing.number
                );
                return;
            }
        }
        self.jobs.insert(
            build.job.clone(),
            HistoryEntry {
                number: build.number,
                result: build.result,
                recorded_at: build.completed_at,
            },
        );
    }

    /// Write the history back, replacing the file atomically.
    pub fn save(&self) -> Result<()> {
        let io_err = |source: std::io::Error| HistoryError::Io {
            path: self.path.clone(),
            source,
        };
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(io_err)?;
        let content = serde_json::to_vec_pretty(&self.jobs).map_err(|source| HistoryError::Json {
            path: self.path.clone(),
            source,
        })?;

        // Write to a temp file in the same directory, then rename over.
        let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
        tmp.write_all(&content).map_err(io_err)?;
        tmp.persist(&self.path).map_err(|e| io_err(e.error))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_is_empty_history() {
        let dir = tempdir().unwrap();
        let history = BuildHistory::load(&dir.path().join("history.json")).unwrap();
        assert_eq!(history.previous_result("svc", 1), None);
    }

    #[test]
    fn test_record_save_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("history.json");

        let mut history = BuildHistory::load(&path).unwrap();
        history.record(&CompletedBuild::new("svc", 4, Some(BuildResult::Failure)));
        history.save().unwrap();

        let reloaded = BuildHistory::load(&path).unwrap();
        assert_eq!(reloaded.previous_result("svc", 5), Some(BuildResult::Failure));
        assert_eq!(reloaded.entry("svc").map(|e| e.number), Some(4));
    }

    #[test]
    fn test_previous_ignores_same_or_later_builds() {
        let dir = tempdir().unwrap();
        let mut history = BuildHistory::load(&dir.path().join("h.json")).unwrap();
        history.record(&CompletedBuild::new("svc", 7, Some(BuildResult::Failure)));

        assert_eq!(history.previous_result("svc", 7), None);
        assert_eq!(history.previous_result("svc", 6), None);
        assert_eq!(history.previous_result("svc", 8), Some(BuildResult::Failure));
    }

    #[test]
    fn test_unreported_build_in_between_hides_previous() {
        let dir = tempdir().unwrap();
        let mut history = BuildHistory::load(&dir.path().join("h.json")).unwrap();
        history.record(&CompletedBuild::new("svc", 5, Some(BuildResult::Failure)));

        // Build 6 was never reported, so build 7 has no known predecessor.
        assert_eq!(history.previous_result("svc", 7), None);
        assert_eq!(history.previous_result("svc", 6), Some(BuildResult::Failure));
    }

    #[test]
    fn test_record_keeps_latest_build() {
        let dir = tempdir().unwrap();
        let mut history = BuildHistory::load(&dir.path().join("h.json")).unwrap();
        history.record(&CompletedBuild::new("svc", 9, Some(BuildResult::Success)));
        history.record(&CompletedBuild::new("svc", 8, Some(BuildResult::Failure)));

        assert_eq!(history.entry("svc").map(|e| e.number), Some(9));
        assert_eq!(history.previous_result("svc", 10), Some(BuildResult::Success));
    }

    #[test]
    fn test_unset_result_is_recorded() {
        let dir = tempdir().unwrap();
        let mut history = BuildHistory::load(&dir.path().join("h.json")).unwrap();
        history.record(&CompletedBuild::new("svc", 1, None));
        assert_eq!(history.previous_result("svc", 2), None);
        assert!(history.entry("svc").is_some());
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("h.json");
        std::fs::write(&path, "not json").unwrap();

        let err = BuildHistory::load(&path).unwrap_err();
        assert!(matches!(err, HistoryError::Json { .. }));
    }
}
