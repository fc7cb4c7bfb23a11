//! Build outcomes and completion facts supplied by the CI host.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Terminal outcome of a build.
///
/// A build without a result (still running, or aborted before the host
/// recorded one) is modelled as `Option::<BuildResult>::None`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuildResult {
    Success,
    Unstable,
    Failure,
    NotBuilt,
    Aborted,
}

impl BuildResult {
    /// Every variant, in the host's severity order.
    pub const ALL: [BuildResult; 5] = [
        BuildResult::Success,
        BuildResult::Unstable,
        BuildResult::Failure,
        BuildResult::NotBuilt,
        BuildResult::Aborted,
    ];

    /// Canonical upper-case name, as the host reports it.
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildResult::Success => "SUCCESS",
            BuildResult::Unstable => "UNSTABLE",
            BuildResult::Failure => "FAILURE",
            BuildResult::NotBuilt => "NOT_BUILT",
            BuildResult::Aborted => "ABORTED",
        }
    }
}

impl fmt::Display for BuildResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown build result: {0}")]
pub struct ParseBuildResultError(pub String);

impl FromStr for BuildResult {
    type Err = ParseBuildResultError;

    /// Case-insensitive; `-` is accepted in place of `_` (`not-built`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        BuildResult::ALL
            .into_iter()
            .find(|r| r.as_str() == normalized)
            .ok_or_else(|| ParseBuildResultError(s.to_string()))
    }
}

/// Durations the host measured for a build, in milliseconds.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BuildTiming {
    /// Time spent waiting in the queue before an executor picked it up.
    pub queue_ms: Option<u64>,

    /// Time spent executing.
    pub building_ms: Option<u64>,

    /// Queue plus execution.
    pub total_ms: Option<u64>,
}

impl BuildTiming {
    pub fn is_empty(&self) -> bool {
        self.queue_ms.is_none() && self.building_ms.is_none() && self.total_ms.is_none()
    }
}

/// A build the host reports as completed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompletedBuild {
    /// Full job name (e.g. `team/service/main`).
    pub job: String,

    /// Build number within the job.
    pub number: u64,

    /// Terminal result; `None` when the host never set one.
    pub result: Option<BuildResult>,

    /// When the host observed completion.
    pub completed_at: DateTime<Utc>,

    /// Timing facts, when the host tracks them.
    #[serde(default)]
    pub timing: BuildTiming,

    /// Link back to the build page.
    #[serde(default)]
    pub url: Option<String>,
}

impl CompletedBuild {
    /// Create a completed build observed now, without timing or URL.
    pub fn new(job: impl Into<String>, number: u64, result: Option<BuildResult>) -> Self {
        Self {
            job: job.into(),
            number,
            result,
            completed_at: Utc::now(),
            timing: BuildTiming::default(),
            url: None,
        }
    }

    pub fn with_completed_at(mut self, completed_at: DateTime<Utc>) -> Self {
        self.completed_at = completed_at;
        self
    }

    pub fn with_timing(mut self, timing: BuildTiming) -> Self {
        self.timing = timing;
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Epoch seconds used as the timestamp of every record for this build.
    pub fn timestamp(&self) -> i64 {
        self.completed_at.timestamp()
    }

    /// `<job>#<number>`, the identifier annotations carry.
    pub fn display_name(&self) -> String {
        format!("{}#{}", self.job, self.number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_build_result_names() {
        assert_eq!(BuildResult::Success.to_string(), "SUCCESS");
        assert_eq!(BuildResult::Unstable.to_string(), "UNSTABLE");
        assert_eq!(BuildResult::Failure.to_string(), "FAILURE");
        assert_eq!(BuildResult::NotBuilt.to_string(), "NOT_BUILT");
        assert_eq!(BuildResult::Aborted.to_string(), "ABORTED");
    }

    #[test]
    fn test_build_result_serde_matches_display() {
        for result in BuildResult::ALL {
            let json = serde_json::to_string(&result).expect("serialize");
            assert_eq!(json, format!("\"{}\"", result));
            let back: BuildResult = serde_json::from_str(&json).expect("deserialize");
            assert_eq!(back, result);
        }
    }

    #[test]
    fn test_build_result_from_str() {
        assert_eq!("SUCCESS".parse::<BuildResult>(), Ok(BuildResult::Success));
        assert_eq!("failure".parse::<BuildResult>(), Ok(BuildResult::Failure));
        assert_eq!("not-built".parse::<BuildResult>(), Ok(BuildResult::NotBuilt));
        assert_eq!(" Aborted ".parse::<BuildResult>(), Ok(BuildResult::Aborted));
        assert!("PASSED".parse::<BuildResult>().is_err());
    }

    #[test]
    fn test_completed_build_timestamp_is_epoch_seconds() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let build = CompletedBuild::new("svc", 7, Some(BuildResult::Success)).with_completed_at(at);
        assert_eq!(build.timestamp(), 1_714_564_800);
        assert_eq!(build.display_name(), "svc#7");
    }

    #[test]
    fn test_timing_is_empty() {
        assert!(BuildTiming::default().is_empty());
        let timing = BuildTiming {
            queue_ms: Some(10),
            ..Default::default()
        };
        assert!(!timing.is_empty());
    }
}
