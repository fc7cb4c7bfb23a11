//! Build result classification.
//!
//! Resolves a build result into the forms Argus consumes: a contextual
//! status for annotations ("FIXED", "STILL FAILING"), a metric name, and a
//! numeric score for graphing. Every function here is pure and total;
//! an absent result is the `UNKNOWN` input, not an error.

use crate::build::BuildResult;
use serde::Serialize;
use std::fmt;

pub const FIXED: &str = "FIXED";
pub const STILL_FAILING: &str = "STILL FAILING";
pub const UNKNOWN: &str = "UNKNOWN";

/// Prefix shared by every result metric name.
pub const METRIC_PREFIX: &str = "build.";

/// Canonical result string; `UNKNOWN` when the build has no result.
pub fn canonical_result_string(result: Option<BuildResult>) -> &'static str {
    match result {
        Some(result) => result.as_str(),
        None => UNKNOWN,
    }
}

/// Metric name for a result, e.g. `build.failure`.
pub fn metric_name(result: Option<BuildResult>) -> String {
    format!(
        "{}{}",
        METRIC_PREFIX,
        canonical_result_string(result).to_lowercase()
    )
}

/// Severity score plotted for a result.
///
/// The scale is fixed: ABORTED -1.0, NOT_BUILT -0.5, SUCCESS 0.0,
/// UNKNOWN 0.5, UNSTABLE 1.0, FAILURE 2.0.
pub fn severity_score(result: Option<BuildResult>) -> f64 {
    match result {
        Some(BuildResult::Aborted) => -1.0,
        Some(BuildResult::NotBuilt) => -0.5,
        Some(BuildResult::Success) => 0.0,
        None => 0.5,
        Some(BuildResult::Unstable) => 1.0,
        Some(BuildResult::Failure) => 2.0,
    }
}

/// Status of a build read against the build before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub enum ContextualStatus {
    /// Previous build failed, this one succeeded.
    Fixed,
    /// Previous build failed, and so did this one.
    StillFailing,
    /// No transition worth calling out; the build's own result.
    Plain(Option<BuildResult>),
}

impl ContextualStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContextualStatus::Fixed => FIXED,
            ContextualStatus::StillFailing => STILL_FAILING,
            ContextualStatus::Plain(result) => canonical_result_string(*result),
        }
    }
}

impl fmt::Display for ContextualStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ContextualStatus> for String {
    fn from(status: ContextualStatus) -> Self {
        status.as_str().to_string()
    }
}

/// Contextual status of `current` given the result of the build before it.
///
/// `previous` is `None` both for the first build of a job and for a
/// predecessor that never recorded a result.
pub fn contextual_status(
    current: Option<BuildResult>,
    previous: Option<BuildResult>,
) -> ContextualStatus {
    match (previous, current) {
        (Some(BuildResult::Failure), Some(BuildResult::Success)) => ContextualStatus::Fixed,
        (Some(BuildResult::Failure), Some(BuildResult::Failure)) => {
            ContextualStatus::StillFailing
        }
        _ => ContextualStatus::Plain(current),
    }
}

/// Everything the classifier derives for one build.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub result: &'static str,
    pub status: ContextualStatus,
    pub metric_name: String,
    pub score: f64,
}

impl Classification {
    pub fn of(current: Option<BuildResult>, previous: Option<BuildResult>) -> Self {
        Self {
            result: canonical_result_string(current),
            status: contextual_status(current, previous),
            metric_name: metric_name(current),
            score: severity_score(current),
        }
    }
}
