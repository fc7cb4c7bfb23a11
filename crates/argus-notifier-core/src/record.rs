//! Metric and annotation records handed to the sender.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single timestamped data point.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Metric {
    pub scope: String,

    /// Metric name, e.g. `build.failure` or `build.time.total`.
    pub metric: String,

    /// Epoch seconds.
    pub timestamp: i64,

    pub value: f64,

    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl Metric {
    pub fn new(scope: impl Into<String>, metric: impl Into<String>, timestamp: i64, value: f64) -> Self {
        Self {
            scope: scope.into(),
            metric: metric.into(),
            timestamp,
            value,
            tags: BTreeMap::new(),
        }
    }

    pub fn with_tags(mut self, tags: BTreeMap<String, String>) -> Self {
        self.tags = tags;
        self
    }
}

/// Textual marker attached to a metric data point.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Annotation {
    pub scope: String,
    pub source: String,

    /// Name of the metric this annotation is attached to.
    pub metric: String,

    /// Epoch seconds; equal to the annotated data point's timestamp.
    pub timestamp: i64,

    /// Contextual status of the build ("FIXED", "STILL FAILING", ...).
    pub text: String,

    /// Annotation type as Argus groups them; always `BUILD` here.
    #[serde(rename = "type")]
    pub kind: String,

    /// Identifier of the annotated event, `<job>#<number>`.
    pub id: String,

    #[serde(default)]
    pub tags: BTreeMap<String, String>,

    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

impl Annotation {
    /// Whether this annotation belongs to `metric`'s data point.
    pub fn annotates(&self, metric: &Metric) -> bool {
        self.scope == metric.scope && self.metric == metric.metric && self.timestamp == metric.timestamp
    }
}
