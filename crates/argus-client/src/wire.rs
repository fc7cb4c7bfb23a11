//! JSON shapes the Argus collection endpoints accept.
//!
//! Notifier records carry epoch seconds; Argus keys datapoints and
//! annotation timestamps in epoch milliseconds.

use std::collections::BTreeMap;

use argus_notifier_core::{Annotation, Metric};
use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WireMetric {
    pub scope: String,
    pub metric: String,
    pub tags: BTreeMap<String, String>,
    /// Epoch-millisecond timestamp (as a string key) to value.
    pub datapoints: BTreeMap<String, f64>,
}

impl From<&Metric> for WireMetric {
    fn from(metric: &Metric) -> Self {
        let mut datapoints = BTreeMap::new();
        datapoints.insert(to_millis(metric.timestamp).to_string(), metric.value);
        Self {
            scope: metric.scope.clone(),
            metric: metric.metric.clone(),
            tags: metric.tags.clone(),
            datapoints,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct WireAnnotation {
    pub scope: String,
    pub metric: String,
    pub source: String,
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// Epoch milliseconds.
    pub timestamp: i64,
    pub tags: BTreeMap<String, String>,
    pub fields: BTreeMap<String, String>,
}

impl From<&Annotation> for WireAnnotation {
    fn from(annotation: &Annotation) -> Self {
        let mut fields = annotation.fields.clone();
        fields
            .entry("status".to_string())
            .or_insert_with(|| annotation.text.clone());
        Self {
            scope: annotation.scope.clone(),
            metric: annotation.metric.clone(),
            source: annotation.source.clone(),
            id: annotation.id.clone(),
            kind: annotation.kind.clone(),
            timestamp: to_millis(annotation.timestamp),
            tags: annotation.tags.clone(),
            fields,
        }
    }
}

fn to_millis(epoch_seconds: i64) -> i64 {
    epoch_seconds.saturating_mul(1000)
}
