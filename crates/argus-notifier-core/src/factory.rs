//! Metric and annotation assembly for one completed build.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::build::{BuildResult, CompletedBuild};
use crate::config::NotifierConfig;
use crate::record::{Annotation, Metric};
use crate::resolver::{
    canonical_result_string, metric_name, severity_score, Classification,
    ContextualStatus,
};

pub const QUEUE_TIME_METRIC: &str = "build.time.queue";
pub const BUILDING_TIME_METRIC: &str = "build.time.building";
pub const TOTAL_TIME_METRIC: &str = "build.time.total";

/// Annotation type Argus files build annotations under.
pub const BUILD_ANNOTATION_TYPE: &str = "BUILD";

/// Builds the metric data points reported for a build.
pub struct MetricFactory<'a> {
    build: &'a CompletedBuild,
    scope: &'a str,
    timestamp: i64,
    tags: BTreeMap<String, String>,
}

impl<'a> MetricFactory<'a> {
    /// Every metric is tagged with the job and, when known, the host instance.
    pub fn new(build: &'a CompletedBuild, scope: &'a str, instance_name: Option<&str>) -> Self {
        let mut tags = BTreeMap::new();
        tags.insert("job".to_string(), build.job.clone());
        if let Some(host) = instance_name {
            tags.insert("host".to_string(), host.to_string());
        }
        Self {
            build,
            scope,
            timestamp: build.timestamp(),
            tags,
        }
    }

    /// `build.<result>` with the severity score as its value.
    pub fn build_status_metric(&self) -> Metric {
        self.metric(
            metric_name(self.build.result),
            severity_score(self.build.result),
        )
    }

    /// Queue, building and total durations in seconds, for whichever the
    /// host measured.
    pub fn build_time_metrics(&self) -> Vec<Metric> {
        let timing = &self.build.timing;
        [
            (QUEUE_TIME_METRIC, timing.queue_ms),
            (BUILDING_TIME_METRIC, timing.building_ms),
            (TOTAL_TIME_METRIC, timing.total_ms),
        ]
        .into_iter()
        .filter_map(|(name, ms)| ms.map(|ms| self.metric(name.to_string(), ms as f64 / 1000.0)))
        .collect()
    }

    fn metric(&self, name: String, value: f64) -> Metric {
        Metric::new(self.scope, name, self.timestamp, value).with_tags(self.tags.clone())
    }
}

/// Builds the annotations that carry a build's contextual status.
pub struct AnnotationFactory<'a> {
    build: &'a CompletedBuild,
    source: &'a str,
    status: ContextualStatus,
}

impl<'a> AnnotationFactory<'a> {
    pub fn new(build: &'a CompletedBuild, source: &'a str, status: ContextualStatus) -> Self {
        Self {
            build,
            source,
            status,
        }
    }

    /// One annotation per metric, attached to that metric's data point.
    pub fn annotations_for(&self, metrics: &[Metric]) -> Vec<Annotation> {
        metrics.iter().map(|m| self.annotation_for(m)).collect()
    }

    pub fn annotation_for(&self, metric: &Metric) -> Annotation {
        let mut fields = BTreeMap::new();
        fields.insert("status".to_string(), self.status.to_string());
        fields.insert(
            "result".to_string(),
            canonical_result_string(self.build.result).to_string(),
        );
        if let Some(url) = &self.build.url {
            fields.insert("url".to_string(), url.clone());
        }

        Annotation {
            scope: metric.scope.clone(),
            source: self.source.to_string(),
            metric: metric.metric.clone(),
            timestamp: metric.timestamp,
            text: self.status.to_string(),
            kind: BUILD_ANNOTATION_TYPE.to_string(),
            id: self.build.display_name(),
            tags: metric.tags.clone(),
            fields,
        }
    }
}

/// Everything sent to Argus for one build.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationPayload {
    pub classification: Classification,
    pub metrics: Vec<Metric>,
    pub annotations: Vec<Annotation>,
}

/// Classify `build` against its predecessor and assemble its records.
///
/// The severity metric always comes first, followed by any timing metrics.
pub fn assemble_payload(
    build: &CompletedBuild,
    previous: Option<BuildResult>,
    config: &NotifierConfig,
    instance_name: Option<&str>,
) -> NotificationPayload {
    let classification = Classification::of(build.result, previous);

    let metric_factory = MetricFactory::new(build, &config.scope, instance_name);
    let mut metrics = vec![metric_factory.build_status_metric()];
    metrics.extend(metric_factory.build_time_metrics());

    let annotations = AnnotationFactory::new(build, &config.source, classification.status)
        .annotations_for(&metrics);

    NotificationPayload {
        classification,
        metrics,
        annotations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::BuildTiming;
    use chrono::{TimeZone, Utc};

    fn build(result: Option<BuildResult>) -> CompletedBuild {
        CompletedBuild::new("team/service", 42, result)
            .with_completed_at(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap())
    }

    fn config() -> NotifierConfig {
        NotifierConfig::new("https://argus.example.com", "bot")
            .with_scope("ci.test")
            .with_source("unit")
    }

    #[test]
    fn test_build_status_metric() {
        let build = build(Some(BuildResult::Failure));
        let metric = MetricFactory::new(&build, "ci.test", None).build_status_metric();

        assert_eq!(metric.metric, "build.failure");
        assert_eq!(metric.value, 2.0);
        assert_eq!(metric.scope, "ci.test");
        assert_eq!(metric.timestamp, build.timestamp());
        assert_eq!(metric.tags.get("job").map(String::as_str), Some("team/service"));
        assert!(!metric.tags.contains_key("host"));
    }

    #[test]
    fn test_host_tag_when_instance_known() {
        let build = build(Some(BuildResult::Success));
        let metric = MetricFactory::new(&build, "ci", Some("ci-east-1")).build_status_metric();
        assert_eq!(metric.tags.get("host").map(String::as_str), Some("ci-east-1"));
    }

    #[test]
    fn test_no_time_metrics_without_timing() {
        let build = build(Some(BuildResult::Success));
        assert!(MetricFactory::new(&build, "ci", None)
            .build_time_metrics()
            .is_empty());
    }

    #[test]
    fn test_time_metrics_in_seconds() {
        let build = build(Some(BuildResult::Success)).with_timing(BuildTiming {
            queue_ms: Some(1_500),
            building_ms: None,
            total_ms: Some(61_500),
        });
        let metrics = MetricFactory::new(&build, "ci", None).build_time_metrics();

        assert_eq!(metrics.len(), 2);
        assert_eq!(metrics[0].metric, QUEUE_TIME_METRIC);
        assert_eq!(metrics[0].value, 1.5);
        assert_eq!(metrics[1].metric, TOTAL_TIME_METRIC);
        assert_eq!(metrics[1].value, 61.5);
    }

    #[test]
    fn test_annotation_carries_contextual_status() {
        let build = build(Some(BuildResult::Success)).with_url("https://ci.example.com/job/42");
        let metric = MetricFactory::new(&build, "ci", None).build_status_metric();
        let annotation =
            AnnotationFactory::new(&build, "unit", ContextualStatus::Fixed).annotation_for(&metric);

        assert_eq!(annotation.text, "FIXED");
        assert_eq!(annotation.kind, "BUILD");
        assert_eq!(annotation.id, "team/service#42");
        assert_eq!(annotation.source, "unit");
        assert!(annotation.annotates(&metric));
        assert_eq!(annotation.fields.get("result").map(String::as_str), Some("SUCCESS"));
        assert_eq!(
            annotation.fields.get("url").map(String::as_str),
            Some("https://ci.example.com/job/42")
        );
    }

    #[test]
    fn test_assemble_payload_orders_status_metric_first() {
        let build = build(Some(BuildResult::Failure)).with_timing(BuildTiming {
            queue_ms: Some(100),
            building_ms: Some(200),
            total_ms: Some(300),
        });
        let payload = assemble_payload(&build, Some(BuildResult::Failure), &config(), None);

        assert_eq!(payload.metrics.len(), 4);
        assert_eq!(payload.metrics[0].metric, "build.failure");
        assert_eq!(payload.annotations.len(), 4);
        for (metric, annotation) in payload.metrics.iter().zip(&payload.annotations) {
            assert!(annotation.annotates(metric));
            assert_eq!(annotation.text, "STILL FAILING");
            assert_eq!(annotation.source, "unit");
        }
        assert_eq!(payload.classification.status, ContextualStatus::StillFailing);
    }

    #[test]
    fn test_assemble_payload_unknown_result() {
        let payload = assemble_payload(&build(None), Some(BuildResult::Failure), &config(), None);
        assert_eq!(payload.metrics[0].metric, "build.unknown");
        assert_eq!(payload.metrics[0].value, 0.5);
        assert_eq!(payload.annotations[0].text, "UNKNOWN");
    }
}
