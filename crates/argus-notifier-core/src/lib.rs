//! Argus Notifier Core
//!
//! Turns CI build completion events into Argus metrics and annotations:
//! - `resolver`: pure classification of build results (contextual status,
//!   metric name, severity score)
//! - `factory`: metric and annotation assembly for one completed build
//! - `listener`: the build-completion handler that wires host, classifier
//!   and sender together
//!
//! The host (CI server, pipeline step) and the transport to Argus are
//! reached only through the [`HostContext`] and [`ArgusSender`] traits.

pub mod build;
pub mod config;
pub mod error;
pub mod factory;
pub mod fakes;
pub mod host;
pub mod listener;
pub mod obs;
pub mod record;
pub mod resolver;
pub mod sender;
pub mod telemetry;

pub use build::{BuildResult, BuildTiming, CompletedBuild, ParseBuildResultError};
pub use config::{
    Credentials, CredentialsProvider, EnvCredentialsProvider, NotifierConfig,
    StaticCredentialsProvider,
};
pub use error::{NotifyError, Result, SendError};
pub use factory::{assemble_payload, AnnotationFactory, MetricFactory, NotificationPayload};
pub use host::HostContext;
pub use listener::{ArgusBuildListener, BuildListener, DeliveryReport};
pub use obs::{
    build_span, emit_host_unavailable, emit_notify_failed, emit_notify_sending, emit_notify_sent,
};
pub use record::{Annotation, Metric};
pub use resolver::{
    canonical_result_string, contextual_status, metric_name, severity_score, Classification,
    ContextualStatus,
};
pub use sender::ArgusSender;
pub use telemetry::init_tracing;

/// Argus notifier core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
