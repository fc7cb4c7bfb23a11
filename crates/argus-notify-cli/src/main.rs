//! Argus Notify - report CI build results to Argus
//!
//! Runs as the last step of a pipeline and acts as the notifier's host.
//!
//! ## Commands
//!
//! - `notify`: report a completed build as metrics and annotations
//! - `classify`: print how a result would be classified, without sending

mod history;
mod host;
mod settings;

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use argus_client::{ArgusClient, ClientConfig};
use argus_notifier_core::{
    assemble_payload, canonical_result_string, ArgusBuildListener, BuildResult, BuildTiming,
    Classification, CompletedBuild, Credentials, CredentialsProvider, EnvCredentialsProvider,
    StaticCredentialsProvider,
};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn, Level};

use crate::history::BuildHistory;
use crate::host::{PipelineHost, PreviousResult};
use crate::settings::{FileSettings, Overrides, Settings};

#[derive(Parser)]
#[command(name = "argus-notify")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Report CI build results to Argus", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Settings file (TOML)
    #[arg(short, long, global = true, env = "ARGUS_NOTIFY_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report a completed build to Argus
    ///
    /// Never fails the pipeline: delivery problems are logged and the
    /// command still exits successfully.
    Notify(NotifyArgs),

    /// Print the classification of a result as JSON
    Classify {
        /// Result of the build (SUCCESS, UNSTABLE, FAILURE, NOT_BUILT, ABORTED or UNKNOWN)
        #[arg(short, long)]
        result: ResultArg,

        /// Result of the build before it
        #[arg(short, long)]
        previous_result: Option<ResultArg>,
    },
}

#[derive(Args)]
struct NotifyArgs {
    /// Full job name
    #[arg(long, env = "ARGUS_JOB")]
    job: String,

    /// Build number
    #[arg(long, env = "ARGUS_BUILD_NUMBER")]
    number: u64,

    /// Result of the build (UNKNOWN when the CI never set one)
    #[arg(long, env = "ARGUS_BUILD_RESULT", default_value = "UNKNOWN")]
    result: ResultArg,

    /// Result of the previous build (overrides the history file)
    #[arg(long)]
    previous_result: Option<ResultArg>,

    /// Completion time, RFC 3339 (default: now)
    #[arg(long)]
    completed_at: Option<DateTime<Utc>>,

    /// Milliseconds spent queued
    #[arg(long)]
    queue_ms: Option<u64>,

    /// Milliseconds spent building
    #[arg(long)]
    building_ms: Option<u64>,

    /// Milliseconds from queueing to completion
    #[arg(long)]
    total_ms: Option<u64>,

    /// Link to the build page
    #[arg(long, env = "ARGUS_BUILD_URL")]
    url: Option<String>,

    /// Argus web service base URL
    #[arg(long, env = "ARGUS_URL")]
    argus_url: Option<String>,

    /// Scope for metrics and annotations
    #[arg(long, env = "ARGUS_SCOPE")]
    scope: Option<String>,

    /// Source recorded on annotations
    #[arg(long, env = "ARGUS_SOURCE")]
    source: Option<String>,

    /// Credentials id resolved from ARGUS_CREDENTIALS_<ID>_USERNAME/_PASSWORD
    #[arg(long, env = "ARGUS_CREDENTIALS_ID")]
    credentials_id: Option<String>,

    /// Username, used instead of a credentials id
    #[arg(long, env = "ARGUS_USERNAME", requires = "password")]
    username: Option<String>,

    /// Password, used instead of a credentials id
    #[arg(long, env = "ARGUS_PASSWORD", hide_env_values = true, requires = "username")]
    password: Option<String>,

    /// Name of this CI instance, tagged on metrics as `host`
    #[arg(long, env = "ARGUS_INSTANCE_NAME")]
    instance_name: Option<String>,

    /// Build history file used to find the previous result
    #[arg(long, env = "ARGUS_HISTORY")]
    history: Option<PathBuf>,

    /// HTTP timeout in seconds
    #[arg(long, env = "ARGUS_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    /// Print the payload instead of sending it
    #[arg(long)]
    dry_run: bool,
}

/// Build result as given on the command line; `UNKNOWN` means no result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ResultArg(Option<BuildResult>);

impl FromStr for ResultArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty()
            || trimmed.eq_ignore_ascii_case("unknown")
            || trimmed.eq_ignore_ascii_case("unset")
        {
            return Ok(ResultArg(None));
        }
        trimmed
            .parse::<BuildResult>()
            .map(|r| ResultArg(Some(r)))
            .map_err(|e| e.to_string())
    }
}

/// Credentials id used when a username and password are given directly.
const CLI_CREDENTIALS_ID: &str = "cli";

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    argus_notifier_core::init_tracing(cli.json, level);

    match cli.command {
        Commands::Notify(args) => cmd_notify(cli.config.as_deref(), args).await,
        Commands::Classify {
            result,
            previous_result,
        } => cmd_classify(result, previous_result),
    }
}

/// Report a completed build
async fn cmd_notify(config_path: Option<&Path>, args: NotifyArgs) -> Result<()> {
    let file = match config_path {
        Some(path) => FileSettings::load(path)?,
        None => FileSettings::default(),
    };
    let direct_credentials = match (&args.username, &args.password) {
        (Some(username), Some(password)) => Some(Credentials::new(username, password)),
        _ => None,
    };
    let mut overrides = Overrides {
        argus_url: args.argus_url.clone(),
        scope: args.scope.clone(),
        source: args.source.clone(),
        credentials_id: args.credentials_id.clone(),
        instance_name: args.instance_name.clone(),
        history: args.history.clone(),
        timeout_secs: args.timeout_secs,
    };
    if direct_credentials.is_some() {
        overrides.credentials_id = Some(CLI_CREDENTIALS_ID.to_string());
    }
    let settings = Settings::merge(file, overrides);

    let build = completed_build(&args);

    let mut history = match &settings.history {
        Some(path) => match BuildHistory::load(path) {
            Ok(history) => Some(history),
            Err(e) => {
                warn!("Ignoring build history: {}", e);
                None
            }
        },
        None => None,
    };

    let previous = match (args.previous_result, &history) {
        (Some(previous), _) => PreviousResult::Explicit(previous.0),
        (None, Some(history)) => PreviousResult::History(history.clone()),
        (None, None) => PreviousResult::Unknown,
    };

    if args.dry_run {
        let host = PipelineHost::new(
            settings.notifier.clone(),
            Box::new(StaticCredentialsProvider::new()),
            previous,
            settings.instance_name.clone(),
        );
        return print_payload(&host, &build);
    }

    let credentials: Box<dyn CredentialsProvider> = match direct_credentials {
        Some(creds) => Box::new(StaticCredentialsProvider::new().with(CLI_CREDENTIALS_ID, creds)),
        None => Box::new(EnvCredentialsProvider::new()),
    };
    let host = Arc::new(PipelineHost::new(
        settings.notifier.clone(),
        credentials,
        previous,
        settings.instance_name.clone(),
    ));

    let mut client_config = ClientConfig::from_env();
    if let Some(timeout_secs) = settings.timeout_secs {
        client_config = client_config.with_timeout_secs(timeout_secs);
    }
    match ArgusClient::new(client_config) {
        Ok(client) => {
            let listener = Arc::new(ArgusBuildListener::new(&host, Arc::new(client)));
            if let Err(e) = listener.dispatch(build.clone()).await {
                warn!("Notification task ended abnormally: {}", e);
            }
        }
        Err(e) => warn!("Could not create Argus client, skipping notification: {}", e),
    }

    if let Some(history) = history.as_mut() {
        history.record(&build);
        if let Err(e) = history.save() {
            warn!("Could not save build history: {}", e);
        }
    }

    info!(
        "Reported {} as {}",
        build.display_name(),
        canonical_result_string(build.result)
    );
    Ok(())
}

/// Print the classification of a result
fn cmd_classify(result: ResultArg, previous: Option<ResultArg>) -> Result<()> {
    let classification = Classification::of(result.0, previous.and_then(|p| p.0));
    let json = serde_json::to_string_pretty(&classification)
        .context("Failed to serialize classification")?;
    println!("{}", json);
    Ok(())
}

fn completed_build(args: &NotifyArgs) -> CompletedBuild {
    let mut build = CompletedBuild::new(args.job.clone(), args.number, args.result.0).with_timing(
        BuildTiming {
            queue_ms: args.queue_ms,
            building_ms: args.building_ms,
            total_ms: args.total_ms,
        },
    );
    if let Some(completed_at) = args.completed_at {
        build = build.with_completed_at(completed_at);
    }
    if let Some(url) = &args.url {
        build = build.with_url(url.clone());
    }
    build
}

fn print_payload(host: &PipelineHost, build: &CompletedBuild) -> Result<()> {
    use argus_notifier_core::HostContext;

    let config = host.notifier_config();
    let previous = host.previous_result(&build.job, build.number);
    let instance = host.instance_name();
    let payload = assemble_payload(build, previous, &config, instance.as_deref());
    let json = serde_json::to_string_pretty(&payload).context("Failed to serialize payload")?;
    println!("{}", json);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_result_arg_parsing() {
        assert_eq!("FAILURE".parse::<ResultArg>(), Ok(ResultArg(Some(BuildResult::Failure))));
        assert_eq!("not_built".parse::<ResultArg>(), Ok(ResultArg(Some(BuildResult::NotBuilt))));
        assert_eq!("UNKNOWN".parse::<ResultArg>(), Ok(ResultArg(None)));
        assert_eq!("unset".parse::<ResultArg>(), Ok(ResultArg(None)));
        assert!("GREEN".parse::<ResultArg>().is_err());
    }

    #[test]
    fn test_parse_notify_args() {
        let cli = Cli::try_parse_from([
            "argus-notify",
            "notify",
            "--job",
            "svc/main",
            "--number",
            "12",
            "--result",
            "failure",
            "--previous-result",
            "FAILURE",
            "--total-ms",
            "60000",
            "--completed-at",
            "2024-05-01T12:00:00Z",
            "--dry-run",
        ])
        .expect("parse");

        let Commands::Notify(args) = cli.command else {
            panic!("expected notify command");
        };
        assert_eq!(args.job, "svc/main");
        assert_eq!(args.number, 12);
        assert_eq!(args.result, ResultArg(Some(BuildResult::Failure)));
        assert_eq!(args.previous_result, Some(ResultArg(Some(BuildResult::Failure))));
        assert!(args.dry_run);

        let build = completed_build(&args);
        assert_eq!(build.timing.total_ms, Some(60_000));
        assert_eq!(build.timestamp(), 1_714_564_800);
    }

    #[test]
    fn test_username_requires_password() {
        let parsed = Cli::try_parse_from([
            "argus-notify",
            "notify",
            "--job",
            "svc",
            "--number",
            "1",
            "--username",
            "bot",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_classify_prints_json() {
        assert!(cmd_classify(
            ResultArg(Some(BuildResult::Success)),
            Some(ResultArg(Some(BuildResult::Failure)))
        )
        .is_ok());
    }

    #[tokio::test]
    async fn test_notify_dry_run_records_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let history_path = dir.path().join("history.json");
        let cli = Cli::try_parse_from([
            "argus-notify",
            "notify",
            "--job",
            "svc",
            "--number",
            "3",
            "--result",
            "SUCCESS",
            "--argus-url",
            "https://argus.example.com",
            "--history",
            history_path.to_str().unwrap(),
            "--dry-run",
        ])
        .expect("parse");
        let Commands::Notify(args) = cli.command else {
            panic!("expected notify command");
        };

        cmd_notify(None, args).await.expect("dry run");
        assert!(!history_path.exists());
    }

    #[tokio::test]
    async fn test_notify_unreachable_argus_still_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let history_path = dir.path().join("history.json");
        let cli = Cli::try_parse_from([
            "argus-notify",
            "notify",
            "--job",
            "svc",
            "--number",
            "4",
            "--result",
            "FAILURE",
            "--argus-url",
            "http://127.0.0.1:9",
            "--username",
            "bot",
            "--password",
            "pw",
            "--timeout-secs",
            "2",
            "--history",
            history_path.to_str().unwrap(),
        ])
        .expect("parse");
        let Commands::Notify(args) = cli.command else {
            panic!("expected notify command");
        };

        cmd_notify(None, args).await.expect("notify never fails the build");

        let history = BuildHistory::load(&history_path).unwrap();
        assert_eq!(history.previous_result("svc", 5), Some(BuildResult::Failure));
    }
}
