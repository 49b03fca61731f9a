//! Workload launcher CLI - render pod launch specifications from requests

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info};

use launcher_common::telemetry::{init_logging, LogFormat, LoggingConfig};
use launcher_common::{Error, LauncherConfig, OsEnv, Result};
use launcher_pods::{LaunchInputMapper, LaunchRequest, LaunchSpecification};

/// Workload launcher - maps launch requests to pod launch specifications
#[derive(Parser, Debug)]
#[command(name = "workload-launcher", version, about, long_about = None)]
struct Cli {
    /// Log output format (json or text)
    #[arg(long, env = "LOG_FORMAT", default_value = "json", global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the launch specification for a request as JSON
    ///
    /// Configuration is read from the YAML file and then overridden from
    /// the environment (e.g. JOB_KUBE_NODE_SELECTORS).
    Render(RenderArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Path to the launcher configuration YAML
    #[arg(short = 'c', long = "config", env = "WORKLOAD_LAUNCHER_CONFIG")]
    config_file: PathBuf,

    /// Path to the launch request JSON
    #[arg(short = 'r', long = "request")]
    request_file: PathBuf,

    /// Workload identifier written into the pod's init files
    #[arg(long)]
    workload_id: String,

    /// Shared label applied to every role, as key=value (repeatable)
    #[arg(short = 'l', long = "label", value_parser = parse_label)]
    labels: Vec<(String, String)>,
}

fn parse_label(raw: &str) -> std::result::Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got '{}'", raw)),
    }
}

fn read_request(path: &Path) -> Result<LaunchRequest> {
    let data = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    LaunchRequest::from_json_str(&data)
}

fn render(args: &RenderArgs) -> Result<LaunchSpecification> {
    let config = LauncherConfig::from_file(&args.config_file)?.apply_env(&OsEnv)?;
    config.validate()?;

    let request = read_request(&args.request_file)?;
    let shared_labels: BTreeMap<String, String> = args.labels.iter().cloned().collect();

    let mapper = LaunchInputMapper::from_config(&config);
    mapper.map(&args.workload_id, &request, &shared_labels)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(LoggingConfig {
        format: cli.log_format,
        default_filter: None,
    }) {
        eprintln!("{}", e);
        return ExitCode::FAILURE;
    }

    match cli.command {
        Commands::Render(args) => match render(&args) {
            Ok(spec) => match serde_json::to_string_pretty(&spec) {
                Ok(json) => {
                    info!(pod = %spec.pod_info.name, "rendered launch specification");
                    println!("{}", json);
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    error!(error = %e, "failed to encode launch specification");
                    ExitCode::FAILURE
                }
            },
            Err(e) => {
                error!(
                    error = %e,
                    retryable = e.is_retryable(),
                    "failed to render launch specification"
                );
                ExitCode::FAILURE
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_render_arguments() {
        let cli = Cli::try_parse_from([
            "workload-launcher",
            "--log-format",
            "text",
            "render",
            "-c",
            "launcher.yaml",
            "-r",
            "request.json",
            "--workload-id",
            "wl-1",
            "-l",
            "team=data",
            "--label",
            "tier=gold",
        ])
        .unwrap();

        assert_eq!(cli.log_format, LogFormat::Text);
        let Commands::Render(args) = cli.command;
        assert_eq!(args.config_file, PathBuf::from("launcher.yaml"));
        assert_eq!(args.request_file, PathBuf::from("request.json"));
        assert_eq!(args.workload_id, "wl-1");
        assert_eq!(
            args.labels,
            vec![
                ("team".to_string(), "data".to_string()),
                ("tier".to_string(), "gold".to_string()),
            ]
        );
    }

    #[test]
    fn rejects_malformed_label() {
        let result = Cli::try_parse_from([
            "workload-launcher",
            "render",
            "-c",
            "launcher.yaml",
            "-r",
            "request.json",
            "--workload-id",
            "wl-1",
            "-l",
            "no-equals",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn label_values_may_be_empty() {
        assert_eq!(
            parse_label("team=").unwrap(),
            ("team".to_string(), String::new())
        );
        assert!(parse_label("=value").is_err());
    }

    #[test]
    fn missing_request_file_is_io_error() {
        let err = read_request(Path::new("/nonexistent/request.json")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn unknown_request_type_is_unsupported() {
        let path = std::env::temp_dir().join(format!(
            "workload-launcher-request-{}.json",
            std::process::id()
        ));
        std::fs::write(&path, r#"{"type":"discoverV2","jobRunConfig":{}}"#).unwrap();

        let err = read_request(&path).unwrap_err();
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(err, Error::UnsupportedVariant { ref variant } if variant == "discoverV2"));
        assert!(!err.is_retryable());
    }
}
