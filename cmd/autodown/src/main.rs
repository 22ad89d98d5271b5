use anyhow::Context;
use chrono::Utc;
use clap::{Parser, ValueEnum};
use pkg_cluster::{ClusterClient, KubeCluster};
use pkg_constants::{env, logging, paths};
use pkg_controllers::{ScanConfig, WorkloadScanner};
use pkg_types::config::{AutodownConfigFile, load_config_file};
use pkg_types::policy::parse_bool;
use pkg_types::workload::WorkloadKind;
use std::process::ExitCode;
use tracing::{Instrument, error, info, info_span, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "autodown",
    about = "Scale idle Deployments and StatefulSets down to zero replicas"
)]
struct Cli {
    /// Path to YAML config file
    #[arg(long, short, default_value = paths::DEFAULT_CONFIG)]
    config: String,

    /// Report decisions without scaling anything
    #[arg(long)]
    dry_run: bool,

    /// Log output format
    #[arg(long, value_enum, default_value = "text")]
    log_format: LogFormat,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_env(env::LOG_FILTER).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Merge: CLI flag > environment > config file > live mode.
fn resolve_dry_run(flag: bool, env_value: Option<&str>, file_value: Option<bool>) -> bool {
    if flag {
        return true;
    }
    if let Some(value) = env_value.and_then(parse_bool) {
        return value;
    }
    file_value.unwrap_or(false)
}

fn build_scan_config(dry_run: bool, file_cfg: AutodownConfigFile) -> ScanConfig {
    let kinds = file_cfg.kinds.unwrap_or_else(|| WorkloadKind::ALL.to_vec());
    ScanConfig::new(dry_run)
        .with_kinds(&kinds)
        .with_excluded_namespaces(file_cfg.exclude_namespaces)
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    // Load config file (returns defaults if file not found)
    let file_cfg: AutodownConfigFile = load_config_file(&cli.config)
        .with_context(|| format!("failed to load config file {}", cli.config))?;
    info!("Config file: {}", cli.config);

    let env_dry_run = std::env::var(env::DRY_RUN).ok();
    if let Some(value) = &env_dry_run
        && parse_bool(value).is_none()
    {
        warn!("{}='{}' is not a boolean, ignoring", env::DRY_RUN, value);
    }
    let dry_run = resolve_dry_run(cli.dry_run, env_dry_run.as_deref(), file_cfg.dry_run);
    let config = build_scan_config(dry_run, file_cfg);

    info!("Starting autodown");
    info!("  Dry run:   {}", config.dry_run);
    info!(
        "  Kinds:     {}",
        config
            .kinds()
            .iter()
            .map(|k| k.label())
            .collect::<Vec<_>>()
            .join(", ")
    );
    if !config.exclude_namespaces.is_empty() {
        info!("  Excluded:  {}", config.exclude_namespaces.join(", "));
    }

    let client = KubeCluster::try_default()
        .await
        .context("failed to create Kubernetes client")?;
    info!("Connected via {} client", client.name());

    // sampled once so every decision in this run agrees on the time
    let now = Utc::now();
    let report = WorkloadScanner::new(&client, config).scan(now).await;
    Ok(report.finish())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    match run(cli).instrument(info_span!("run", prefix = logging::PREFIX)).await {
        Ok(code) => code,
        Err(e) => {
            error!("exited with error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
