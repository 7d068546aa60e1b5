//! Verification daemon: loads configuration, opens the LMDB store and serves
//! the HTTP API until interrupted.

mod config;

use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::sync::broadcast::error::RecvError;

use vetting_rpc::{AppState, BroadcastSink, RpcMetrics, RpcServer};
use vetting_store_lmdb::{check_data_dir, check_integrity, LmdbEnvironment};
use vetting_types::SystemClock;
use vetting_utils::{init_logging, LogFormat};
use vetting_verification::VerificationService;

use crate::config::DaemonConfig;

/// Named databases plus headroom for schema migrations.
const MAX_DBS: u32 = 16;

#[derive(Parser)]
#[command(name = "vetting-daemon", about = "Founder and investor verification service")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "VETTING_CONFIG")]
    config: Option<PathBuf>,

    /// Data directory for the LMDB environment.
    #[arg(long, env = "VETTING_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// LMDB map size in bytes.
    #[arg(long, env = "VETTING_MAP_SIZE")]
    map_size: Option<usize>,

    /// Address the HTTP API binds to.
    #[arg(long, env = "VETTING_RPC_BIND")]
    rpc_bind: Option<IpAddr>,

    /// HTTP API port.
    #[arg(long, env = "VETTING_RPC_PORT")]
    rpc_port: Option<u16>,

    /// Enable Prometheus metrics endpoint.
    #[arg(long, env = "VETTING_ENABLE_METRICS")]
    metrics: bool,

    /// Log format: "human" or "json".
    #[arg(long, env = "VETTING_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "VETTING_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Run the HTTP API.
    Serve,
    /// Open the store, run the integrity check and exit.
    Check,
    /// Print the effective configuration as TOML.
    Config,
}

impl Cli {
    /// File config (or defaults) with CLI and environment overrides applied.
    fn effective_config(&self) -> anyhow::Result<DaemonConfig> {
        let mut config = match &self.config {
            Some(path) => DaemonConfig::from_toml_file(path)?,
            None => DaemonConfig::default(),
        };
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(size) = self.map_size {
            config.map_size = size;
        }
        if let Some(bind) = self.rpc_bind {
            config.rpc_bind = bind;
        }
        if let Some(port) = self.rpc_port {
            config.rpc_port = port;
        }
        config.enable_metrics |= self.metrics;
        if let Some(format) = self.log_format {
            config.log_format = format;
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.effective_config()?;

    if let Command::Config = cli.command {
        print!("{}", config.to_toml_string()?);
        return Ok(());
    }

    init_logging(config.log_format, &config.log_level)?;
    if let Some(path) = &cli.config {
        tracing::info!("Loaded config from {}", path.display());
    }

    let env = open_environment(&config)?;
    match cli.command {
        Command::Check => tracing::info!("integrity check passed"),
        Command::Serve => serve(config, env).await?,
        Command::Config => {}
    }
    Ok(())
}

fn open_environment(config: &DaemonConfig) -> anyhow::Result<LmdbEnvironment> {
    check_data_dir(&config.data_dir).map_err(anyhow::Error::msg)?;
    let env = LmdbEnvironment::open(&config.data_dir, MAX_DBS, config.map_size)
        .with_context(|| format!("failed to open store at {}", config.data_dir.display()))?;

    let report = check_integrity(env.env())?;
    if !report.is_healthy() {
        for error in &report.errors {
            tracing::error!("integrity: {error}");
        }
        anyhow::bail!(
            "store at {} failed the integrity check ({} errors)",
            config.data_dir.display(),
            report.errors.len()
        );
    }
    tracing::info!(
        databases = report.databases_checked,
        entries = report.total_entries,
        "store opened"
    );
    Ok(env)
}

async fn serve(config: DaemonConfig, env: LmdbEnvironment) -> anyhow::Result<()> {
    let sink = Arc::new(BroadcastSink::new(config.notification_capacity));
    spawn_event_log(&sink);

    let service = VerificationService::new(Arc::new(env.verification_store()), Arc::new(SystemClock))
        .with_requirements(config.requirements.clone())
        .with_page_limits(config.queue)
        .with_sink(sink);

    let mut state = AppState::new(Arc::new(service));
    if config.enable_metrics {
        state = state.with_metrics(Arc::new(RpcMetrics::new()?));
    }

    tracing::info!(
        "Starting verification API on {} (metrics: {})",
        config.rpc_addr(),
        if config.enable_metrics { "on" } else { "off" }
    );
    RpcServer::new(config.rpc_addr(), state)
        .serve(shutdown_signal())
        .await?;

    tracing::info!("verification daemon exited cleanly");
    Ok(())
}

/// Log every review decision. Stands in for mail or push delivery.
fn spawn_event_log(sink: &BroadcastSink) {
    let mut events = sink.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => tracing::info!(
                    request_id = %event.request_id,
                    user_id = %event.user_id,
                    status = %event.status,
                    "verification reviewed"
                ),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "review event log lagged")
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
        return;
    }
    tracing::info!("Shutdown signal received, stopping");
}
