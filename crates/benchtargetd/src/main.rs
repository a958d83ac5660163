//! benchtargetd - Benchmark Target Daemon
//!
//! Builds one benchmark target from configuration, drives it with concurrent
//! synthetic client sessions and prints the resulting counters.
//!
//! # Usage
//!
//! ```bash
//! # 8 clients, 10000 scalar reads each, JSON report
//! benchtargetd --clients 8 --calls 10000 --workload scalar-read
//!
//! # Mixed workload, Prometheus text report
//! benchtargetd --workload all --output prometheus
//!
//! # 4 clients issuing commands for 10 seconds each
//! benchtargetd --workload command --period 10
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use benchtarget::config::DEFAULT_CONFIG_PATH;
use benchtarget::{
    run_session, BenchmarkTarget, Budget, MetricsExporter, SessionReport, TargetConfig, Workload,
};

#[derive(Parser, Debug)]
#[command(name = "benchtargetd")]
#[command(about = "Drive concurrent client sessions against a benchmark target", long_about = None)]
struct Args {
    /// Configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Log filter, overrides the configuration file (e.g. "debug", "benchtarget=trace")
    #[arg(long)]
    log_level: Option<String>,

    /// Emit JSON formatted logs
    #[arg(long)]
    json_logs: bool,

    /// Number of concurrent client sessions
    #[arg(long, default_value = "4")]
    clients: usize,

    /// Calls issued by each session
    #[arg(long, default_value = "1000")]
    calls: usize,

    /// Run each session for this many seconds instead of a fixed call count
    #[arg(short = 'p', long, conflicts_with = "calls")]
    period: Option<f64>,

    /// Request kind issued by every session
    #[arg(long, default_value = "all")]
    workload: Workload,

    /// Report format
    #[arg(long, value_enum, default_value = "json")]
    output: OutputFormat,
}

#[derive(Clone, Debug, ValueEnum)]
enum OutputFormat {
    /// Counter snapshot and session reports as JSON
    Json,
    /// Prometheus text exposition format
    Prometheus,
}

impl Args {
    fn budget(&self) -> Result<Budget> {
        match self.period {
            Some(secs) => Duration::try_from_secs_f64(secs)
                .map(Budget::Period)
                .with_context(|| format!("invalid --period {}", secs)),
            None => Ok(Budget::Calls(self.calls)),
        }
    }
}

fn session_json(report: &SessionReport) -> serde_json::Value {
    serde_json::json!({
        "workload": report.workload,
        "calls": report.calls,
        "failures": report.failures,
        "elapsed_secs": report.elapsed.as_secs_f64(),
        "throughput": report.throughput(),
    })
}

/// Initializes tracing/logging subsystem
fn init_logging(filter: &str, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter))
        .context("invalid log filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| anyhow::anyhow!("failed to set tracing subscriber: {}", e))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = TargetConfig::load_or_default(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;

    let level = args.log_level.as_deref().unwrap_or(&config.logging.level);
    init_logging(level, args.json_logs || config.logging.json)?;

    info!("--- Starting benchtargetd ---");
    if !args.config.exists() {
        warn!("{} not found, running with defaults", args.config.display());
    }

    let target = Arc::new(BenchmarkTarget::new(&config).context("invalid configuration")?);
    info!(
        "Target ready: spectrum {}, image {:?}",
        target.buffers().spectrum_length(),
        target.buffers().image_size()
    );

    let budget = args.budget()?;
    info!("Driving {} clients x {} ({})", args.clients, budget, args.workload);
    let start = Instant::now();
    let handles: Vec<_> = (0..args.clients)
        .map(|_| {
            let target = Arc::clone(&target);
            let workload = args.workload;
            tokio::task::spawn_blocking(move || run_session(&target, workload, budget))
        })
        .collect();

    let mut reports = Vec::with_capacity(handles.len());
    for handle in handles {
        let report = handle.await.context("client session panicked")?;
        if report.failures > 0 {
            warn!("Session finished with {} failed calls", report.failures);
        }
        reports.push(report);
    }
    let wall = start.elapsed();

    let snapshot = target.snapshot();
    info!(
        "Completed {} calls in {:.3}s",
        reports.iter().map(|r| r.calls).sum::<usize>(),
        wall.as_secs_f64()
    );

    match args.output {
        OutputFormat::Json => {
            let report = serde_json::json!({
                "workload": args.workload,
                "clients": args.clients,
                "budget": budget.to_string(),
                "wall_secs": wall.as_secs_f64(),
                "sessions": reports.iter().map(session_json).collect::<Vec<_>>(),
                "counters": snapshot,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Prometheus => {
            let exporter = MetricsExporter::new().context("creating metrics registry")?;
            exporter.record_snapshot(&snapshot);
            exporter.record_buffers(target.buffers());
            print!("{}", exporter.gather_metrics());
        }
    }

    Ok(())
}
