//! Command-line interface for query-latency
//!
//! # Usage
//! ```bash
//! # Run 100 executions with the settings in ./query-latency.properties
//! query-latency
//!
//! # Explicit configuration, more executions, no pause between them
//! query-latency --config orders.properties --repeat 1000 --max-pause-ms 0
//!
//! # Also write the results as JSON
//! query-latency --emit-metrics /tmp/latency.json
//! ```

use anyhow::Context;
use clap::Parser;
use query_latency::emit::RunMetricsBuilder;
use query_latency::reporting::{build_reporters, report_all};
use query_latency::{
    init_tracing, local_hostname, DriverRegistry, LogCapture, QueryRunner, RunConfig,
};
use query_latency_metrics::MetricsRegistry;
use std::path::PathBuf;
use std::time::Duration;
use tracing::error;

#[derive(Parser)]
#[command(name = "query-latency")]
#[command(about = "Measure database connection, query execution and fetch latency")]
#[command(long_about = None)]
struct Cli {
    /// Properties file with connection, query and reporter settings
    #[arg(
        long,
        env = "QUERY_LATENCY_CONFIG",
        value_name = "PATH",
        default_value = "query-latency.properties"
    )]
    config: PathBuf,

    /// Number of times the query is executed
    #[arg(long, env = "QUERY_LATENCY_REPEAT", default_value_t = 100)]
    repeat: u32,

    /// Upper bound of the random pause after each execution, 0 disables it
    #[arg(long, env = "QUERY_LATENCY_MAX_PAUSE_MS", default_value_t = 100)]
    max_pause_ms: u64,

    /// Write run results and timer statistics to this JSON file
    #[arg(long, value_name = "PATH")]
    emit_metrics: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let capture = LogCapture::new();
    init_tracing(capture.clone()).context("Failed to initialize logging")?;

    let mut config = RunConfig::load(&cli.config)
        .with_context(|| format!("Failed to load configuration from {:?}", cli.config))?;
    config.repeat = cli.repeat;
    config.max_pause = Duration::from_millis(cli.max_pause_ms);

    let hostname = local_hostname();
    let registry = MetricsRegistry::new();
    let runner = QueryRunner::new(&config, &registry)
        .context("Failed to register timers")?
        .with_hostname(hostname.as_str());

    let metrics = cli
        .emit_metrics
        .as_ref()
        .map(|_| RunMetricsBuilder::start(hostname.as_str(), config.repeat));

    let outcome = runner.run(&DriverRegistry::new()).await;
    if let Err(e) = &outcome {
        error!("Run failed in {} phase: {}", e.phase(), e);
    }

    // Report whatever was recorded, even after a failed run.
    let snapshot = registry.snapshot();
    let reporters = build_reporters(&config, &capture, &hostname);
    report_all(&reporters, &snapshot).await;

    if let (Some(path), Some(metrics)) = (&cli.emit_metrics, metrics) {
        metrics.finish(&outcome, snapshot).write(path)?;
    }

    outcome.context("Query run failed")?;
    Ok(())
}
