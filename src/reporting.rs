//! Reporter selection and dispatch.

use crate::config::RunConfig;
use crate::logging::LogCapture;
use query_latency_metrics::RegistrySnapshot;
use query_latency_reporter::{ConsoleReporter, InfluxDbReporter, Reporter, ReporterKind};
use tracing::{error, info, warn};

/// Build the reporters selected in `config`.
///
/// The console reporter replays whatever `capture` holds at this point, so
/// call this after the run has finished.
pub fn build_reporters(
    config: &RunConfig,
    capture: &LogCapture,
    hostname: &str,
) -> Vec<Box<dyn Reporter>> {
    let mut reporters: Vec<Box<dyn Reporter>> = Vec::new();

    for kind in &config.reporters {
        match kind {
            ReporterKind::Console => reporters.push(Box::new(
                ConsoleReporter::stdout().with_captured_logs(capture.contents()),
            )),
            ReporterKind::InfluxDb => {
                let Some(influx) = &config.influxdb else {
                    warn!("InfluxDB reporter selected without an influxdb block, skipping");
                    continue;
                };
                match InfluxDbReporter::new(influx.clone(), hostname) {
                    Ok(reporter) => reporters.push(Box::new(reporter)),
                    Err(e) => error!("Failed to create InfluxDB reporter: {}", e),
                }
            }
        }
    }

    reporters
}

/// Run every reporter over the same snapshot.
///
/// A failing reporter is logged and does not stop the others. Returns the
/// number of reporters that failed.
pub async fn report_all(reporters: &[Box<dyn Reporter>], snapshot: &RegistrySnapshot) -> usize {
    let mut failures = 0;
    for reporter in reporters {
        match reporter.report(snapshot).await {
            Ok(()) => info!("Reported {} timers to {}", snapshot.timers.len(), reporter.name()),
            Err(e) => {
                error!("Reporter {} failed: {}", reporter.name(), e);
                failures += 1;
            }
        }
    }
    failures
}
