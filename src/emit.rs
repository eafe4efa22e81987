//! JSON metrics file written with `--emit-metrics`.

use crate::runner::{RunError, RunResult};
use anyhow::Context;
use chrono::{DateTime, Utc};
use query_latency_metrics::RegistrySnapshot;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Outcome of one run, as written to the metrics file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetrics {
    pub hostname: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub repeat: u32,
    pub success: bool,
    pub error: Option<String>,
    pub result: Option<RunResult>,
    pub timers: RegistrySnapshot,
}

/// Captures the start of a run; finished once the run is over.
pub struct RunMetricsBuilder {
    hostname: String,
    started_at: DateTime<Utc>,
    repeat: u32,
}

impl RunMetricsBuilder {
    pub fn start(hostname: impl Into<String>, repeat: u32) -> Self {
        Self {
            hostname: hostname.into(),
            started_at: Utc::now(),
            repeat,
        }
    }

    pub fn finish(
        self,
        outcome: &Result<RunResult, RunError>,
        timers: RegistrySnapshot,
    ) -> RunMetrics {
        RunMetrics {
            hostname: self.hostname,
            started_at: self.started_at,
            completed_at: Utc::now(),
            repeat: self.repeat,
            success: outcome.is_ok(),
            error: outcome.as_ref().err().map(|e| e.to_string()),
            result: outcome.as_ref().ok().copied(),
            timers,
        }
    }
}

impl RunMetrics {
    pub fn write(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, &json)
            .with_context(|| format!("Failed to write metrics to {path:?}"))?;
        info!("Metrics written to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use query_latency_driver::DriverError;
    use query_latency_metrics::MetricsRegistry;

    #[test]
    fn test_successful_run_metrics() {
        let registry = MetricsRegistry::new();
        registry.timer("execution").unwrap();
        let outcome = Ok(RunResult { rows: 3, bytes: 12 });

        let metrics = RunMetricsBuilder::start("monitor", 3).finish(&outcome, registry.snapshot());
        assert!(metrics.success);
        assert_eq!(metrics.error, None);
        assert_eq!(metrics.result, Some(RunResult { rows: 3, bytes: 12 }));
        assert!(metrics.completed_at >= metrics.started_at);
    }

    #[test]
    fn test_failed_run_metrics_written_to_file() {
        let outcome = Err(RunError::Connect(DriverError::Connect("refused".to_string())));
        let metrics =
            RunMetricsBuilder::start("monitor", 10).finish(&outcome, RegistrySnapshot::default());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.json");
        metrics.write(&path).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["hostname"], "monitor");
        assert_eq!(json["success"], false);
        assert_eq!(
            json["error"],
            "Connection failed: Connection error: refused"
        );
        assert!(json["result"].is_null());
    }
}
