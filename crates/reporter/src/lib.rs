//! Reporters for query-latency
//!
//! A reporter consumes one [`RegistrySnapshot`] after a run has finished and
//! writes it to a sink. Two sinks are provided: a console table and an
//! InfluxDB line-protocol writer.

pub mod console;
pub mod error;
pub mod influxdb;

use async_trait::async_trait;
use query_latency_metrics::RegistrySnapshot;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

pub use console::ConsoleReporter;
pub use error::ReportError;
pub use influxdb::{encode_line_protocol, InfluxDbConfig, InfluxDbReporter};

/// A destination for timer snapshots.
#[async_trait]
pub trait Reporter: Send + Sync {
    fn name(&self) -> &'static str;

    /// Report the snapshot once. Implementations make a single attempt.
    async fn report(&self, snapshot: &RegistrySnapshot) -> Result<(), ReportError>;
}

/// Reporter names accepted in the `reporter` configuration property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReporterKind {
    Console,
    InfluxDb,
}

impl fmt::Display for ReporterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReporterKind::Console => write!(f, "console"),
            ReporterKind::InfluxDb => write!(f, "influxdb"),
        }
    }
}

impl FromStr for ReporterKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "console" => Ok(ReporterKind::Console),
            "influxdb" => Ok(ReporterKind::InfluxDb),
            other => Err(format!("Unknown reporter: {other}")),
        }
    }
}

/// Parse a comma-separated reporter list.
///
/// Unknown names are logged and skipped; duplicates are kept once, in the
/// order first seen.
pub fn parse_reporter_list(list: &str) -> Vec<ReporterKind> {
    let mut kinds = Vec::new();
    for name in list.split(',').map(str::trim).filter(|n| !n.is_empty()) {
        match name.parse::<ReporterKind>() {
            Ok(kind) if !kinds.contains(&kind) => kinds.push(kind),
            Ok(_) => {}
            Err(e) => warn!("{e}, ignoring"),
        }
    }
    kinds
}
