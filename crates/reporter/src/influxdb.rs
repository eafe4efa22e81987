//! InfluxDB sink using the 1.x HTTP write endpoint.
//!
//! Each timer becomes one line-protocol point:
//!
//! ```text
//! execution,application=query-latency,server=db-host-1 count=100i,max=4.2,mean=1.9,... 1718000000000
//! ```

use crate::{ReportError, Reporter};
use async_trait::async_trait;
use chrono::Utc;
use query_latency_metrics::{RegistrySnapshot, TimerSnapshot};
use reqwest::Client;
use std::fmt::Write as _;
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_PORT: u16 = 8086;

const APPLICATION: &str = "query-latency";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfluxDbConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub database: String,
}

impl InfluxDbConfig {
    pub fn write_url(&self) -> String {
        format!("http://{}:{}/write", self.host, self.port)
    }
}

pub struct InfluxDbReporter {
    config: InfluxDbConfig,
    server: String,
    client: Client,
}

impl InfluxDbReporter {
    /// `server` is the value of the `server` tag, normally the local hostname.
    pub fn new(config: InfluxDbConfig, server: impl Into<String>) -> Result<Self, ReportError> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self {
            config,
            server: server.into(),
            client,
        })
    }

    fn tags(&self) -> Vec<(&str, &str)> {
        vec![("application", APPLICATION), ("server", self.server.as_str())]
    }
}

#[async_trait]
impl Reporter for InfluxDbReporter {
    fn name(&self) -> &'static str {
        "influxdb"
    }

    async fn report(&self, snapshot: &RegistrySnapshot) -> Result<(), ReportError> {
        let body = encode_line_protocol(snapshot, &self.tags(), Utc::now().timestamp_millis());
        if body.is_empty() {
            debug!("No timers to write to InfluxDB");
            return Ok(());
        }

        let url = self.config.write_url();
        debug!("Writing {} points to {}", snapshot.timers.len(), url);

        let mut request = self
            .client
            .post(&url)
            .query(&[("db", self.config.database.as_str()), ("precision", "ms")])
            .body(body);
        if let Some(username) = &self.config.username {
            request = request.basic_auth(username, self.config.password.as_ref());
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ReportError::Status {
                sink: "InfluxDB",
                status: status.as_u16(),
                body,
            });
        }

        info!(
            "Wrote {} timers to InfluxDB database {}",
            snapshot.timers.len(),
            self.config.database
        );
        Ok(())
    }
}

/// Encode every timer of `snapshot` as one line-protocol point.
///
/// Tags are written sorted by key. Non-finite values are left out because
/// the line protocol cannot represent them.
pub fn encode_line_protocol(
    snapshot: &RegistrySnapshot,
    tags: &[(&str, &str)],
    timestamp_ms: i64,
) -> String {
    let mut tags = tags.to_vec();
    tags.sort_by(|a, b| a.0.cmp(b.0));

    let mut out = String::new();
    for timer in &snapshot.timers {
        out.push_str(&escape_measurement(&timer.name));
        for (key, value) in &tags {
            let _ = write!(out, ",{}={}", escape_key(key), escape_key(value));
        }
        let _ = write!(out, " count={}i", timer.count);
        for (field, value) in timer_fields(timer) {
            if value.is_finite() {
                let _ = write!(out, ",{field}={value}");
            }
        }
        let _ = writeln!(out, " {timestamp_ms}");
    }
    out
}

fn timer_fields(timer: &TimerSnapshot) -> [(&'static str, f64); 11] {
    [
        ("max", timer.max_ms),
        ("mean", timer.mean_ms),
        ("min", timer.min_ms),
        ("std-dev", timer.stddev_ms),
        ("p50", timer.p50_ms),
        ("p75", timer.p75_ms),
        ("p95", timer.p95_ms),
        ("p98", timer.p98_ms),
        ("p99", timer.p99_ms),
        ("p999", timer.p999_ms),
        ("mean-rate", timer.mean_rate),
    ]
}

fn escape_measurement(name: &str) -> String {
    escape(name, &[',', ' '])
}

/// Tag keys, tag values and field keys share the same escaping rules.
fn escape_key(name: &str) -> String {
    escape(name, &[',', '=', ' '])
}

fn escape(input: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(name: &str, count: u64) -> TimerSnapshot {
        TimerSnapshot {
            name: name.to_string(),
            count,
            mean_rate: 2.5,
            min_ms: 1.0,
            max_ms: 4.5,
            mean_ms: 2.0,
            stddev_ms: 0.5,
            p50_ms: 2.0,
            p75_ms: 3.0,
            p95_ms: 4.0,
            p98_ms: 4.25,
            p99_ms: 4.5,
            p999_ms: 4.5,
        }
    }

    #[test]
    fn test_encode_single_point() {
        let registry = RegistrySnapshot {
            timers: vec![snapshot("execution", 3)],
        };
        let line = encode_line_protocol(
            &registry,
            &[("server", "db-host"), ("application", "query-latency")],
            1_700_000_000_000,
        );

        assert_eq!(
            line,
            "execution,application=query-latency,server=db-host count=3i,max=4.5,mean=2,min=1,\
             std-dev=0.5,p50=2,p75=3,p95=4,p98=4.25,p99=4.5,p999=4.5,mean-rate=2.5 1700000000000\n"
        );
    }

    #[test]
    fn test_encode_escapes_tags_and_measurement() {
        let registry = RegistrySnapshot {
            timers: vec![snapshot("slow query", 1)],
        };
        let line = encode_line_protocol(&registry, &[("server", "my host,a=b")], 0);
        assert!(line.starts_with("slow\\ query,server=my\\ host\\,a\\=b count=1i"));
    }

    #[test]
    fn test_encode_skips_non_finite_fields() {
        let mut timer = snapshot("fetch", 0);
        timer.mean_rate = f64::NAN;
        let registry = RegistrySnapshot {
            timers: vec![timer],
        };
        let line = encode_line_protocol(&registry, &[], 0);
        assert!(!line.contains("mean-rate"));
        assert!(!line.contains("NaN"));
    }

    #[test]
    fn test_encode_empty_snapshot() {
        assert_eq!(
            encode_line_protocol(&RegistrySnapshot::default(), &[], 0),
            ""
        );
    }

    #[test]
    fn test_write_url() {
        let config = InfluxDbConfig {
            host: "metrics.local".to_string(),
            port: DEFAULT_PORT,
            username: None,
            password: None,
            database: "latency".to_string(),
        };
        assert_eq!(config.write_url(), "http://metrics.local:8086/write");
    }
}
