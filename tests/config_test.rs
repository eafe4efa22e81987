//! Loading run configuration from properties files on disk.

use query_latency::{ConfigError, RunConfig};
use query_latency_reporter::ReporterKind;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_properties(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_load_full_configuration() {
    let file = write_properties(
        r#"# latency check for the orders service
url = jdbc:postgresql://db.internal:5432/orders
user = monitor
password = s3cr3t
driver = org.postgresql.Driver
query = SELECT id, total \
        FROM orders \
        WHERE customer_id = ? AND status = ?
p1 = 42
p2 = string:shipped
reporter = console, influxdb
influxdb.host = metrics.internal
influxdb.port = 8087
influxdb.db = latency
"#,
    );

    let config = RunConfig::load(file.path()).unwrap();
    assert_eq!(config.url, "jdbc:postgresql://db.internal:5432/orders");
    assert_eq!(config.user.as_deref(), Some("monitor"));
    assert_eq!(config.password.as_deref(), Some("s3cr3t"));
    assert_eq!(config.driver.as_deref(), Some("org.postgresql.Driver"));
    assert_eq!(
        config.query,
        "SELECT id, total FROM orders WHERE customer_id = ? AND status = ?"
    );
    assert_eq!(config.params.len(), 2);
    assert_eq!(config.params[&2], "string:shipped");
    assert_eq!(
        config.reporters,
        vec![ReporterKind::Console, ReporterKind::InfluxDb]
    );

    let influx = config.influxdb.unwrap();
    assert_eq!(influx.host, "metrics.internal");
    assert_eq!(influx.port, 8087);
    assert_eq!(influx.database, "latency");
}

#[test]
fn test_load_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = RunConfig::load(&dir.path().join("absent.properties")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
    assert!(err.to_string().contains("absent.properties"));
}

#[test]
fn test_load_without_query() {
    let file = write_properties("url=jdbc:mysql://localhost/app\n");
    let err = RunConfig::load(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::MissingKey("query")));
}

#[test]
fn test_unknown_reporters_are_dropped() {
    let file = write_properties("url=mock://x\nquery=SELECT 1\nreporter=graphite,console\n");
    let config = RunConfig::load(file.path()).unwrap();
    assert_eq!(config.reporters, vec![ReporterKind::Console]);
}
