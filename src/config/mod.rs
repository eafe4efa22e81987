//! Run configuration loaded from a properties file.

mod properties;

pub use properties::parse_properties;

use query_latency_reporter::influxdb::DEFAULT_PORT;
use query_latency_reporter::{parse_reporter_list, InfluxDbConfig, ReporterKind};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

pub const DEFAULT_REPEAT: u32 = 100;
pub const DEFAULT_MAX_PAUSE: Duration = Duration::from_millis(100);
pub const DEFAULT_REPORTER: &str = "console";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed properties at line {line}: {message}")]
    Malformed { line: usize, message: String },

    #[error("Missing required property: {0}")]
    MissingKey(&'static str),

    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Everything a run needs. Built once at startup and only read afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub url: String,
    pub user: Option<String>,
    pub password: Option<String>,
    /// Driver name or JDBC driver class; chosen from the URL when absent.
    pub driver: Option<String>,
    pub query: String,
    /// Raw `pN` values keyed by their 1-based position.
    pub params: BTreeMap<usize, String>,
    pub repeat: u32,
    /// Upper bound of the random pause after each execution. Zero disables
    /// pacing.
    pub max_pause: Duration,
    pub reporters: Vec<ReporterKind>,
    pub influxdb: Option<InfluxDbConfig>,
}

impl RunConfig {
    /// Load and validate a properties file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_properties(&parse_properties(&text)?)
    }

    pub fn from_properties(props: &BTreeMap<String, String>) -> Result<Self, ConfigError> {
        let url = required(props, "url")?;
        let query = required(props, "query")?;

        let reporter_list = props
            .get("reporter")
            .map(String::as_str)
            .unwrap_or(DEFAULT_REPORTER);
        let reporters = parse_reporter_list(reporter_list);
        if reporters.is_empty() {
            warn!("No known reporter in '{}', results will not be reported", reporter_list);
        }

        let influxdb = if reporters.contains(&ReporterKind::InfluxDb) {
            Some(influxdb_config(props)?)
        } else {
            None
        };

        Ok(Self {
            url,
            user: props.get("user").cloned(),
            password: props.get("password").cloned(),
            driver: props
                .get("driver")
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            query,
            params: positional_params(props),
            repeat: DEFAULT_REPEAT,
            max_pause: DEFAULT_MAX_PAUSE,
            reporters,
            influxdb,
        })
    }
}

fn required(props: &BTreeMap<String, String>, key: &'static str) -> Result<String, ConfigError> {
    props
        .get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or(ConfigError::MissingKey(key))
}

/// Collect `p1`, `p2`, ... entries. Keys like `p0` or `px` are ignored.
fn positional_params(props: &BTreeMap<String, String>) -> BTreeMap<usize, String> {
    props
        .iter()
        .filter_map(|(key, value)| {
            let index = key.strip_prefix('p')?.parse::<usize>().ok()?;
            (index >= 1).then(|| (index, value.clone()))
        })
        .collect()
}

fn influxdb_config(props: &BTreeMap<String, String>) -> Result<InfluxDbConfig, ConfigError> {
    let host = required(props, "influxdb.host")?;
    let database = required(props, "influxdb.db")?;
    let port = match props.get("influxdb.port").map(|p| p.trim()) {
        None | Some("") => DEFAULT_PORT,
        Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::InvalidValue {
            key: "influxdb.port".to_string(),
            message: format!("'{raw}': {e}"),
        })?,
    };
    let optional = |key: &str| {
        props
            .get(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    Ok(InfluxDbConfig {
        host,
        port,
        username: optional("influxdb.username"),
        password: optional("influxdb.password"),
        database,
    })
}
