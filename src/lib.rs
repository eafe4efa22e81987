//! query-latency library
//!
//! Measures how long it takes to connect to a database, execute a
//! parameterized query and fetch its results.
//!
//! # Phases
//!
//! - `connection`: one sample per run, from connect start to an open
//!   connection
//! - `execution`: one sample per execution, until the result set is available
//! - `fetch`: one sample per execution, until every row was read and the
//!   result set closed
//!
//! # Configuration
//!
//! ```properties
//! url=jdbc:postgresql://localhost:5432/app
//! user=app
//! password=secret
//! query=SELECT * FROM orders WHERE customer_id = ? AND status = ?
//! p1=42
//! p2=string:shipped
//! reporter=console,influxdb
//! influxdb.host=localhost
//! influxdb.db=latency
//! ```

pub mod config;
pub mod drivers;
pub mod emit;
pub mod logging;
pub mod reporting;
pub mod runner;

pub use config::{ConfigError, RunConfig};
pub use drivers::DriverRegistry;
pub use logging::{init_tracing, mask_connection_password, LogCapture};
pub use runner::{Phase, QueryRunner, RunError, RunResult};

/// Hostname of this machine, or `unknown` when it cannot be determined.
pub fn local_hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string())
}
