//! Driver lookup by name or connection URL.

use query_latency_driver::{Driver, DriverError};
use query_latency_mysql::MySQLDriver;
use query_latency_postgresql::PostgreSQLDriver;
use tracing::debug;

/// The set of drivers a run may choose from.
pub struct DriverRegistry {
    drivers: Vec<Box<dyn Driver>>,
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DriverRegistry {
    /// Registry with every built-in driver.
    pub fn new() -> Self {
        Self::empty()
            .with_driver(Box::new(PostgreSQLDriver))
            .with_driver(Box::new(MySQLDriver))
    }

    pub fn empty() -> Self {
        Self {
            drivers: Vec::new(),
        }
    }

    pub fn with_driver(mut self, driver: Box<dyn Driver>) -> Self {
        self.drivers.push(driver);
        self
    }

    /// Pick a driver by its configured name, or by URL when no name is set.
    pub fn resolve(&self, name: Option<&str>, url: &str) -> Result<&dyn Driver, DriverError> {
        let driver = match name {
            Some(name) => self
                .drivers
                .iter()
                .find(|d| d.accepts_name(name))
                .ok_or_else(|| DriverError::DriverNotFound(name.to_string()))?,
            None => self
                .drivers
                .iter()
                .find(|d| d.accepts_url(url))
                .ok_or_else(|| DriverError::DriverNotFound(format!("no driver accepts {url}")))?,
        };
        debug!("Using {} driver", driver.name());
        Ok(&**driver)
    }
}
