//! Error types shared by all drivers.

use thiserror::Error;

/// Errors raised by a driver or one of its handles.
#[derive(Error, Debug)]
pub enum DriverError {
    /// No registered driver matches the configured identifier or URL.
    #[error("No suitable driver found for '{0}'")]
    DriverNotFound(String),

    /// The connection URL could not be parsed by the driver.
    #[error("Invalid connection URL: {0}")]
    InvalidUrl(String),

    /// Establishing the connection failed.
    #[error("Connection error: {0}")]
    Connect(String),

    /// Preparing the statement failed.
    #[error("Prepare error: {0}")]
    Prepare(String),

    /// The driver rejected a bind value.
    #[error("Bind error at parameter {index}: {message}")]
    Bind { index: usize, message: String },

    /// A placeholder was left without a value at execution time.
    #[error("No value specified for parameter {0}")]
    UnboundParameter(usize),

    /// Executing the statement failed.
    #[error("Execution error: {0}")]
    Execute(String),

    /// Reading rows from a result set failed.
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// A column index outside `1..=column_count` was requested.
    #[error("Column index {index} out of range (1..={count})")]
    ColumnOutOfRange { index: usize, count: usize },

    /// Releasing a result set, statement or connection failed.
    #[error("Close error: {0}")]
    Close(String),
}

impl DriverError {
    /// Build a [`DriverError::Bind`] from any displayable cause.
    pub fn bind(index: usize, cause: impl std::fmt::Display) -> Self {
        DriverError::Bind {
            index,
            message: cause.to_string(),
        }
    }
}
