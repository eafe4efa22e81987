//! Error types for the metrics registry.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetricsError {
    /// The backing histogram could not be created.
    #[error("Histogram error: {0}")]
    Histogram(String),
}

impl From<hdrhistogram::CreationError> for MetricsError {
    fn from(err: hdrhistogram::CreationError) -> Self {
        MetricsError::Histogram(format!("{err:?}"))
    }
}
