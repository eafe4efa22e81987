//! Metrics registry for query-latency.
//!
//! The registry is constructed explicitly and passed by reference. During a
//! run the query runner is its only writer; reporters read a
//! [`RegistrySnapshot`] once the run has finished.
//!
//! ```ignore
//! let registry = MetricsRegistry::new();
//! let timer = registry.timer("execution")?;
//! let ctx = timer.time();
//! // ... timed work ...
//! ctx.stop();
//! let snapshot = registry.snapshot();
//! ```

pub mod error;
pub mod registry;
pub mod timer;

pub use error::MetricsError;
pub use registry::{MetricsRegistry, RegistrySnapshot};
pub use timer::{Timer, TimerContext, TimerSnapshot};
