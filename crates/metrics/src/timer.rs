//! Latency timer backed by an HDR histogram.

use crate::error::MetricsError;
use hdrhistogram::Histogram;
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Significant decimal digits kept by every timer histogram.
const SIGNIFICANT_DIGITS: u8 = 3;

const NANOS_PER_MILLI: f64 = 1_000_000.0;

/// Longest trackable sample, one hour. Longer samples are clamped to it.
const MAX_TRACKABLE_NANOS: u64 = 3_600 * 1_000_000_000;

/// Accumulates duration samples for one named measurement.
///
/// Samples are stored in nanoseconds, up to one hour. Only aggregate
/// statistics survive, individual samples are not retained.
#[derive(Debug)]
pub struct Timer {
    name: String,
    created: Instant,
    histogram: Mutex<Histogram<u64>>,
}

impl Timer {
    pub fn new(name: impl Into<String>) -> Result<Self, MetricsError> {
        Ok(Self {
            name: name.into(),
            created: Instant::now(),
            histogram: Mutex::new(Histogram::new_with_bounds(
                1,
                MAX_TRACKABLE_NANOS,
                SIGNIFICANT_DIGITS,
            )?),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Start timing. The sample is recorded when the context is stopped.
    pub fn time(&self) -> TimerContext<'_> {
        TimerContext {
            timer: self,
            start: Instant::now(),
        }
    }

    /// Record one externally measured sample.
    pub fn update(&self, duration: Duration) {
        let nanos = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);
        self.histogram().saturating_record(nanos);
    }

    /// Number of samples recorded so far.
    pub fn count(&self) -> u64 {
        self.histogram().len()
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        let histogram = self.histogram();
        let count = histogram.len();
        let elapsed = self.created.elapsed().as_secs_f64();
        let mean_rate = if count > 0 && elapsed > 0.0 {
            count as f64 / elapsed
        } else {
            0.0
        };
        let quantile_ms = |q: f64| to_millis(histogram.value_at_quantile(q) as f64);

        TimerSnapshot {
            name: self.name.clone(),
            count,
            mean_rate,
            min_ms: to_millis(histogram.min() as f64),
            max_ms: to_millis(histogram.max() as f64),
            mean_ms: to_millis(histogram.mean()),
            stddev_ms: to_millis(histogram.stdev()),
            p50_ms: quantile_ms(0.50),
            p75_ms: quantile_ms(0.75),
            p95_ms: quantile_ms(0.95),
            p98_ms: quantile_ms(0.98),
            p99_ms: quantile_ms(0.99),
            p999_ms: quantile_ms(0.999),
        }
    }

    fn histogram(&self) -> MutexGuard<'_, Histogram<u64>> {
        self.histogram
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn to_millis(nanos: f64) -> f64 {
    nanos / NANOS_PER_MILLI
}

/// A running measurement started by [`Timer::time`].
///
/// Dropping the context without calling [`TimerContext::stop`] discards the
/// measurement.
#[must_use = "a timer context records nothing until stopped"]
#[derive(Debug)]
pub struct TimerContext<'a> {
    timer: &'a Timer,
    start: Instant,
}

impl TimerContext<'_> {
    /// Record the elapsed time as one sample and return it.
    pub fn stop(self) -> Duration {
        let elapsed = self.start.elapsed();
        self.timer.update(elapsed);
        elapsed
    }
}

/// Point-in-time statistics of a timer. Durations are in milliseconds, the
/// mean rate in samples per second since the timer was created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub name: String,
    pub count: u64,
    pub mean_rate: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    pub mean_ms: f64,
    pub stddev_ms: f64,
    pub p50_ms: f64,
    pub p75_ms: f64,
    pub p95_ms: f64,
    pub p98_ms: f64,
    pub p99_ms: f64,
    pub p999_ms: f64,
}
