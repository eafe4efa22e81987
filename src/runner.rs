//! The query runner: one connection, one prepared statement, `repeat` timed
//! executions.

use crate::config::RunConfig;
use crate::drivers::DriverRegistry;
use crate::logging::mask_connection_password;
use query_latency_driver::{
    bind_parameters, ConnectTarget, Connection, DriverError, ResultSet, Statement,
};
use query_latency_metrics::{MetricsError, MetricsRegistry, Timer};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// A timed phase of a run. Each phase owns the timer of the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Connection,
    Execution,
    Fetch,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::Connection, Phase::Execution, Phase::Fetch];

    pub fn timer_name(&self) -> &'static str {
        match self {
            Phase::Connection => "connection",
            Phase::Execution => "execution",
            Phase::Fetch => "fetch",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.timer_name())
    }
}

#[derive(Error, Debug)]
pub enum RunError {
    #[error("Connection failed: {0}")]
    Connect(#[source] DriverError),

    #[error("Prepare failed: {0}")]
    Prepare(#[source] DriverError),

    #[error("Binding parameters failed: {0}")]
    Bind(#[source] DriverError),

    #[error("Execution {iteration} failed: {source}")]
    Execute {
        iteration: u32,
        #[source]
        source: DriverError,
    },

    #[error("Fetching results of execution {iteration} failed: {source}")]
    Fetch {
        iteration: u32,
        #[source]
        source: DriverError,
    },
}

impl RunError {
    /// The phase the run was in when it failed.
    pub fn phase(&self) -> Phase {
        match self {
            RunError::Connect(_) => Phase::Connection,
            RunError::Prepare(_) | RunError::Bind(_) | RunError::Execute { .. } => {
                Phase::Execution
            }
            RunError::Fetch { .. } => Phase::Fetch,
        }
    }
}

/// Totals over every fetched row of every execution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    pub rows: u64,
    pub bytes: u64,
}

impl RunResult {
    /// Average bytes per row; NaN when no rows were fetched.
    pub fn bytes_per_row(&self) -> f64 {
        if self.rows == 0 {
            f64::NAN
        } else {
            self.bytes as f64 / self.rows as f64
        }
    }
}

struct PhaseTimers {
    connection: Arc<Timer>,
    execution: Arc<Timer>,
    fetch: Arc<Timer>,
}

impl PhaseTimers {
    fn register(registry: &MetricsRegistry) -> Result<Self, MetricsError> {
        Ok(Self {
            connection: registry.timer(Phase::Connection.timer_name())?,
            execution: registry.timer(Phase::Execution.timer_name())?,
            fetch: registry.timer(Phase::Fetch.timer_name())?,
        })
    }
}

pub struct QueryRunner<'c> {
    config: &'c RunConfig,
    hostname: String,
    timers: PhaseTimers,
}

impl<'c> QueryRunner<'c> {
    /// Create a runner recording into `registry`. The phase timers are
    /// registered immediately, so they are reported even if the run fails
    /// early.
    pub fn new(config: &'c RunConfig, registry: &MetricsRegistry) -> Result<Self, MetricsError> {
        Ok(Self {
            config,
            hostname: crate::local_hostname(),
            timers: PhaseTimers::register(registry)?,
        })
    }

    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = hostname.into();
        self
    }

    /// Connect, prepare, bind and execute the query `repeat` times.
    ///
    /// Whatever was opened is closed again before returning, result set
    /// first and connection last, whether the run succeeded or not.
    pub async fn run(&self, drivers: &DriverRegistry) -> Result<RunResult, RunError> {
        let config = self.config;
        let driver = drivers
            .resolve(config.driver.as_deref(), &config.url)
            .map_err(RunError::Connect)?;

        info!(
            "Connect to: {} from {}",
            mask_connection_password(&config.url),
            self.hostname
        );
        let target = ConnectTarget::new(config.url.as_str())
            .with_credentials(config.user.clone(), config.password.clone());

        let ctx = self.timers.connection.time();
        let mut connection = driver.connect(&target).await.map_err(RunError::Connect)?;
        let elapsed = ctx.stop();
        debug!("Connected in {:?}", elapsed);

        let outcome = self.run_on_connection(&mut *connection).await;

        if let Err(e) = connection.close().await {
            warn!("Failed to close connection: {}", e);
        }

        if let Ok(result) = &outcome {
            info!(
                "Fetched rows: {}, total bytes: {}, bytes/rows: {}",
                result.rows,
                result.bytes,
                result.bytes_per_row()
            );
        }
        outcome
    }

    async fn run_on_connection(
        &self,
        connection: &mut dyn Connection,
    ) -> Result<RunResult, RunError> {
        let query = self.config.query.as_str();
        let mut statement = connection.prepare(query).await.map_err(RunError::Prepare)?;

        let outcome = self.run_statement(&mut *statement).await;

        if let Err(e) = statement.close().await {
            warn!("Failed to close statement: {}", e);
        }
        outcome
    }

    async fn run_statement(
        &self,
        statement: &mut (dyn Statement + '_),
    ) -> Result<RunResult, RunError> {
        let config = self.config;
        let bound = bind_parameters(&mut *statement, &config.query, &config.params)
            .map_err(RunError::Bind)?;
        debug!("Bound {} parameters", bound);

        info!("Submitting {} queries: {}", config.repeat, config.query);

        let mut result = RunResult::default();
        for iteration in 0..config.repeat {
            let ctx = self.timers.execution.time();
            let mut result_set = statement
                .execute()
                .await
                .map_err(|source| RunError::Execute { iteration, source })?;
            ctx.stop();

            let ctx = self.timers.fetch.time();
            let drained = drain(&mut *result_set, &mut result).await;
            let closed = result_set.close().await;
            if drained.is_ok() {
                ctx.stop();
            }
            if let Err(e) = closed {
                warn!("Failed to close result set: {}", e);
            }
            drained.map_err(|source| RunError::Fetch { iteration, source })?;

            self.pause().await;
        }

        Ok(result)
    }

    /// Sleep a random duration below the configured maximum.
    async fn pause(&self) {
        let max_ms = u64::try_from(self.config.max_pause.as_millis()).unwrap_or(u64::MAX);
        if max_ms == 0 {
            return;
        }
        let pause = Duration::from_millis(rand::rng().random_range(0..max_ms));
        tokio::time::sleep(pause).await;
    }
}

/// Read every row of `result_set` into the totals.
///
/// Each column is counted with the size of column 1; a NULL counts as zero.
async fn drain(
    result_set: &mut (dyn ResultSet + '_),
    totals: &mut RunResult,
) -> Result<(), DriverError> {
    let columns = result_set.column_count();
    while result_set.next().await? {
        totals.rows += 1;
        for _ in 1..=columns {
            let len = result_set.bytes(1)?.map_or(0, |b| b.len());
            totals.bytes += len as u64;
        }
    }
    Ok(())
}
