//! In-memory driver that records every call it receives.

#![allow(dead_code)]

use async_trait::async_trait;
use query_latency::{DriverRegistry, RunConfig};
use query_latency_driver::{
    ConnectTarget, Connection, Driver, DriverError, ParamValue, ResultSet, Statement,
};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

pub type Row = Vec<Option<Vec<u8>>>;

/// What the mock database does.
#[derive(Debug, Clone, Default)]
pub struct Behavior {
    pub columns: usize,
    pub rows: Vec<Row>,
    /// Highest parameter index the prepared statement accepts.
    pub parameters: usize,
    pub fail_connect: bool,
    /// Zero-based execution that fails.
    pub fail_execute_at: Option<u32>,
    /// Zero-based execution whose first fetch fails.
    pub fail_fetch_at: Option<u32>,
}

impl Behavior {
    pub fn with_rows(columns: usize, rows: Vec<Row>) -> Self {
        Self {
            columns,
            rows,
            ..Default::default()
        }
    }
}

/// Every driver call in order, stamped with the tokio clock.
#[derive(Debug, Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<(String, Instant)>>>);

impl EventLog {
    fn push(&self, event: impl Into<String>) {
        self.0.lock().unwrap().push((event.into(), Instant::now()));
    }

    pub fn events(&self) -> Vec<String> {
        self.timeline().into_iter().map(|(e, _)| e).collect()
    }

    pub fn timeline(&self) -> Vec<(String, Instant)> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, event: &str) -> usize {
        self.events().iter().filter(|e| *e == event).count()
    }

    /// Events that open or close a handle, in order.
    pub fn lifecycle(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter(|e| e == "connect" || e == "prepare" || e.ends_with(".close"))
            .collect()
    }
}

pub struct MockDriver {
    behavior: Arc<Behavior>,
    events: EventLog,
}

impl MockDriver {
    pub fn new(behavior: Behavior) -> (Self, EventLog) {
        let events = EventLog::default();
        let driver = Self {
            behavior: Arc::new(behavior),
            events: events.clone(),
        };
        (driver, events)
    }
}

#[async_trait]
impl Driver for MockDriver {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn accepts_name(&self, name: &str) -> bool {
        name == "mock"
    }

    fn accepts_url(&self, url: &str) -> bool {
        url.starts_with("mock://")
    }

    async fn connect(&self, target: &ConnectTarget) -> Result<Box<dyn Connection>, DriverError> {
        if self.behavior.fail_connect {
            return Err(DriverError::Connect(format!("refused: {}", target.url)));
        }
        self.events.push("connect");
        Ok(Box::new(MockConnection {
            behavior: Arc::clone(&self.behavior),
            events: self.events.clone(),
        }))
    }
}

struct MockConnection {
    behavior: Arc<Behavior>,
    events: EventLog,
}

#[async_trait]
impl Connection for MockConnection {
    async fn prepare<'a>(
        &'a mut self,
        _sql: &str,
    ) -> Result<Box<dyn Statement + 'a>, DriverError> {
        self.events.push("prepare");
        Ok(Box::new(MockStatement {
            behavior: Arc::clone(&self.behavior),
            events: self.events.clone(),
            executions: 0,
        }))
    }

    async fn close(self: Box<Self>) -> Result<(), DriverError> {
        self.events.push("connection.close");
        Ok(())
    }
}

struct MockStatement {
    behavior: Arc<Behavior>,
    events: EventLog,
    executions: u32,
}

#[async_trait]
impl Statement for MockStatement {
    fn bind(&mut self, index: usize, value: &ParamValue) -> Result<(), DriverError> {
        if index == 0 || index > self.behavior.parameters {
            return Err(DriverError::bind(index, "no such parameter"));
        }
        self.events.push(format!("bind {index} {value:?}"));
        Ok(())
    }

    async fn execute<'a>(&'a mut self) -> Result<Box<dyn ResultSet + 'a>, DriverError> {
        let iteration = self.executions;
        self.executions += 1;
        if self.behavior.fail_execute_at == Some(iteration) {
            return Err(DriverError::Execute("syntax error".to_string()));
        }
        self.events.push("execute");
        Ok(Box::new(MockResultSet {
            behavior: Arc::clone(&self.behavior),
            events: self.events.clone(),
            position: 0,
            fail_fetch: self.behavior.fail_fetch_at == Some(iteration),
        }))
    }

    async fn close(self: Box<Self>) -> Result<(), DriverError> {
        self.events.push("statement.close");
        Ok(())
    }
}

struct MockResultSet {
    behavior: Arc<Behavior>,
    events: EventLog,
    /// 1-based index of the current row, 0 before the first.
    position: usize,
    fail_fetch: bool,
}

#[async_trait]
impl ResultSet for MockResultSet {
    fn column_count(&self) -> usize {
        self.behavior.columns
    }

    async fn next(&mut self) -> Result<bool, DriverError> {
        if self.fail_fetch {
            return Err(DriverError::Fetch("connection reset".to_string()));
        }
        if self.position < self.behavior.rows.len() {
            self.position += 1;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn bytes(&self, column: usize) -> Result<Option<Cow<'_, [u8]>>, DriverError> {
        self.events.push(format!("bytes {column}"));
        let row = self
            .position
            .checked_sub(1)
            .and_then(|i| self.behavior.rows.get(i))
            .ok_or_else(|| DriverError::Fetch("no current row".to_string()))?;
        let value = column
            .checked_sub(1)
            .and_then(|i| row.get(i))
            .ok_or(DriverError::ColumnOutOfRange {
                index: column,
                count: self.behavior.columns,
            })?;
        Ok(value.as_deref().map(Cow::Borrowed))
    }

    async fn close(self: Box<Self>) -> Result<(), DriverError> {
        self.events.push("result_set.close");
        Ok(())
    }
}

pub fn registry_with(driver: MockDriver) -> DriverRegistry {
    DriverRegistry::empty().with_driver(Box::new(driver))
}

pub fn text(value: &str) -> Option<Vec<u8>> {
    Some(value.as_bytes().to_vec())
}

pub fn run_config(query: &str, params: &[(usize, &str)], repeat: u32) -> RunConfig {
    RunConfig {
        url: "mock://localhost/test".to_string(),
        user: Some("tester".to_string()),
        password: Some("secret".to_string()),
        driver: None,
        query: query.to_string(),
        params: params
            .iter()
            .map(|(i, v)| (*i, v.to_string()))
            .collect::<BTreeMap<_, _>>(),
        repeat,
        max_pause: Duration::ZERO,
        reporters: vec![query_latency_reporter::ReporterKind::Console],
        influxdb: None,
    }
}
