//! Console sink: a timer table followed by the log lines captured during the
//! run.

use crate::{ReportError, Reporter};
use async_trait::async_trait;
use chrono::{DateTime, Local};
use comfy_table::{presets::UTF8_FULL, Cell, CellAlignment, Table};
use query_latency_metrics::{RegistrySnapshot, TimerSnapshot};
use std::io::Write;
use std::sync::{Mutex, PoisonError};

pub struct ConsoleReporter {
    writer: Mutex<Box<dyn Write + Send>>,
    captured_logs: String,
}

impl ConsoleReporter {
    /// Report to stdout.
    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }

    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(writer),
            captured_logs: String::new(),
        }
    }

    /// Log output to print after the table.
    pub fn with_captured_logs(mut self, logs: impl Into<String>) -> Self {
        self.captured_logs = logs.into();
        self
    }
}

#[async_trait]
impl Reporter for ConsoleReporter {
    fn name(&self) -> &'static str {
        "console"
    }

    async fn report(&self, snapshot: &RegistrySnapshot) -> Result<(), ReportError> {
        let output = render(snapshot, Local::now());
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writer.write_all(output.as_bytes())?;
        if !self.captured_logs.is_empty() {
            writeln!(writer, "-- Log output {}", "-".repeat(60))?;
            writer.write_all(self.captured_logs.as_bytes())?;
            if !self.captured_logs.ends_with('\n') {
                writeln!(writer)?;
            }
        }
        writer.flush()?;
        Ok(())
    }
}

/// Render the timer table for `snapshot`.
pub fn render(snapshot: &RegistrySnapshot, now: DateTime<Local>) -> String {
    let mut output = format!(
        "{} {}\n\n-- Timers {}\n",
        now.format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(50),
        "-".repeat(64)
    );

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        "Timer", "Count", "Mean rate/s", "Min ms", "Max ms", "Mean ms", "StdDev ms", "p50",
        "p75", "p95", "p98", "p99", "p99.9",
    ]);
    for timer in &snapshot.timers {
        table.add_row(timer_row(timer));
    }

    output.push_str(&table.to_string());
    output.push('\n');
    output
}

fn timer_row(timer: &TimerSnapshot) -> Vec<Cell> {
    let mut row = vec![
        Cell::new(&timer.name),
        Cell::new(timer.count).set_alignment(CellAlignment::Right),
    ];
    for value in [
        timer.mean_rate,
        timer.min_ms,
        timer.max_ms,
        timer.mean_ms,
        timer.stddev_ms,
        timer.p50_ms,
        timer.p75_ms,
        timer.p95_ms,
        timer.p98_ms,
        timer.p99_ms,
        timer.p999_ms,
    ] {
        row.push(Cell::new(format!("{value:.2}")).set_alignment(CellAlignment::Right));
    }
    row
}
