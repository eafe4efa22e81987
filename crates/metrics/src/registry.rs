use crate::error::MetricsError;
use crate::timer::{Timer, TimerSnapshot};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Named collection of timers shared by the runner and the reporters.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    timers: Mutex<BTreeMap<String, Arc<Timer>>>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the timer registered under `name`, creating it on first use.
    pub fn timer(&self, name: &str) -> Result<Arc<Timer>, MetricsError> {
        let mut timers = self.timers.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(timer) = timers.get(name) {
            return Ok(Arc::clone(timer));
        }
        let timer = Arc::new(Timer::new(name)?);
        timers.insert(name.to_string(), Arc::clone(&timer));
        Ok(timer)
    }

    /// Snapshot every registered timer, ordered by name.
    pub fn snapshot(&self) -> RegistrySnapshot {
        let timers = self.timers.lock().unwrap_or_else(PoisonError::into_inner);
        RegistrySnapshot {
            timers: timers.values().map(|t| t.snapshot()).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    pub timers: Vec<TimerSnapshot>,
}

impl RegistrySnapshot {
    pub fn get(&self, name: &str) -> Option<&TimerSnapshot> {
        self.timers.iter().find(|t| t.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}
