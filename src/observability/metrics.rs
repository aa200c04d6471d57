//! Executor counters
//!
//! - Counters only, monotonic
//! - Relaxed atomics; exact totals, no cross-counter consistency

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Operational counters for one executor
#[derive(Debug, Default)]
pub struct ExecutorMetrics {
    /// `execute` calls started
    executions: AtomicU64,
    /// `execute` calls that returned an error
    failures: AtomicU64,
    /// Filter units resolved into chains
    filters_applied: AtomicU64,
    /// Rows passed through mappers (once per mapper)
    rows_mapped: AtomicU64,
}

impl ExecutorMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_executions(&self) {
        self.executions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_failures(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_filters_applied(&self, count: u64) {
        self.filters_applied.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_rows_mapped(&self, count: u64) {
        self.rows_mapped.fetch_add(count, Ordering::Relaxed);
    }

    /// Point-in-time copy of every counter
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            executions: self.executions.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            filters_applied: self.filters_applied.load(Ordering::Relaxed),
            rows_mapped: self.rows_mapped.load(Ordering::Relaxed),
        }
    }
}

/// Serializable copy of [`ExecutorMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub executions: u64,
    pub failures: u64,
    pub filters_applied: u64,
    pub rows_mapped: u64,
}
