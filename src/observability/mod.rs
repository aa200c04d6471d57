//! Observability for criteria execution
//!
//! Structured logging goes through `tracing`; installing a subscriber is
//! left to the host application.
//!
//! # Principles
//!
//! 1. Observability is read-only
//! 2. No side effects on execution
//! 3. No background threads
//!
//! # Usage
//!
//! ```ignore
//! use sluice::observability::{ExecutionScope, ExecutorMetrics};
//!
//! let metrics = ExecutorMetrics::new();
//! metrics.increment_executions();
//!
//! let scope = ExecutionScope::begin("users");
//! // ... do work ...
//! scope.complete();
//! ```

mod metrics;
mod scope;

pub use metrics::{ExecutorMetrics, MetricsSnapshot};
pub use scope::ExecutionScope;
