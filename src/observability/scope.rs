//! ExecutionScope for start/complete logging around one `execute` call
//!
//! - Logs EXECUTE_BEGIN on creation
//! - Logs EXECUTE_COMPLETE or EXECUTE_FAILED when closed
//! - Warns EXECUTE_INCOMPLETE if dropped while still open

use std::time::Instant;

use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::core::error::CoreError;

/// Scope covering a single criteria execution
///
/// # Usage
///
/// ```ignore
/// let scope = ExecutionScope::begin("users");
/// // ... run the pipeline ...
/// scope.complete();
/// ```
pub struct ExecutionScope {
    id: Uuid,
    source: String,
    started_at: Instant,
    closed: bool,
}

impl ExecutionScope {
    /// Open a scope, logging `EXECUTE_BEGIN`
    pub fn begin(source: &str) -> Self {
        let id = Uuid::new_v4();
        debug!(execution_id = %id, source, "EXECUTE_BEGIN");

        Self {
            id,
            source: source.to_string(),
            started_at: Instant::now(),
            closed: false,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn elapsed_ms(&self) -> u128 {
        self.started_at.elapsed().as_millis()
    }

    /// Close the scope successfully
    pub fn complete(mut self) {
        self.closed = true;
        debug!(
            execution_id = %self.id,
            source = %self.source,
            elapsed_ms = self.elapsed_ms() as u64,
            "EXECUTE_COMPLETE"
        );
    }

    /// Close the scope with the error that aborted the pipeline
    pub fn fail(mut self, err: &CoreError) {
        self.closed = true;
        error!(
            execution_id = %self.id,
            source = %self.source,
            code = err.code(),
            elapsed_ms = self.elapsed_ms() as u64,
            "EXECUTE_FAILED: {}",
            err
        );
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Drop for ExecutionScope {
    fn drop(&mut self) {
        if !self.closed {
            warn!(
                execution_id = %self.id,
                source = %self.source,
                "EXECUTE_INCOMPLETE: scope dropped before the pipeline finished"
            );
        }
    }
}
