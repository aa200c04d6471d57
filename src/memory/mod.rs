//! In-memory backend
//!
//! A complete adapter over process-local JSON collections, with a filter
//! library that builds its queries. Used by the test suite and as a worked
//! example of plugging a backend into the executor.

mod adapter;
pub mod filters;
mod query;

pub use adapter::MemoryAdapter;
pub use filters::{library, QueryStep};
pub use query::{Condition, MemoryQuery, Operator, SortKey};
