//! sluice - A pluggable criteria execution pipeline
//!
//! A criteria names a source, a set of filters with options, and a list of
//! result mappers. The executor resolves each filter from its search path,
//! threads the adapter's provider through the filters as a middleware
//! chain, lets the adapter execute it, and maps the rows that come back.

pub mod core;
pub mod memory;
pub mod observability;

pub use crate::core::{
    Adapter, CoreError, CoreResult, Criteria, Executor, ExecutorConfig, FieldRule, Filter,
    FilterLibrary, MapperSpec, Next, QueryCriteria,
};
