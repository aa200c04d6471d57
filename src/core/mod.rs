//! # Sluice Core Module
//!
//! Criteria execution: filter resolution, middleware chain, adapter
//! delegation and result mapping.
//!
//! ## Design Principles
//!
//! - Filters are resolved by name from an ordered search path of libraries
//! - The provider is threaded through filters as an onion-style chain
//! - Backends plug in through the `Adapter` capability trait
//! - Any error aborts the remaining stages and reaches the caller unchanged

pub mod adapter;
pub mod config;
pub mod criteria;
pub mod error;
pub mod executor;
pub mod mapper;
pub mod pipeline;
pub mod resolver;

pub use adapter::{Adapter, AdapterFuture};
pub use config::{ExecutorConfig, SearchPath};
pub use criteria::{Criteria, FilterEntry, QueryCriteria};
pub use error::{CoreError, CoreResult, PipelineStage};
pub use executor::{Executor, SharedAdapter};
pub use mapper::{apply_mappers, map_values, FieldRule, FieldRules, MapperSpec, TransformFn};
pub use pipeline::{filter_fn, Filter, FilterChain, FilterFuture, Next};
pub use resolver::{FilterFactory, FilterLibrary, FilterLocation, FilterResolver};
