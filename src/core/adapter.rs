//! Adapter Capability
//!
//! Backend contract consumed by the executor: hand out a fresh mutable
//! provider for a source, then run that provider to completion.

use futures_util::future::BoxFuture;
use serde_json::Value;

use super::error::CoreResult;

/// Future returned by [`Adapter::execute`]
pub type AdapterFuture<'a> = BoxFuture<'a, CoreResult<Value>>;

/// Swappable execution backend
pub trait Adapter: Send + Sync {
    /// Adapter-specific mutable query builder threaded through the filters
    type Provider: Send;

    /// Create a fresh provider for the source
    fn get_provider(&self, source: &str) -> CoreResult<Self::Provider>;

    /// Execute the provider and return the raw result
    fn execute(&self, provider: Self::Provider) -> AdapterFuture<'_>;
}
