//! Criteria Executor
//!
//! Drives one criteria through the pipeline:
//! check adapter → resolve filters → compose chain → get provider →
//! run chain → adapter execute → result mappers.

use std::sync::Arc;

use serde_json::Value;
use tracing::error;

use super::adapter::Adapter;
use super::config::ExecutorConfig;
use super::criteria::{Criteria, FilterEntry, QueryCriteria};
use super::error::{CoreError, CoreResult};
use super::mapper::apply_mappers;
use super::pipeline::{Filter, FilterChain};
use super::resolver::{FilterLibrary, FilterLocation, FilterResolver};
use crate::observability::{ExecutionScope, ExecutorMetrics, MetricsSnapshot};

/// Shared handle to an adapter producing providers of type `P`
pub type SharedAdapter<P> = Arc<dyn Adapter<Provider = P>>;

/// Executes criteria against the configured adapter
pub struct Executor<P> {
    config: ExecutorConfig,
    resolver: FilterResolver<P>,
    adapter: Option<SharedAdapter<P>>,
    metrics: ExecutorMetrics,
}

impl<P: Send + 'static> Executor<P> {
    /// Create an executor; the filter search path comes from the config
    pub fn new(config: impl Into<ExecutorConfig>) -> Self {
        let config = config.into();
        Self {
            resolver: FilterResolver::new(config.path.clone()),
            config,
            adapter: None,
            metrics: ExecutorMetrics::new(),
        }
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Make a filter library available to the search path
    pub fn mount(&mut self, library: FilterLibrary<P>) {
        self.resolver.mount(library);
    }

    /// Builder form of [`mount`](Self::mount)
    pub fn with_library(mut self, library: FilterLibrary<P>) -> Self {
        self.mount(library);
        self
    }

    /// Set the adapter, replacing any previous one
    pub fn set_adapter(&mut self, adapter: impl Adapter<Provider = P> + 'static) {
        self.adapter = Some(Arc::new(adapter));
    }

    /// Set an adapter that is shared with other executors
    pub fn set_shared_adapter(&mut self, adapter: SharedAdapter<P>) {
        self.adapter = Some(adapter);
    }

    /// Builder form of [`set_adapter`](Self::set_adapter)
    pub fn with_adapter(mut self, adapter: impl Adapter<Provider = P> + 'static) -> Self {
        self.set_adapter(adapter);
        self
    }

    /// The configured adapter
    pub fn adapter(&self) -> CoreResult<&SharedAdapter<P>> {
        self.adapter
            .as_ref()
            .ok_or_else(|| CoreError::invalid_adapter("no adapter configured"))
    }

    /// Find the first library on the search path providing `filter`
    pub fn resolve_filter_path(&self, filter: &str) -> CoreResult<FilterLocation> {
        self.resolver.resolve_path(filter)
    }

    /// Resolve criteria filters into ordered units
    pub fn resolve_filters(
        &self,
        filters: &[(String, FilterEntry<P>)],
    ) -> CoreResult<Vec<Arc<dyn Filter<P>>>> {
        self.resolver.resolve(filters)
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Build and run the query described by `criteria`
    ///
    /// Errors from any stage abort the remaining stages, are logged, and are
    /// returned unchanged.
    pub async fn execute<C>(&self, criteria: &C) -> CoreResult<Value>
    where
        C: QueryCriteria<P> + ?Sized,
    {
        self.metrics.increment_executions();
        let scope = ExecutionScope::begin(criteria.source());

        match self.run(criteria).await {
            Ok(result) => {
                scope.complete();
                Ok(result)
            }
            Err(err) => {
                self.metrics.increment_failures();
                scope.fail(&err);
                Err(err)
            }
        }
    }

    /// Execute and return the first row
    ///
    /// Row sets yield their first element (`None` when empty); any other
    /// result is returned as is.
    pub async fn find_one<C>(&self, criteria: &C) -> CoreResult<Option<Value>>
    where
        C: QueryCriteria<P> + ?Sized,
    {
        Ok(match self.execute(criteria).await? {
            Value::Array(rows) => rows.into_iter().next(),
            other => Some(other),
        })
    }

    /// Execute criteria supplied as a JSON document
    pub async fn execute_json(&self, doc: &Value) -> CoreResult<Value> {
        let criteria = self.parse(doc)?;
        self.execute(&criteria).await
    }

    /// [`find_one`](Self::find_one) for criteria supplied as a JSON document
    pub async fn find_one_json(&self, doc: &Value) -> CoreResult<Option<Value>> {
        let criteria = self.parse(doc)?;
        self.find_one(&criteria).await
    }

    /// Rejected documents count as failed executions
    fn parse(&self, doc: &Value) -> CoreResult<Criteria<P>> {
        Criteria::from_json(doc).map_err(|err| {
            self.metrics.increment_executions();
            self.metrics.increment_failures();
            error!(code = err.code(), "rejected criteria: {}", err);
            err
        })
    }

    async fn run<C>(&self, criteria: &C) -> CoreResult<Value>
    where
        C: QueryCriteria<P> + ?Sized,
    {
        let adapter = self.adapter()?;

        let units = self.resolver.resolve(criteria.filters())?;
        self.metrics.add_filters_applied(units.len() as u64);
        let chain = FilterChain::compose(units);

        let mut provider = adapter.get_provider(criteria.source())?;
        chain.run(&mut provider).await?;

        let result = adapter.execute(provider).await?;

        let mappers = criteria.mappers();
        let rows = match &result {
            Value::Array(rows) => rows.len() * mappers.len(),
            _ => 0,
        };
        let mapped = apply_mappers(result, mappers)?;
        self.metrics.add_rows_mapped(rows as u64);
        Ok(mapped)
    }
}
