//! Filter Pipeline
//!
//! Onion-style middleware chain threaded over a mutable provider.
//! Each filter receives the provider and a [`Next`] handle; awaiting
//! `next.run(provider)` runs everything downstream, skipping it
//! short-circuits the rest of the chain.

use std::sync::Arc;

use futures_util::future::BoxFuture;

use super::error::CoreResult;

/// Future returned by a filter unit
pub type FilterFuture<'a> = BoxFuture<'a, CoreResult<()>>;

/// A resolved, callable filter unit
pub trait Filter<P>: Send + Sync {
    /// Mutate the provider, optionally continuing down the chain
    fn apply<'a>(&'a self, provider: &'a mut P, next: Next<'a, P>) -> FilterFuture<'a>;
}

/// Remainder of the chain after the current filter
pub struct Next<'a, P> {
    filters: &'a [Arc<dyn Filter<P>>],
}

impl<'a, P: Send> Next<'a, P> {
    /// Run the next filter, or finish if the chain is exhausted
    pub fn run(self, provider: &'a mut P) -> FilterFuture<'a> {
        Box::pin(async move {
            if let Some((first, rest)) = self.filters.split_first() {
                let next = Next { filters: rest };
                first.apply(provider, next).await
            } else {
                Ok(())
            }
        })
    }

    /// Number of filters still to run
    pub fn remaining(&self) -> usize {
        self.filters.len()
    }
}

/// Ordered filter units composed into a single invocation
pub struct FilterChain<P> {
    filters: Vec<Arc<dyn Filter<P>>>,
}

impl<P: Send> FilterChain<P> {
    /// Compose units in the order given
    pub fn compose(filters: Vec<Arc<dyn Filter<P>>>) -> Self {
        Self { filters }
    }

    /// Run the chain once against the provider
    pub async fn run(&self, provider: &mut P) -> CoreResult<()> {
        let next = Next {
            filters: &self.filters,
        };
        next.run(provider).await
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

/// Filter backed by a closure, see [`filter_fn`]
pub struct FilterFn<F>(F);

impl<P, F> Filter<P> for FilterFn<F>
where
    F: for<'a> Fn(&'a mut P, Next<'a, P>) -> FilterFuture<'a> + Send + Sync,
{
    fn apply<'a>(&'a self, provider: &'a mut P, next: Next<'a, P>) -> FilterFuture<'a> {
        (self.0)(provider, next)
    }
}

/// Wrap a closure as a filter unit
pub fn filter_fn<P, F>(f: F) -> Arc<dyn Filter<P>>
where
    P: 'static,
    F: for<'a> Fn(&'a mut P, Next<'a, P>) -> FilterFuture<'a> + Send + Sync + 'static,
{
    Arc::new(FilterFn(f))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::CoreError;

    /// Records before/after markers around the rest of the chain
    struct Trace(&'static str);

    impl Filter<Vec<String>> for Trace {
        fn apply<'a>(
            &'a self,
            log: &'a mut Vec<String>,
            next: Next<'a, Vec<String>>,
        ) -> FilterFuture<'a> {
            Box::pin(async move {
                log.push(format!("{}:before", self.0));
                next.run(log).await?;
                log.push(format!("{}:after", self.0));
                Ok(())
            })
        }
    }

    /// Never calls next
    struct Stop;

    impl Filter<Vec<String>> for Stop {
        fn apply<'a>(
            &'a self,
            log: &'a mut Vec<String>,
            _next: Next<'a, Vec<String>>,
        ) -> FilterFuture<'a> {
            Box::pin(async move {
                log.push("stop".to_string());
                Ok(())
            })
        }
    }

    struct Fail;

    impl Filter<Vec<String>> for Fail {
        fn apply<'a>(
            &'a self,
            _log: &'a mut Vec<String>,
            _next: Next<'a, Vec<String>>,
        ) -> FilterFuture<'a> {
            Box::pin(async move { Err(CoreError::filter("rejected")) })
        }
    }

    #[tokio::test]
    async fn test_empty_chain_completes() {
        let chain: FilterChain<Vec<String>> = FilterChain::compose(Vec::new());
        let mut log = Vec::new();

        assert!(chain.is_empty());
        chain.run(&mut log).await.unwrap();
        assert!(log.is_empty());
    }

    #[tokio::test]
    async fn test_onion_ordering() {
        let chain = FilterChain::compose(vec![
            Arc::new(Trace("a")) as Arc<dyn Filter<Vec<String>>>,
            Arc::new(Trace("b")),
            Arc::new(Trace("c")),
        ]);
        let mut log = Vec::new();

        chain.run(&mut log).await.unwrap();

        assert_eq!(
            log,
            vec!["a:before", "b:before", "c:before", "c:after", "b:after", "a:after"]
        );
    }

    #[tokio::test]
    async fn test_short_circuit_skips_rest() {
        let chain = FilterChain::compose(vec![
            Arc::new(Trace("a")) as Arc<dyn Filter<Vec<String>>>,
            Arc::new(Stop),
            Arc::new(Trace("never")),
        ]);
        let mut log = Vec::new();

        chain.run(&mut log).await.unwrap();

        assert_eq!(log, vec!["a:before", "stop", "a:after"]);
    }

    #[tokio::test]
    async fn test_error_aborts_chain() {
        let chain = FilterChain::compose(vec![
            Arc::new(Trace("a")) as Arc<dyn Filter<Vec<String>>>,
            Arc::new(Fail),
            Arc::new(Trace("never")),
        ]);
        let mut log = Vec::new();

        let err = chain.run(&mut log).await.unwrap_err();

        assert_eq!(err, CoreError::filter("rejected"));
        // "a" propagated the error with `?`, so its post-next logic never ran
        assert_eq!(log, vec!["a:before"]);
    }

    #[tokio::test]
    async fn test_closure_filter() {
        let push = filter_fn::<Vec<String>, _>(|log, next| {
            Box::pin(async move {
                log.push(format!("remaining={}", next.remaining()));
                next.run(log).await
            })
        });
        let chain = FilterChain::compose(vec![push.clone(), push]);
        let mut log = Vec::new();

        chain.run(&mut log).await.unwrap();

        assert_eq!(log, vec!["remaining=1", "remaining=0"]);
    }
}
