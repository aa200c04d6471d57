//! In-memory adapter
//!
//! Collections of JSON documents held in process. Every `execute` returns a
//! JSON array of the matching documents.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use serde_json::Value;

use crate::core::adapter::{Adapter, AdapterFuture};
use crate::core::error::{CoreError, CoreResult};

use super::query::MemoryQuery;

/// Collection name -> documents, in insertion order
type Collections = HashMap<String, Vec<Value>>;

/// In-memory backend for tests and examples
#[derive(Debug, Default)]
pub struct MemoryAdapter {
    collections: RwLock<Collections>,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: seed a collection
    ///
    /// The adapter is owned here, so the collections are reached without
    /// locking; a poisoned lock still holds valid data and is recovered.
    pub fn with_collection(mut self, name: impl Into<String>, docs: Vec<Value>) -> Self {
        let collections = self
            .collections
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        collections.entry(name.into()).or_default().extend(docs);
        self
    }

    /// Append a document to a collection, creating it if needed
    pub fn insert(&self, collection: &str, doc: Value) -> CoreResult<()> {
        let mut collections = self
            .collections
            .write()
            .map_err(|_| CoreError::adapter("lock poisoned"))?;
        collections.entry(collection.to_string()).or_default().push(doc);
        Ok(())
    }

    /// Number of documents in a collection
    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .map(|c| c.get(collection).map(Vec::len).unwrap_or(0))
            .unwrap_or(0)
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    fn run(&self, query: &MemoryQuery) -> CoreResult<Value> {
        let collections = self
            .collections
            .read()
            .map_err(|_| CoreError::adapter("lock poisoned"))?;

        let rows = collections
            .get(&query.collection)
            .map(|docs| query.apply(docs))
            .unwrap_or_default();

        Ok(Value::Array(rows))
    }
}

impl Adapter for MemoryAdapter {
    type Provider = MemoryQuery;

    fn get_provider(&self, source: &str) -> CoreResult<MemoryQuery> {
        Ok(MemoryQuery::new(source))
    }

    fn execute(&self, provider: MemoryQuery) -> AdapterFuture<'_> {
        let result = self.run(&provider);
        Box::pin(async move { result })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::query::{Condition, SortKey};
    use serde_json::json;

    fn adapter() -> MemoryAdapter {
        MemoryAdapter::new().with_collection(
            "posts",
            (0..5).map(|i| json!({"title": format!("Post {}", i), "n": i})).collect(),
        )
    }

    #[tokio::test]
    async fn test_fresh_provider_per_call() {
        let adapter = adapter();
        let mut first = adapter.get_provider("posts").unwrap();
        first.limit = Some(1);

        let second = adapter.get_provider("posts").unwrap();
        assert_eq!(second, MemoryQuery::new("posts"));
    }

    #[tokio::test]
    async fn test_execute_query() {
        let adapter = adapter();
        let mut query = adapter.get_provider("posts").unwrap();
        query.conditions.push(Condition::eq("n", json!(3)));

        let result = adapter.execute(query).await.unwrap();
        assert_eq!(result, json!([{"title": "Post 3", "n": 3}]));
    }

    #[tokio::test]
    async fn test_execute_pagination() {
        let adapter = adapter();
        let mut query = adapter.get_provider("posts").unwrap();
        query.sort.push(SortKey::desc("n"));
        query.offset = 1;
        query.limit = Some(2);

        let result = adapter.execute(query).await.unwrap();
        let ns: Vec<i64> = result
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["n"].as_i64().unwrap())
            .collect();
        assert_eq!(ns, vec![3, 2]);
    }

    #[tokio::test]
    async fn test_unknown_collection_is_empty() {
        let adapter = MemoryAdapter::new();
        let result = adapter.execute(MemoryQuery::new("nothing")).await.unwrap();
        assert_eq!(result, json!([]));
    }

    #[test]
    fn test_seeding_survives_poisoned_lock() {
        let adapter = MemoryAdapter::new().with_collection("users", vec![json!({"id": 1})]);
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = adapter.collections.write().unwrap();
            panic!("poison the lock");
        }));
        assert!(adapter.collections.is_poisoned());

        let mut adapter = adapter.with_collection("users", vec![json!({"id": 2})]);
        let collections = adapter
            .collections
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        assert_eq!(collections.get("users").map(Vec::len), Some(2));
    }

    #[test]
    fn test_insert() {
        let adapter = MemoryAdapter::new();
        adapter.insert("users", json!({"name": "Alice"})).unwrap();
        adapter.insert("users", json!({"name": "Bob"})).unwrap();

        assert_eq!(adapter.len("users"), 2);
        assert!(adapter.is_empty("posts"));
    }
}
