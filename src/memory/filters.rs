//! Built-in filters for [`MemoryQuery`]
//!
//! | name     | options                               |
//! |----------|---------------------------------------|
//! | `where`  | `{"field": .., "op"?: .., "value": ..}` |
//! | `limit`  | non-negative integer                  |
//! | `offset` | non-negative integer                  |
//! | `sort`   | field name or `{"field": .., "desc"?: bool}` |

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::core::error::{CoreError, CoreResult};
use crate::core::pipeline::{Filter, FilterFuture, Next};
use crate::core::resolver::FilterLibrary;

use super::query::{Condition, MemoryQuery, SortKey};

/// Name of the library returned by [`library`]
pub const LIBRARY: &str = "memory";

/// One mutation of the query
#[derive(Debug, Clone, PartialEq)]
pub enum QueryStep {
    Where(Condition),
    Limit(usize),
    Offset(usize),
    Sort(SortKey),
}

impl QueryStep {
    fn apply_to(&self, query: &mut MemoryQuery) {
        match self {
            QueryStep::Where(condition) => query.conditions.push(condition.clone()),
            QueryStep::Limit(limit) => query.limit = Some(*limit),
            QueryStep::Offset(offset) => query.offset = *offset,
            QueryStep::Sort(key) => query.sort.push(key.clone()),
        }
    }
}

impl Filter<MemoryQuery> for QueryStep {
    fn apply<'a>(
        &'a self,
        query: &'a mut MemoryQuery,
        next: Next<'a, MemoryQuery>,
    ) -> FilterFuture<'a> {
        Box::pin(async move {
            self.apply_to(query);
            next.run(query).await
        })
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SortOptions {
    Field(String),
    Key(SortKey),
}

fn parse<T: DeserializeOwned>(filter: &str, options: &Value) -> CoreResult<T> {
    serde_json::from_value(options.clone())
        .map_err(|e| CoreError::invalid_options(filter, e.to_string()))
}

fn unit(step: QueryStep) -> CoreResult<Arc<dyn Filter<MemoryQuery>>> {
    Ok(Arc::new(step))
}

/// Filter library for the in-memory backend
pub fn library() -> FilterLibrary<MemoryQuery> {
    FilterLibrary::new(LIBRARY)
        .with("where", |options: &Value| {
            unit(QueryStep::Where(parse("where", options)?))
        })
        .with("limit", |options: &Value| {
            unit(QueryStep::Limit(parse("limit", options)?))
        })
        .with("offset", |options: &Value| {
            unit(QueryStep::Offset(parse("offset", options)?))
        })
        .with("sort", |options: &Value| {
            let key = match parse::<SortOptions>("sort", options)? {
                SortOptions::Field(field) => SortKey::asc(field),
                SortOptions::Key(key) => key,
            };
            unit(QueryStep::Sort(key))
        })
}
