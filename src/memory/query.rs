//! In-memory query builder
//!
//! The provider handed to filters by [`MemoryAdapter`](super::MemoryAdapter).

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Mutable query against one collection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryQuery {
    pub collection: String,
    pub conditions: Vec<Condition>,
    pub sort: Vec<SortKey>,
    pub offset: usize,
    pub limit: Option<usize>,
}

impl MemoryQuery {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            ..Self::default()
        }
    }

    /// Check a document against every condition
    pub fn matches(&self, doc: &Value) -> bool {
        self.conditions.iter().all(|c| c.matches(doc))
    }

    /// Run the query over a set of documents
    pub fn apply(&self, docs: &[Value]) -> Vec<Value> {
        let mut rows: Vec<Value> = docs.iter().filter(|d| self.matches(d)).cloned().collect();

        if !self.sort.is_empty() {
            rows.sort_by(|a, b| {
                self.sort
                    .iter()
                    .map(|key| key.compare(a, b))
                    .find(|ord| *ord != Ordering::Equal)
                    .unwrap_or(Ordering::Equal)
            });
        }

        let rows = rows.into_iter().skip(self.offset);
        match self.limit {
            Some(limit) => rows.take(limit).collect(),
            None => rows.collect(),
        }
    }
}

/// Comparison operators
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    #[default]
    Eq,
    Neq,
    In,
    Contains,
    Gt,
    Gte,
    Lt,
    Lte,
}

/// Field condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub field: String,
    #[serde(default, rename = "op")]
    pub operator: Operator,
    pub value: Value,
}

impl Condition {
    pub fn new(field: impl Into<String>, operator: Operator, value: Value) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
        }
    }

    pub fn eq(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, Operator::Eq, value)
    }

    /// Check if a document passes this condition; missing fields never match
    pub fn matches(&self, doc: &Value) -> bool {
        let field_value = match doc.get(&self.field) {
            Some(v) => v,
            None => return false,
        };

        match self.operator {
            Operator::Eq => field_value == &self.value,
            Operator::Neq => field_value != &self.value,
            Operator::In => self
                .value
                .as_array()
                .map(|arr| arr.contains(field_value))
                .unwrap_or(false),
            Operator::Contains => match (field_value, &self.value) {
                (Value::String(haystack), Value::String(needle)) => {
                    haystack.contains(needle.as_str())
                }
                (Value::Array(items), needle) => items.contains(needle),
                _ => false,
            },
            Operator::Gt => ordered(field_value, &self.value) == Some(Ordering::Greater),
            Operator::Gte => matches!(
                ordered(field_value, &self.value),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Operator::Lt => ordered(field_value, &self.value) == Some(Ordering::Less),
            Operator::Lte => matches!(
                ordered(field_value, &self.value),
                Some(Ordering::Less | Ordering::Equal)
            ),
        }
    }
}

/// Sort key; missing fields sort first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub field: String,
    #[serde(default, rename = "desc")]
    pub descending: bool,
}

impl SortKey {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: false,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: true,
        }
    }

    fn compare(&self, a: &Value, b: &Value) -> Ordering {
        let ord = total_order(a.get(&self.field), b.get(&self.field));
        if self.descending {
            ord.reverse()
        } else {
            ord
        }
    }
}

/// Numeric or string comparison; other pairs are unordered
fn ordered(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn rank(v: Option<&Value>) -> u8 {
    match v {
        None | Some(Value::Null) => 0,
        Some(Value::Bool(_)) => 1,
        Some(Value::Number(_)) => 2,
        Some(Value::String(_)) => 3,
        Some(Value::Array(_)) => 4,
        Some(Value::Object(_)) => 5,
    }
}

fn total_order(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(x), Some(y)) => {
            ordered(x, y).unwrap_or_else(|| rank(Some(x)).cmp(&rank(Some(y))))
        }
        _ => rank(a).cmp(&rank(b)),
    }
}
