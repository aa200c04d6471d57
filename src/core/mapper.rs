//! Result Mappers
//!
//! Post-execution row transforms. A mapper is either a function applied to
//! every row or a field-rewrite table (rename, drop, or transform per field).

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use super::error::CoreResult;

/// Fallible value transform shared by row and field mappers
pub type TransformFn = Arc<dyn Fn(Value) -> CoreResult<Value> + Send + Sync>;

/// Rewrite rule for one field
#[derive(Clone)]
pub enum FieldRule {
    /// Move the value to another field name
    Rename(String),
    /// Omit the field
    Drop,
    /// Replace the value, keeping the field name
    Transform(TransformFn),
}

impl FieldRule {
    pub fn rename(target: impl Into<String>) -> Self {
        FieldRule::Rename(target.into())
    }

    pub fn transform<F>(f: F) -> Self
    where
        F: Fn(Value) -> CoreResult<Value> + Send + Sync + 'static,
    {
        FieldRule::Transform(Arc::new(f))
    }
}

impl fmt::Debug for FieldRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldRule::Rename(target) => f.debug_tuple("Rename").field(target).finish(),
            FieldRule::Drop => f.write_str("Drop"),
            FieldRule::Transform(_) => f.write_str("Transform(..)"),
        }
    }
}

/// Field-rewrite table; fields without a rule pass through
pub type FieldRules = HashMap<String, FieldRule>;

/// A single step of the result-mapping chain
#[derive(Clone)]
pub enum MapperSpec {
    /// Applied to every row
    Function(TransformFn),
    /// Field rules applied to every row
    Fields(FieldRules),
}

impl MapperSpec {
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(Value) -> CoreResult<Value> + Send + Sync + 'static,
    {
        MapperSpec::Function(Arc::new(f))
    }

    pub fn fields<I, K>(rules: I) -> Self
    where
        I: IntoIterator<Item = (K, FieldRule)>,
        K: Into<String>,
    {
        MapperSpec::Fields(rules.into_iter().map(|(k, r)| (k.into(), r)).collect())
    }

    /// Apply this mapper to one row
    pub fn apply(&self, row: Value) -> CoreResult<Value> {
        match self {
            MapperSpec::Function(f) => f(row),
            MapperSpec::Fields(rules) => map_values(row, rules),
        }
    }
}

impl fmt::Debug for MapperSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapperSpec::Function(_) => f.write_str("Function(..)"),
            MapperSpec::Fields(rules) => f.debug_tuple("Fields").field(rules).finish(),
        }
    }
}

/// Rewrite the fields of one row
///
/// Only fields present on the row are considered; rules for absent fields
/// are ignored. Rows that are not objects are returned unchanged.
pub fn map_values(row: Value, rules: &FieldRules) -> CoreResult<Value> {
    let fields = match row {
        Value::Object(fields) => fields,
        other => return Ok(other),
    };

    let mut out = Map::with_capacity(fields.len());
    for (key, value) in fields {
        match rules.get(&key) {
            None => {
                out.insert(key, value);
            }
            Some(FieldRule::Drop) => {}
            Some(FieldRule::Transform(f)) => {
                out.insert(key, f(value)?);
            }
            Some(FieldRule::Rename(target)) => {
                out.insert(target.clone(), value);
            }
        }
    }

    Ok(Value::Object(out))
}

/// Fold mappers left to right over a result set
///
/// Results that are not arrays are returned unchanged, as is everything
/// when there are no mappers.
pub fn apply_mappers(result: Value, mappers: &[MapperSpec]) -> CoreResult<Value> {
    if mappers.is_empty() {
        return Ok(result);
    }

    let mut rows = match result {
        Value::Array(rows) => rows,
        other => return Ok(other),
    };

    for mapper in mappers {
        rows = rows
            .into_iter()
            .map(|row| mapper.apply(row))
            .collect::<CoreResult<Vec<_>>>()?;
    }

    Ok(Value::Array(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::CoreError;
    use serde_json::json;

    fn rules(spec: MapperSpec) -> FieldRules {
        match spec {
            MapperSpec::Fields(rules) => rules,
            MapperSpec::Function(_) => unreachable!(),
        }
    }

    #[test]
    fn test_map_values_drop() {
        let r = rules(MapperSpec::fields([("a", FieldRule::Drop)]));
        let out = map_values(json!({"a": 1, "b": 2, "c": 3}), &r).unwrap();
        assert_eq!(out, json!({"b": 2, "c": 3}));
    }

    #[test]
    fn test_map_values_rename() {
        let r = rules(MapperSpec::fields([("a", FieldRule::rename("alpha"))]));
        let out = map_values(json!({"a": 1, "b": 2}), &r).unwrap();
        assert_eq!(out, json!({"alpha": 1, "b": 2}));
    }

    #[test]
    fn test_map_values_rename_to_same_name() {
        let r = rules(MapperSpec::fields([("a", FieldRule::rename("a"))]));
        let out = map_values(json!({"a": 1}), &r).unwrap();
        assert_eq!(out, json!({"a": 1}));
    }

    #[test]
    fn test_map_values_transform() {
        let r = rules(MapperSpec::fields([(
            "n",
            FieldRule::transform(|v| Ok(json!(v.as_i64().unwrap_or(0) * 10))),
        )]));
        let out = map_values(json!({"n": 4, "s": "x"}), &r).unwrap();
        assert_eq!(out, json!({"n": 40, "s": "x"}));
    }

    #[test]
    fn test_map_values_does_not_synthesize() {
        let r = rules(MapperSpec::fields([
            ("missing", FieldRule::rename("other")),
            ("gone", FieldRule::Drop),
        ]));
        let out = map_values(json!({"a": 1}), &r).unwrap();
        assert_eq!(out, json!({"a": 1}));
    }

    #[test]
    fn test_map_values_non_object_passthrough() {
        let r = rules(MapperSpec::fields([("a", FieldRule::Drop)]));
        assert_eq!(map_values(json!(7), &r).unwrap(), json!(7));
    }

    #[test]
    fn test_apply_mappers_sequential() {
        let mappers = vec![
            MapperSpec::fields([("a", FieldRule::rename("b"))]),
            MapperSpec::function(|mut row| {
                row["seen"] = row["b"].clone();
                Ok(row)
            }),
            MapperSpec::fields([("b", FieldRule::Drop)]),
        ];

        let out = apply_mappers(json!([{"a": 1}, {"a": 2}]), &mappers).unwrap();
        assert_eq!(out, json!([{"seen": 1}, {"seen": 2}]));
    }

    #[test]
    fn test_apply_mappers_empty_is_identity() {
        let raw = json!({"not": "an array"});
        assert_eq!(apply_mappers(raw.clone(), &[]).unwrap(), raw);
    }

    #[test]
    fn test_apply_mappers_bare_result_passthrough() {
        let mappers = vec![MapperSpec::fields([("not", FieldRule::Drop)])];
        let raw = json!({"not": "an array"});
        assert_eq!(apply_mappers(raw.clone(), &mappers).unwrap(), raw);
    }

    #[test]
    fn test_apply_mappers_propagates_error() {
        let mappers = vec![MapperSpec::function(|_| Err(CoreError::mapper("bad row")))];
        let err = apply_mappers(json!([{"a": 1}]), &mappers).unwrap_err();
        assert_eq!(err, CoreError::mapper("bad row"));
    }
}
