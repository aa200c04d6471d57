//! Criteria
//!
//! Declarative description of one query: the source, the named filters
//! with their options, and the ordered result mappers.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use super::error::{CoreError, CoreResult};
use super::mapper::{FieldRule, MapperSpec};
use super::pipeline::Filter;

/// Read-only view of a criteria consumed by the executor
pub trait QueryCriteria<P>: Send + Sync {
    /// Data source handed to `Adapter::get_provider`
    fn source(&self) -> &str;

    /// Named filters in application order
    fn filters(&self) -> &[(String, FilterEntry<P>)];

    /// Result mappers in application order
    fn mappers(&self) -> &[MapperSpec];
}

/// Value stored under a filter name
pub enum FilterEntry<P> {
    /// Options for a single application of the filter
    Options(Value),
    /// Options appended under the same name, one application each
    Many(Vec<Value>),
    /// A unit that needs no lookup
    Resolved(Arc<dyn Filter<P>>),
}

impl<P> FilterEntry<P> {
    /// Number of units this entry resolves to
    pub fn unit_count(&self) -> usize {
        match self {
            FilterEntry::Many(list) => list.len(),
            _ => 1,
        }
    }

    fn into_options(self) -> Vec<Value> {
        match self {
            FilterEntry::Options(opts) => vec![opts],
            FilterEntry::Many(list) => list,
            FilterEntry::Resolved(_) => Vec::new(),
        }
    }
}

/// Array-valued options are appended options, one application per element
impl<P> From<Value> for FilterEntry<P> {
    fn from(opts: Value) -> Self {
        match opts {
            Value::Array(list) => FilterEntry::Many(list),
            other => FilterEntry::Options(other),
        }
    }
}

impl<P> Clone for FilterEntry<P> {
    fn clone(&self) -> Self {
        match self {
            FilterEntry::Options(opts) => FilterEntry::Options(opts.clone()),
            FilterEntry::Many(list) => FilterEntry::Many(list.clone()),
            FilterEntry::Resolved(unit) => FilterEntry::Resolved(Arc::clone(unit)),
        }
    }
}

impl<P> fmt::Debug for FilterEntry<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterEntry::Options(opts) => f.debug_tuple("Options").field(opts).finish(),
            FilterEntry::Many(list) => f.debug_tuple("Many").field(list).finish(),
            FilterEntry::Resolved(_) => f.write_str("Resolved(..)"),
        }
    }
}

/// Criteria value object
pub struct Criteria<P> {
    source: String,
    filters: Vec<(String, FilterEntry<P>)>,
    mappers: Vec<MapperSpec>,
}

impl<P> Criteria<P> {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            filters: Vec::new(),
            mappers: Vec::new(),
        }
    }

    /// Add a filter with append semantics
    ///
    /// Adding a name that already holds options keeps every options value,
    /// in insertion order, so the filter is applied once per value. An
    /// array of options counts as one value per element. A resolved unit
    /// stored under the name is replaced.
    pub fn add_filter(&mut self, name: impl Into<String>, opts: Value) -> &mut Self {
        let name = name.into();
        let incoming = FilterEntry::from(opts);
        match self.entry_mut(&name) {
            Some(entry) => {
                *entry = match std::mem::replace(entry, FilterEntry::Many(Vec::new())) {
                    // options cannot be appended to a resolved unit
                    FilterEntry::Resolved(_) => incoming,
                    existing => {
                        let mut list = existing.into_options();
                        list.extend(incoming.into_options());
                        FilterEntry::Many(list)
                    }
                };
            }
            None => self.filters.push((name, incoming)),
        }
        self
    }

    /// Set a filter, replacing anything stored under the name
    pub fn set_filter(&mut self, name: impl Into<String>, opts: Value) -> &mut Self {
        self.put(name.into(), FilterEntry::from(opts))
    }

    /// Set an already-resolved filter unit under the name
    pub fn add_filter_unit(
        &mut self,
        name: impl Into<String>,
        unit: Arc<dyn Filter<P>>,
    ) -> &mut Self {
        self.put(name.into(), FilterEntry::Resolved(unit))
    }

    pub fn add_mapper(&mut self, mapper: MapperSpec) -> &mut Self {
        self.mappers.push(mapper);
        self
    }

    /// Builder form of [`add_filter`](Self::add_filter)
    pub fn with_filter(mut self, name: impl Into<String>, opts: Value) -> Self {
        self.add_filter(name, opts);
        self
    }

    /// Builder form of [`add_mapper`](Self::add_mapper)
    pub fn with_mapper(mut self, mapper: MapperSpec) -> Self {
        self.add_mapper(mapper);
        self
    }

    /// Look up the entry stored under a filter name
    pub fn filter(&self, name: &str) -> Option<&FilterEntry<P>> {
        self.filters
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, entry)| entry)
    }

    /// Build criteria from a JSON document
    ///
    /// The document must be an object with `source` (string), `filters`
    /// (object) and `mappers` (array). Array-valued filter options are
    /// treated as appended options. Mapper objects become field-rewrite
    /// tables; other mapper values are ignored.
    pub fn from_json(doc: &Value) -> CoreResult<Self> {
        let obj = doc
            .as_object()
            .ok_or_else(|| CoreError::invalid_criteria("criteria must be an object"))?;

        let source = obj
            .get("source")
            .and_then(Value::as_str)
            .ok_or_else(|| CoreError::invalid_criteria("missing string field `source`"))?;
        let filters = obj
            .get("filters")
            .and_then(Value::as_object)
            .ok_or_else(|| CoreError::invalid_criteria("missing object field `filters`"))?;
        let mappers = obj
            .get("mappers")
            .and_then(Value::as_array)
            .ok_or_else(|| CoreError::invalid_criteria("missing array field `mappers`"))?;

        let mut criteria = Self::new(source);
        for (name, opts) in filters {
            criteria.put(name.clone(), FilterEntry::from(opts.clone()));
        }

        for (index, mapper) in mappers.iter().enumerate() {
            match mapper {
                Value::Object(rules) => {
                    let mut spec = Vec::with_capacity(rules.len());
                    for (field, rule) in rules {
                        let rule = match rule {
                            Value::Bool(false) => FieldRule::Drop,
                            Value::String(target) => FieldRule::Rename(target.clone()),
                            other => {
                                return Err(CoreError::invalid_criteria(format!(
                                    "mapper {} has unsupported rule for `{}`: {}",
                                    index, field, other
                                )))
                            }
                        };
                        spec.push((field.clone(), rule));
                    }
                    criteria.mappers.push(MapperSpec::fields(spec));
                }
                other => {
                    warn!(index, mapper = %other, "ignoring non-object mapper");
                }
            }
        }

        Ok(criteria)
    }

    fn entry_mut(&mut self, name: &str) -> Option<&mut FilterEntry<P>> {
        self.filters
            .iter_mut()
            .find(|(key, _)| key == name)
            .map(|(_, entry)| entry)
    }

    fn put(&mut self, name: String, entry: FilterEntry<P>) -> &mut Self {
        match self.entry_mut(&name) {
            Some(slot) => *slot = entry,
            None => self.filters.push((name, entry)),
        }
        self
    }
}

impl<P> QueryCriteria<P> for Criteria<P> {
    fn source(&self) -> &str {
        &self.source
    }

    fn filters(&self) -> &[(String, FilterEntry<P>)] {
        &self.filters
    }

    fn mappers(&self) -> &[MapperSpec] {
        &self.mappers
    }
}

impl<P> fmt::Debug for Criteria<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Criteria")
            .field("source", &self.source)
            .field("filters", &self.filters)
            .field("mappers", &self.mappers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    type TestCriteria = Criteria<()>;

    fn options(entry: Option<&FilterEntry<()>>) -> Value {
        match entry {
            Some(FilterEntry::Options(v)) => v.clone(),
            Some(FilterEntry::Many(list)) => Value::Array(list.clone()),
            other => panic!("unexpected entry {:?}", other),
        }
    }

    #[test]
    fn test_add_filter_single() {
        let mut criteria = TestCriteria::new("source");
        criteria.add_filter("name", json!({"opt1": 1}));

        assert_eq!(options(criteria.filter("name")), json!({"opt1": 1}));
        assert_eq!(criteria.source(), "source");
    }

    #[test]
    fn test_add_filter_appends() {
        let mut criteria = TestCriteria::new("source");
        criteria.add_filter("name", json!({"opt1": 1}));
        criteria.add_filter("name", json!({"opt1": 2}));
        criteria.add_filter("name", json!({"opt1": 3}));

        assert_eq!(
            options(criteria.filter("name")),
            json!([{"opt1": 1}, {"opt1": 2}, {"opt1": 3}])
        );
        assert_eq!(criteria.filters().len(), 1);
        assert_eq!(criteria.filters()[0].1.unit_count(), 3);
    }

    #[test]
    fn test_set_filter_replaces_in_place() {
        let mut criteria = TestCriteria::new("source");
        criteria.add_filter("first", json!(1));
        criteria.add_filter("second", json!(2));
        criteria.add_filter("first", json!(3));
        criteria.set_filter("first", json!(4));

        let names: Vec<&str> = criteria.filters().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["first", "second"]);
        assert_eq!(options(criteria.filter("first")), json!(4));
    }

    #[test]
    fn test_insertion_order_preserved() {
        let criteria = TestCriteria::new("s")
            .with_filter("zeta", json!({}))
            .with_filter("alpha", json!({}))
            .with_filter("mid", json!({}));

        let names: Vec<&str> = criteria.filters().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_from_json() {
        let doc = json!({
            "source": "users",
            "filters": {"test": {}, "test2": [{"opt1": 1}, {"opt1": 2}]},
            "mappers": [{"a": false, "b": "bee"}, 42]
        });

        let criteria = TestCriteria::from_json(&doc).unwrap();

        assert_eq!(criteria.source(), "users");
        assert_eq!(criteria.filters().len(), 2);
        assert_eq!(criteria.filters()[0].0, "test");
        assert_eq!(criteria.filters()[1].1.unit_count(), 2);
        // non-object mapper is dropped
        assert_eq!(criteria.mappers().len(), 1);
    }

    #[test]
    fn test_array_options_fan_out_like_json() {
        let mut built = TestCriteria::new("s");
        built.add_filter("x", json!([1, 2]));
        built.add_filter("x", json!(3));
        built.set_filter("y", json!([4]));

        let parsed = TestCriteria::from_json(&json!({
            "source": "s",
            "filters": {"x": [1, 2, 3], "y": [4]},
            "mappers": []
        }))
        .unwrap();

        for name in ["x", "y"] {
            assert_eq!(options(built.filter(name)), options(parsed.filter(name)));
        }
        assert_eq!(built.filters()[0].1.unit_count(), 3);
        assert_eq!(built.filters()[1].1.unit_count(), 1);
    }

    #[test]
    fn test_from_json_missing_fields() {
        for doc in [
            json!("users"),
            json!({"filters": {}, "mappers": []}),
            json!({"source": "s", "mappers": []}),
            json!({"source": "s", "filters": {}}),
            json!({"source": "s", "filters": [], "mappers": []}),
        ] {
            let err = TestCriteria::from_json(&doc).unwrap_err();
            assert_eq!(err.code(), "INVALID_CRITERIA", "doc: {}", doc);
        }
    }

    #[test]
    fn test_from_json_rejects_unknown_rule() {
        let doc = json!({"source": "s", "filters": {}, "mappers": [{"a": true}]});
        let err = TestCriteria::from_json(&doc).unwrap_err();
        assert!(matches!(err, CoreError::InvalidCriteria(_)));
    }
}
