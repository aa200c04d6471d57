//! Filter Resolution
//!
//! Filters are looked up by name in a search path of filter libraries.
//! A library is a named collection of factories, populated at startup;
//! the first library on the path that knows a name wins.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use super::criteria::FilterEntry;
use super::error::{CoreError, CoreResult};
use super::pipeline::Filter;

/// Builds a filter unit from its options
pub trait FilterFactory<P>: Send + Sync {
    fn create(&self, options: &Value) -> CoreResult<Arc<dyn Filter<P>>>;
}

impl<P, F> FilterFactory<P> for F
where
    F: Fn(&Value) -> CoreResult<Arc<dyn Filter<P>>> + Send + Sync,
{
    fn create(&self, options: &Value) -> CoreResult<Arc<dyn Filter<P>>> {
        self(options)
    }
}

/// Named collection of filter factories
pub struct FilterLibrary<P> {
    name: String,
    factories: HashMap<String, Arc<dyn FilterFactory<P>>>,
}

impl<P: 'static> FilterLibrary<P> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            factories: HashMap::new(),
        }
    }

    /// Register a factory function under a filter name
    pub fn register<F>(&mut self, filter: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(&Value) -> CoreResult<Arc<dyn Filter<P>>> + Send + Sync + 'static,
    {
        self.register_factory(filter, factory)
    }

    /// Register any [`FilterFactory`] under a filter name
    pub fn register_factory(
        &mut self,
        filter: impl Into<String>,
        factory: impl FilterFactory<P> + 'static,
    ) -> &mut Self {
        self.factories.insert(filter.into(), Arc::new(factory));
        self
    }

    /// Builder form of [`register`](Self::register)
    pub fn with<F>(mut self, filter: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&Value) -> CoreResult<Arc<dyn Filter<P>>> + Send + Sync + 'static,
    {
        self.register(filter, factory);
        self
    }
}

impl<P> FilterLibrary<P> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn contains(&self, filter: &str) -> bool {
        self.factories.contains_key(filter)
    }

    pub fn get(&self, filter: &str) -> Option<&Arc<dyn FilterFactory<P>>> {
        self.factories.get(filter)
    }

    /// Registered filter names, sorted
    pub fn filters(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl<P> fmt::Debug for FilterLibrary<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterLibrary")
            .field("name", &self.name)
            .field("filters", &self.filters())
            .finish()
    }
}

/// Where a filter name resolved to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterLocation {
    pub library: String,
    pub filter: String,
}

impl fmt::Display for FilterLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.library, self.filter)
    }
}

/// Resolves filter names against an ordered search path
pub struct FilterResolver<P> {
    path: Vec<String>,
    libraries: HashMap<String, FilterLibrary<P>>,
}

impl<P> FilterResolver<P> {
    pub fn new(path: Vec<String>) -> Self {
        Self {
            path,
            libraries: HashMap::new(),
        }
    }

    /// Make a library available; it is only searched if the path names it
    pub fn mount(&mut self, library: FilterLibrary<P>) {
        if !self.path.iter().any(|p| p == library.name()) {
            debug!(library = library.name(), "mounted library is not on the search path");
        }
        self.libraries.insert(library.name().to_string(), library);
    }

    pub fn search_path(&self) -> &[String] {
        &self.path
    }

    /// Find the first library on the search path providing `filter`
    pub fn resolve_path(&self, filter: &str) -> CoreResult<FilterLocation> {
        self.lookup(filter).map(|(location, _)| location)
    }

    /// Turn criteria filters into ordered units
    ///
    /// Resolved entries are used as is. Appended options fan out into one
    /// unit per options value at the position of their name.
    pub fn resolve(
        &self,
        filters: &[(String, FilterEntry<P>)],
    ) -> CoreResult<Vec<Arc<dyn Filter<P>>>> {
        let mut units = Vec::with_capacity(filters.iter().map(|(_, e)| e.unit_count()).sum());

        for (name, entry) in filters {
            match entry {
                FilterEntry::Resolved(unit) => units.push(Arc::clone(unit)),
                FilterEntry::Options(options) => {
                    let (location, factory) = self.lookup(name)?;
                    debug!(filter = %location, "resolved filter");
                    units.push(factory.create(options)?);
                }
                FilterEntry::Many(list) => {
                    let (location, factory) = self.lookup(name)?;
                    debug!(filter = %location, count = list.len(), "resolved appended filter");
                    for options in list {
                        units.push(factory.create(options)?);
                    }
                }
            }
        }

        Ok(units)
    }

    fn lookup(&self, filter: &str) -> CoreResult<(FilterLocation, &Arc<dyn FilterFactory<P>>)> {
        self.path
            .iter()
            .filter_map(|name| self.libraries.get(name))
            .find_map(|library| {
                library.get(filter).map(|factory| {
                    let location = FilterLocation {
                        library: library.name().to_string(),
                        filter: filter.to_string(),
                    };
                    (location, factory)
                })
            })
            .ok_or_else(|| CoreError::filter_not_found(filter))
    }
}
