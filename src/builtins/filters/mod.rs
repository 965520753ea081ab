use std::collections::HashMap;
use std::sync::Arc;

use serde_json::value::Value;

use crate::errors::{Error, Result};

pub mod array;
pub mod common;
pub mod cycle;
pub mod number;
pub mod string;

/// The filter function type definition
pub trait Filter: Sync + Send {
    /// The filter function type definition
    fn filter(&self, value: &Value, args: &[Value]) -> Result<Value>;
}

impl<F> Filter for F
where
    F: Fn(&Value, &[Value]) -> Result<Value> + Sync + Send,
{
    fn filter(&self, value: &Value, args: &[Value]) -> Result<Value> {
        self(value, args)
    }
}

/// Name to filter map owned by an `Engine`
#[derive(Clone, Default)]
pub struct FilterRegistry {
    filters: HashMap<String, Arc<dyn Filter>>,
}

impl FilterRegistry {
    /// A registry with every builtin filter, the `cycle`/`next` pair sharing `cycles`
    pub fn with_builtins(cycles: Arc<cycle::CycleRegistry>) -> Self {
        let mut registry = FilterRegistry::default();

        registry.register("uppercase", string::uppercase);
        registry.register("lowercase", string::lowercase);
        registry.register("capitalize", string::capitalize);
        registry.register("titleCase", string::title_case);
        registry.register("trim", string::trim);
        registry.register("truncate", string::truncate);
        registry.register("replace", string::replace);
        registry.register("split", string::split);
        #[cfg(feature = "builtins")]
        registry.register("slugify", string::slugify);
        registry.register("stripTags", string::strip_tags);
        registry.register("nl2br", string::nl2br);
        #[cfg(feature = "urlencode")]
        registry.register("urlEncode", string::url_encode);
        registry.register("escape", string::escape);
        registry.register("wordCount", string::word_count);

        registry.register("length", array::length);
        registry.register("first", array::first);
        registry.register("last", array::last);
        registry.register("join", array::join);
        registry.register("reverse", array::reverse);
        registry.register("sort", array::sort);
        registry.register("unique", array::unique);
        registry.register("slice", array::slice);
        registry.register("keys", array::keys);
        registry.register("values", array::values);

        registry.register("abs", number::abs);
        registry.register("round", number::round);
        registry.register("fixed", number::fixed);
        #[cfg(feature = "builtins")]
        registry.register("fileSize", number::file_size);
        registry.register("pluralize", number::pluralize);

        registry.register("default", common::default);
        registry.register("json", common::json);
        #[cfg(feature = "builtins")]
        registry.register("dateFormat", common::date_format);
        registry.register("string", common::string);

        registry.register("cycle", cycle::Cycle::new(cycles.clone()));
        registry.register("next", cycle::Next::new(cycles));

        registry
    }

    /// Adds or replaces the filter named `name`
    pub fn register<F: Filter + 'static>(&mut self, name: &str, filter: F) {
        self.filters.insert(name.to_string(), Arc::new(filter));
    }

    /// Looks up a filter, failing with `FilterNotFound`
    pub fn get(&self, name: &str) -> Result<&Arc<dyn Filter>> {
        self.filters.get(name).ok_or_else(|| Error::filter_not_found(name))
    }
}
