//! [`SchemaCompiler`]: every entry point, bound to one set of [`Settings`].

use serde_json::Value;

use crate::config::Settings;
use crate::error::Result;
use crate::extract;
use crate::output::{self, ObjectSchema};
use crate::schema::merge;
use crate::schema::normalize::{self, SchemaSource};
use crate::schema::types::NormalizedMap;

/// Compiles declarative schemas with fixed settings.
///
/// Every method is a pure function of its arguments and the settings; one
/// compiler can be shared between threads.
#[derive(Debug, Clone, Default)]
pub struct SchemaCompiler {
    settings: Settings,
}

impl SchemaCompiler {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Normalize a collection, a normalized map, or JSON holding either.
    pub fn normalize<'a>(&self, source: impl Into<SchemaSource<'a>>) -> Result<NormalizedMap> {
        normalize::resolve(source.into(), &self.settings).map(|map| map.into_owned())
    }

    pub fn normalize_value(&self, value: &Value) -> Result<NormalizedMap> {
        normalize::normalize_value(value, &self.settings)
    }

    /// Lay a private declaration over a public one. Keys set to `null` in
    /// `private` are removed, and a field `private` declares takes the
    /// requiredness and type it is declared with there.
    pub fn merge_collections(&self, public: &Value, private: &Value) -> Value {
        merge::merge_collections(public, private)
    }

    pub fn build_object_schema<'a>(&self, source: impl Into<SchemaSource<'a>>) -> Result<ObjectSchema> {
        let map = normalize::resolve(source.into(), &self.settings)?;
        output::build_object_schema(&map, &self.settings)
    }

    pub fn build_object_schema_merged(&self, public: &Value, private: &Value) -> Result<ObjectSchema> {
        self.build_object_schema(&self.merge_collections(public, private))
    }

    pub fn build_wire_schema<'a>(&self, source: impl Into<SchemaSource<'a>>) -> Result<Value> {
        let map = normalize::resolve(source.into(), &self.settings)?;
        output::build_wire_schema(&map, &self.settings)
    }

    pub fn build_wire_schema_merged(&self, public: &Value, private: &Value) -> Result<Value> {
        self.build_wire_schema(&self.merge_collections(public, private))
    }

    pub fn extract<'a>(&self, instance: &Value, source: impl Into<SchemaSource<'a>>) -> Result<Value> {
        let map = normalize::resolve(source.into(), &self.settings)?;
        extract::extract(instance, &map, &self.settings)
    }

    pub fn extract_and_validate<'a>(&self, instance: &Value, source: impl Into<SchemaSource<'a>>) -> Result<Value> {
        let map = normalize::resolve(source.into(), &self.settings)?;
        extract::extract_and_validate(instance, &map, &self.settings)
    }

    /// [`extract`](Self::extract), keeping a field that declares option `key`
    /// only when `predicate` accepts the option's value.
    pub fn extract_where<'a>(
        &self,
        instance: &Value,
        source: impl Into<SchemaSource<'a>>,
        key: &str,
        predicate: impl Fn(&Value) -> bool,
    ) -> Result<Value> {
        let map = normalize::resolve(source.into(), &self.settings)?;
        extract::extract_where(instance, &map, key, &predicate, &self.settings)
    }
}
