#![deny(clippy::all)]

//! Compile declarative field descriptions into runtime object schemas, wire
//! schemas, and direct extract/validate passes.
//!
//! A description groups fields by requiredness, then by type:
//!
//! ```
//! use combined_validator_core::{build_wire_schema, extract_and_validate};
//! use serde_json::json;
//!
//! let schema = json!({
//!     "required": {"string": {"name": {"maxLength": 8}}},
//!     "optional": {"number": {"age": {}}}
//! });
//!
//! let wire = build_wire_schema(&schema).unwrap();
//! assert_eq!(wire["properties"]["name"], json!({"type": "string"}));
//!
//! let clean = extract_and_validate(&json!({"name": "ada", "junk": 1}), &schema).unwrap();
//! assert_eq!(clean, json!({"name": "ada"}));
//! ```
//!
//! The free functions use [`Settings::default`]; build a [`SchemaCompiler`]
//! to use loaded settings.

pub mod compiler;
pub mod config;
pub mod error;
pub mod extract;
pub mod output;
pub mod schema;
pub mod validate;

pub use compiler::SchemaCompiler;
pub use config::{ConfigError, ConfigLoader, ResolvedConfig, Settings};
pub use error::{Error, ErrorKind, FieldPath, Result, ValidationReport};
pub use output::{ObjectSchema, PreValidateHook, SchemaEntry, SchemaType};
pub use schema::{FieldConstraint, FieldConstraintCollection, FieldKind, NormalizedMap, PrimitiveType, SchemaSource};

use serde_json::Value;

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Normalize with default settings.
pub fn normalize<'a>(source: impl Into<SchemaSource<'a>>) -> Result<NormalizedMap> {
    SchemaCompiler::default().normalize(source)
}

/// Build an [`ObjectSchema`] with default settings.
pub fn build_object_schema<'a>(source: impl Into<SchemaSource<'a>>) -> Result<ObjectSchema> {
    SchemaCompiler::default().build_object_schema(source)
}

/// Build a wire schema with default settings.
pub fn build_wire_schema<'a>(source: impl Into<SchemaSource<'a>>) -> Result<Value> {
    SchemaCompiler::default().build_wire_schema(source)
}

/// Extract the declared fields of `instance` with default settings.
pub fn extract<'a>(instance: &Value, source: impl Into<SchemaSource<'a>>) -> Result<Value> {
    SchemaCompiler::default().extract(instance, source)
}

/// Extract and validate `instance` with default settings.
pub fn extract_and_validate<'a>(instance: &Value, source: impl Into<SchemaSource<'a>>) -> Result<Value> {
    SchemaCompiler::default().extract_and_validate(instance, source)
}
