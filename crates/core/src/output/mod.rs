//! Artifacts generated from a normalized map.

pub mod object_schema;
pub mod wire_schema;

pub use object_schema::{HookFn, ObjectSchema, PreValidateHook, SchemaEntry, SchemaType, build_object_schema};
pub use wire_schema::{build_wire_schema, wire_type};
