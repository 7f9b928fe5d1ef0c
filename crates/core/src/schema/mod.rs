//! Declarative schema input and its normalized form.

pub mod collection;
pub mod merge;
pub mod normalize;
pub mod types;
pub mod visit;

pub use collection::{DeclaredField, DeclaredObject, FieldConstraintCollection, FieldGroup, TypeContainer};
pub use merge::{Patch, PatchMap, deep_assign, merge_collections, merge_values};
pub use normalize::{SchemaSource, flatten, normalize_value, resolve};
pub use types::{FieldConstraint, FieldKind, FieldOptions, NormalizedMap, PrimitiveType, TypeName};
pub use visit::{Children, FieldContext, FieldValue, FieldVisitor, visit};
