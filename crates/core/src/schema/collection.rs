//! The raw declarative description: `required`/`optional` groups keyed by type.
//!
//! ```json
//! {
//!   "required": {
//!     "string": { "name": { "maxLength": 40 } },
//!     "object": { "address": { "required": { "string": { "city": {} } } } }
//!   },
//!   "optional": {
//!     "number": { "age": {} }
//!   }
//! }
//! ```

use serde_json::{Map, Value};

use super::types::{FieldOptions, OPTIONAL_KEY, PrimitiveType, REQUIRED_KEY, TypeName};
use crate::error::{Error, FieldPath, Result};

/// A primitive field as declared.
#[derive(Debug, Clone, PartialEq)]
pub struct DeclaredField {
    pub name: String,
    pub is_array: bool,
    pub options: FieldOptions,
}

/// A nested object field as declared.
#[derive(Debug, Clone, PartialEq)]
pub struct DeclaredObject {
    pub name: String,
    pub is_array: bool,
    pub options: FieldOptions,
    pub fields: FieldConstraintCollection,
}

/// All fields declared under one type key.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldGroup {
    Primitive { ty: PrimitiveType, fields: Vec<DeclaredField> },
    Object { fields: Vec<DeclaredObject> },
}

impl FieldGroup {
    pub fn type_name(&self) -> TypeName {
        match self {
            Self::Primitive { ty, .. } => TypeName::Primitive(*ty),
            Self::Object { .. } => TypeName::Object,
        }
    }
}

/// The `required` or `optional` half of a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeContainer {
    pub required: bool,
    pub groups: Vec<FieldGroup>,
}

/// Parsed declarative input, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldConstraintCollection {
    pub containers: Vec<TypeContainer>,
}

impl FieldConstraintCollection {
    /// Parse a declarative description. Unknown type keys are rejected here.
    pub fn from_value(value: &Value, max_depth: usize) -> Result<Self> {
        let map = value
            .as_object()
            .ok_or_else(|| Error::malformed(&FieldPath::root(), "a schema should be an object"))?;
        let (collection, _) = Self::parse(map, &FieldPath::root(), false, max_depth)?;
        Ok(collection)
    }

    /// Parse a collection. Nested collections (`nested == true`) may also
    /// carry the array flag and pass-through options of the object field.
    fn parse(
        map: &Map<String, Value>,
        path: &FieldPath,
        nested: bool,
        max_depth: usize,
    ) -> Result<(Self, Vec<(String, Value)>)> {
        if path.depth() >= max_depth {
            return Err(Error::SchemaTooDeep { path: path.clone(), max_depth });
        }

        let mut containers = Vec::new();
        let mut field_options = Vec::new();
        for (key, value) in map {
            let required = match key.as_str() {
                REQUIRED_KEY => true,
                OPTIONAL_KEY => false,
                _ if nested => {
                    field_options.push((key.clone(), value.clone()));
                    continue;
                }
                other => {
                    return Err(Error::malformed(
                        path,
                        format!("expected \"{REQUIRED_KEY}\" or \"{OPTIONAL_KEY}\", found \"{other}\""),
                    ));
                }
            };
            let groups = value.as_object().ok_or_else(|| {
                Error::malformed(path, format!("\"{key}\" should map type names to fields"))
            })?;
            containers.push(TypeContainer { required, groups: parse_groups(groups, path, max_depth)? });
        }
        Ok((Self { containers }, field_options))
    }

    pub fn is_empty(&self) -> bool {
        self.containers.iter().all(|c| c.groups.is_empty())
    }
}

fn parse_groups(groups: &Map<String, Value>, path: &FieldPath, max_depth: usize) -> Result<Vec<FieldGroup>> {
    let mut out = Vec::new();
    for (type_key, fields) in groups {
        let type_name = type_key
            .parse::<TypeName>()
            .map_err(|_| Error::UnknownType { path: path.clone(), type_name: type_key.clone() })?;
        let fields = fields.as_object().ok_or_else(|| {
            Error::malformed(path, format!("\"{type_key}\" should map field names to options"))
        })?;

        let group = match type_name {
            TypeName::Primitive(ty) => {
                let mut declared = Vec::new();
                for (name, options) in fields {
                    let options = options.as_object().ok_or_else(|| {
                        Error::malformed(path, format!("options of field \"{name}\" should be an object"))
                    })?;
                    let (options, is_array) = FieldOptions::parse(Some(ty), options.iter(), name, path)?;
                    declared.push(DeclaredField { name: name.clone(), is_array, options });
                }
                FieldGroup::Primitive { ty, fields: declared }
            }
            TypeName::Object => {
                let mut declared = Vec::new();
                for (name, nested) in fields {
                    let nested = nested.as_object().ok_or_else(|| {
                        Error::malformed(path, format!("object field \"{name}\" should be a nested schema"))
                    })?;
                    let (collection, rest) =
                        FieldConstraintCollection::parse(nested, &path.child(name), true, max_depth)?;
                    let (options, is_array) =
                        FieldOptions::parse(None, rest.iter().map(|(k, v)| (k, v)), name, path)?;
                    declared.push(DeclaredObject { name: name.clone(), is_array, options, fields: collection });
                }
                FieldGroup::Object { fields: declared }
            }
        };
        out.push(group);
    }
    Ok(out)
}
