//! Wire schemas in the JSON Type Definition layout.
//!
//! Required fields go under `properties`, optional ones under
//! `optionalProperties`. Nested objects become `{"ref": name}` entries pointing
//! into a root-level `definitions` table. Empty buckets and `null` leaves never
//! appear in the output.

use serde_json::{Map, Value};

use crate::config::Settings;
use crate::error::{Error, FieldPath, Result};
use crate::schema::types::{NormalizedMap, PrimitiveType};
use crate::schema::visit::{Children, FieldContext, FieldValue, FieldVisitor, visit};

const PROPERTIES: &str = "properties";
const OPTIONAL_PROPERTIES: &str = "optionalProperties";
const DEFINITIONS: &str = "definitions";
const ELEMENTS: &str = "elements";

/// Primitive type to wire type name.
const WIRE_TYPES: &[(PrimitiveType, &str)] = &[
    (PrimitiveType::String, "string"),
    (PrimitiveType::Number, "float64"),
    (PrimitiveType::Boolean, "boolean"),
    (PrimitiveType::Date, "timestamp"),
];

pub fn wire_type(ty: PrimitiveType) -> Option<&'static str> {
    WIRE_TYPES.iter().find(|(p, _)| *p == ty).map(|(_, name)| *name)
}

/// Fields of one object level, split by requiredness.
#[derive(Debug, Default)]
struct WireObject {
    properties: Map<String, Value>,
    optional_properties: Map<String, Value>,
}

impl WireObject {
    fn bucket(&mut self, required: bool) -> &mut Map<String, Value> {
        if required { &mut self.properties } else { &mut self.optional_properties }
    }

    fn into_map(self) -> Map<String, Value> {
        let mut out = Map::new();
        if !self.properties.is_empty() {
            out.insert(PROPERTIES.to_string(), Value::Object(self.properties));
        }
        if !self.optional_properties.is_empty() {
            out.insert(OPTIONAL_PROPERTIES.to_string(), Value::Object(self.optional_properties));
        }
        out
    }
}

/// Generation state for one call. The reference counter starts at zero on
/// every call.
struct WireBuilder<'s> {
    ref_prefix: &'s str,
    next_ref: usize,
    definitions: Map<String, Value>,
}

impl WireBuilder<'_> {
    fn allocate_ref(&mut self) -> String {
        let name = format!("{}{}", self.ref_prefix, self.next_ref);
        self.next_ref += 1;
        name
    }
}

fn wrap_elements(entry: Value, is_array: bool) -> Value {
    if is_array {
        let mut wrapper = Map::new();
        wrapper.insert(ELEMENTS.to_string(), entry);
        Value::Object(wrapper)
    } else {
        entry
    }
}

impl FieldVisitor for WireBuilder<'_> {
    type Output = WireObject;
    type Type = &'static str;

    fn map_type(&self, ty: PrimitiveType) -> Result<&'static str> {
        wire_type(ty).ok_or_else(|| Error::UnknownType { path: FieldPath::root(), type_name: ty.to_string() })
    }

    fn on_primitive(
        &mut self,
        field: &FieldContext<'_>,
        out: &mut WireObject,
        ty: &'static str,
        _value: Option<FieldValue<'_>>,
    ) -> Result<()> {
        let constraint = field.constraint;
        let mut entry = Map::new();
        match &constraint.options.enum_values {
            Some(values) => entry.insert("enum".to_string(), Value::from(values.clone())),
            None => entry.insert("type".to_string(), Value::from(ty)),
        };
        out.bucket(constraint.required)
            .insert(field.name.to_string(), wrap_elements(Value::Object(entry), constraint.is_array));
        Ok(())
    }

    fn on_object(
        &mut self,
        field: &FieldContext<'_>,
        out: &mut WireObject,
        children: Children<WireObject>,
    ) -> Result<()> {
        let child = match children {
            Children::Single(child) => child,
            Children::Many(_) => {
                return Err(Error::malformed(field.path, "wire schemas are built without a data instance"));
            }
        };
        let name = self.allocate_ref();
        tracing::debug!(reference = %name, field = field.name, path = %field.path, "allocated wire reference");
        self.definitions.insert(name.clone(), Value::Object(child.into_map()));

        let mut entry = Map::new();
        entry.insert("ref".to_string(), Value::String(name));
        out.bucket(field.constraint.required)
            .insert(field.name.to_string(), wrap_elements(Value::Object(entry), field.constraint.is_array));
        Ok(())
    }
}

/// Build the wire schema document for a normalized map.
pub fn build_wire_schema(map: &NormalizedMap, settings: &Settings) -> Result<Value> {
    let mut builder = WireBuilder { ref_prefix: &settings.ref_prefix, next_ref: 0, definitions: Map::new() };
    let root = visit(map, &mut builder, None, settings.max_depth)?;

    let mut document = root.into_map();
    if !builder.definitions.is_empty() {
        document.insert(DEFINITIONS.to_string(), Value::Object(builder.definitions));
    }
    tracing::debug!(references = builder.next_ref, "built wire schema");
    Ok(strip_empty(Value::Object(document)).unwrap_or_else(|| Value::Object(Map::new())))
}

/// Drop `null` values and empty buckets, recursively. `None` means "omit".
fn strip_empty(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::Object(map) => {
            let mut out = Map::new();
            for (key, value) in map {
                let Some(value) = strip_empty(value) else { continue };
                let empty_bucket = matches!(key.as_str(), PROPERTIES | OPTIONAL_PROPERTIES | DEFINITIONS)
                    && value.as_object().is_some_and(Map::is_empty);
                if !empty_bucket {
                    out.insert(key, value);
                }
            }
            Some(Value::Object(out))
        }
        Value::Array(items) => Some(Value::Array(items.into_iter().filter_map(strip_empty).collect())),
        other => Some(other),
    }
}
