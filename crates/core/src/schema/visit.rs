//! The traversal shared by every consumer of a [`NormalizedMap`].
//!
//! [`visit`] walks the map depth-first in declaration order, optionally in
//! lockstep with a data instance, and hands each field to a [`FieldVisitor`].
//! Nested objects are walked before their `on_object` call, so a visitor
//! always receives finished child accumulators.

use serde_json::{Map, Value};

use super::types::{FieldConstraint, FieldKind, NormalizedMap, PrimitiveType};
use crate::error::{Error, FieldPath, Result};

/// The field being visited.
#[derive(Debug, Clone, Copy)]
pub struct FieldContext<'a> {
    pub name: &'a str,
    /// Path of the enclosing object.
    pub path: &'a FieldPath,
    pub constraint: &'a FieldConstraint,
}

/// A field's value in the data instance.
#[derive(Debug, Clone, Copy)]
pub enum FieldValue<'a> {
    Scalar(&'a Value),
    /// The elements of an array field.
    Elements(&'a [Value]),
}

impl<'a> FieldValue<'a> {
    /// The scalar, or each element in turn.
    pub fn iter(&self) -> std::slice::Iter<'a, Value> {
        match *self {
            Self::Scalar(value) => std::slice::from_ref(value).iter(),
            Self::Elements(items) => items.iter(),
        }
    }

    /// The value as it appeared in the instance.
    pub fn to_value(&self) -> Value {
        match *self {
            Self::Scalar(value) => value.clone(),
            Self::Elements(items) => Value::Array(items.to_vec()),
        }
    }
}

/// Accumulators produced for a nested object field.
#[derive(Debug, Clone, PartialEq)]
pub enum Children<T> {
    /// A single object, or the schema of the element type when walking without data.
    Single(T),
    /// One accumulator per element of an array-of-objects value.
    Many(Vec<T>),
}

/// Callbacks driven by [`visit`].
pub trait FieldVisitor {
    /// Per-object accumulator.
    type Output: Default;
    /// What primitive types are mapped to before reaching `on_primitive`.
    type Type;

    fn map_type(&self, ty: PrimitiveType) -> Result<Self::Type>;

    fn on_primitive(
        &mut self,
        field: &FieldContext<'_>,
        out: &mut Self::Output,
        ty: Self::Type,
        value: Option<FieldValue<'_>>,
    ) -> Result<()>;

    fn on_object(
        &mut self,
        field: &FieldContext<'_>,
        out: &mut Self::Output,
        children: Children<Self::Output>,
    ) -> Result<()>;

    /// Called once per object after all its fields, with the instance at that level.
    fn finish(
        &mut self,
        _path: &FieldPath,
        _out: &mut Self::Output,
        _instance: Option<&Map<String, Value>>,
    ) -> Result<()> {
        Ok(())
    }
}

/// Walk `map` with `visitor`, against `instance` when one is given.
///
/// With an instance: a non-object instance is [`Error::InvalidInput`], an
/// absent required field is [`Error::MissingRequiredField`], absent optional
/// fields are skipped, and array fields must hold arrays.
pub fn visit<V: FieldVisitor>(
    map: &NormalizedMap,
    visitor: &mut V,
    instance: Option<&Value>,
    max_depth: usize,
) -> Result<V::Output> {
    let instance = match instance {
        None => None,
        Some(Value::Object(obj)) => Some(obj),
        Some(other) => return Err(Error::InvalidInput { found: json_kind(other).to_string() }),
    };
    walk(map, visitor, instance, &FieldPath::root(), max_depth)
}

fn walk<V: FieldVisitor>(
    map: &NormalizedMap,
    visitor: &mut V,
    instance: Option<&Map<String, Value>>,
    path: &FieldPath,
    max_depth: usize,
) -> Result<V::Output> {
    if path.depth() >= max_depth {
        return Err(Error::SchemaTooDeep { path: path.clone(), max_depth });
    }

    let mut out = V::Output::default();
    for (name, constraint) in map.iter() {
        let field = FieldContext { name, path, constraint };
        let value = match instance {
            None => None,
            Some(obj) => match obj.get(name) {
                Some(value) => Some(value),
                None if constraint.required => {
                    return Err(Error::MissingRequiredField { field: name.to_string(), path: path.clone() });
                }
                None => continue,
            },
        };
        tracing::trace!(field = name, %path, present = value.is_some(), "visiting field");

        match &constraint.kind {
            FieldKind::Primitive(ty) => {
                let mapped = visitor.map_type(*ty)?;
                let value = match value {
                    None => None,
                    Some(value) if constraint.is_array => Some(FieldValue::Elements(elements(&field, value)?)),
                    Some(value) => Some(FieldValue::Scalar(value)),
                };
                visitor.on_primitive(&field, &mut out, mapped, value)?;
            }
            FieldKind::Object(sub) => {
                let child_path = path.child(name);
                let children = match value {
                    None => Children::Single(walk(sub, visitor, None, &child_path, max_depth)?),
                    Some(value) if constraint.is_array => {
                        let mut many = Vec::new();
                        for (i, item) in elements(&field, value)?.iter().enumerate() {
                            let obj = as_object(&field, item)?;
                            many.push(walk(sub, visitor, Some(obj), &child_path.index(i), max_depth)?);
                        }
                        Children::Many(many)
                    }
                    Some(value) => {
                        let obj = as_object(&field, value)?;
                        Children::Single(walk(sub, visitor, Some(obj), &child_path, max_depth)?)
                    }
                };
                visitor.on_object(&field, &mut out, children)?;
            }
        }
    }
    visitor.finish(path, &mut out, instance)?;
    Ok(out)
}

fn elements<'v>(field: &FieldContext<'_>, value: &'v Value) -> Result<&'v [Value]> {
    value
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| type_mismatch(field, value, field.constraint.type_label()))
}

fn as_object<'v>(field: &FieldContext<'_>, value: &'v Value) -> Result<&'v Map<String, Value>> {
    value.as_object().ok_or_else(|| type_mismatch(field, value, "object".to_string()))
}

pub(crate) fn type_mismatch(field: &FieldContext<'_>, value: &Value, expected: String) -> Error {
    Error::TypeMismatch {
        field: field.name.to_string(),
        path: field.path.clone(),
        value: value.to_string(),
        expected,
    }
}

/// Name of a JSON value's kind, for error messages.
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::error::ErrorKind;
    use crate::schema::normalize::normalize_value;
    use serde_json::json;

    /// Records the order of callbacks as `kind:path.name`.
    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl FieldVisitor for Recorder {
        type Output = usize;
        type Type = &'static str;

        fn map_type(&self, ty: PrimitiveType) -> Result<Self::Type> {
            Ok(ty.as_str())
        }

        fn on_primitive(
            &mut self,
            field: &FieldContext<'_>,
            out: &mut usize,
            ty: &'static str,
            value: Option<FieldValue<'_>>,
        ) -> Result<()> {
            let count = value.map(|v| v.iter().count()).unwrap_or(0);
            self.events.push(format!("{ty}:{}.{} x{count}", field.path, field.name));
            *out += 1;
            Ok(())
        }

        fn on_object(&mut self, field: &FieldContext<'_>, out: &mut usize, children: Children<usize>) -> Result<()> {
            let label = match children {
                Children::Single(n) => format!("{n}"),
                Children::Many(ns) => format!("{ns:?}"),
            };
            self.events.push(format!("object:{}.{} {label}", field.path, field.name));
            *out += 1;
            Ok(())
        }

        fn finish(&mut self, path: &FieldPath, out: &mut usize, _: Option<&Map<String, Value>>) -> Result<()> {
            self.events.push(format!("finish:{path} {out}"));
            Ok(())
        }
    }

    fn schema() -> NormalizedMap {
        normalize_value(
            &json!({
                "required": {
                    "string": {"name": {}, "tags": {"array": true}},
                    "object": {"items": {"required": {"number": {"qty": {}}}, "array": true}}
                },
                "optional": {"boolean": {"flag": {}}}
            }),
            &Settings::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_visits_children_before_parent() {
        let mut recorder = Recorder::default();
        let total = visit(&schema(), &mut recorder, None, 32).unwrap();
        assert_eq!(total, 4);
        assert_eq!(
            recorder.events,
            vec![
                "string:$.name x0",
                "string:$.tags x0",
                "number:$.items.qty x0",
                "finish:$.items 1",
                "object:$.items 1",
                "boolean:$.flag x0",
                "finish:$ 4",
            ]
        );
    }

    #[test]
    fn test_walks_instance_element_wise() {
        let mut recorder = Recorder::default();
        let instance = json!({"name": "a", "tags": ["x", "y"], "items": [{"qty": 1}, {"qty": 2}]});
        let total = visit(&schema(), &mut recorder, Some(&instance), 32).unwrap();
        assert_eq!(total, 3);
        assert!(recorder.events.contains(&"string:$.tags x2".to_string()));
        assert!(recorder.events.contains(&"number:$.items[1].qty x1".to_string()));
        assert!(recorder.events.contains(&"object:$.items [1, 1]".to_string()));
    }

    #[test]
    fn test_missing_required_field() {
        let err = visit(&schema(), &mut Recorder::default(), Some(&json!({"name": "a"})), 32).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredField);
        assert!(err.to_string().contains("\"tags\""));
    }

    #[test]
    fn test_array_field_needs_array() {
        let instance = json!({"name": "a", "tags": "x", "items": []});
        let err = visit(&schema(), &mut Recorder::default(), Some(&instance), 32).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
        assert!(err.to_string().contains("should be a array of string"));
    }

    #[test]
    fn test_non_object_instance() {
        let err = visit(&schema(), &mut Recorder::default(), Some(&json!([1, 2])), 32).unwrap_err();
        assert_eq!(err, Error::InvalidInput { found: "array".into() });
    }
}
