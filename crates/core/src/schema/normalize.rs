//! Flattening of declarative collections into [`NormalizedMap`]s.

use std::borrow::Cow;

use serde_json::Value;

use super::collection::{FieldConstraintCollection, FieldGroup};
use super::types::{FieldConstraint, FieldKind, NormalizedMap};
use crate::config::{DuplicatePolicy, Settings};
use crate::error::{Error, FieldPath, Result};

/// Anything that can be normalized.
#[derive(Debug, Clone, Copy)]
pub enum SchemaSource<'a> {
    /// JSON, either a declarative collection or the JSON form of a normalized map.
    Value(&'a Value),
    /// An already-parsed declarative collection.
    Collection(&'a FieldConstraintCollection),
    /// An already-normalized map.
    Normalized(&'a NormalizedMap),
}

impl<'a> From<&'a Value> for SchemaSource<'a> {
    fn from(value: &'a Value) -> Self {
        Self::Value(value)
    }
}

impl<'a> From<&'a FieldConstraintCollection> for SchemaSource<'a> {
    fn from(collection: &'a FieldConstraintCollection) -> Self {
        Self::Collection(collection)
    }
}

impl<'a> From<&'a NormalizedMap> for SchemaSource<'a> {
    fn from(map: &'a NormalizedMap) -> Self {
        Self::Normalized(map)
    }
}

/// Flatten a collection: one entry per declared field, nested collections
/// flattened into the entry's type.
pub fn flatten(collection: &FieldConstraintCollection, settings: &Settings) -> Result<NormalizedMap> {
    let map = flatten_level(collection, &FieldPath::root(), settings)?;
    tracing::debug!(fields = map.len(), depth = map.depth(), "flattened schema");
    Ok(map)
}

fn flatten_level(
    collection: &FieldConstraintCollection,
    path: &FieldPath,
    settings: &Settings,
) -> Result<NormalizedMap> {
    if path.depth() >= settings.max_depth {
        return Err(Error::SchemaTooDeep { path: path.clone(), max_depth: settings.max_depth });
    }

    let mut out = NormalizedMap::new();
    for container in &collection.containers {
        for group in &container.groups {
            match group {
                FieldGroup::Primitive { ty, fields } => {
                    for field in fields {
                        let constraint = FieldConstraint {
                            kind: FieldKind::Primitive(*ty),
                            required: container.required,
                            is_array: field.is_array,
                            options: field.options.clone(),
                        };
                        add_field(&mut out, &field.name, constraint, path, settings)?;
                    }
                }
                FieldGroup::Object { fields } => {
                    for field in fields {
                        let nested = flatten_level(&field.fields, &path.child(&field.name), settings)?;
                        let constraint = FieldConstraint {
                            kind: FieldKind::Object(nested),
                            required: container.required,
                            is_array: field.is_array,
                            options: field.options.clone(),
                        };
                        add_field(&mut out, &field.name, constraint, path, settings)?;
                    }
                }
            }
        }
    }
    out.check_references(path)?;
    Ok(out)
}

fn add_field(
    out: &mut NormalizedMap,
    name: &str,
    constraint: FieldConstraint,
    path: &FieldPath,
    settings: &Settings,
) -> Result<()> {
    if let Some(existing) = out.get(name) {
        match settings.duplicate_fields {
            DuplicatePolicy::Reject => {
                return Err(Error::malformed(
                    path,
                    format!(
                        "field \"{name}\" is declared more than once (as {} {} and as {} {})",
                        requiredness(existing.required),
                        existing.type_label(),
                        requiredness(constraint.required),
                        constraint.type_label(),
                    ),
                ));
            }
            DuplicatePolicy::LastWins => {
                tracing::warn!("field \"{name}\" at {path} declared more than once, keeping the later declaration");
            }
        }
    }
    tracing::trace!(field = name, %path, "normalized field");
    out.insert(name, constraint);
    Ok(())
}

fn requiredness(required: bool) -> &'static str {
    if required { "required" } else { "optional" }
}

/// Normalize JSON that is either a declarative collection or an
/// already-normalized map. The two are told apart by probing whether every
/// top-level value carries a `type` key.
pub fn normalize_value(value: &Value, settings: &Settings) -> Result<NormalizedMap> {
    let map = value
        .as_object()
        .ok_or_else(|| Error::malformed(&FieldPath::root(), "a schema should be an object"))?;
    if NormalizedMap::is_normalized_form(map) {
        tracing::debug!(fields = map.len(), "schema is already normalized");
        return NormalizedMap::from_map(map, &FieldPath::root(), settings.max_depth);
    }
    let collection = FieldConstraintCollection::from_value(value, settings.max_depth)?;
    flatten(&collection, settings)
}

/// Normalize any [`SchemaSource`], borrowing when it is already normalized.
pub fn resolve<'a>(source: SchemaSource<'a>, settings: &Settings) -> Result<Cow<'a, NormalizedMap>> {
    match source {
        SchemaSource::Value(value) => normalize_value(value, settings).map(Cow::Owned),
        SchemaSource::Collection(collection) => flatten(collection, settings).map(Cow::Owned),
        SchemaSource::Normalized(map) => {
            if map.depth() > settings.max_depth {
                return Err(Error::SchemaTooDeep { path: FieldPath::root(), max_depth: settings.max_depth });
            }
            Ok(Cow::Borrowed(map))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::schema::types::PrimitiveType;
    use serde_json::json;

    fn normalize(value: Value) -> Result<NormalizedMap> {
        normalize_value(&value, &Settings::default())
    }

    #[test]
    fn test_creates_required_and_type_fields() {
        let out = normalize(json!({
            "required": {"string": {"str": {}}, "number": {"num": {}}, "date": {"dat": {}}},
            "optional": {"boolean": {"bool": {}, "true": {}, "false": {}}}
        }))
        .unwrap();

        assert_eq!(
            out.to_value(),
            json!({
                "str": {"type": "string", "required": true},
                "num": {"type": "number", "required": true},
                "dat": {"type": "date", "required": true},
                "bool": {"type": "boolean", "required": false},
                "true": {"type": "boolean", "required": false},
                "false": {"type": "boolean", "required": false}
            })
        );
    }

    #[test]
    fn test_nests_objects_under_type() {
        let out = normalize(json!({
            "required": {
                "string": {"str": {}},
                "object": {"obj": {"required": {
                    "object": {"nested": {"optional": {"string": {"nest": {}}}}},
                    "string": {"hello": {}}
                }}}
            }
        }))
        .unwrap();

        assert_eq!(
            out.to_value(),
            json!({
                "str": {"type": "string", "required": true},
                "obj": {
                    "type": {
                        "nested": {"type": {"nest": {"type": "string", "required": false}}, "required": true},
                        "hello": {"type": "string", "required": true}
                    },
                    "required": true
                }
            })
        );
    }

    #[test]
    fn test_preserves_additional_information() {
        let out = normalize(json!({
            "required": {
                "string": {"str": {"maxLength": 6, "default": "hello"}},
                "number": {"num": {"default": 3}}
            }
        }))
        .unwrap();

        let str_field = out.get("str").unwrap();
        assert_eq!(str_field.options.max_length, Some(6));
        assert_eq!(str_field.options.default, Some(json!("hello")));
        assert_eq!(out.get("num").unwrap().options.default, Some(json!(3)));
        assert_eq!(str_field.kind, FieldKind::Primitive(PrimitiveType::String));
    }

    #[test]
    fn test_duplicate_declarations() {
        let schema = json!({
            "required": {"string": {"name": {}}},
            "optional": {"string": {"name": {"maxLength": 3}}}
        });

        let err = normalize(schema.clone()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedSchema);
        assert!(err.to_string().contains("declared more than once"));

        let settings = Settings { duplicate_fields: DuplicatePolicy::LastWins, ..Settings::default() };
        let out = normalize_value(&schema, &settings).unwrap();
        let name = out.get("name").unwrap();
        assert!(!name.required);
        assert_eq!(name.options.max_length, Some(3));
    }

    #[test]
    fn test_undeclared_cross_field_reference() {
        let err = normalize(json!({"required": {"number": {"num": {"greaterOrEqualTo": "missing"}}}}))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedSchema);
        assert!(err.to_string().contains("undeclared field \"missing\""));
    }

    #[test]
    fn test_cross_field_reference_must_be_a_number() {
        for (ty, label) in [("string", "string"), ("boolean", "boolean"), ("date", "date")] {
            let err = normalize(json!({
                "required": {"number": {"num": {"greaterOrEqualTo": "other"}}, ty: {"other": {}}}
            }))
            .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::MalformedSchema);
            assert!(err.to_string().contains(&format!("refers to {label} field \"other\"")), "{err}");
        }

        let err = normalize(json!({
            "required": {"number": {"num": {"greaterOrEqualTo": "o"}}, "object": {"o": {"required": {"number": {"x": {}}}}}}
        }))
        .unwrap_err();
        assert!(err.to_string().contains("refers to object field \"o\""), "{err}");

        normalize(json!({"required": {"number": {"num": {"greaterOrEqualTo": "many"}, "many": {"array": true}}}})).unwrap();
    }

    #[test]
    fn test_normalized_input_is_recognized() {
        let once = normalize(json!({"required": {"string": {"a": {"enum": ["x", "y"]}}}})).unwrap();
        let twice = normalize(once.to_value()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_non_object_schema() {
        assert_eq!(normalize(json!("nope")).unwrap_err().kind(), ErrorKind::MalformedSchema);
    }

    #[test]
    fn test_resolve_borrows_normalized_maps() {
        let map = normalize(json!({"required": {"string": {"a": {}}}})).unwrap();
        let resolved = resolve(SchemaSource::from(&map), &Settings::default()).unwrap();
        assert!(matches!(resolved, Cow::Borrowed(_)));
    }
}
