//! Runtime object schemas: nested type/required/validate entries plus
//! pre-validation hooks, for persistence layers that validate whole documents.

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value, json};

use crate::config::Settings;
use crate::error::{Error, FieldPath, Result, ValidationReport};
use crate::schema::types::{NormalizedMap, PrimitiveType};
use crate::schema::visit::{Children, FieldContext, FieldValue, FieldVisitor, json_kind, visit};
use crate::validate::{BoundRule, CrossFieldValidator, check_enum, cross_field_validators, field_validators};

/// Type of a schema entry.
#[derive(Debug, Clone)]
pub enum SchemaType {
    Primitive(PrimitiveType),
    Object(Box<ObjectSchema>),
    Array(Box<SchemaType>),
}

impl SchemaType {
    /// Expected type as shown in errors, e.g. `array of number`.
    pub fn label(&self) -> String {
        match self {
            Self::Primitive(ty) => ty.to_string(),
            Self::Object(_) => "object".to_string(),
            Self::Array(inner) => format!("array of {}", inner.label()),
        }
    }

    fn describe(&self) -> Value {
        match self {
            Self::Primitive(ty) => Value::from(ty.as_str()),
            Self::Object(schema) => schema.describe(),
            Self::Array(inner) => Value::Array(vec![inner.describe()]),
        }
    }

    fn fill_defaults(&self, value: &Value) -> Value {
        match (self, value) {
            (Self::Object(schema), Value::Object(obj)) => Value::Object(schema.fill_defaults(obj)),
            (Self::Array(inner), Value::Array(items)) => {
                Value::Array(items.iter().map(|item| inner.fill_defaults(item)).collect())
            }
            _ => value.clone(),
        }
    }
}

/// One field of an [`ObjectSchema`].
#[derive(Debug, Clone)]
pub struct SchemaEntry {
    pub ty: SchemaType,
    pub required: bool,
    pub default: Option<Value>,
    pub enum_values: Option<Vec<String>>,
    pub unique: Option<bool>,
    /// Attached single-field validators, run on every value (every element for arrays).
    pub validate: Vec<BoundRule>,
}

impl SchemaEntry {
    fn check(&self, ty: &SchemaType, field: &str, path: &FieldPath, value: &Value, report: &mut ValidationReport) {
        let mismatch = || Error::TypeMismatch {
            field: field.to_string(),
            path: path.clone(),
            value: value.to_string(),
            expected: ty.label(),
        };
        match ty {
            SchemaType::Primitive(primitive) => {
                if !primitive.matches(value) {
                    report.add_error(mismatch());
                    return;
                }
                if let Some(allowed) = &self.enum_values
                    && let Err(e) = check_enum(field, path, allowed, value)
                {
                    report.add_error(e);
                }
                for rule in &self.validate {
                    if let Err(e) = rule.validate(field, path, value) {
                        report.add_error(e);
                    }
                }
            }
            SchemaType::Object(schema) => match value.as_object() {
                Some(obj) => report.merge(schema.validate_object(obj, &path.child(field))),
                None => report.add_error(mismatch()),
            },
            SchemaType::Array(inner) => match value.as_array() {
                Some(items) => {
                    for (i, item) in items.iter().enumerate() {
                        match inner.as_ref() {
                            SchemaType::Object(schema) => match item.as_object() {
                                Some(obj) => report.merge(schema.validate_object(obj, &path.child(field).index(i))),
                                None => report.add_error(Error::TypeMismatch {
                                    field: field.to_string(),
                                    path: path.clone(),
                                    value: item.to_string(),
                                    expected: inner.label(),
                                }),
                            },
                            other => self.check(other, field, path, item, report),
                        }
                    }
                }
                None => report.add_error(mismatch()),
            },
        }
    }

    fn describe(&self) -> Value {
        let mut out = Map::new();
        out.insert("type".to_string(), self.ty.describe());
        out.insert("required".to_string(), Value::Bool(self.required));
        if let Some(default) = &self.default {
            out.insert("default".to_string(), default.clone());
        }
        if let Some(allowed) = &self.enum_values {
            out.insert("enum".to_string(), Value::from(allowed.clone()));
        }
        if let Some(unique) = self.unique {
            out.insert("unique".to_string(), Value::Bool(unique));
        }
        if !self.validate.is_empty() {
            let rules = self
                .validate
                .iter()
                .map(|rule| json!({"option": rule.option, "limit": rule.limit, "message": rule.validator.message()}))
                .collect();
            out.insert("validate".to_string(), Value::Array(rules));
        }
        Value::Object(out)
    }
}

/// Signature of a custom pre-validation hook.
pub type HookFn = dyn Fn(&Map<String, Value>) -> Result<()> + Send + Sync;

/// Runs against the raw document before any field is checked.
#[derive(Clone)]
pub enum PreValidateHook {
    /// A declared cross-field constraint.
    CrossField(CrossFieldValidator),
    /// A hook registered by the caller.
    Custom { name: String, hook: Arc<HookFn> },
}

impl PreValidateHook {
    pub fn name(&self) -> &str {
        match self {
            Self::CrossField(validator) => validator.name(),
            Self::Custom { name, .. } => name,
        }
    }

    fn run(&self, instance: &Map<String, Value>, path: &FieldPath) -> Result<()> {
        match self {
            Self::CrossField(validator) => validator.validate(instance, path),
            Self::Custom { hook, .. } => (**hook)(instance),
        }
    }
}

impl fmt::Debug for PreValidateHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CrossField(validator) => f.debug_tuple("CrossField").field(validator).finish(),
            Self::Custom { name, .. } => f.debug_struct("Custom").field("name", name).finish_non_exhaustive(),
        }
    }
}

/// A built schema. Nested objects carry their own schema and hooks.
#[derive(Debug, Clone, Default)]
pub struct ObjectSchema {
    fields: Vec<(String, SchemaEntry)>,
    hooks: Vec<PreValidateHook>,
}

impl ObjectSchema {
    pub fn fields(&self) -> impl Iterator<Item = (&str, &SchemaEntry)> {
        self.fields.iter().map(|(n, e)| (n.as_str(), e))
    }

    pub fn field(&self, name: &str) -> Option<&SchemaEntry> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, e)| e)
    }

    pub fn hooks(&self) -> &[PreValidateHook] {
        &self.hooks
    }

    /// Register a hook to run, after the ones already registered, on every
    /// validation of this schema.
    pub fn pre_validate<F>(&mut self, name: impl Into<String>, hook: F) -> &mut Self
    where
        F: Fn(&Map<String, Value>) -> Result<()> + Send + Sync + 'static,
    {
        self.hooks.push(PreValidateHook::Custom { name: name.into(), hook: Arc::new(hook) });
        self
    }

    /// Validate a document.
    ///
    /// Hooks run first, in registration order, and the first failing hook is
    /// the only error reported. Otherwise every field-level error is collected.
    pub fn validate(&self, document: &Value) -> ValidationReport {
        match document.as_object() {
            Some(obj) => self.validate_object(obj, &FieldPath::root()),
            None => ValidationReport::single_error(Error::InvalidInput { found: json_kind(document).to_string() }),
        }
    }

    fn validate_object(&self, obj: &Map<String, Value>, path: &FieldPath) -> ValidationReport {
        for hook in &self.hooks {
            if let Err(e) = hook.run(obj, path) {
                return ValidationReport::single_error(e);
            }
        }

        let mut report = ValidationReport::success();
        for (name, entry) in &self.fields {
            match obj.get(name) {
                Some(value) => entry.check(&entry.ty, name, path, value, &mut report),
                None if entry.required => report.add_error(Error::MissingRequiredField {
                    field: name.clone(),
                    path: path.clone(),
                }),
                None => {}
            }
        }
        report
    }

    /// Build a document: fill declared defaults for absent fields, drop
    /// undeclared keys, then validate.
    pub fn construct(&self, document: &Value) -> Result<Value, ValidationReport> {
        let obj = document.as_object().ok_or_else(|| {
            ValidationReport::single_error(Error::InvalidInput { found: json_kind(document).to_string() })
        })?;
        let built = Value::Object(self.fill_defaults(obj));
        let report = self.validate(&built);
        if report.valid { Ok(built) } else { Err(report) }
    }

    fn fill_defaults(&self, obj: &Map<String, Value>) -> Map<String, Value> {
        let mut out = Map::new();
        for (name, entry) in &self.fields {
            match obj.get(name) {
                Some(value) => {
                    out.insert(name.clone(), entry.ty.fill_defaults(value));
                }
                None => {
                    if let Some(default) = &entry.default {
                        out.insert(name.clone(), default.clone());
                    }
                }
            }
        }
        out
    }

    /// JSON rendering: `{"fields": {...}, "hooks": [...]}`, hooks omitted when none.
    pub fn describe(&self) -> Value {
        let fields: Map<String, Value> = self.fields.iter().map(|(n, e)| (n.clone(), e.describe())).collect();
        let mut out = Map::new();
        out.insert("fields".to_string(), Value::Object(fields));
        if !self.hooks.is_empty() {
            let hooks = self
                .hooks
                .iter()
                .map(|hook| match hook {
                    PreValidateHook::CrossField(v) => {
                        json!({"name": v.name(), "fields": v.fields(), "message": v.message()})
                    }
                    PreValidateHook::Custom { name, .. } => json!({"name": name}),
                })
                .collect();
            out.insert("hooks".to_string(), Value::Array(hooks));
        }
        Value::Object(out)
    }
}

struct ObjectSchemaBuilder;

impl FieldVisitor for ObjectSchemaBuilder {
    type Output = ObjectSchema;
    type Type = PrimitiveType;

    fn map_type(&self, ty: PrimitiveType) -> Result<PrimitiveType> {
        Ok(ty)
    }

    fn on_primitive(
        &mut self,
        field: &FieldContext<'_>,
        out: &mut ObjectSchema,
        ty: PrimitiveType,
        _value: Option<FieldValue<'_>>,
    ) -> Result<()> {
        let constraint = field.constraint;
        let options = &constraint.options;
        let ty = if constraint.is_array {
            SchemaType::Array(Box::new(SchemaType::Primitive(ty)))
        } else {
            SchemaType::Primitive(ty)
        };
        out.fields.push((
            field.name.to_string(),
            SchemaEntry {
                ty,
                required: constraint.required,
                default: options.default.clone(),
                enum_values: options.enum_values.clone(),
                unique: options.unique,
                validate: field_validators(options),
            },
        ));

        for validator in cross_field_validators(field.name, options) {
            tracing::debug!(
                hook = validator.name(),
                fields = ?validator.fields(),
                path = %field.path,
                "registering pre-validation hook"
            );
            out.hooks.push(PreValidateHook::CrossField(validator));
        }
        Ok(())
    }

    fn on_object(
        &mut self,
        field: &FieldContext<'_>,
        out: &mut ObjectSchema,
        children: Children<ObjectSchema>,
    ) -> Result<()> {
        let child = match children {
            Children::Single(child) => child,
            Children::Many(_) => {
                return Err(Error::malformed(field.path, "object schemas are built without a data instance"));
            }
        };
        let ty = SchemaType::Object(Box::new(child));
        let ty = if field.constraint.is_array { SchemaType::Array(Box::new(ty)) } else { ty };
        out.fields.push((
            field.name.to_string(),
            SchemaEntry {
                ty,
                required: field.constraint.required,
                default: None,
                enum_values: None,
                unique: field.constraint.options.unique,
                validate: Vec::new(),
            },
        ));
        Ok(())
    }
}

/// Build an [`ObjectSchema`] from a normalized map.
pub fn build_object_schema(map: &NormalizedMap, settings: &Settings) -> Result<ObjectSchema> {
    visit(map, &mut ObjectSchemaBuilder, None, settings.max_depth)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::schema::normalize::normalize_value;

    fn build(schema: Value) -> ObjectSchema {
        let map = normalize_value(&schema, &Settings::default()).unwrap();
        build_object_schema(&map, &Settings::default()).unwrap()
    }

    fn kinds(report: &ValidationReport) -> Vec<ErrorKind> {
        report.errors.iter().map(Error::kind).collect()
    }

    #[test]
    fn test_entries_carry_options_and_validators() {
        let schema = build(json!({
            "required": {"string": {"code": {"maxLength": 4, "enum": ["ab", "abcd"]}}},
            "optional": {"number": {"scores": {"array": true, "default": [1, 2]}}}
        }));

        let code = schema.field("code").unwrap();
        assert!(code.required);
        assert_eq!(code.validate.len(), 1);
        assert_eq!(code.enum_values.as_deref(), Some(&["ab".to_string(), "abcd".to_string()][..]));

        let scores = schema.field("scores").unwrap();
        assert_eq!(scores.ty.label(), "array of number");
        assert_eq!(scores.default, Some(json!([1, 2])));
    }

    #[test]
    fn test_validate_accumulates_field_errors() {
        let schema = build(json!({
            "required": {"string": {"name": {"maxLength": 3}}, "number": {"age": {}}},
            "optional": {"boolean": {"flag": {}}}
        }));

        let report = schema.validate(&json!({"name": "toolong", "flag": "yes"}));
        assert!(!report.valid);
        assert_eq!(
            kinds(&report),
            vec![ErrorKind::ConstraintViolation, ErrorKind::MissingRequiredField, ErrorKind::TypeMismatch]
        );
        assert!(schema.validate(&json!({"name": "abc", "age": 3})).valid);
    }

    #[test]
    fn test_cross_field_hooks_run_first_and_alone() {
        let schema = build(json!({
            "required": {"number": {"num": {"greaterOrEqualTo": "num2"}, "num2": {}}, "string": {"s": {}}}
        }));
        assert_eq!(schema.hooks().len(), 1);

        let report = schema.validate(&json!({"num": 3, "num2": 10}));
        assert_eq!(kinds(&report), vec![ErrorKind::ConstraintViolation]);
        assert!(report.errors[0].to_string().contains("Fields for validation: num,num2"));

        assert!(schema.validate(&json!({"num": 100, "num2": 10, "s": "x"})).valid);
    }

    #[test]
    fn test_nested_schemas_validate_with_paths() {
        let schema = build(json!({
            "required": {"object": {"lines": {"required": {"number": {"qty": {}}}, "array": true}}}
        }));

        let report = schema.validate(&json!({"lines": [{"qty": 1}, {"qty": "two"}]}));
        assert_eq!(kinds(&report), vec![ErrorKind::TypeMismatch]);
        assert!(report.errors[0].to_string().contains("$.lines[1]"));
    }

    #[test]
    fn test_custom_hooks() {
        let mut schema = build(json!({"required": {"string": {"name": {}}}}));
        schema.pre_validate("no-admin", |doc| match doc.get("name").and_then(Value::as_str) {
            Some("admin") => Err(Error::malformed(&FieldPath::root(), "reserved name")),
            _ => Ok(()),
        });

        assert!(schema.validate(&json!({"name": "bob"})).valid);
        assert!(!schema.validate(&json!({"name": "admin"})).valid);
        assert_eq!(schema.hooks()[0].name(), "no-admin");
    }

    #[test]
    fn test_construct_fills_defaults_and_drops_junk() {
        let schema = build(json!({
            "required": {"string": {"name": {}}},
            "optional": {"string": {"role": {"default": "member"}}}
        }));

        let built = schema.construct(&json!({"name": "bob", "junk": 1})).unwrap();
        assert_eq!(built, json!({"name": "bob", "role": "member"}));

        let report = schema.construct(&json!({"role": "x"})).unwrap_err();
        assert_eq!(kinds(&report), vec![ErrorKind::MissingRequiredField]);
    }

    #[test]
    fn test_describe() {
        let schema = build(json!({
            "required": {"number": {"hi": {"greaterOrEqualTo": ["lo"]}, "lo": {}}},
            "optional": {"string": {"tags": {"array": true, "maxLength": 5}}}
        }));

        assert_eq!(
            schema.describe(),
            json!({
                "fields": {
                    "hi": {"type": "number", "required": true},
                    "lo": {"type": "number", "required": true},
                    "tags": {
                        "type": ["string"],
                        "required": false,
                        "validate": [{"option": "maxLength", "limit": 5, "message": "This string field is too long"}]
                    }
                },
                "hooks": [{
                    "name": "greaterOrEqualTo",
                    "fields": ["hi", "lo"],
                    "message": "The fields need to be in descending order or equal"
                }]
            })
        );
    }

    #[test]
    fn test_non_object_document() {
        let schema = build(json!({"required": {"string": {"name": {}}}}));
        assert_eq!(kinds(&schema.validate(&json!(42))), vec![ErrorKind::InvalidInput]);
    }
}
