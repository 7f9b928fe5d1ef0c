//! Direct extraction and validation of data instances.
//!
//! [`extract`] keeps only declared fields and type-checks them.
//! [`extract_and_validate`] then walks the extracted object again, checking
//! enums and single-field rules in field order and, once each object level is
//! done, its cross-field rules in declaration order. The first failure wins.

use serde_json::{Map, Value};

use crate::config::Settings;
use crate::error::{FieldPath, Result};
use crate::schema::types::{ARRAY_KEY, NormalizedMap, PrimitiveType};
use crate::schema::visit::{Children, FieldContext, FieldValue, FieldVisitor, type_mismatch, visit};
use crate::validate::{CrossFieldValidator, check_enum, cross_field_validators, field_validators};

/// Decides whether a field is kept, given the value of its option.
type KeepFilter<'a> = (&'a str, &'a dyn Fn(&Value) -> bool);

struct Extractor<'a> {
    keep: Option<KeepFilter<'a>>,
}

impl Extractor<'_> {
    fn keeps(&self, field: &FieldContext<'_>) -> bool {
        match self.keep {
            Some((ARRAY_KEY, predicate)) => !field.constraint.is_array || predicate(&Value::Bool(true)),
            Some((key, predicate)) => field.constraint.options.get(key).is_none_or(|option| predicate(&option)),
            None => true,
        }
    }
}

impl FieldVisitor for Extractor<'_> {
    type Output = Map<String, Value>;
    type Type = PrimitiveType;

    fn map_type(&self, ty: PrimitiveType) -> Result<PrimitiveType> {
        Ok(ty)
    }

    fn on_primitive(
        &mut self,
        field: &FieldContext<'_>,
        out: &mut Map<String, Value>,
        ty: PrimitiveType,
        value: Option<FieldValue<'_>>,
    ) -> Result<()> {
        let Some(value) = value else { return Ok(()) };
        for item in value.iter() {
            if !ty.matches(item) {
                return Err(type_mismatch(field, item, ty.to_string()));
            }
        }
        if self.keeps(field) {
            out.insert(field.name.to_string(), value.to_value());
        }
        Ok(())
    }

    fn on_object(
        &mut self,
        field: &FieldContext<'_>,
        out: &mut Map<String, Value>,
        children: Children<Map<String, Value>>,
    ) -> Result<()> {
        if !self.keeps(field) {
            return Ok(());
        }
        let value = match children {
            Children::Single(child) => Value::Object(child),
            Children::Many(children) => Value::Array(children.into_iter().map(Value::Object).collect()),
        };
        out.insert(field.name.to_string(), value);
        Ok(())
    }
}

/// Second pass of [`extract_and_validate`]. Each level's output is the list of
/// cross-field checks declared at that level.
struct ConstraintChecker;

impl FieldVisitor for ConstraintChecker {
    type Output = Vec<CrossFieldValidator>;
    type Type = ();

    fn map_type(&self, _ty: PrimitiveType) -> Result<()> {
        Ok(())
    }

    fn on_primitive(
        &mut self,
        field: &FieldContext<'_>,
        out: &mut Vec<CrossFieldValidator>,
        _ty: (),
        value: Option<FieldValue<'_>>,
    ) -> Result<()> {
        let Some(value) = value else { return Ok(()) };
        let options = &field.constraint.options;
        let rules = field_validators(options);
        for item in value.iter() {
            if let Some(allowed) = &options.enum_values {
                check_enum(field.name, field.path, allowed, item)?;
            }
            for rule in &rules {
                rule.validate(field.name, field.path, item)?;
            }
        }
        out.extend(cross_field_validators(field.name, options));
        Ok(())
    }

    fn on_object(
        &mut self,
        _field: &FieldContext<'_>,
        _out: &mut Vec<CrossFieldValidator>,
        _children: Children<Vec<CrossFieldValidator>>,
    ) -> Result<()> {
        Ok(())
    }

    fn finish(
        &mut self,
        path: &FieldPath,
        out: &mut Vec<CrossFieldValidator>,
        instance: Option<&Map<String, Value>>,
    ) -> Result<()> {
        let Some(instance) = instance else { return Ok(()) };
        for validator in out.drain(..) {
            tracing::trace!(check = validator.name(), fields = ?validator.fields(), %path, "cross-field check");
            validator.validate(instance, path)?;
        }
        Ok(())
    }
}

/// Keep only the declared fields of `instance`, type-checked.
pub fn extract(instance: &Value, map: &NormalizedMap, settings: &Settings) -> Result<Value> {
    visit(map, &mut Extractor { keep: None }, Some(instance), settings.max_depth).map(Value::Object)
}

/// Like [`extract`], but a field whose options declare `key` is kept only when
/// `predicate` holds for that option's value. Fields without the option are kept.
/// The `array` flag counts as an option, present with value `true` on array fields.
pub fn extract_where(
    instance: &Value,
    map: &NormalizedMap,
    key: &str,
    predicate: &dyn Fn(&Value) -> bool,
    settings: &Settings,
) -> Result<Value> {
    let mut extractor = Extractor { keep: Some((key, predicate)) };
    visit(map, &mut extractor, Some(instance), settings.max_depth).map(Value::Object)
}

/// [`extract`], then check enums, single-field rules and cross-field rules.
pub fn extract_and_validate(instance: &Value, map: &NormalizedMap, settings: &Settings) -> Result<Value> {
    let extracted = extract(instance, map, settings)?;
    visit(map, &mut ConstraintChecker, Some(&extracted), settings.max_depth)?;
    Ok(extracted)
}
