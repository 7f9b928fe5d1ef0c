//! Validator factories: predicates paired with messages, bound to arguments
//! when a schema is built.

use std::fmt;

use serde_json::{Map, Value};

use super::predicates::{is_exact_length, is_greater_or_equal_to, is_max_length};
use crate::error::{Error, FieldPath, Result};
use crate::schema::types::{EXACT_LENGTH_KEY, FieldOptions, GREATER_OR_EQUAL_TO_KEY, MAX_LENGTH_KEY};

/// Single-field predicate: the value, then the arguments fixed at build time.
pub type FieldPredicate = fn(&Value, &[Value]) -> bool;

/// Cross-field predicate over the resolved values, primary field first.
pub type CrossFieldPredicate = fn(&[Option<&Value>]) -> bool;

/// A message and a single-field predicate, not yet bound to arguments.
#[derive(Clone, Copy)]
pub struct FieldValidatorFactory {
    message: &'static str,
    predicate: FieldPredicate,
}

impl FieldValidatorFactory {
    pub const fn new(message: &'static str, predicate: FieldPredicate) -> Self {
        Self { message, predicate }
    }

    pub fn message(&self) -> &'static str {
        self.message
    }

    pub fn bind(&self, args: Vec<Value>) -> FieldValidator {
        FieldValidator { message: self.message.to_string(), predicate: self.predicate, args }
    }
}

impl fmt::Debug for FieldValidatorFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldValidatorFactory").field("message", &self.message).finish_non_exhaustive()
    }
}

/// `{message, check(value)}` for one field.
#[derive(Clone)]
pub struct FieldValidator {
    message: String,
    predicate: FieldPredicate,
    args: Vec<Value>,
}

impl FieldValidator {
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub fn check(&self, value: &Value) -> bool {
        (self.predicate)(value, &self.args)
    }
}

impl fmt::Debug for FieldValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldValidator")
            .field("message", &self.message)
            .field("args", &self.args)
            .finish_non_exhaustive()
    }
}

/// What a cross-field check does when one of its fields has no value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndefinedPolicy {
    /// The check passes without running the predicate.
    Pass,
    /// The check fails without running the predicate.
    Fail,
    /// The predicate runs with the missing values as `None`.
    Propagate,
}

/// A cross-field predicate with its message and undefined-value policy.
#[derive(Clone, Copy)]
pub struct CrossFieldValidatorFactory {
    name: &'static str,
    message: &'static str,
    policy: UndefinedPolicy,
    predicate: CrossFieldPredicate,
}

impl CrossFieldValidatorFactory {
    pub const fn new(
        name: &'static str,
        message: &'static str,
        policy: UndefinedPolicy,
        predicate: CrossFieldPredicate,
    ) -> Self {
        Self { name, message, policy, predicate }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Bind to the fields to compare, primary field first.
    pub fn bind(&self, fields: Vec<String>) -> CrossFieldValidator {
        CrossFieldValidator {
            name: self.name,
            message: self.message.to_string(),
            policy: self.policy,
            predicate: self.predicate,
            fields,
        }
    }
}

impl fmt::Debug for CrossFieldValidatorFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrossFieldValidatorFactory")
            .field("name", &self.name)
            .field("message", &self.message)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

/// A cross-field check bound to field names, run against one object at a time.
#[derive(Clone)]
pub struct CrossFieldValidator {
    name: &'static str,
    message: String,
    policy: UndefinedPolicy,
    predicate: CrossFieldPredicate,
    fields: Vec<String>,
}

impl CrossFieldValidator {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Run the check against `instance`.
    ///
    /// Array-valued fields are zipped element by element, scalar fields are
    /// repeated for every element. Elements past the end of a shorter array
    /// count as missing. `null` counts as missing.
    pub fn check(&self, instance: &Map<String, Value>) -> bool {
        let resolved: Vec<Option<&Value>> =
            self.fields.iter().map(|name| instance.get(name).filter(|v| !v.is_null())).collect();

        let rows = resolved.iter().filter_map(|v| v.and_then(Value::as_array)).map(Vec::len).max();
        match rows {
            None => self.check_tuple(&resolved),
            Some(rows) => (0..rows).all(|i| {
                let tuple: Vec<Option<&Value>> = resolved
                    .iter()
                    .map(|v| match v {
                        Some(Value::Array(items)) => items.get(i),
                        other => *other,
                    })
                    .collect();
                self.check_tuple(&tuple)
            }),
        }
    }

    fn check_tuple(&self, values: &[Option<&Value>]) -> bool {
        if values.iter().any(Option::is_none) {
            match self.policy {
                UndefinedPolicy::Pass => return true,
                UndefinedPolicy::Fail => return false,
                UndefinedPolicy::Propagate => {}
            }
        }
        (self.predicate)(values)
    }

    /// [`check`](Self::check), as an error for the object at `path`.
    pub fn validate(&self, instance: &Map<String, Value>, path: &FieldPath) -> Result<()> {
        if self.check(instance) {
            return Ok(());
        }
        Err(Error::CrossFieldViolation {
            path: path.clone(),
            fields: self.fields.clone(),
            message: self.message.clone(),
        })
    }
}

impl fmt::Debug for CrossFieldValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrossFieldValidator")
            .field("name", &self.name)
            .field("message", &self.message)
            .field("policy", &self.policy)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

fn max_length(value: &Value, args: &[Value]) -> bool {
    match (value.as_str(), length_arg(args)) {
        (Some(s), Some(max)) => is_max_length(s, max),
        _ => false,
    }
}

fn exact_length(value: &Value, args: &[Value]) -> bool {
    match (value.as_str(), length_arg(args)) {
        (Some(s), Some(length)) => is_exact_length(s, length),
        _ => false,
    }
}

fn length_arg(args: &[Value]) -> Option<usize> {
    args.first().and_then(Value::as_u64).and_then(|n| usize::try_from(n).ok())
}

fn greater_or_equal(values: &[Option<&Value>]) -> bool {
    let numbers: Option<Vec<f64>> = values.iter().map(|v| v.and_then(Value::as_f64)).collect();
    numbers.is_some_and(|numbers| is_greater_or_equal_to(&numbers))
}

pub const MAX_LENGTH: FieldValidatorFactory =
    FieldValidatorFactory::new("This string field is too long", max_length);

pub const EXACT_LENGTH: FieldValidatorFactory =
    FieldValidatorFactory::new("This string field size does not match the required size", exact_length);

pub const GREATER_OR_EQUAL_TO: CrossFieldValidatorFactory = CrossFieldValidatorFactory::new(
    GREATER_OR_EQUAL_TO_KEY,
    "The fields need to be in descending order or equal",
    UndefinedPolicy::Fail,
    greater_or_equal,
);

/// A single-field validator together with the option it came from.
#[derive(Debug, Clone)]
pub struct BoundRule {
    /// Option key, e.g. `maxLength`.
    pub option: &'static str,
    /// Declared option value.
    pub limit: Value,
    pub validator: FieldValidator,
}

impl BoundRule {
    /// Check one value of `field` in the object at `path`.
    pub fn validate(&self, field: &str, path: &FieldPath, value: &Value) -> Result<()> {
        if self.validator.check(value) {
            return Ok(());
        }
        Err(Error::ConstraintViolation {
            field: field.to_string(),
            path: path.clone(),
            constraint: self.option.to_string(),
            limit: self.limit.to_string(),
            value: value.to_string(),
            message: self.validator.message().to_string(),
        })
    }
}

/// Single-field validators for the declared options.
pub fn field_validators(options: &FieldOptions) -> Vec<BoundRule> {
    let mut rules = Vec::new();
    for (option, limit, factory) in [
        (MAX_LENGTH_KEY, options.max_length, MAX_LENGTH),
        (EXACT_LENGTH_KEY, options.exact_length, EXACT_LENGTH),
    ] {
        if let Some(limit) = limit {
            let limit = Value::from(limit);
            rules.push(BoundRule { option, validator: factory.bind(vec![limit.clone()]), limit });
        }
    }
    rules
}

/// Cross-field validators declared on the field `name`.
pub fn cross_field_validators(name: &str, options: &FieldOptions) -> Vec<CrossFieldValidator> {
    let mut validators = Vec::new();
    if let Some(references) = &options.greater_or_equal_to {
        let fields = std::iter::once(name.to_string()).chain(references.iter().cloned()).collect();
        validators.push(GREATER_OR_EQUAL_TO.bind(fields));
    }
    validators
}

/// Enum membership check for one value of `field`.
pub fn check_enum(field: &str, path: &FieldPath, allowed: &[String], value: &Value) -> Result<()> {
    if value.as_str().is_some_and(|s| allowed.iter().any(|a| a == s)) {
        return Ok(());
    }
    Err(Error::EnumViolation {
        field: field.to_string(),
        path: path.clone(),
        value: value.to_string(),
        allowed: allowed.to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_field_validator_binds_arguments() {
        let validator = MAX_LENGTH.bind(vec![json!(2)]);
        assert_eq!(validator.message(), "This string field is too long");
        assert!(validator.check(&json!("ab")));
        assert!(!validator.check(&json!("abc")));
        assert!(!validator.check(&json!(12)));
    }

    #[test]
    fn test_field_validators_from_options() {
        let options = FieldOptions { max_length: Some(6), exact_length: Some(3), ..Default::default() };
        let rules = field_validators(&options);
        assert_eq!(rules.iter().map(|r| r.option).collect::<Vec<_>>(), vec!["maxLength", "exactLength"]);

        let err = rules[1].validate("code", &FieldPath::root(), &json!("abcd")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConstraintViolation);
        let message = err.to_string();
        assert!(message.contains("\"code\""));
        assert!(message.contains("abcd"));
        assert!(message.contains("does not match the required size"));
    }

    #[test]
    fn test_cross_field_scalars() {
        let validator = GREATER_OR_EQUAL_TO.bind(vec!["num".into(), "num2".into()]);
        assert!(validator.check(&object(json!({"num": 100, "num2": 10}))));
        assert!(!validator.check(&object(json!({"num": 3, "num2": 10}))));

        let err = validator.validate(&object(json!({"num": 3, "num2": 10})), &FieldPath::root()).unwrap_err();
        assert!(err.to_string().contains("Fields for validation: num,num2"));
    }

    #[test]
    fn test_cross_field_broadcasts_arrays() {
        let validator = GREATER_OR_EQUAL_TO.bind(vec!["highs".into(), "floor".into()]);
        assert!(validator.check(&object(json!({"highs": [5, 7, 9], "floor": 5}))));
        assert!(!validator.check(&object(json!({"highs": [5, 4], "floor": 5}))));
        assert!(validator.check(&object(json!({"highs": [], "floor": 5}))));

        let zipped = GREATER_OR_EQUAL_TO.bind(vec!["a".into(), "b".into()]);
        assert!(zipped.check(&object(json!({"a": [3, 4], "b": [1, 4]}))));
        assert!(!zipped.check(&object(json!({"a": [3, 4, 5], "b": [1, 4]}))));
    }

    #[test]
    fn test_undefined_policies() {
        fn always_true(_: &[Option<&Value>]) -> bool {
            true
        }
        let instance = object(json!({"a": 1}));
        let fields = vec!["a".to_string(), "missing".to_string()];
        for (policy, expected) in
            [(UndefinedPolicy::Pass, true), (UndefinedPolicy::Fail, false), (UndefinedPolicy::Propagate, true)]
        {
            let factory = CrossFieldValidatorFactory::new("test", "failed", policy, always_true);
            assert_eq!(factory.bind(fields.clone()).check(&instance), expected, "{policy:?}");
        }
    }

    #[test]
    fn test_check_enum() {
        let allowed = vec!["red".to_string(), "blue".to_string()];
        assert!(check_enum("color", &FieldPath::root(), &allowed, &json!("red")).is_ok());
        let err = check_enum("color", &FieldPath::root(), &allowed, &json!("green")).unwrap_err();
        assert!(err.to_string().contains("must have one of the following values: red, blue"));
    }
}
