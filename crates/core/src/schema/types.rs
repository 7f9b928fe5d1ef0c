//! Field types and the normalized per-field representation.

use serde_json::{Map, Value};

use crate::error::{Error, FieldPath, Result};

pub(crate) const ARRAY_KEY: &str = "array";
pub(crate) const TYPE_KEY: &str = "type";
pub(crate) const REQUIRED_KEY: &str = "required";
pub(crate) const OPTIONAL_KEY: &str = "optional";
pub(crate) const ENUM_KEY: &str = "enum";
pub(crate) const MAX_LENGTH_KEY: &str = "maxLength";
pub(crate) const EXACT_LENGTH_KEY: &str = "exactLength";
pub(crate) const GREATER_OR_EQUAL_TO_KEY: &str = "greaterOrEqualTo";
pub(crate) const DEFAULT_KEY: &str = "default";
pub(crate) const UNIQUE_KEY: &str = "unique";

/// Primitive type of a field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    /// String value.
    String,
    /// Numeric value (integer or float).
    Number,
    /// Boolean value.
    Boolean,
    /// RFC 3339 date-time or `YYYY-MM-DD` date string.
    Date,
}

impl PrimitiveType {
    pub const ALL: [PrimitiveType; 4] = [Self::String, Self::Number, Self::Boolean, Self::Date];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Date => "date",
        }
    }

    /// Whether `value` is a value of this type.
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::String, Value::String(_)) => true,
            (Self::Number, Value::Number(_)) => true,
            (Self::Boolean, Value::Bool(_)) => true,
            (Self::Date, Value::String(s)) => is_valid_date(s),
            _ => false,
        }
    }
}

impl std::fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Type tag of a declaration group: one of the primitives or `object`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeName {
    Primitive(PrimitiveType),
    Object,
}

impl TypeName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Primitive(p) => p.as_str(),
            Self::Object => "object",
        }
    }
}

impl std::fmt::Display for TypeName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TypeName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(Self::Primitive(PrimitiveType::String)),
            "number" => Ok(Self::Primitive(PrimitiveType::Number)),
            "boolean" => Ok(Self::Primitive(PrimitiveType::Boolean)),
            "date" => Ok(Self::Primitive(PrimitiveType::Date)),
            "object" => Ok(Self::Object),
            _ => Err(format!("unknown type: {s}")),
        }
    }
}

/// Declared options of one field, besides its type, requiredness and array flag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldOptions {
    // String constraints
    /// Allowed values.
    pub enum_values: Option<Vec<String>>,
    /// Maximum string length, in characters.
    pub max_length: Option<usize>,
    /// Exact string length, in characters.
    pub exact_length: Option<usize>,

    // Number constraints
    /// Sibling fields this field must be greater than or equal to.
    pub greater_or_equal_to: Option<Vec<String>>,

    /// Default value, type-matched to the field.
    pub default: Option<Value>,
    /// Uniqueness hint for persistence layers.
    pub unique: Option<bool>,
    /// Any other key, kept verbatim.
    pub extra: Map<String, Value>,
}

impl FieldOptions {
    /// Parse the options of a field of type `ty` (`None` for object fields).
    ///
    /// Returns the options and the array flag.
    pub(crate) fn parse<'a>(
        ty: Option<PrimitiveType>,
        entries: impl Iterator<Item = (&'a String, &'a Value)>,
        field: &str,
        path: &FieldPath,
    ) -> Result<(Self, bool)> {
        let mut options = Self::default();
        let mut is_array = false;
        let bad = |message: String| Error::malformed(path, format!("field \"{field}\": {message}"));
        let string_only = |key: &str| -> Result<()> {
            if ty == Some(PrimitiveType::String) {
                Ok(())
            } else {
                Err(bad(format!("\"{key}\" only applies to string fields")))
            }
        };

        for (key, value) in entries {
            match key.as_str() {
                ARRAY_KEY => {
                    is_array = value
                        .as_bool()
                        .ok_or_else(|| bad(format!("\"{ARRAY_KEY}\" must be a boolean")))?;
                }
                ENUM_KEY => {
                    string_only(ENUM_KEY)?;
                    let values = value
                        .as_array()
                        .and_then(|items| {
                            items.iter().map(|v| v.as_str().map(str::to_string)).collect()
                        })
                        .ok_or_else(|| bad(format!("\"{ENUM_KEY}\" must be a list of strings")))?;
                    options.enum_values = Some(values);
                }
                MAX_LENGTH_KEY => {
                    string_only(MAX_LENGTH_KEY)?;
                    options.max_length = Some(parse_length(value).ok_or_else(|| {
                        bad(format!("\"{MAX_LENGTH_KEY}\" must be a non-negative integer"))
                    })?);
                }
                EXACT_LENGTH_KEY => {
                    string_only(EXACT_LENGTH_KEY)?;
                    options.exact_length = Some(parse_length(value).ok_or_else(|| {
                        bad(format!("\"{EXACT_LENGTH_KEY}\" must be a non-negative integer"))
                    })?);
                }
                GREATER_OR_EQUAL_TO_KEY => {
                    if ty != Some(PrimitiveType::Number) {
                        return Err(bad(format!(
                            "\"{GREATER_OR_EQUAL_TO_KEY}\" only applies to number fields"
                        )));
                    }
                    let names = match value {
                        Value::String(name) => Some(vec![name.clone()]),
                        Value::Array(items) => {
                            items.iter().map(|v| v.as_str().map(str::to_string)).collect()
                        }
                        _ => None,
                    }
                    .filter(|names: &Vec<String>| !names.is_empty())
                    .ok_or_else(|| {
                        bad(format!(
                            "\"{GREATER_OR_EQUAL_TO_KEY}\" must name a field or a non-empty list of fields"
                        ))
                    })?;
                    options.greater_or_equal_to = Some(names);
                }
                DEFAULT_KEY => options.default = Some(value.clone()),
                UNIQUE_KEY => {
                    options.unique = Some(
                        value
                            .as_bool()
                            .ok_or_else(|| bad(format!("\"{UNIQUE_KEY}\" must be a boolean")))?,
                    );
                }
                TYPE_KEY | REQUIRED_KEY => {
                    return Err(bad(format!(
                        "\"{key}\" is implied by the declaration group and cannot be set as an option"
                    )));
                }
                _ => {
                    options.extra.insert(key.clone(), value.clone());
                }
            }
        }

        if let Some(default) = &options.default {
            let ok = match ty {
                None => false,
                Some(ty) if is_array => default
                    .as_array()
                    .is_some_and(|items| items.iter().all(|item| ty.matches(item))),
                Some(ty) => ty.matches(default),
            };
            if !ok {
                let expected = match ty {
                    Some(ty) if is_array => format!("array of {ty}"),
                    Some(ty) => ty.to_string(),
                    None => "nothing (object fields take no default)".to_string(),
                };
                return Err(bad(format!("default value {default} should be a {expected}")));
            }
        }

        Ok((options, is_array))
    }

    /// The JSON form of the option stored under `key`, if declared.
    pub fn get(&self, key: &str) -> Option<Value> {
        match key {
            ENUM_KEY => self.enum_values.as_ref().map(|v| Value::from(v.clone())),
            MAX_LENGTH_KEY => self.max_length.map(Value::from),
            EXACT_LENGTH_KEY => self.exact_length.map(Value::from),
            GREATER_OR_EQUAL_TO_KEY => self.greater_or_equal_to.as_ref().map(|names| match names
                .as_slice()
            {
                [single] => Value::from(single.clone()),
                _ => Value::from(names.clone()),
            }),
            DEFAULT_KEY => self.default.clone(),
            UNIQUE_KEY => self.unique.map(Value::from),
            _ => self.extra.get(key).cloned(),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Write every declared option into `out`, known options first.
    pub(crate) fn write_to(&self, out: &mut Map<String, Value>) {
        for key in [
            ENUM_KEY,
            MAX_LENGTH_KEY,
            EXACT_LENGTH_KEY,
            GREATER_OR_EQUAL_TO_KEY,
            DEFAULT_KEY,
            UNIQUE_KEY,
        ] {
            if let Some(value) = self.get(key) {
                out.insert(key.to_string(), value);
            }
        }
        for (key, value) in &self.extra {
            out.insert(key.clone(), value.clone());
        }
    }
}

fn parse_length(value: &Value) -> Option<usize> {
    value.as_u64().and_then(|n| usize::try_from(n).ok())
}

/// What a normalized field holds: a primitive or a nested normalized map.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Primitive(PrimitiveType),
    Object(NormalizedMap),
}

/// One declared field's rule set, after normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldConstraint {
    pub kind: FieldKind,
    pub required: bool,
    pub is_array: bool,
    pub options: FieldOptions,
}

impl FieldConstraint {
    pub fn primitive(ty: PrimitiveType, required: bool) -> Self {
        Self { kind: FieldKind::Primitive(ty), required, is_array: false, options: FieldOptions::default() }
    }

    pub fn object(fields: NormalizedMap, required: bool) -> Self {
        Self { kind: FieldKind::Object(fields), required, is_array: false, options: FieldOptions::default() }
    }

    /// Human-readable expected type, e.g. `string` or `array of object`.
    pub fn type_label(&self) -> String {
        let base = match &self.kind {
            FieldKind::Primitive(ty) => ty.as_str(),
            FieldKind::Object(_) => "object",
        };
        if self.is_array { format!("array of {base}") } else { base.to_string() }
    }

    pub fn to_value(&self) -> Value {
        let mut out = Map::new();
        let ty = match &self.kind {
            FieldKind::Primitive(ty) => Value::from(ty.as_str()),
            FieldKind::Object(fields) => fields.to_value(),
        };
        out.insert(TYPE_KEY.to_string(), ty);
        out.insert(REQUIRED_KEY.to_string(), Value::Bool(self.required));
        if self.is_array {
            out.insert(ARRAY_KEY.to_string(), Value::Bool(true));
        }
        self.options.write_to(&mut out);
        Value::Object(out)
    }
}

/// Field name to [`FieldConstraint`], in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedMap {
    fields: Vec<(String, FieldConstraint)>,
}

impl NormalizedMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&FieldConstraint> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, c)| c)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldConstraint)> {
        self.fields.iter().map(|(n, c)| (n.as_str(), c))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    /// Insert a field at the end, replacing any earlier field of the same name.
    ///
    /// Returns the replaced constraint.
    pub fn insert(&mut self, name: impl Into<String>, constraint: FieldConstraint) -> Option<FieldConstraint> {
        let name = name.into();
        let previous = self
            .fields
            .iter()
            .position(|(n, _)| *n == name)
            .map(|i| self.fields.remove(i).1);
        self.fields.push((name, constraint));
        previous
    }

    /// Number of object levels, counting this one.
    pub fn depth(&self) -> usize {
        1 + self
            .fields
            .iter()
            .filter_map(|(_, c)| match &c.kind {
                FieldKind::Object(sub) => Some(sub.depth()),
                FieldKind::Primitive(_) => None,
            })
            .max()
            .unwrap_or(0)
    }

    /// JSON form: `{name: {type, required, array?, ...options}}`.
    pub fn to_value(&self) -> Value {
        Value::Object(self.fields.iter().map(|(n, c)| (n.clone(), c.to_value())).collect())
    }

    /// Whether `map` looks like the JSON form of a normalized map: every value
    /// is an object carrying a `type` key.
    pub fn is_normalized_form(map: &Map<String, Value>) -> bool {
        map.values().all(|v| v.as_object().is_some_and(|o| o.contains_key(TYPE_KEY)))
    }

    /// Parse the JSON form produced by [`NormalizedMap::to_value`].
    pub(crate) fn from_map(map: &Map<String, Value>, path: &FieldPath, max_depth: usize) -> Result<Self> {
        if path.depth() >= max_depth {
            return Err(Error::SchemaTooDeep { path: path.clone(), max_depth });
        }
        let mut out = Self::new();
        for (name, entry) in map {
            let entry = entry.as_object().ok_or_else(|| {
                Error::malformed(path, format!("field \"{name}\" should be an object"))
            })?;
            let required = match entry.get(REQUIRED_KEY) {
                None => false,
                Some(Value::Bool(b)) => *b,
                Some(_) => {
                    return Err(Error::malformed(
                        path,
                        format!("field \"{name}\": \"{REQUIRED_KEY}\" must be a boolean"),
                    ));
                }
            };
            let rest = entry.iter().filter(|(k, _)| !matches!(k.as_str(), TYPE_KEY | REQUIRED_KEY));
            let constraint = match entry.get(TYPE_KEY) {
                Some(Value::String(tag)) => {
                    let ty = match tag.parse::<TypeName>() {
                        Ok(TypeName::Primitive(ty)) => ty,
                        Ok(TypeName::Object) => {
                            return Err(Error::malformed(
                                path,
                                format!("field \"{name}\": object fields carry their nested fields as the type"),
                            ));
                        }
                        Err(_) => {
                            return Err(Error::UnknownType { path: path.clone(), type_name: tag.clone() });
                        }
                    };
                    let (options, is_array) = FieldOptions::parse(Some(ty), rest, name, path)?;
                    FieldConstraint { kind: FieldKind::Primitive(ty), required, is_array, options }
                }
                Some(Value::Object(sub)) => {
                    let nested = Self::from_map(sub, &path.child(name), max_depth)?;
                    let (options, is_array) = FieldOptions::parse(None, rest, name, path)?;
                    FieldConstraint { kind: FieldKind::Object(nested), required, is_array, options }
                }
                _ => {
                    return Err(Error::malformed(
                        path,
                        format!("field \"{name}\": \"{TYPE_KEY}\" must be a type name or an object"),
                    ));
                }
            };
            out.insert(name.clone(), constraint);
        }
        out.check_references(path)?;
        Ok(out)
    }

    /// Every cross-field reference must name a sibling number field.
    pub(crate) fn check_references(&self, path: &FieldPath) -> Result<()> {
        for (name, constraint) in self.iter() {
            for reference in constraint.options.greater_or_equal_to.iter().flatten() {
                let problem = match self.get(reference) {
                    None => "undeclared".to_string(),
                    Some(target) if !matches!(target.kind, FieldKind::Primitive(PrimitiveType::Number)) => {
                        target.type_label()
                    }
                    Some(_) => continue,
                };
                return Err(Error::malformed(
                    path,
                    format!("field \"{name}\": \"{GREATER_OR_EQUAL_TO_KEY}\" refers to {problem} field \"{reference}\""),
                ));
            }
        }
        Ok(())
    }
}

/// Check if a string is a date (`YYYY-MM-DD`) or an RFC 3339 date-time.
fn is_valid_date(s: &str) -> bool {
    chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
        || chrono::DateTime::parse_from_rfc3339(s).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_type_name_from_str() {
        assert_eq!("string".parse::<TypeName>().unwrap(), TypeName::Primitive(PrimitiveType::String));
        assert_eq!("number".parse::<TypeName>().unwrap(), TypeName::Primitive(PrimitiveType::Number));
        assert_eq!("boolean".parse::<TypeName>().unwrap(), TypeName::Primitive(PrimitiveType::Boolean));
        assert_eq!("date".parse::<TypeName>().unwrap(), TypeName::Primitive(PrimitiveType::Date));
        assert_eq!("object".parse::<TypeName>().unwrap(), TypeName::Object);
        assert!("notExist".parse::<TypeName>().unwrap_err().contains("unknown type"));
    }

    #[test]
    fn test_primitive_matches() {
        assert!(PrimitiveType::String.matches(&json!("hi")));
        assert!(!PrimitiveType::String.matches(&json!(3)));
        assert!(PrimitiveType::Number.matches(&json!(3.14)));
        assert!(PrimitiveType::Boolean.matches(&json!(false)));
        assert!(PrimitiveType::Date.matches(&json!("2025-12-29")));
        assert!(PrimitiveType::Date.matches(&json!("2025-12-29T14:30:00Z")));
        assert!(!PrimitiveType::Date.matches(&json!("29-12-2025")));
        assert!(!PrimitiveType::Date.matches(&json!(1700000000)));
    }

    #[test]
    fn test_options_round_trip_through_get() {
        let raw = json!({"maxLength": 6, "default": "hello", "lazyFill": true});
        let map = raw.as_object().unwrap();
        let (options, is_array) =
            FieldOptions::parse(Some(PrimitiveType::String), map.iter(), "str", &FieldPath::root()).unwrap();
        assert!(!is_array);
        assert_eq!(options.max_length, Some(6));
        assert_eq!(options.get("default"), Some(json!("hello")));
        assert_eq!(options.get("lazyFill"), Some(json!(true)));
        assert_eq!(options.get("missing"), None);
    }

    #[test]
    fn test_options_reject_misplaced_constraints() {
        let raw = json!({"maxLength": 3});
        let err = FieldOptions::parse(
            Some(PrimitiveType::Number),
            raw.as_object().unwrap().iter(),
            "num",
            &FieldPath::root(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("only applies to string fields"));

        let raw = json!({"default": "three"});
        let err = FieldOptions::parse(
            Some(PrimitiveType::Number),
            raw.as_object().unwrap().iter(),
            "num",
            &FieldPath::root(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("should be a number"));
    }

    #[test]
    fn test_insert_replaces_and_moves_to_end() {
        let mut map = NormalizedMap::new();
        map.insert("a", FieldConstraint::primitive(PrimitiveType::String, true));
        map.insert("b", FieldConstraint::primitive(PrimitiveType::Number, true));
        let previous = map.insert("a", FieldConstraint::primitive(PrimitiveType::String, false));
        assert!(previous.is_some_and(|c| c.required));
        assert_eq!(map.names().collect::<Vec<_>>(), vec!["b", "a"]);
    }

    #[test]
    fn test_depth() {
        let mut inner = NormalizedMap::new();
        inner.insert("x", FieldConstraint::primitive(PrimitiveType::String, true));
        let mut outer = NormalizedMap::new();
        outer.insert("obj", FieldConstraint::object(inner, true));
        assert_eq!(outer.depth(), 2);
    }
}
