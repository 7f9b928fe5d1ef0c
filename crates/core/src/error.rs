//! Error types for schema compilation and data validation.

use std::fmt;

use thiserror::Error;

/// Location of a field's enclosing object, rendered as `$`, `$.obj` or `$.list[2].inner`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    /// The top-level object.
    pub fn root() -> Self {
        Self::default()
    }

    /// Path of the object stored under `name` inside this one.
    pub fn child(&self, name: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(name.to_string());
        Self(segments)
    }

    /// Path of the `index`-th element of the array at this path.
    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(format!("[{index}]"));
        Self(segments)
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of object levels below the root.
    pub fn depth(&self) -> usize {
        self.0.iter().filter(|s| !s.starts_with('[')).count()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "$")?;
        for segment in &self.0 {
            if segment.starts_with('[') {
                write!(f, "{segment}")?;
            } else {
                write!(f, ".{segment}")?;
            }
        }
        Ok(())
    }
}

/// Discriminant of [`Error`], one per failure kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MalformedSchema,
    UnknownType,
    MissingRequiredField,
    InvalidInput,
    TypeMismatch,
    EnumViolation,
    ConstraintViolation,
    SchemaTooDeep,
}

/// Errors raised while compiling a declarative schema or validating data against it.
///
/// Every variant carries the field name and the [`FieldPath`] of the enclosing
/// object where that makes sense, so callers can build user-facing messages
/// without re-walking the schema.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// The declarative input contradicts itself or has the wrong shape.
    #[error("malformed schema at {path}: {message}")]
    MalformedSchema { path: FieldPath, message: String },

    /// A type tag that no type table knows.
    #[error("unknown type: \"{type_name}\" (declared at {path})")]
    UnknownType { path: FieldPath, type_name: String },

    /// A required field is absent from the data instance.
    #[error("the key \"{field}\" in the object at {path} is required and should be present")]
    MissingRequiredField { field: String, path: FieldPath },

    /// The data instance is not an object.
    #[error("the value to validate should be an object, got {found}")]
    InvalidInput { found: String },

    /// A value's runtime type disagrees with the declared type.
    #[error(
        "the value {value} that belongs to the key \"{field}\" in the object at {path} should be a {expected}"
    )]
    TypeMismatch {
        field: String,
        path: FieldPath,
        value: String,
        expected: String,
    },

    /// A value is not one of the declared enum values.
    #[error(
        "the enum \"{field}\" in the object at {path} with the value {value} must have one of the following values: {}",
        .allowed.join(", ")
    )]
    EnumViolation {
        field: String,
        path: FieldPath,
        value: String,
        allowed: Vec<String>,
    },

    /// A single-field predicate such as `maxLength` failed.
    #[error(
        "the \"{constraint}\" constraint with the value {limit} was not met by the field \"{field}\" in the object at {path} with the value {value} with an error message saying \"{message}\""
    )]
    ConstraintViolation {
        field: String,
        path: FieldPath,
        constraint: String,
        limit: String,
        value: String,
        message: String,
    },

    /// A cross-field predicate such as `greaterOrEqualTo` failed.
    #[error(
        "A constraint failed in the object at {path} with an error message saying \"{message}; Fields for validation: {}\"",
        .fields.join(",")
    )]
    CrossFieldViolation {
        path: FieldPath,
        fields: Vec<String>,
        message: String,
    },

    /// Nested objects go deeper than the configured limit.
    #[error("schema nesting at {path} exceeds the maximum depth of {max_depth}")]
    SchemaTooDeep { path: FieldPath, max_depth: usize },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedSchema { .. } => ErrorKind::MalformedSchema,
            Self::UnknownType { .. } => ErrorKind::UnknownType,
            Self::MissingRequiredField { .. } => ErrorKind::MissingRequiredField,
            Self::InvalidInput { .. } => ErrorKind::InvalidInput,
            Self::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            Self::EnumViolation { .. } => ErrorKind::EnumViolation,
            Self::ConstraintViolation { .. } | Self::CrossFieldViolation { .. } => {
                ErrorKind::ConstraintViolation
            }
            Self::SchemaTooDeep { .. } => ErrorKind::SchemaTooDeep,
        }
    }

    pub(crate) fn malformed(path: &FieldPath, message: impl Into<String>) -> Self {
        Self::MalformedSchema { path: path.clone(), message: message.into() }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Outcome of validating a document against an [`ObjectSchema`](crate::ObjectSchema).
///
/// Field-level problems accumulate; a failing pre-validation hook is reported alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    /// Whether the document is valid.
    pub valid: bool,
    /// Validation errors (empty if valid).
    pub errors: Vec<Error>,
}

impl ValidationReport {
    /// Create a successful report.
    pub fn success() -> Self {
        Self { valid: true, errors: vec![] }
    }

    /// Create a failed report with a single error.
    pub fn single_error(error: Error) -> Self {
        Self { valid: false, errors: vec![error] }
    }

    /// Add an error to the report.
    pub fn add_error(&mut self, error: Error) {
        self.errors.push(error);
        self.valid = false;
    }

    /// Merge another report into this one.
    pub fn merge(&mut self, other: ValidationReport) {
        self.errors.extend(other.errors);
        if !other.valid {
            self.valid = false;
        }
    }

    /// The first error, if any, as a `Result`.
    pub fn into_result(self) -> Result<()> {
        match self.errors.into_iter().next() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}
