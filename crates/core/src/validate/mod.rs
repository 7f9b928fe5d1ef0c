//! Constraint predicates and the validators built from them.

pub mod factory;
pub mod predicates;

pub use factory::{
    BoundRule, CrossFieldPredicate, CrossFieldValidator, CrossFieldValidatorFactory, EXACT_LENGTH, FieldPredicate,
    FieldValidator, FieldValidatorFactory, GREATER_OR_EQUAL_TO, MAX_LENGTH, UndefinedPolicy, check_enum,
    cross_field_validators, field_validators,
};
pub use predicates::{is_exact_length, is_greater_or_equal_to, is_max_length};
