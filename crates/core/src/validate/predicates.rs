//! Pure constraint checks. Lengths count characters, not bytes.

pub fn is_exact_length(value: &str, length: usize) -> bool {
    value.chars().count() == length
}

pub fn is_max_length(value: &str, max: usize) -> bool {
    value.chars().count() <= max
}

/// Whether the first value is greater than or equal to every other value.
///
/// An empty or single-value sequence passes.
pub fn is_greater_or_equal_to(values: &[f64]) -> bool {
    match values.split_first() {
        Some((first, rest)) => rest.iter().all(|other| first >= other),
        None => true,
    }
}
