//! Reading schema and data documents from disk.

use std::fs;
use std::path::Path;

use color_eyre::eyre::{Result, WrapErr};
use serde_json::Value;

/// Read a JSON or YAML document. `.yaml`/`.yml` files are YAML, anything else JSON.
pub fn read_document(path: &Path) -> Result<Value> {
    let text = fs::read_to_string(path).wrap_err_with(|| format!("failed to read {}", path.display()))?;
    parse_document(path, &text)
}

fn parse_document(path: &Path, text: &str) -> Result<Value> {
    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

    if is_yaml {
        serde_yaml::from_str(text).wrap_err_with(|| format!("failed to parse YAML in {}", path.display()))
    } else {
        serde_json::from_str(text).wrap_err_with(|| format!("failed to parse JSON in {}", path.display()))
    }
}
