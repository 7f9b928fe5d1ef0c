//! `normalize`, `wire` and `object-schema`.

use std::path::Path;

use combined_validator_core::SchemaCompiler;
use combined_validator_core::config::types::ResolvedConfig;
use serde_json::Value;

use super::{fail, print_json, read_or_exit};
use crate::CompileArgs;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Normalized,
    Wire,
    ObjectSchema,
}

pub fn run(rc: &ResolvedConfig, target: Target, args: &CompileArgs) {
    let compiler = SchemaCompiler::new(rc.settings.clone());
    let schema = read_schema(&compiler, &args.schema, args.private.as_deref());

    let result = match target {
        Target::Normalized => compiler.normalize(&schema).map(|map| map.to_value()),
        Target::Wire => compiler.build_wire_schema(&schema),
        Target::ObjectSchema => compiler.build_object_schema(&schema).map(|s| s.describe()),
    };

    match result {
        Ok(out) => print_json(&out),
        Err(e) => fail(&e.to_string()),
    }
}

/// The public schema, with the private overlay merged in when given.
fn read_schema(compiler: &SchemaCompiler, public: &Path, private: Option<&Path>) -> Value {
    let schema = read_or_exit(public);
    match private {
        Some(private) => {
            let overlay = read_or_exit(private);
            tracing::debug!(public = %public.display(), private = %private.display(), "merging private schema");
            compiler.merge_collections(&schema, &overlay)
        }
        None => schema,
    }
}
