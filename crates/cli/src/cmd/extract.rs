use combined_validator_core::SchemaCompiler;
use combined_validator_core::config::types::ResolvedConfig;

use super::{fail, print_json, read_or_exit};
use crate::ExtractArgs;

pub fn run(rc: &ResolvedConfig, args: &ExtractArgs) {
    let compiler = SchemaCompiler::new(rc.settings.clone());
    let schema = read_or_exit(&args.schema);
    let data = read_or_exit(&args.data);

    let result = if args.validate {
        compiler.extract_and_validate(&data, &schema)
    } else {
        compiler.extract(&data, &schema)
    };

    match result {
        Ok(out) => print_json(&out),
        Err(e) => {
            tracing::debug!(kind = ?e.kind(), "extraction failed");
            fail(&e.to_string())
        }
    }
}
