pub mod compile;
pub mod doctor;
pub mod extract;
pub mod input;

use std::path::Path;

use combined_validator_core::config::loader::ConfigLoader;
use combined_validator_core::config::types::ResolvedConfig;
use serde_json::Value;

/// Load configuration and start logging, or exit.
pub fn load_config(config: Option<&Path>) -> ResolvedConfig {
    match ConfigLoader::load(config) {
        Ok(rc) => {
            crate::logging::init(&rc);
            rc
        }
        Err(e) => {
            eprintln!("Error loading config: {e}");
            std::process::exit(1);
        }
    }
}

/// Read a document argument, or exit.
pub fn read_or_exit(path: &Path) -> Value {
    match input::read_document(path) {
        Ok(value) => value,
        Err(e) => fail(&format!("{e:#}")),
    }
}

pub fn print_json(value: &Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

pub fn fail(message: &str) -> ! {
    eprintln!("Error: {message}");
    crate::logging::shutdown();
    std::process::exit(1);
}
