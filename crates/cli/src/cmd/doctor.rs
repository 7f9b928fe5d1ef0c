use combined_validator_core::config::loader::{ConfigLoader, default_config_path};
use std::path::Path;

pub fn run(config: Option<&Path>) {
    match ConfigLoader::load(config) {
        Ok(rc) => {
            crate::logging::init(&rc);
            tracing::debug!("configuration loaded");

            println!("OK   cval doctor");
            println!(
                "path: {}",
                rc.source.as_deref().map_or_else(
                    || format!("{} (not found, using defaults)", default_config_path().display()),
                    |p| p.display().to_string()
                )
            );
            println!("normalize.max_depth: {}", rc.settings.max_depth);
            println!("normalize.duplicate_fields: {}", rc.settings.duplicate_fields.as_str());
            println!("wire.ref_prefix: {}", rc.settings.ref_prefix);
            println!("logging.level: {}", rc.logging.level);
            if let Some(file) = &rc.logging.file {
                println!("logging.file: {}", file.display());
            }
        }
        Err(e) => {
            println!("FAIL cval doctor");
            println!("{e}");
            if config.is_none() {
                println!("looked for: {}", default_config_path().display());
            }
            std::process::exit(1);
        }
    }
}
