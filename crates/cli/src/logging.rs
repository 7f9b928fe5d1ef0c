//! `cval` logging: compact diagnostics on stderr, and an optional log file
//! that collects every run. stdout stays reserved for JSON output.

use combined_validator_core::config::types::ResolvedConfig;
use std::fs::{File, OpenOptions};
use std::io::IsTerminal;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Overrides the configured levels, in `EnvFilter` directive syntax.
pub const LOG_ENV_VAR: &str = "CVAL_LOG";

static LOG_GUARD: Mutex<Option<tracing_appender::non_blocking::WorkerGuard>> = Mutex::new(None);

pub fn init(cfg: &ResolvedConfig) {
    let stderr_level = parse_level(&cfg.logging.level).unwrap_or(LevelFilter::INFO);

    let stderr_layer = fmt::layer()
        .compact()
        .without_time()
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .with_filter(level_filter(stderr_level));

    let registry = tracing_subscriber::registry().with(stderr_layer);

    let Some(path) = cfg.logging.file.as_deref() else {
        registry.init();
        return;
    };

    let file_level_str = cfg.logging.file_level.as_deref().unwrap_or(&cfg.logging.level);
    let file_level = parse_level(file_level_str).unwrap_or(LevelFilter::DEBUG);

    let file = open_log_file(path).unwrap_or_else(|e| {
        eprintln!("Failed to open log file {}: {}", path.display(), e);
        std::process::exit(1);
    });
    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    // Dropped by `shutdown`, which flushes pending lines.
    if let Ok(mut g) = LOG_GUARD.lock() {
        *g = Some(guard);
    }

    // Module targets tell normalize, wire and extract events apart.
    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true)
        .with_filter(level_filter(file_level));

    registry.with(file_layer).init();
    tracing::debug!(pid = std::process::id(), args = ?std::env::args().skip(1).collect::<Vec<_>>(), "cval started");
}

/// Flush and close the file logger, if any.
pub fn shutdown() {
    if let Ok(mut g) = LOG_GUARD.lock() {
        g.take();
    }
}

fn level_filter(level: LevelFilter) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(level.into())
        .with_env_var(LOG_ENV_VAR)
        .from_env_lossy()
}

/// Open `path` for appending, creating missing parent directories.
fn open_log_file(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

fn parse_level(s: &str) -> Option<LevelFilter> {
    s.trim().parse::<LevelFilter>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("error"), Some(LevelFilter::ERROR));
        assert_eq!(parse_level("WARN"), Some(LevelFilter::WARN));
        assert_eq!(parse_level(" Info "), Some(LevelFilter::INFO));
        assert_eq!(parse_level("debug"), Some(LevelFilter::DEBUG));
        assert_eq!(parse_level("trace"), Some(LevelFilter::TRACE));
        assert_eq!(parse_level("off"), Some(LevelFilter::OFF));
        assert_eq!(parse_level("invalid"), None);
    }

    #[test]
    fn test_log_file_is_appended_to() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logs").join("cval.log");

        std::io::Write::write_all(&mut open_log_file(&path).unwrap(), b"first\n").unwrap();
        std::io::Write::write_all(&mut open_log_file(&path).unwrap(), b"second\n").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }
}
