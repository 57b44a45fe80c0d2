// Logger initialization for both binaries
// The server logs to stderr; the terminal client must not draw over its own
// screen, so it logs to a file instead.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use colored::*;
use log::LevelFilter;

use crate::ms_error::LoggerError;

/// Where log records go.
pub enum LogTarget<'a> {
    Stderr,
    File(&'a Path),
}

/// Default directives: `level` for this crate, warnings elsewhere. Directives
/// from `rust_log` (the `RUST_LOG` syntax) are applied last and win.
fn filters(level: LevelFilter, rust_log: Option<&str>) -> env_logger::Builder {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(LevelFilter::Warn);
    builder.filter_module("mswpr", level);
    builder.filter_module("mswpr_server", level);
    builder.filter_module("hyper", LevelFilter::Info);
    builder.filter_module("rustls", LevelFilter::Info);
    if let Some(spec) = rust_log {
        builder.parse_filters(spec);
    }
    builder
}

/// Initializes `env_logger` with the given level.
///
/// `RUST_LOG` still overrides any of the defaults, e.g. `RUST_LOG=debug` or
/// `RUST_LOG=mswpr=trace`.
/// Records look like `2026-01-02 10:00:00 [INFO] [mswpr::ms_api] message`,
/// timestamp in magenta, level in red and target in blue.
pub fn init_logger(level: LevelFilter, target: LogTarget<'_>) -> Result<(), LoggerError> {
    let rust_log = std::env::var("RUST_LOG").ok();
    let mut builder = filters(level, rust_log.as_deref());

    match target {
        LogTarget::Stderr => {
            colored::control::set_override(true);
        }
        LogTarget::File(path) => {
            colored::control::set_override(false);
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|source| LoggerError::File {
                    path: path.display().to_string(),
                    source,
                })?;
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
    }

    builder.format(|buf, record| {
        writeln!(
            buf,
            "{} {} {} {}",
            chrono::Local::now()
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
                .magenta(),
            format!("[{}]", record.level()).red(),
            format!("[{}]", record.target()).blue(),
            record.args()
        )
    });

    // try_init: tests may initialize more than once
    builder.try_init()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::{Level, Log, Metadata};

    fn enabled(logger: &env_logger::Logger, target: &str, level: Level) -> bool {
        logger.enabled(&Metadata::builder().target(target).level(level).build())
    }

    #[test]
    fn defaults_without_rust_log() {
        let b = filters(LevelFilter::Info, None).build();
        assert!(enabled(&b, "mswpr::ms_api", Level::Info));
        assert!(!enabled(&b, "mswpr::ms_api", Level::Debug));
        assert!(!enabled(&b, "tower_http", Level::Info));
        assert!(enabled(&b, "tower_http", Level::Warn));
    }

    #[test]
    fn rust_log_overrides_the_defaults() {
        let b = filters(LevelFilter::Info, Some("debug")).build();
        assert!(enabled(&b, "tower_http", Level::Debug));

        let b = filters(LevelFilter::Info, Some("mswpr=trace")).build();
        assert!(enabled(&b, "mswpr::ms_store", Level::Trace));
        assert!(!enabled(&b, "tower_http", Level::Info));

        let b = filters(LevelFilter::Debug, Some("mswpr=error,hyper=debug")).build();
        assert!(!enabled(&b, "mswpr::ms_api", Level::Warn));
        assert!(enabled(&b, "hyper::proto", Level::Debug));
    }

    #[test]
    fn init_to_file_creates_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.log");
        // Another test may have installed a logger already; the file is
        // opened before the global logger is set either way.
        let _ = init_logger(LevelFilter::Debug, LogTarget::File(&path));
        assert!(path.exists());
    }

    #[test]
    fn unwritable_log_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("client.log");
        let err = init_logger(LevelFilter::Info, LogTarget::File(&path)).unwrap_err();
        assert!(matches!(err, LoggerError::File { .. }));
    }
}
