use log::{LevelFilter, Log, Metadata, Record};
use std::sync::OnceLock;

struct StderrLogger {
    level: LevelFilter,
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        eprintln!("[{}] {}", record.level(), record.args());
    }

    fn flush(&self) {}
}

static LOGGER: OnceLock<StderrLogger> = OnceLock::new();

/// Level from `RUST_LOG`, falling back to `default` when unset or unknown.
///
/// Errors are always shown: the final diagnostic of a failed run is logged.
pub fn level_from_env(default: LevelFilter) -> LevelFilter {
    select_level(std::env::var("RUST_LOG").ok().as_deref(), default)
}

fn select_level(requested: Option<&str>, default: LevelFilter) -> LevelFilter {
    requested
        .and_then(parse_level)
        .unwrap_or(default)
        .max(LevelFilter::Error)
}

fn parse_level(level: &str) -> Option<LevelFilter> {
    match level.trim().to_lowercase().as_str() {
        "off" => Some(LevelFilter::Off),
        "error" => Some(LevelFilter::Error),
        "warn" => Some(LevelFilter::Warn),
        "info" => Some(LevelFilter::Info),
        "debug" => Some(LevelFilter::Debug),
        "trace" => Some(LevelFilter::Trace),
        _ => None,
    }
}

/// Install the stderr logger. Later calls keep the first level.
pub fn init(level: LevelFilter) {
    let logger = LOGGER.get_or_init(|| StderrLogger { level });
    if log::set_logger(logger).is_ok() {
        log::set_max_level(logger.level);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_levels() {
        assert_eq!(parse_level("WARN"), Some(LevelFilter::Warn));
        assert_eq!(parse_level(" debug "), Some(LevelFilter::Debug));
        assert_eq!(parse_level("off"), Some(LevelFilter::Off));
        assert_eq!(parse_level("loud"), None);
    }

    #[test]
    fn errors_stay_visible_when_logging_is_off() {
        assert_eq!(select_level(Some("off"), LevelFilter::Info), LevelFilter::Error);
        assert_eq!(select_level(Some("warn"), LevelFilter::Info), LevelFilter::Warn);
        assert_eq!(select_level(Some("loud"), LevelFilter::Info), LevelFilter::Info);
        assert_eq!(select_level(None, LevelFilter::Debug), LevelFilter::Debug);
    }
}
