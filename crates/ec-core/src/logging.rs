//! Logging bootstrap
//!
//! The host runtime captures the plugin's output, so a plain `fmt`
//! subscriber is all that is installed here.

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Parse a log level name (`trace`, `debug`, `info`, `warn`, `error`)
pub fn parse_level(level: &str) -> Result<Level, crate::Error> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => Err(crate::Error::config(format!(
            "log level '{}' is not valid. Valid levels: trace, debug, info, warn, error",
            level
        ))),
    }
}

/// Install the global tracing subscriber
///
/// Fails if the level is invalid or a global subscriber is already set.
pub fn init_logging(level: &str) -> Result<(), crate::Error> {
    let level = parse_level(level)?;

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| crate::Error::config(format!("Failed to set tracing subscriber: {}", e)))
}
