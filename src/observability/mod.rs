use tracing_subscriber::EnvFilter;

use crate::config::{FeaturesConfig, LogFormat};

/// Initialize the tracing subscriber with the configured log level.
///
/// Maps config log levels to tracing levels:
/// - "DISABLED" -> no subscriber installed
/// - "WARNING" -> WARN
/// - "CRITICAL" -> ERROR
/// - Others map directly (DEBUG, INFO, ERROR)
///
/// Returns `false` when nothing was installed, either because logging is
/// disabled or because a global subscriber already exists.
pub fn init_tracing(features: &FeaturesConfig) -> bool {
    let Some(filter) = level_filter(&features.log_level) else {
        return false;
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    match features.log_format {
        LogFormat::Text => builder.try_init().is_ok(),
        LogFormat::Json => builder.json().try_init().is_ok(),
    }
}

fn level_filter(log_level: &str) -> Option<EnvFilter> {
    let level = log_level.to_uppercase();
    let tracing_level = match level.as_str() {
        "DISABLED" => return None,
        "WARNING" => "WARN",
        "CRITICAL" => "ERROR",
        other => other,
    };
    Some(EnvFilter::try_new(tracing_level).unwrap_or_else(|_| EnvFilter::new("INFO")))
}
