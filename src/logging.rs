//! Logging setup for the screener binary.
//!
//! `RUST_LOG` wins when set. Otherwise the configured level applies to the
//! screener and HTTP client internals are held at `warn`.

use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Library targets that are only interesting when something breaks.
pub const QUIET_TARGETS: &[&str] = &["hyper", "hyper_util", "reqwest", "h2", "rustls"];

fn build_filter(log_level: &str) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    EnvFilter::new(filter_directives(log_level))
}

fn filter_directives(log_level: &str) -> String {
    QUIET_TARGETS
        .iter()
        .fold(log_level.to_string(), |mut acc, target| {
            acc.push_str(&format!(",{}=warn", target));
            acc
        })
}

/// Install the global subscriber.
///
/// `log_format` is `"json"` for one JSON object per line, anything else for
/// human-readable output. Calling this twice is harmless.
pub fn init_logging(log_level: &str, log_format: &str) {
    let subscriber = tracing_subscriber::registry().with(build_filter(log_level));

    if log_format == "json" {
        let layer = tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_target(true)
            .with_writer(std::io::stderr);
        let _ = subscriber.with(layer).try_init();
    } else {
        let layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr);
        let _ = subscriber.with(layer).try_init();
    }

    tracing::debug!(log_level, log_format, "Logging initialized");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directives_quiet_http_stack() {
        let directives = filter_directives("debug");
        assert!(directives.starts_with("debug,"));
        assert!(directives.contains("reqwest=warn"));
        assert!(directives.contains("hyper=warn"));
    }

    #[test]
    fn test_init_logging_twice_is_harmless() {
        init_logging("info", "pretty");
        init_logging("debug", "json");
    }
}
