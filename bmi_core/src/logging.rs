//! Tracing setup shared by the library and the `bmi` binary.
//!
//! Everything is written to stderr; stdout belongs to command output
//! (`bmi chart --json` must stay parseable).

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Default filter for a given number of `-v` flags
pub fn level_for_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Initialize logging at INFO unless RUST_LOG says otherwise
pub fn init() {
    init_with_level("info")
}

/// Initialize logging from a `-v` count; RUST_LOG still wins
pub fn init_for_verbosity(verbose: u8) {
    init_with_level(level_for_verbosity(verbose))
}

/// Initialize logging with a specific default level.
///
/// Calling this twice (or after an embedding application installed its own
/// subscriber) leaves the existing subscriber in place.
pub fn init_with_level(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init();
    if installed.is_err() {
        tracing::debug!("Global subscriber already set, keeping it");
    }
}

/// Route logs through the test harness so they show up on failure
#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::new("debug"))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(level_for_verbosity(0), "warn");
        assert_eq!(level_for_verbosity(1), "info");
        assert_eq!(level_for_verbosity(2), "debug");
        assert_eq!(level_for_verbosity(7), "trace");
    }

    #[test]
    fn test_repeated_init_is_harmless() {
        init_test();
        init_with_level("info");
        init_for_verbosity(2);
    }
}
