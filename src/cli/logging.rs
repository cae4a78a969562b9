//! Logging setup for the CLI
//!
//! Logs go to stderr so that converted rows can be piped from stdout.
//! `RUST_LOG` takes precedence over the verbosity flags when it is set.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Map `-v` / `-q` counts to a default filter directive
pub fn level_directive(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber
pub fn init_logging(verbose: u8, quiet: bool) -> Result<(), String> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_directive(verbose, quiet)));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init()
        .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_directive() {
        assert_eq!(level_directive(0, false), "warn");
        assert_eq!(level_directive(1, false), "info");
        assert_eq!(level_directive(5, false), "trace");
        assert_eq!(level_directive(3, true), "error");
    }
}
