//! Diagnostic logging to stderr
//!
//! Filter precedence: `RUST_LOG`, then `-v`/`-q`, then the configured `log`
//! directive, then `warn`. Command output goes to stdout and is never mixed
//! with log lines.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter directive for the given verbosity flags
pub fn directive(verbose: bool, quiet: bool, configured: Option<&str>) -> String {
    if quiet {
        "error".to_string()
    } else if verbose {
        "fieldtrack=debug,info".to_string()
    } else {
        configured
            .filter(|d| !d.trim().is_empty())
            .unwrap_or("warn")
            .to_string()
    }
}

/// Install the global subscriber; later calls are ignored
pub fn init(verbose: bool, quiet: bool, configured: Option<&str>) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::try_new(directive(verbose, quiet, configured))
            .unwrap_or_else(|_| EnvFilter::new("warn"))
    });

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_beats_verbose() {
        assert_eq!(directive(true, true, Some("debug")), "error");
    }

    #[test]
    fn test_configured_directive_used_by_default() {
        assert_eq!(directive(false, false, Some("fieldtrack=info")), "fieldtrack=info");
        assert_eq!(directive(false, false, Some("  ")), "warn");
        assert_eq!(directive(false, false, None), "warn");
    }

    #[test]
    fn test_verbose_enables_debug() {
        assert!(directive(true, false, None).starts_with("fieldtrack=debug"));
    }
}
