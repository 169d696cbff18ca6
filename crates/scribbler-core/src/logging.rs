//! Shared logging initialization for Scribbler binaries.

use std::sync::OnceLock;

static INIT: OnceLock<()> = OnceLock::new();

fn parse_level(value: Option<&str>) -> tracing::Level {
    match value.unwrap_or("info").trim().to_ascii_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}

/// Initialize process-level tracing output from `SCRIBBLER_LOG`.
///
/// `verbose` forces debug output regardless of the environment. Output goes
/// to stderr so that operation results written to stdout stay clean. Safe to
/// call multiple times; only the first call installs the subscriber.
pub fn init(verbose: bool) {
    if INIT.get().is_some() {
        return;
    }
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        parse_level(std::env::var("SCRIBBLER_LOG").ok().as_deref())
    };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
    let _ = INIT.set(());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level(None), tracing::Level::INFO);
        assert_eq!(parse_level(Some("DEBUG")), tracing::Level::DEBUG);
        assert_eq!(parse_level(Some(" warn ")), tracing::Level::WARN);
        assert_eq!(parse_level(Some("verbose")), tracing::Level::INFO);
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init(false);
        init(true);
    }
}
