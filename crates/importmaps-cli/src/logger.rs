//! Logging setup for the importmaps CLI.
//!
//! `--verbose` and `--quiet` pick the level for importmaps crates. Without
//! either flag `RUST_LOG` is honoured, falling back to `info`.

use importmaps::LogLevel;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter for the given flags. `RUST_LOG` only applies when no flag is set.
pub fn filter_for(verbose: u8, quiet: bool) -> EnvFilter {
    if verbose > 0 || quiet {
        return EnvFilter::new(LogLevel::from_verbosity(verbose, quiet).directives());
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(LogLevel::Info.directives()))
}

/// Install the global subscriber. Call once, before any logging.
pub fn init_logger(verbose: u8, quiet: bool, no_color: bool) {
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_ansi(!no_color && should_use_colors())
        .without_time()
        .compact();

    tracing_subscriber::registry()
        .with(filter_for(verbose, quiet))
        .with(fmt_layer)
        .init();
}

/// Whether stderr output should be colored.
///
/// `NO_COLOR` disables colors, `FORCE_COLOR` enables them on non-terminals.
pub fn should_use_colors() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if std::env::var_os("FORCE_COLOR").is_some() {
        return true;
    }
    console::Term::stderr().features().colors_supported()
}
