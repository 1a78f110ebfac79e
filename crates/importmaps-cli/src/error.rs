//! CLI error type and its conversion to miette reports.

use std::path::PathBuf;

use miette::Report;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] importmaps_config::ConfigError),

    #[error(transparent)]
    Core(#[from] importmaps::Error),

    #[error(transparent)]
    Build(#[from] importmaps_rolldown::Error),

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Server error: {0}")]
    Server(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CliError>;

/// Convert a CLI error into a report, keeping diagnostic codes and help text.
pub fn cli_error_to_miette(err: CliError) -> Report {
    match err {
        CliError::Core(e) => Report::new(e),
        CliError::Build(importmaps_rolldown::Error::Core(e)) => Report::new(e),
        CliError::Build(e) => Report::new(e),
        CliError::Config(e) => miette::miette!(
            help = "Check importmaps.toml, importmaps.json or the \"importmaps\" field of package.json",
            "Configuration error: {}",
            e
        ),
        CliError::FileNotFound(path) => miette::miette!(
            help = "Paths are resolved against the project root",
            "File not found: {}",
            path.display()
        ),
        other => miette::miette!("{}", other),
    }
}
