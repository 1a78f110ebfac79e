//! # importmaps-rolldown
//!
//! Runs the import-map engine inside a rolldown build: shared dependencies
//! become their own chunks and the resulting map is appended to the bundle.
//!
//! ```no_run
//! use importmaps::{ImportMaps, ImportMapsOptions};
//! use importmaps_rolldown::{BuildRequest, build};
//!
//! # async fn run() -> importmaps_rolldown::Result<()> {
//! let maps = ImportMaps::new(ImportMapsOptions::new(["react", "react-dom"]).shared_out_dir("shared"))?;
//! let output = build(&maps, BuildRequest::new("./app").entry("./src/main.js").html("index.html")).await?;
//! output.write_to("./app/dist")?;
//! println!("{}", output.import_map.to_pretty_json());
//! # Ok(())
//! # }
//! ```

pub mod build;
pub mod host;
pub mod input;
pub mod plugin;
pub mod scan;

pub use build::{BuildOutput, BuildRequest, DEFAULT_FILE_NAMES, build};
pub use host::FsModuleHost;
pub use input::{
    InputItemEmitter, to_input_items, to_input_options, to_preserve_entry_signatures,
};
pub use plugin::{HtmlTemplate, ImportMapsPlugin};
pub use scan::{ModuleScan, scan_module};

use miette::Diagnostic;

/// Error types for rolldown builds.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] importmaps::Error),

    /// Error from the rolldown bundler, rendered from its diagnostics.
    #[error("Rolldown bundler error: {0}")]
    Bundler(String),

    /// Neither application entries nor shared dependencies to bundle.
    #[error("Nothing to build: no inputs and no shared dependencies")]
    NoInputs,

    /// The bundle finished without reaching the generate-bundle hook.
    #[error("Build finished without publishing an import map")]
    NotPublished,

    /// Invalid output path (e.g., directory traversal attempt).
    #[error("Invalid output path: {0}")]
    InvalidOutputPath(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a bundler error from a batch of rolldown diagnostics.
    pub fn from_rolldown_batch(error: &dyn std::fmt::Debug) -> Self {
        Error::Bundler(format!("{error:?}"))
    }
}

impl Diagnostic for Error {
    fn code(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        match self {
            Error::Core(inner) => inner.code(),
            Error::Bundler(_) => Some(Box::new("BUNDLER_ERROR")),
            Error::NoInputs => Some(Box::new("NO_INPUTS")),
            Error::NotPublished => Some(Box::new("NOT_PUBLISHED")),
            Error::InvalidOutputPath(_) => Some(Box::new("INVALID_OUTPUT_PATH")),
            Error::Io(_) => Some(Box::new("IO_ERROR")),
        }
    }

    fn help(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        match self {
            Error::Core(inner) => inner.help(),
            Error::NoInputs => Some(Box::new(
                "Add an application entry or declare at least one shared dependency.",
            )),
            _ => None,
        }
    }
}
