//! Command implementations.
//!
//! - [`build`] - bundle the project and write the outputs
//! - [`dev`] - serve the project with a dev-mode import map
//! - [`print`] - print the dev-mode import map
//!
//! Each command exposes an `execute` function taking its parsed arguments.

pub mod build;
pub mod dev;
pub mod print;

use std::path::{Path, PathBuf};

use importmaps::{ImportMaps, StrategyKind};
use importmaps_config::{ConfigLoader, ImportMapsConfig};
use serde_json::json;

use crate::cli::ConfigArgs;
use crate::error::{CliError, Result};

pub use build::execute as build_execute;
pub use dev::execute as dev_execute;
pub use print::execute as print_execute;

/// Configuration for one command run, with the project root resolved to a
/// canonical path.
#[derive(Debug)]
pub struct Project {
    pub config: ImportMapsConfig,
    pub root: PathBuf,
}

impl Project {
    pub fn maps(&self) -> Result<ImportMaps> {
        Ok(ImportMaps::new(self.config.options.clone())?)
    }

    /// Resolve `path` against the project root.
    pub fn path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

/// Loader with the shared flags applied as overrides.
pub(crate) fn config_loader(args: &ConfigArgs, cwd: &Path) -> Result<ConfigLoader> {
    if let Some(path) = &args.config {
        let path = if path.is_absolute() { path.clone() } else { cwd.join(path) };
        if !path.is_file() {
            return Err(CliError::FileNotFound(path));
        }
    }

    let mut loader = ConfigLoader::new(cwd)
        .file(args.config.clone())
        .set_opt("root", args.root.as_ref().map(|p| p.to_string_lossy().into_owned()))
        .set_opt("shared_out_dir", args.shared_out_dir.clone());

    if !args.shared.is_empty() {
        loader = loader.set("shared", args.shared.clone());
    }
    if let Some(strategy) = args.strategy {
        let strategy = StrategyKind::from(strategy);
        loader = loader.set("build_options", json!({ "strategy": strategy.as_str() }));
    }
    if args.strict_exports {
        loader = loader.set("strict_exports", true);
    }
    Ok(loader)
}

/// Load configuration from the current directory.
pub(crate) fn load_project(loader: ConfigLoader, cwd: &Path) -> Result<Project> {
    let config = loader.load()?;
    let root = config.resolved_root(cwd);
    if !root.is_dir() {
        return Err(CliError::FileNotFound(root));
    }
    // Module hosts report real paths, so the dev URL root must be one too.
    let root = root.canonicalize()?;
    tracing::debug!(root = %root.display(), shared = config.options.shared.len(), "configuration loaded");
    Ok(Project { config, root })
}

pub(crate) fn current_dir() -> Result<PathBuf> {
    Ok(std::env::current_dir()?)
}
