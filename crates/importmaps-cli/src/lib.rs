//! # importmaps-cli
//!
//! Command-line front end for the import-map engine.
//!
//! - `importmaps build` bundles the project with rolldown, writes the outputs
//!   and injects the import map into the HTML page
//! - `importmaps dev` serves the project root and injects a dev-mode map
//! - `importmaps print` prints the dev-mode map as JSON
//!
//! Configuration comes from `importmaps.toml`, `importmaps.json` or the
//! `importmaps` field of `package.json`, then `IMPORTMAPS_*` environment
//! variables, then command-line flags.

pub mod cli;
pub mod commands;
pub mod error;
pub mod logger;
pub mod server;
pub mod ui;
