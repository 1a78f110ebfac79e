//! Configuration for importmaps projects.
//!
//! A project is configured by `importmaps.toml`, `importmaps.json`, or an
//! `importmaps` field in `package.json`. [`ConfigLoader`] layers that file
//! over the defaults, then `IMPORTMAPS_*` environment variables, then
//! command-line overrides.

pub mod config;
pub mod discovery;
pub mod error;

pub use config::{DevConfig, ImportMapsConfig, normalize_keys};
pub use discovery::{ConfigDiscovery, ConfigLoader, ENV_PREFIX, read_config_file};
pub use error::{ConfigError, Result};
