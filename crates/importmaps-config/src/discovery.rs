//! File-based config discovery and layered loading.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format as _, Json, Serialized, Toml};
use serde_json::Value;

use crate::config::{ImportMapsConfig, normalize_keys};
use crate::error::{ConfigError, Result};

/// Environment variable prefix. Nested keys use a double underscore:
/// `IMPORTMAPS_DEV__PORT=3000`.
pub const ENV_PREFIX: &str = "IMPORTMAPS_";

const PACKAGE_JSON_FIELD: &str = "importmaps";

/// Searches a project directory for importmaps configuration.
///
/// ```no_run
/// use importmaps_config::ConfigDiscovery;
///
/// let discovery = ConfigDiscovery::new(".");
/// if let Some(path) = discovery.find() {
///     println!("using {}", path.display());
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ConfigDiscovery {
    root: PathBuf,
}

impl ConfigDiscovery {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Find a config file in the root directory
    ///
    /// Searches in this order:
    /// 1. importmaps.toml
    /// 2. importmaps.json
    /// 3. package.json (importmaps field)
    pub fn find(&self) -> Option<PathBuf> {
        for name in ["importmaps.toml", "importmaps.json"] {
            let path = self.root.join(name);
            if path.is_file() {
                return Some(path);
            }
        }

        let pkg_path = self.root.join("package.json");
        if pkg_path.is_file() && read_package_field(&pkg_path).ok().flatten().is_some() {
            return Some(pkg_path);
        }

        None
    }

    /// Load the discovered file on its own, without env or overrides.
    pub fn load(&self) -> Result<ImportMapsConfig> {
        let path = self.find().ok_or(ConfigError::NotFound)?;
        ImportMapsConfig::from_value(read_config_file(&path)?)
    }
}

/// Read a config file into a key-normalised JSON value.
pub fn read_config_file(path: &Path) -> Result<Value> {
    if !path.is_file() {
        return Err(ConfigError::FileNotFound(path.to_path_buf()));
    }

    let is_package_json = path.file_name() == Some(std::ffi::OsStr::new("package.json"));
    let value = if is_package_json {
        read_package_field(path)?.ok_or_else(|| {
            ConfigError::invalid(
                PACKAGE_JSON_FIELD,
                "Add an 'importmaps' field to your package.json",
            )
        })?
    } else {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Figment::from(Toml::file(path)).extract::<Value>()?,
            Some("json") => Figment::from(Json::file(path)).extract::<Value>()?,
            other => {
                return Err(ConfigError::UnsupportedFormat(
                    other.unwrap_or("<none>").to_string(),
                ));
            }
        }
    };

    Ok(normalize_keys(value))
}

fn read_package_field(path: &Path) -> Result<Option<Value>> {
    let figment = Figment::from(Json::file(path));
    if !figment.contains(PACKAGE_JSON_FIELD) {
        return Ok(None);
    }
    let value: Value = figment.extract_inner(PACKAGE_JSON_FIELD)?;
    Ok((!value.is_null()).then_some(value))
}

/// Layered configuration: defaults < file < environment < overrides.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    dir: PathBuf,
    file: Option<PathBuf>,
    overrides: serde_json::Map<String, Value>,
}

impl ConfigLoader {
    /// Load from `dir`, discovering the config file there.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            file: None,
            overrides: serde_json::Map::new(),
        }
    }

    /// Use an explicit file instead of discovery.
    pub fn file(mut self, path: Option<PathBuf>) -> Self {
        self.file = path;
        self
    }

    /// Override one top-level key. Highest priority.
    pub fn set(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.overrides.insert(key.to_string(), value.into());
        self
    }

    /// Override a key only when a value was given.
    pub fn set_opt<V: Into<Value>>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.set(key, value),
            None => self,
        }
    }

    /// The file that will be read, if any.
    pub fn config_file(&self) -> Option<PathBuf> {
        match &self.file {
            Some(path) if path.is_absolute() => Some(path.clone()),
            Some(path) => Some(self.dir.join(path)),
            None => ConfigDiscovery::new(&self.dir).find(),
        }
    }

    pub fn load(&self) -> Result<ImportMapsConfig> {
        let mut figment = Figment::new().merge(Serialized::defaults(ImportMapsConfig::default()));

        if let Some(path) = self.config_file() {
            tracing::debug!(path = %path.display(), "loading config file");
            figment = figment.merge(Serialized::defaults(read_config_file(&path)?));
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        if !self.overrides.is_empty() {
            let overrides = normalize_keys(Value::Object(self.overrides.clone()));
            figment = figment.merge(Serialized::defaults(overrides));
        }

        let config: ImportMapsConfig = figment.extract()?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn find_returns_none_when_no_config() {
        let dir = TempDir::new().unwrap();
        assert!(ConfigDiscovery::new(dir.path()).find().is_none());
    }

    #[test]
    fn toml_wins_over_package_json() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("package.json"), r#"{"importmaps": {"shared": ["a"]}}"#).unwrap();
        fs::write(dir.path().join("importmaps.toml"), "shared = [\"b\"]\n").unwrap();

        let discovery = ConfigDiscovery::new(dir.path());
        assert_eq!(discovery.find().unwrap(), dir.path().join("importmaps.toml"));
        assert_eq!(discovery.load().unwrap().options.shared[0].name(), "b");
    }

    #[test]
    fn package_json_without_field_is_ignored() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("package.json"), r#"{"name": "app"}"#).unwrap();
        let discovery = ConfigDiscovery::new(dir.path());
        assert!(discovery.find().is_none());
        assert!(matches!(discovery.load(), Err(ConfigError::NotFound)));
    }

    #[test]
    fn unsupported_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("importmaps.yaml");
        fs::write(&path, "shared: []").unwrap();
        assert!(matches!(
            read_config_file(&path),
            Err(ConfigError::UnsupportedFormat(ext)) if ext == "yaml"
        ));
    }
}
