//! Project configuration: engine options plus the settings the CLI needs.

use std::path::{Path, PathBuf};

use importmaps::{ImportMapsOptions, SharedDependencyConfig};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ConfigError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportMapsConfig {
    #[serde(flatten)]
    pub options: ImportMapsOptions,

    /// Project root, relative to the directory the config was found in.
    pub root: PathBuf,

    /// Build output directory, relative to `root`.
    pub out_dir: PathBuf,

    /// HTML page that receives the import map, relative to `root`.
    pub html: Option<PathBuf>,

    /// Application entry modules, relative to `root`.
    pub entries: Vec<String>,

    pub dev: DevConfig,
}

impl Default for ImportMapsConfig {
    fn default() -> Self {
        Self {
            options: ImportMapsOptions::default(),
            root: PathBuf::from("."),
            out_dir: PathBuf::from("dist"),
            html: Some(PathBuf::from("index.html")),
            entries: Vec::new(),
            dev: DevConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DevConfig {
    pub host: String,
    pub port: u16,
}

impl Default for DevConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 5173,
        }
    }
}

impl ImportMapsConfig {
    /// Create from a JSON value, accepting camelCase keys.
    ///
    /// ```
    /// use importmaps_config::ImportMapsConfig;
    /// use serde_json::json;
    ///
    /// let config = ImportMapsConfig::from_value(json!({
    ///     "shared": ["react"],
    ///     "sharedOutDir": "shared",
    ///     "outDir": "build"
    /// }))
    /// .unwrap();
    /// assert_eq!(config.options.shared_out_dir, "shared");
    /// assert_eq!(config.out_dir.to_str(), Some("build"));
    /// ```
    pub fn from_value(value: Value) -> Result<Self> {
        let config: ImportMapsConfig = serde_json::from_value(normalize_keys(value))
            .map_err(|e| ConfigError::invalid("config", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check values serde cannot express.
    pub fn validate(&self) -> Result<()> {
        for (index, dependency) in self.options.shared.iter().enumerate() {
            if dependency.name().trim().is_empty() {
                return Err(ConfigError::invalid(
                    format!("shared[{index}]"),
                    "dependency names cannot be empty",
                ));
            }
            if let SharedDependencyConfig::Detailed { entry, .. } = dependency {
                if entry.trim().is_empty() {
                    return Err(ConfigError::invalid(
                        format!("shared[{index}].entry"),
                        "remove the entry or point it at a package or file",
                    ));
                }
            }
        }

        if self.entries.iter().any(|entry| entry.trim().is_empty()) {
            return Err(ConfigError::invalid(
                "entries",
                "remove empty strings from the 'entries' array",
            ));
        }

        if self.dev.port == 0 {
            return Err(ConfigError::invalid("dev.port", "use a port between 1 and 65535"));
        }

        Ok(())
    }

    /// `root` resolved against `base`.
    pub fn resolved_root(&self, base: &Path) -> PathBuf {
        if self.root.is_absolute() {
            self.root.clone()
        } else {
            base.join(&self.root)
        }
    }
}

/// Rewrite camelCase object keys to snake_case, recursively.
///
/// Configuration written for JavaScript tooling uses camelCase. Layers are
/// normalised before merging so a camelCase file key and a snake_case
/// override address the same field.
pub fn normalize_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (to_snake_case(&key), normalize_keys(value)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(normalize_keys).collect()),
        other => other,
    }
}

fn to_snake_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for (i, ch) in key.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}
