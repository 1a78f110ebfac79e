//! User-facing options.
//!
//! Field names follow Rust conventions; the camelCase spellings used by
//! JavaScript tooling are accepted as aliases so a `package.json` field can be
//! deserialized directly.

use serde::{Deserialize, Serialize};

/// Default stem of the standalone import-map resource.
pub const DEFAULT_IMPORT_MAP_FILE: &str = "import-map";

/// One entry of the `shared` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SharedDependencyConfig {
    /// A package shared under its own name.
    Name(String),
    /// A package name served from a replacement entry (another package or a local file).
    Detailed { name: String, entry: String },
}

impl SharedDependencyConfig {
    pub fn name(&self) -> &str {
        match self {
            SharedDependencyConfig::Name(name) => name,
            SharedDependencyConfig::Detailed { name, .. } => name,
        }
    }
}

impl From<&str> for SharedDependencyConfig {
    fn from(name: &str) -> Self {
        SharedDependencyConfig::Name(name.to_string())
    }
}

impl From<String> for SharedDependencyConfig {
    fn from(name: String) -> Self {
        SharedDependencyConfig::Name(name)
    }
}

/// How shared dependencies enter the bundler graph during a production build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    /// Inject each dependency into the host's named input mapping.
    #[default]
    EntryAsInput,
    /// Emit a synthetic passthrough module per dependency.
    VirtualModules,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::EntryAsInput => "entry-as-input",
            StrategyKind::VirtualModules => "virtual-modules",
        }
    }
}

impl std::str::FromStr for StrategyKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "entry-as-input" => Ok(StrategyKind::EntryAsInput),
            "virtual-modules" => Ok(StrategyKind::VirtualModules),
            other => Err(format!("Invalid strategy: {}", other)),
        }
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `true`, `false`, or a custom resource name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OutputAsFile {
    Enabled(bool),
    Named(String),
}

impl Default for OutputAsFile {
    fn default() -> Self {
        OutputAsFile::Enabled(false)
    }
}

impl OutputAsFile {
    /// File name of the standalone resource, `None` when disabled.
    pub fn file_name(&self) -> Option<String> {
        let stem = match self {
            OutputAsFile::Enabled(false) => return None,
            OutputAsFile::Enabled(true) => DEFAULT_IMPORT_MAP_FILE,
            OutputAsFile::Named(name) => name.trim_start_matches('/'),
        };
        if stem.is_empty() {
            return Some(format!("{DEFAULT_IMPORT_MAP_FILE}.json"));
        }
        if stem.ends_with(".json") {
            Some(stem.to_string())
        } else {
            Some(format!("{stem}.json"))
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildStrategyOptions {
    #[serde(default)]
    pub strategy: StrategyKind,
}

/// Options of the import-map engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportMapsOptions {
    /// Dependencies to build as standalone chunks.
    #[serde(default)]
    pub shared: Vec<SharedDependencyConfig>,

    /// Output subdirectory for shared chunks (`""` keeps them at the chunk root).
    #[serde(default, alias = "sharedOutDir")]
    pub shared_out_dir: String,

    /// Log every registered dependency at `info` level.
    #[serde(default)]
    pub log: bool,

    #[serde(default, alias = "buildOptions")]
    pub build_options: BuildStrategyOptions,

    /// Fail instead of guessing when a dependency's default export is ambiguous.
    #[serde(default, alias = "strictExports")]
    pub strict_exports: bool,

    #[serde(default, alias = "outputAsFile")]
    pub output_as_file: OutputAsFile,
}

impl ImportMapsOptions {
    pub fn new<I, S>(shared: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SharedDependencyConfig>,
    {
        Self {
            shared: shared.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn shared_out_dir(mut self, dir: impl Into<String>) -> Self {
        self.shared_out_dir = dir.into();
        self
    }

    pub fn strategy(mut self, strategy: StrategyKind) -> Self {
        self.build_options.strategy = strategy;
        self
    }

    pub fn log(mut self, log: bool) -> Self {
        self.log = log;
        self
    }

    pub fn strict_exports(mut self, strict: bool) -> Self {
        self.strict_exports = strict;
        self
    }

    pub fn output_as_file(mut self, output: OutputAsFile) -> Self {
        self.output_as_file = output;
        self
    }
}
