//! Contract between the engine and the bundler or dev server hosting it.
//!
//! The engine never resolves or parses modules itself; hosts expose their
//! resolution service and module metadata through [`ModuleHost`].

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A specifier resolved by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedModule {
    /// Host module id, usually an absolute path, possibly with a `?query` suffix.
    pub id: String,
    #[serde(default)]
    pub external: bool,
}

impl ResolvedModule {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            external: false,
        }
    }
}

/// A module required by a CommonJS module, with its resolution when known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredModule {
    pub source: String,
    pub resolved: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommonJsMeta {
    pub is_commonjs: bool,
    pub requires: Vec<RequiredModule>,
}

/// Compiled metadata the host records for a module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleInfo {
    pub id: String,
    pub has_default_export: bool,
    pub exports: Vec<String>,
    pub commonjs: Option<CommonJsMeta>,
}

impl ModuleInfo {
    pub fn is_commonjs(&self) -> bool {
        self.commonjs.as_ref().is_some_and(|meta| meta.is_commonjs)
    }
}

/// Resolution and metadata services of the host.
#[async_trait]
pub trait ModuleHost: Send + Sync {
    /// Resolve a specifier the way the host's own graph would.
    async fn resolve(&self, specifier: &str, importer: Option<&str>) -> Option<ResolvedModule>;

    /// Metadata of a module known to the host.
    async fn module_info(&self, id: &str) -> Option<ModuleInfo>;
}

/// Dependency optimizer state of a dev server.
pub trait OptimizerState: Send + Sync {
    /// Hash that changes whenever optimized dependencies are rebuilt.
    fn browser_hash(&self) -> Option<String>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PreserveSignature {
    /// Keep every export of the entry exactly as authored.
    #[default]
    Strict,
}

/// A chunk the engine asks the host to build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedChunk {
    pub name: String,
    pub id: String,
    pub preserve_signature: PreserveSignature,
}

pub trait ChunkEmitter {
    fn emit_chunk(&mut self, chunk: EmittedChunk);
}

impl ChunkEmitter for Vec<EmittedChunk> {
    fn emit_chunk(&mut self, chunk: EmittedChunk) {
        self.push(chunk);
    }
}

/// Shape of the host's input option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputOptions {
    Single(String),
    List(Vec<String>),
    Map(IndexMap<String, String>),
}

impl InputOptions {
    pub fn kind(&self) -> &'static str {
        match self {
            InputOptions::Single(_) => "string",
            InputOptions::List(_) => "list",
            InputOptions::Map(_) => "object",
        }
    }
}

/// Input-related options the host lets the engine rewrite before the graph is frozen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostInputOptions {
    pub input: Option<InputOptions>,
    pub preserve_entry_signatures: Option<PreserveSignature>,
}

/// One chunk of the host's output manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputChunkInfo {
    /// Logical chunk name.
    pub name: String,
    /// Output path relative to the output directory.
    pub file_name: String,
    pub facade_module_id: Option<String>,
    pub is_entry: bool,
}
