//! Dependency registry.
//!
//! The registry owns the declared shared dependencies, the entrypoints derived
//! from them and the live `package name -> URL` map. Build sessions and the dev
//! resolver receive it as a [`SharedRegistry`] handle.

use std::path::PathBuf;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use path_clean::PathClean;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::normalize::{is_local_file_entry, normalize_dependency_name};
use crate::options::{ImportMapsOptions, SharedDependencyConfig};
use crate::{Error, Result};

/// Registry handle shared between host hooks.
pub type SharedRegistry = Arc<RwLock<Registry>>;

/// Rewrites the `imports` object right before publication.
///
/// Receives the imports in declaration order and the full dependency map.
pub type ImportMapTransformer = Arc<
    dyn Fn(IndexMap<String, String>, &IndexMap<String, RegisteredDependency>) -> IndexMap<String, String>
        + Send
        + Sync,
>;

/// A declared shared dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedDependency {
    /// Specifier consumers import.
    pub name: String,
    /// What is resolved to build the chunk.
    pub entry: String,
    pub is_local_file: bool,
}

impl SharedDependency {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            entry: name.clone(),
            name,
            is_local_file: false,
        }
    }

    pub fn with_entry(name: impl Into<String>, entry: impl Into<String>) -> Self {
        let entry = entry.into();
        Self {
            name: name.into(),
            is_local_file: is_local_file_entry(&entry),
            entry,
        }
    }

    pub fn normalized_name(&self) -> String {
        normalize_dependency_name(&self.name)
    }
}

impl From<&SharedDependencyConfig> for SharedDependency {
    fn from(config: &SharedDependencyConfig) -> Self {
        match config {
            SharedDependencyConfig::Name(name) => SharedDependency::new(name.as_str()),
            SharedDependencyConfig::Detailed { name, entry } => {
                SharedDependency::with_entry(name.as_str(), entry.as_str())
            }
        }
    }
}

/// Build-graph entrypoint derived from a declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkEntrypoint {
    pub original_dependency_name: String,
    pub normalized_dependency_name: String,
    /// Logical chunk name, `<shared_out_dir>/<normalized name>`.
    pub entrypoint: String,
    pub id_to_resolve: String,
    pub is_local_file: bool,
}

/// A dependency with a known served URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredDependency {
    pub package_name: String,
    pub url: String,
}

impl RegisteredDependency {
    pub fn new(package_name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            package_name: package_name.into(),
            url: url.into(),
        }
    }
}

pub struct Registry {
    declarations: Vec<SharedDependency>,
    shared_out_dir: String,
    inputs: Vec<ChunkEntrypoint>,
    dependencies: IndexMap<String, RegisteredDependency>,
    transformer: Option<ImportMapTransformer>,
    log: bool,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("declarations", &self.declarations)
            .field("shared_out_dir", &self.shared_out_dir)
            .field("inputs", &self.inputs)
            .field("dependencies", &self.dependencies)
            .field("transformer", &self.transformer.is_some())
            .field("log", &self.log)
            .finish()
    }
}

impl Registry {
    /// Create a registry, rejecting declarations whose normalized names collide.
    ///
    /// Repeating an identical declaration is harmless and keeps the first one.
    pub fn new(declarations: Vec<SharedDependency>, shared_out_dir: impl Into<String>) -> Result<Self> {
        let mut seen: FxHashMap<String, usize> = FxHashMap::default();
        let mut unique: Vec<SharedDependency> = Vec::with_capacity(declarations.len());
        for dep in declarations {
            let normalized = dep.normalized_name();
            match seen.get(&normalized).map(|&index| &unique[index]) {
                Some(first) if first == &dep => {
                    tracing::debug!(dependency = %dep.name, "skipping repeated declaration");
                }
                Some(first) if first.name == dep.name => {
                    return Err(Error::DuplicateDeclaration { name: dep.name });
                }
                Some(first) => {
                    return Err(Error::NameCollision {
                        normalized,
                        first: first.name.clone(),
                        second: dep.name,
                    });
                }
                None => {
                    seen.insert(normalized, unique.len());
                    unique.push(dep);
                }
            }
        }

        Ok(Self {
            declarations: unique,
            shared_out_dir: shared_out_dir.into(),
            inputs: Vec::new(),
            dependencies: IndexMap::new(),
            transformer: None,
            log: false,
        })
    }

    pub fn from_options(options: &ImportMapsOptions) -> Result<Self> {
        let declarations = options.shared.iter().map(SharedDependency::from).collect();
        let mut registry = Self::new(declarations, options.shared_out_dir.clone())?;
        registry.log = options.log;
        Ok(registry)
    }

    pub fn into_shared(self) -> SharedRegistry {
        Arc::new(RwLock::new(self))
    }

    pub fn with_transformer(mut self, transformer: ImportMapTransformer) -> Self {
        self.transformer = Some(transformer);
        self
    }

    pub fn set_transformer(&mut self, transformer: ImportMapTransformer) {
        self.transformer = Some(transformer);
    }

    pub fn log(&self) -> bool {
        self.log
    }

    pub fn declarations(&self) -> &[SharedDependency] {
        &self.declarations
    }

    pub fn is_declared(&self, package_name: &str) -> bool {
        self.declarations.iter().any(|dep| dep.name == package_name)
    }

    /// Upsert a dependency URL. Undeclared package names are dropped.
    ///
    /// Returns whether the entry was stored.
    pub fn add_dependency(&mut self, dependency: RegisteredDependency) -> bool {
        if !self.is_declared(&dependency.package_name) {
            tracing::debug!(
                package = %dependency.package_name,
                "ignoring registration of undeclared dependency"
            );
            return false;
        }

        if self.log {
            tracing::info!("[importmaps] Added {}: {}", dependency.package_name, dependency.url);
        } else {
            tracing::debug!(package = %dependency.package_name, url = %dependency.url, "registered dependency");
        }
        self.dependencies
            .insert(dependency.package_name.clone(), dependency);
        true
    }

    pub fn clear_dependencies(&mut self) {
        self.dependencies.clear();
    }

    pub fn dependencies(&self) -> &IndexMap<String, RegisteredDependency> {
        &self.dependencies
    }

    /// Logical chunk name for a dependency: the shared output directory joined
    /// with the normalized name, always with `/` separators.
    pub fn get_entrypoint_path(&self, name: &str) -> String {
        let joined = PathBuf::from(&self.shared_out_dir)
            .join(normalize_dependency_name(name))
            .clean();
        joined.to_string_lossy().replace('\\', "/")
    }

    /// Derive and record the entrypoint of a declaration.
    ///
    /// Adding the same declaration twice returns the existing entrypoint.
    pub fn add_input(&mut self, dependency: &SharedDependency) -> Result<ChunkEntrypoint> {
        let normalized = dependency.normalized_name();
        if let Some(existing) = self
            .inputs
            .iter()
            .find(|input| input.normalized_dependency_name == normalized)
        {
            if existing.original_dependency_name != dependency.name {
                return Err(Error::NameCollision {
                    normalized,
                    first: existing.original_dependency_name.clone(),
                    second: dependency.name.clone(),
                });
            }
            return Ok(existing.clone());
        }

        let input = ChunkEntrypoint {
            original_dependency_name: dependency.name.clone(),
            entrypoint: self.get_entrypoint_path(&normalized),
            normalized_dependency_name: normalized,
            id_to_resolve: dependency.entry.clone(),
            is_local_file: dependency.is_local_file,
        };
        self.inputs.push(input.clone());
        Ok(input)
    }

    pub fn inputs(&self) -> &[ChunkEntrypoint] {
        &self.inputs
    }

    /// Registered imports in declaration order, before the transformer.
    pub fn imports(&self) -> IndexMap<String, String> {
        self.declarations
            .iter()
            .filter_map(|dep| {
                self.dependencies
                    .get(&dep.name)
                    .map(|registered| (dep.name.clone(), registered.url.clone()))
            })
            .collect()
    }

    /// Imports as published: declaration order, then the user transformer.
    pub fn published_imports(&self) -> IndexMap<String, String> {
        let imports = self.imports();
        match &self.transformer {
            Some(transform) => transform(imports, &self.dependencies),
            None => imports,
        }
    }
}
