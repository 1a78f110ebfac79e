use std::path::PathBuf;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::Result;
use crate::dev::DevResolver;
use crate::host::{ModuleHost, OptimizerState};
use crate::options::{ImportMapsOptions, StrategyKind};
use crate::shape::{ExportShapeOracle, HeuristicOracle, StrictOracle};
use crate::publish::ImportMap;
use crate::registry::{RegisteredDependency, Registry, SharedRegistry};
use crate::session::BuildSession;
use crate::strategy;

/// Entry point tying options, registry and strategies together.
///
/// Construct one per configuration load. Its registry lives as long as the
/// instance; each build pass gets its own [`BuildSession`].
///
/// ```
/// use importmaps::{ImportMaps, ImportMapsOptions};
///
/// let maps = ImportMaps::new(ImportMapsOptions::new(["react", "react-dom"]).shared_out_dir("shared"))?;
/// assert_eq!(maps.registry().read().declarations().len(), 2);
/// # Ok::<(), importmaps::Error>(())
/// ```
pub struct ImportMaps {
    options: ImportMapsOptions,
    registry: SharedRegistry,
}

impl ImportMaps {
    pub fn new(options: ImportMapsOptions) -> Result<Self> {
        let registry = Registry::from_options(&options)?.into_shared();
        Ok(Self { options, registry })
    }

    /// Install a transformer applied to the `imports` object before publication.
    pub fn with_transformer<F>(self, transformer: F) -> Self
    where
        F: Fn(IndexMap<String, String>, &IndexMap<String, RegisteredDependency>) -> IndexMap<String, String>
            + Send
            + Sync
            + 'static,
    {
        self.registry.write().set_transformer(Arc::new(transformer));
        self
    }

    pub fn options(&self) -> &ImportMapsOptions {
        &self.options
    }

    pub fn registry(&self) -> SharedRegistry {
        Arc::clone(&self.registry)
    }

    pub fn strategy_kind(&self) -> StrategyKind {
        self.options.build_options.strategy
    }

    pub fn oracle(&self) -> Arc<dyn ExportShapeOracle> {
        if self.options.strict_exports {
            Arc::new(StrictOracle)
        } else {
            Arc::new(HeuristicOracle)
        }
    }

    /// Start a production build pass rooted at `root`.
    pub fn build_session(&self, root: impl Into<PathBuf>, host: Arc<dyn ModuleHost>) -> BuildSession {
        let strategy = strategy::create(
            self.strategy_kind(),
            root,
            Arc::clone(&self.registry),
            host,
            self.oracle(),
        );
        BuildSession::new(Arc::clone(&self.registry), strategy)
    }

    pub fn dev_resolver(
        &self,
        root: impl Into<PathBuf>,
        host: Arc<dyn ModuleHost>,
        optimizer: Arc<dyn OptimizerState>,
    ) -> DevResolver {
        DevResolver::new(root, Arc::clone(&self.registry), host, optimizer)
    }

    /// The import map as currently registered.
    pub fn import_map(&self) -> ImportMap {
        ImportMap::from_imports(self.registry.read().published_imports())
    }

    /// Name of the standalone JSON resource, if enabled.
    pub fn import_map_file_name(&self) -> Option<String> {
        self.options.output_as_file.file_name()
    }
}
