//! Build strategies: how shared dependencies enter the bundler graph.
//!
//! Both strategies produce the same postcondition. After reconciliation every
//! shared dependency that produced a chunk is registered under its
//! `./<file name>` URL.

mod entry_input;
mod virtual_modules;

pub use entry_input::EntryAsInput;
pub use virtual_modules::{VirtualChunkResolver, VirtualModules};

use std::path::PathBuf;
use std::sync::Arc;

use crate::host::{ChunkEmitter, HostInputOptions, ModuleHost, OutputChunkInfo};
use crate::options::StrategyKind;
use crate::shape::ExportShapeOracle;
use crate::registry::{ChunkEntrypoint, Registry, SharedRegistry};
use crate::Result;

pub trait BuildStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Rewrite the host's input options before the module graph is frozen.
    fn register_inputs(&self, registry: &Registry, options: &mut HostInputOptions) -> Result<()>;

    /// Ask the host for extra chunks at build start.
    fn emit_chunks(&self, registry: &Registry, emitter: &mut dyn ChunkEmitter) -> Result<()>;

    /// Resolver and loader for synthetic modules, if the strategy generates any.
    fn passthrough_resolver(&self) -> Option<Arc<VirtualChunkResolver>> {
        None
    }

    /// The entrypoint an output chunk was built from.
    fn match_chunk<'a>(
        &self,
        registry: &'a Registry,
        chunk: &OutputChunkInfo,
    ) -> Option<&'a ChunkEntrypoint>;
}

/// Construct the strategy selected by `kind`.
pub fn create(
    kind: StrategyKind,
    root: impl Into<PathBuf>,
    registry: SharedRegistry,
    host: Arc<dyn ModuleHost>,
    oracle: Arc<dyn ExportShapeOracle>,
) -> Box<dyn BuildStrategy> {
    match kind {
        StrategyKind::EntryAsInput => Box::new(EntryAsInput),
        StrategyKind::VirtualModules => {
            Box::new(VirtualModules::new(root, registry, host, oracle))
        }
    }
}
