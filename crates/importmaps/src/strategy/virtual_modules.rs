use std::path::{Path, PathBuf};
use std::sync::Arc;

use path_clean::PathClean;

use super::BuildStrategy;
use crate::Result;
use crate::host::{
    ChunkEmitter, EmittedChunk, HostInputOptions, ModuleHost, OutputChunkInfo, PreserveSignature,
};
use crate::options::StrategyKind;
use crate::passthrough::{PassthroughModule, is_virtual_id, passthrough_source, virtual_id};
use crate::shape::{ExportShapeOracle, strip_query};
use crate::registry::{ChunkEntrypoint, Registry, SharedRegistry};

/// Resolves and loads the synthetic passthrough modules.
pub struct VirtualChunkResolver {
    registry: SharedRegistry,
    host: Arc<dyn ModuleHost>,
    oracle: Arc<dyn ExportShapeOracle>,
}

impl VirtualChunkResolver {
    pub fn new(
        registry: SharedRegistry,
        host: Arc<dyn ModuleHost>,
        oracle: Arc<dyn ExportShapeOracle>,
    ) -> Self {
        Self {
            registry,
            host,
            oracle,
        }
    }

    fn entry_for(&self, id: &str) -> Option<ChunkEntrypoint> {
        if !is_virtual_id(id) {
            return None;
        }
        self.registry
            .read()
            .inputs()
            .iter()
            .find(|input| !input.is_local_file && virtual_id(&input.original_dependency_name) == id)
            .cloned()
    }

    /// Claim a synthetic id. Unknown ids are left to the host.
    pub fn resolve_id(&self, id: &str) -> Option<String> {
        self.entry_for(id).map(|_| id.to_string())
    }

    /// Generate the passthrough module for a synthetic id.
    ///
    /// Returns `Ok(None)` for ids this resolver does not own and for
    /// dependencies the host cannot resolve.
    pub async fn load(&self, id: &str) -> Result<Option<PassthroughModule>> {
        let Some(entry) = self.entry_for(id) else {
            return Ok(None);
        };

        let Some(resolved) = self.host.resolve(&entry.id_to_resolve, None).await else {
            tracing::warn!(
                dependency = %entry.original_dependency_name,
                specifier = %entry.id_to_resolve,
                "shared dependency could not be resolved"
            );
            return Ok(None);
        };

        let shape = self
            .oracle
            .detect(self.host.as_ref(), &entry.id_to_resolve, &resolved.id)
            .await?;
        Ok(Some(passthrough_source(&entry.id_to_resolve, shape)))
    }
}

/// Emits one chunk per shared dependency: a passthrough module for packages,
/// the file itself for local entries.
pub struct VirtualModules {
    root: PathBuf,
    resolver: Arc<VirtualChunkResolver>,
}

impl VirtualModules {
    pub fn new(
        root: impl Into<PathBuf>,
        registry: SharedRegistry,
        host: Arc<dyn ModuleHost>,
        oracle: Arc<dyn ExportShapeOracle>,
    ) -> Self {
        // host facade ids are absolute, so local entries must be too
        let root = root.into();
        let root = std::path::absolute(&root).unwrap_or(root).clean();
        Self {
            root,
            resolver: Arc::new(VirtualChunkResolver::new(registry, host, oracle)),
        }
    }

    fn local_path(&self, input: &ChunkEntrypoint) -> PathBuf {
        self.root.join(&input.id_to_resolve).clean()
    }

    fn chunk_id(&self, input: &ChunkEntrypoint) -> String {
        if input.is_local_file {
            self.local_path(input).to_string_lossy().into_owned()
        } else {
            virtual_id(&input.original_dependency_name)
        }
    }
}

impl BuildStrategy for VirtualModules {
    fn kind(&self) -> StrategyKind {
        StrategyKind::VirtualModules
    }

    fn register_inputs(&self, _registry: &Registry, _options: &mut HostInputOptions) -> Result<()> {
        Ok(())
    }

    fn emit_chunks(&self, registry: &Registry, emitter: &mut dyn ChunkEmitter) -> Result<()> {
        for input in registry.inputs() {
            let id = self.chunk_id(input);
            tracing::debug!(name = %input.entrypoint, id = %id.escape_debug(), "emitting shared chunk");
            emitter.emit_chunk(EmittedChunk {
                name: input.entrypoint.clone(),
                id,
                preserve_signature: PreserveSignature::Strict,
            });
        }
        Ok(())
    }

    fn passthrough_resolver(&self) -> Option<Arc<VirtualChunkResolver>> {
        Some(Arc::clone(&self.resolver))
    }

    fn match_chunk<'a>(
        &self,
        registry: &'a Registry,
        chunk: &OutputChunkInfo,
    ) -> Option<&'a ChunkEntrypoint> {
        let facade = strip_query(chunk.facade_module_id.as_deref()?);

        if is_virtual_id(facade) {
            return registry.inputs().iter().find(|input| {
                !input.is_local_file && virtual_id(&input.original_dependency_name) == facade
            });
        }

        let facade = Path::new(facade);
        if !facade.is_absolute() {
            return None;
        }
        let facade = facade.clean();
        registry
            .inputs()
            .iter()
            .find(|input| input.is_local_file && self.local_path(input) == facade)
    }
}
