//! One production build pass as an explicit state machine.
//!
//! ```text
//! Init -> InputRegistration -> Emission -> Reconciliation -> Publication
//! ```
//!
//! Every step checks the phase it starts from, so a host that calls its hooks
//! out of order gets [`Error::PhaseOrder`] instead of a half-populated map.

use std::sync::Arc;

use crate::host::{ChunkEmitter, HostInputOptions, OutputChunkInfo};
use crate::publish::ImportMap;
use crate::reconcile::reconcile_chunks;
use crate::registry::SharedRegistry;
use crate::strategy::{BuildStrategy, VirtualChunkResolver};
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Init,
    InputRegistration,
    Emission,
    Reconciliation,
    Publication,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Phase::Init => "init",
            Phase::InputRegistration => "input-registration",
            Phase::Emission => "emission",
            Phase::Reconciliation => "reconciliation",
            Phase::Publication => "publication",
        };
        f.write_str(name)
    }
}

pub struct BuildSession {
    registry: SharedRegistry,
    strategy: Box<dyn BuildStrategy>,
    phase: Phase,
}

impl BuildSession {
    pub fn new(registry: SharedRegistry, strategy: Box<dyn BuildStrategy>) -> Self {
        Self {
            registry,
            strategy,
            phase: Phase::Init,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn strategy(&self) -> &dyn BuildStrategy {
        self.strategy.as_ref()
    }

    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    pub fn passthrough_resolver(&self) -> Option<Arc<VirtualChunkResolver>> {
        self.strategy.passthrough_resolver()
    }

    fn expect(&self, expected: Phase) -> Result<()> {
        if self.phase != expected {
            return Err(Error::PhaseOrder {
                expected,
                actual: self.phase,
            });
        }
        Ok(())
    }

    fn advance(&mut self, next: Phase) {
        tracing::debug!(from = %self.phase, to = %next, strategy = %self.strategy.kind(), "build phase");
        self.phase = next;
    }

    /// Derive entrypoints for every declaration and rewrite the host inputs.
    pub fn register_inputs(&mut self, options: &mut HostInputOptions) -> Result<()> {
        self.expect(Phase::Init)?;
        {
            let mut registry = self.registry.write();
            let declarations = registry.declarations().to_vec();
            for dependency in &declarations {
                registry.add_input(dependency)?;
            }
            self.strategy.register_inputs(&registry, options)?;
        }
        self.advance(Phase::InputRegistration);
        Ok(())
    }

    /// Build-start hook: emit the strategy's extra chunks.
    pub fn emit_chunks(&mut self, emitter: &mut dyn ChunkEmitter) -> Result<()> {
        self.expect(Phase::InputRegistration)?;
        self.strategy.emit_chunks(&self.registry.read(), emitter)?;
        self.advance(Phase::Emission);
        Ok(())
    }

    /// Generate-bundle hook: register the URL of every shared chunk.
    pub fn reconcile(&mut self, chunks: &[OutputChunkInfo]) -> Result<usize> {
        self.expect(Phase::Emission)?;
        let registered = reconcile_chunks(&mut self.registry.write(), self.strategy.as_ref(), chunks);
        self.advance(Phase::Reconciliation);
        Ok(registered)
    }

    /// Produce the import map of this pass.
    pub fn publish(&mut self) -> Result<ImportMap> {
        self.expect(Phase::Reconciliation)?;
        let map = ImportMap::from_imports(self.registry.read().published_imports());
        self.advance(Phase::Publication);
        Ok(map)
    }
}
