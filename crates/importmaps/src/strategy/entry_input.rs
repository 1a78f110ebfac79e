use indexmap::IndexMap;

use super::BuildStrategy;
use crate::host::{ChunkEmitter, HostInputOptions, InputOptions, OutputChunkInfo, PreserveSignature};
use crate::options::StrategyKind;
use crate::registry::{ChunkEntrypoint, Registry};
use crate::{Error, Result};

const COMPONENT: &str = "build:entry-as-input";

/// Adds every shared dependency to the host's named inputs.
///
/// Chunks are matched back by their logical name, which the host derives from
/// the input key.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntryAsInput;

impl BuildStrategy for EntryAsInput {
    fn kind(&self) -> StrategyKind {
        StrategyKind::EntryAsInput
    }

    fn register_inputs(&self, registry: &Registry, options: &mut HostInputOptions) -> Result<()> {
        let mut inputs = match options.input.take() {
            None => IndexMap::new(),
            Some(InputOptions::Map(map)) => map,
            Some(other) => {
                let kind = other.kind();
                options.input = Some(other);
                tracing::error!(input = kind, "shared dependencies need named inputs");
                return Err(Error::invalid_input(COMPONENT, "Input options must be an object"));
            }
        };

        for input in registry.inputs() {
            tracing::debug!(name = %input.entrypoint, id = %input.id_to_resolve, "injecting input");
            inputs.insert(input.entrypoint.clone(), input.id_to_resolve.clone());
        }

        options.input = Some(InputOptions::Map(inputs));
        options.preserve_entry_signatures = Some(PreserveSignature::Strict);
        Ok(())
    }

    fn emit_chunks(&self, _registry: &Registry, _emitter: &mut dyn ChunkEmitter) -> Result<()> {
        Ok(())
    }

    fn match_chunk<'a>(
        &self,
        registry: &'a Registry,
        chunk: &OutputChunkInfo,
    ) -> Option<&'a ChunkEntrypoint> {
        registry
            .inputs()
            .iter()
            .find(|input| input.entrypoint == chunk.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::SharedDependency;

    fn registry() -> Registry {
        let mut registry = Registry::new(
            vec![
                SharedDependency::new("react"),
                SharedDependency::with_entry("@app/ui", "./src/ui.ts"),
            ],
            "shared",
        )
        .unwrap();
        for dep in registry.declarations().to_vec() {
            registry.add_input(&dep).unwrap();
        }
        registry
    }

    #[test]
    fn merges_into_existing_mapping() {
        let mut options = HostInputOptions {
            input: Some(InputOptions::Map(IndexMap::from([(
                "main".to_string(),
                "./index.html".to_string(),
            )]))),
            preserve_entry_signatures: None,
        };
        EntryAsInput.register_inputs(&registry(), &mut options).unwrap();

        let Some(InputOptions::Map(map)) = options.input else {
            panic!("expected a mapping");
        };
        assert_eq!(map["main"], "./index.html");
        assert_eq!(map["shared/react"], "react");
        assert_eq!(map["shared/@app_ui"], "./src/ui.ts");
        assert_eq!(options.preserve_entry_signatures, Some(PreserveSignature::Strict));
    }

    #[test]
    fn missing_input_becomes_mapping() {
        let mut options = HostInputOptions::default();
        EntryAsInput.register_inputs(&registry(), &mut options).unwrap();
        assert!(matches!(options.input, Some(InputOptions::Map(ref m)) if m.len() == 2));
    }

    #[test]
    fn list_and_string_inputs_are_fatal() {
        for input in [
            InputOptions::List(vec!["./index.html".into()]),
            InputOptions::Single("./index.html".into()),
        ] {
            let mut options = HostInputOptions {
                input: Some(input.clone()),
                preserve_entry_signatures: None,
            };
            let err = EntryAsInput.register_inputs(&registry(), &mut options).unwrap_err();
            assert!(err.is_fatal());
            assert!(err.to_string().starts_with("[importmaps:build:entry-as-input]"));
            assert_eq!(options.input, Some(input));
        }
    }

    #[test]
    fn matches_chunks_by_logical_name() {
        let registry = registry();
        let chunk = OutputChunkInfo {
            name: "shared/react".into(),
            file_name: "assets/shared/react-abc.js".into(),
            facade_module_id: Some("/nm/react/index.js".into()),
            is_entry: true,
        };
        let matched = EntryAsInput.match_chunk(&registry, &chunk).unwrap();
        assert_eq!(matched.original_dependency_name, "react");

        let other = OutputChunkInfo {
            name: "main".into(),
            ..chunk
        };
        assert!(EntryAsInput.match_chunk(&registry, &other).is_none());
    }
}
