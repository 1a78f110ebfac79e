//! Conversion between rolldown's input list and the engine's input options.
//!
//! Rolldown takes a flat `Vec<InputItem>`. It reads as a mapping when every
//! item carries a name, as a single entry when there is exactly one unnamed
//! item, and as a list otherwise.

use importmaps::{ChunkEmitter, EmittedChunk, InputOptions, PreserveSignature};
use indexmap::IndexMap;
use rolldown::InputItem;
use rolldown_common::PreserveEntrySignatures;

pub fn to_input_options(items: &[InputItem]) -> Option<InputOptions> {
    match items {
        [] => None,
        [InputItem { name: None, import }] => Some(InputOptions::Single(import.clone())),
        _ if items.iter().all(|item| item.name.is_some()) => {
            let map: IndexMap<String, String> = items
                .iter()
                .filter_map(|item| Some((item.name.clone()?, item.import.clone())))
                .collect();
            Some(InputOptions::Map(map))
        }
        _ => Some(InputOptions::List(
            items.iter().map(|item| item.import.clone()).collect(),
        )),
    }
}

pub fn to_input_items(options: Option<InputOptions>) -> Vec<InputItem> {
    match options {
        None => Vec::new(),
        Some(InputOptions::Single(import)) => vec![InputItem { name: None, import }],
        Some(InputOptions::List(imports)) => imports
            .into_iter()
            .map(|import| InputItem { name: None, import })
            .collect(),
        Some(InputOptions::Map(map)) => map
            .into_iter()
            .map(|(name, import)| InputItem {
                name: Some(name),
                import,
            })
            .collect(),
    }
}

/// Rolldown's setting for a requested signature policy.
pub fn to_preserve_entry_signatures(signature: PreserveSignature) -> PreserveEntrySignatures {
    match signature {
        PreserveSignature::Strict => PreserveEntrySignatures::Strict,
    }
}

/// Realises emitted chunks as named inputs.
///
/// The session emits before the bundler exists, so chunks are collected here
/// and appended to the input list. Rolldown only takes a bundle-wide
/// signature policy for inputs; the strictest requested one is kept.
#[derive(Debug, Default)]
pub struct InputItemEmitter {
    items: Vec<InputItem>,
    preserve_signature: Option<PreserveSignature>,
}

impl InputItemEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Signature policy requested by the emitted chunks, if any.
    pub fn preserve_signature(&self) -> Option<PreserveSignature> {
        self.preserve_signature
    }

    pub fn into_items(self) -> Vec<InputItem> {
        self.items
    }
}

impl ChunkEmitter for InputItemEmitter {
    fn emit_chunk(&mut self, chunk: EmittedChunk) {
        self.preserve_signature = Some(chunk.preserve_signature);
        self.items.push(InputItem {
            name: Some(chunk.name),
            import: chunk.id,
        });
    }
}
