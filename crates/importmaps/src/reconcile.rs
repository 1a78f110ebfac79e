//! Map bundler output back onto shared dependencies.

use crate::host::OutputChunkInfo;
use crate::registry::{RegisteredDependency, Registry};
use crate::strategy::BuildStrategy;

/// URL of an emitted chunk, relative to the document it is published in.
pub fn chunk_url(file_name: &str) -> String {
    format!("./{}", file_name.trim_start_matches("./").replace('\\', "/"))
}

/// Replace the registry's dependency map with the shared chunks found in `chunks`.
///
/// Returns the number of registered dependencies.
pub fn reconcile_chunks(
    registry: &mut Registry,
    strategy: &dyn BuildStrategy,
    chunks: &[OutputChunkInfo],
) -> usize {
    registry.clear_dependencies();

    let matched: Vec<RegisteredDependency> = chunks
        .iter()
        .filter_map(|chunk| {
            strategy.match_chunk(registry, chunk).map(|input| {
                RegisteredDependency::new(
                    input.original_dependency_name.as_str(),
                    chunk_url(&chunk.file_name),
                )
            })
        })
        .collect();

    let mut registered = 0;
    for dependency in matched {
        if registry.add_dependency(dependency) {
            registered += 1;
        }
    }
    registered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::SharedDependency;
    use crate::strategy::EntryAsInput;

    #[test]
    fn clears_before_registering() {
        let mut registry = Registry::new(vec![SharedDependency::new("react")], "").unwrap();
        let dep = registry.declarations()[0].clone();
        registry.add_input(&dep).unwrap();
        registry.add_dependency(RegisteredDependency::new("react", "/@fs/stale.js"));

        let count = reconcile_chunks(&mut registry, &EntryAsInput, &[]);
        assert_eq!(count, 0);
        assert!(registry.dependencies().is_empty());

        let chunks = [OutputChunkInfo {
            name: "react".into(),
            file_name: "assets/react-1a2b.js".into(),
            facade_module_id: None,
            is_entry: true,
        }];
        assert_eq!(reconcile_chunks(&mut registry, &EntryAsInput, &chunks), 1);
        assert_eq!(registry.imports()["react"], "./assets/react-1a2b.js");
    }

    #[test]
    fn urls_are_explicitly_relative() {
        assert_eq!(chunk_url("assets/a.js"), "./assets/a.js");
        assert_eq!(chunk_url("./a.js"), "./a.js");
        assert_eq!(chunk_url("assets\\a.js"), "./assets/a.js");
    }
}
