//! Development-mode resolution.
//!
//! In dev there is no bundle to reconcile. Each HTML request resolves the
//! shared dependencies through the dev server and registers the URLs it would
//! serve them under. Results are cached per optimizer hash.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::join_all;
use parking_lot::Mutex;

use crate::host::{ModuleHost, OptimizerState};
use crate::shape::strip_query;
use crate::publish::ImportMap;
use crate::registry::{RegisteredDependency, SharedDependency, SharedRegistry};

#[derive(Debug, Clone)]
struct DevCache {
    hash: Option<String>,
    dependencies: Vec<RegisteredDependency>,
}

pub struct DevResolver {
    root: PathBuf,
    registry: SharedRegistry,
    host: Arc<dyn ModuleHost>,
    optimizer: Arc<dyn OptimizerState>,
    cache: Mutex<Option<DevCache>>,
}

impl DevResolver {
    pub fn new(
        root: impl Into<PathBuf>,
        registry: SharedRegistry,
        host: Arc<dyn ModuleHost>,
        optimizer: Arc<dyn OptimizerState>,
    ) -> Self {
        let root = root.into();
        Self {
            root: std::path::absolute(&root).unwrap_or(root),
            registry,
            host,
            optimizer,
            cache: Mutex::new(None),
        }
    }

    /// Make sure the registry holds a dev URL for every resolvable dependency.
    ///
    /// Resolves again only when the optimizer hash changed since the last call;
    /// otherwise the cached set is written back into the registry.
    /// Returns the number of dependencies resolved by this call, `0` on a cache hit.
    pub async fn resolve_dependencies(&self) -> usize {
        let hash = self.optimizer.browser_hash();
        let cached = self
            .cache
            .lock()
            .as_ref()
            .filter(|cache| cache.hash == hash)
            .map(|cache| cache.dependencies.clone());
        if let Some(dependencies) = cached {
            tracing::trace!(?hash, "dev import map cache hit");
            // the registry may have been cleared by a build pass since
            let mut registry = self.registry.write();
            for dependency in dependencies {
                registry.add_dependency(dependency);
            }
            return 0;
        }

        let declarations: Vec<SharedDependency> = self.registry.read().declarations().to_vec();
        let resolved = join_all(declarations.iter().map(|dep| self.resolve_one(dep))).await;
        let dependencies: Vec<RegisteredDependency> = resolved.into_iter().flatten().collect();

        {
            let mut registry = self.registry.write();
            for dependency in &dependencies {
                registry.add_dependency(dependency.clone());
            }
        }

        let count = dependencies.len();
        tracing::debug!(?hash, count, "resolved dev import map");
        *self.cache.lock() = Some(DevCache { hash, dependencies });
        count
    }

    async fn resolve_one(&self, dependency: &SharedDependency) -> Option<RegisteredDependency> {
        let resolved = self.host.resolve(&dependency.entry, None).await;
        match resolved {
            Some(module) if !module.external => Some(RegisteredDependency::new(
                dependency.name.as_str(),
                file_to_url(&module.id, &self.root),
            )),
            _ => {
                tracing::warn!(
                    dependency = %dependency.name,
                    entry = %dependency.entry,
                    "shared dependency could not be resolved"
                );
                None
            }
        }
    }

    /// Resolve if needed and return the import map to inject.
    pub async fn import_map(&self) -> ImportMap {
        self.resolve_dependencies().await;
        ImportMap::from_imports(self.registry.read().published_imports())
    }

    /// Resolve if needed and inject the import map into `html`.
    pub async fn transform_index_html(&self, html: &str) -> String {
        self.import_map().await.inject_html(html)
    }

    /// Forget the cached hash so the next request resolves again.
    pub fn invalidate(&self) {
        self.cache.lock().take();
    }
}

/// Dev-server URL of a resolved module id.
///
/// Files under `root` are served root-relative, other files through `/@fs/`.
/// Ids that are already URLs are kept, bare ids go through `/@id/`.
pub fn file_to_url(id: &str, root: &Path) -> String {
    let path_part = strip_query(id);
    let query = &id[path_part.len()..];
    let path = Path::new(path_part);

    let url = if let Ok(relative) = path.strip_prefix(root) {
        format!("/{}", relative.to_string_lossy().replace('\\', "/"))
    } else if path.is_absolute() && path.exists() {
        let absolute = path.to_string_lossy().replace('\\', "/");
        format!("/@fs/{}", absolute.trim_start_matches('/'))
    } else if path_part.starts_with('/') {
        path_part.to_string()
    } else {
        format!("/@id/{}", path_part.replace('\0', "__x00__"))
    };

    format!("{url}{query}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn urls_inside_root_are_root_relative() {
        let root = Path::new("/project");
        assert_eq!(
            file_to_url("/project/node_modules/.vite/deps/react.js?v=abc", root),
            "/node_modules/.vite/deps/react.js?v=abc"
        );
        assert_eq!(file_to_url("/project/src/ui.js", root), "/src/ui.js");
    }

    #[test]
    fn urls_outside_root_use_fs_prefix() {
        let outside = TempDir::new().unwrap();
        let file = outside.path().join("lib.js");
        std::fs::write(&file, "export default 1").unwrap();

        let url = file_to_url(&file.to_string_lossy(), Path::new("/project"));
        assert!(url.starts_with("/@fs/"));
        assert!(url.ends_with("/lib.js"));
    }

    #[test]
    fn url_ids_and_bare_ids() {
        let root = Path::new("/project");
        assert_eq!(file_to_url("/@react-refresh", root), "/@react-refresh");
        assert_eq!(file_to_url("virtual:thing", root), "/@id/virtual:thing");
    }
}
