//! Filesystem-backed module host.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use path_clean::PathClean;
use rustc_hash::FxHashMap;

use importmaps::host::{CommonJsMeta, ModuleHost, ModuleInfo, OptimizerState, RequiredModule, ResolvedModule};
use importmaps::shape::strip_query;

use crate::scan::scan_module;

/// Files whose content decides whether optimized dependencies are stale.
const LOCKFILES: &[&str] = &[
    "package-lock.json",
    "npm-shrinkwrap.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "bun.lockb",
    "bun.lock",
    "package.json",
];

/// Resolves with `oxc_resolver` and reads export metadata from disk.
pub struct FsModuleHost {
    root: PathBuf,
    resolver: Arc<oxc_resolver::Resolver>,
    modules: RwLock<FxHashMap<String, ModuleInfo>>,
    hash_seed: String,
}

impl std::fmt::Debug for FsModuleHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsModuleHost")
            .field("root", &self.root)
            .field("cached_modules", &self.modules.read().len())
            .finish()
    }
}

impl FsModuleHost {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let resolver = oxc_resolver::Resolver::new(oxc_resolver::ResolveOptions {
            condition_names: vec![
                "browser".into(),
                "import".into(),
                "module".into(),
                "default".into(),
            ],
            main_fields: vec!["browser".into(), "module".into(), "main".into()],
            extensions: vec![
                ".js".into(),
                ".mjs".into(),
                ".cjs".into(),
                ".ts".into(),
                ".tsx".into(),
                ".jsx".into(),
                ".json".into(),
            ],
            ..Default::default()
        });

        Self {
            root: root.into(),
            resolver: Arc::new(resolver),
            modules: RwLock::new(FxHashMap::default()),
            hash_seed: String::new(),
        }
    }

    /// Mix extra state (such as the declared dependency list) into [`OptimizerState::browser_hash`].
    pub fn with_hash_seed(mut self, seed: impl Into<String>) -> Self {
        self.hash_seed = seed.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve_from(&self, specifier: &str, from_dir: &Path) -> Option<PathBuf> {
        match self.resolver.resolve(from_dir, specifier) {
            Ok(resolution) => Some(resolution.path().to_path_buf()),
            Err(err) => {
                tracing::debug!(specifier, from = %from_dir.display(), error = ?err, "resolution failed");
                None
            }
        }
    }

    fn importer_dir(&self, importer: Option<&str>) -> PathBuf {
        match importer.map(|id| Path::new(strip_query(id))) {
            Some(path) if path.is_absolute() => path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| self.root.clone()),
            _ => self.root.clone(),
        }
    }

    async fn read_module(&self, path: &Path) -> Option<ModuleInfo> {
        let source = match tokio::fs::read_to_string(path).await {
            Ok(source) => source,
            Err(err) => {
                tracing::debug!(path = %path.display(), error = %err, "cannot read module");
                return None;
            }
        };

        let scan = scan_module(&source, path);
        let commonjs = if scan.is_commonjs {
            let dir = path.parent().unwrap_or(&self.root);
            let requires = scan
                .requires
                .iter()
                .map(|source| RequiredModule {
                    source: source.clone(),
                    resolved: self
                        .resolve_from(source, dir)
                        .map(|p| p.to_string_lossy().into_owned()),
                })
                .collect();
            Some(CommonJsMeta {
                is_commonjs: true,
                requires,
            })
        } else {
            None
        };

        Some(ModuleInfo {
            id: path.to_string_lossy().into_owned(),
            has_default_export: scan.has_default_export,
            exports: scan.exports,
            commonjs,
        })
    }
}

#[async_trait]
impl ModuleHost for FsModuleHost {
    async fn resolve(&self, specifier: &str, importer: Option<&str>) -> Option<ResolvedModule> {
        let from_dir = self.importer_dir(importer);
        let path = self.resolve_from(specifier, &from_dir)?;
        Some(ResolvedModule::new(path.to_string_lossy().into_owned()))
    }

    async fn module_info(&self, id: &str) -> Option<ModuleInfo> {
        let id = strip_query(id);
        if let Some(info) = self.modules.read().get(id) {
            return Some(info.clone());
        }

        let path = self.root.join(id).clean();
        let info = self.read_module(&path).await?;
        self.modules.write().insert(id.to_string(), info.clone());
        Some(info)
    }
}

impl OptimizerState for FsModuleHost {
    /// Short digest of the lockfiles plus the hash seed, `None` when neither exists.
    fn browser_hash(&self) -> Option<String> {
        let mut hasher = blake3::Hasher::new();
        let mut inputs = 0;

        if !self.hash_seed.is_empty() {
            hasher.update(self.hash_seed.as_bytes());
            inputs += 1;
        }
        for name in LOCKFILES {
            if let Ok(content) = std::fs::read(self.root.join(name)) {
                hasher.update(name.as_bytes());
                hasher.update(&content);
                inputs += 1;
            }
        }

        (inputs > 0).then(|| hasher.finalize().to_hex()[..8].to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        let pkg = dir.path().join("node_modules/legacy");
        fs::create_dir_all(pkg.join("cjs")).unwrap();
        fs::write(
            pkg.join("package.json"),
            r#"{ "name": "legacy", "main": "index.js" }"#,
        )
        .unwrap();
        fs::write(
            pkg.join("index.js"),
            "module.exports = require('./cjs/legacy.js');",
        )
        .unwrap();
        fs::write(pkg.join("cjs/legacy.js"), "exports.answer = 42;").unwrap();
        dir
    }

    #[tokio::test]
    async fn resolves_packages_from_root() {
        let dir = fixture();
        let host = FsModuleHost::new(dir.path());
        let resolved = host.resolve("legacy", None).await.unwrap();
        assert!(resolved.id.ends_with("index.js"));
        assert!(host.resolve("not-installed", None).await.is_none());
    }

    #[tokio::test]
    async fn reads_commonjs_metadata_with_resolved_requires() {
        let dir = fixture();
        let host = FsModuleHost::new(dir.path());
        let resolved = host.resolve("legacy", None).await.unwrap();
        let info = host.module_info(&resolved.id).await.unwrap();

        assert!(info.is_commonjs());
        let requires = &info.commonjs.as_ref().unwrap().requires;
        assert_eq!(requires.len(), 1);
        assert!(requires[0].resolved.as_deref().unwrap().ends_with("legacy.js"));
    }

    #[test]
    fn browser_hash_tracks_lockfiles_and_seed() {
        let dir = TempDir::new().unwrap();
        let host = FsModuleHost::new(dir.path());
        assert_eq!(host.browser_hash(), None);

        fs::write(dir.path().join("package-lock.json"), "{}").unwrap();
        let first = host.browser_hash().unwrap();
        assert_eq!(first.len(), 8);

        let seeded = FsModuleHost::new(dir.path()).with_hash_seed("react,react-dom");
        assert_ne!(seeded.browser_hash().unwrap(), first);

        fs::write(dir.path().join("package-lock.json"), r#"{"lockfileVersion":3}"#).unwrap();
        assert_ne!(host.browser_hash().unwrap(), first);
    }
}
