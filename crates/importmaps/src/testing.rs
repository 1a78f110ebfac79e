//! In-memory [`ModuleHost`] for tests and embedding examples.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::host::{ModuleHost, ModuleInfo, OptimizerState, ResolvedModule};

/// Module host backed by hash maps, counting every resolution request.
#[derive(Debug, Default)]
pub struct MemoryHost {
    resolutions: FxHashMap<String, String>,
    modules: FxHashMap<String, ModuleInfo>,
    browser_hash: Mutex<Option<String>>,
    resolve_calls: AtomicUsize,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `specifier` resolve to `id`.
    pub fn with_resolution(mut self, specifier: &str, id: &str) -> Self {
        self.resolutions.insert(specifier.to_string(), id.to_string());
        self
    }

    pub fn with_module(mut self, info: ModuleInfo) -> Self {
        self.modules.insert(info.id.clone(), info);
        self
    }

    /// Register an ES module reachable through `specifier`.
    pub fn with_esm(self, specifier: &str, id: &str, has_default_export: bool) -> Self {
        let mut exports = vec!["named".to_string()];
        if has_default_export {
            exports.push("default".to_string());
        }
        self.with_resolution(specifier, id).with_module(ModuleInfo {
            id: id.to_string(),
            has_default_export,
            exports,
            commonjs: None,
        })
    }

    pub fn set_browser_hash(&self, hash: Option<&str>) {
        *self.browser_hash.lock() = hash.map(str::to_string);
    }

    pub fn resolve_calls(&self) -> usize {
        self.resolve_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModuleHost for MemoryHost {
    async fn resolve(&self, specifier: &str, _importer: Option<&str>) -> Option<ResolvedModule> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        self.resolutions
            .get(specifier)
            .map(|id| ResolvedModule::new(id.as_str()))
    }

    async fn module_info(&self, id: &str) -> Option<ModuleInfo> {
        self.modules.get(id).cloned()
    }
}

impl OptimizerState for MemoryHost {
    fn browser_hash(&self) -> Option<String> {
        self.browser_hash.lock().clone()
    }
}
