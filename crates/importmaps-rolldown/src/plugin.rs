//! Rolldown plugin driving a [`BuildSession`] from the bundler's hooks.
//!
//! Input registration and chunk emission happen before the bundler is built
//! (see [`crate::build`]). The plugin serves the passthrough modules of the
//! virtual-modules strategy and, once chunks are named, reconciles the
//! registry and appends the published import map to the bundle.

use std::borrow::Cow;
use std::sync::Arc;

use anyhow::Context;
use importmaps::{
    BuildSession, ImportMap, ModuleSideEffects, OutputChunkInfo, PassthroughModule,
    VirtualChunkResolver,
};
use parking_lot::Mutex;
use rolldown_common::side_effects::HookSideEffects;
use rolldown_common::{ModuleType, Output, OutputAsset, ResolvedExternal};
use rolldown_plugin::{
    HookGenerateBundleArgs, HookLoadArgs, HookLoadOutput, HookLoadReturn, HookNoopReturn,
    HookResolveIdArgs, HookResolveIdOutput, HookResolveIdReturn, HookUsage, Plugin, PluginContext,
};

/// An HTML page that receives the import map before it is emitted.
#[derive(Debug, Clone)]
pub struct HtmlTemplate {
    /// Output path relative to the output directory.
    pub file_name: String,
    pub source: String,
}

pub struct ImportMapsPlugin {
    session: Arc<Mutex<BuildSession>>,
    resolver: Option<Arc<VirtualChunkResolver>>,
    json_file: Option<String>,
    html: Option<HtmlTemplate>,
    published: Arc<Mutex<Option<ImportMap>>>,
}

impl std::fmt::Debug for ImportMapsPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImportMapsPlugin")
            .field("phase", &self.session.lock().phase())
            .field("json_file", &self.json_file)
            .field("html", &self.html.as_ref().map(|t| &t.file_name))
            .finish()
    }
}

impl ImportMapsPlugin {
    /// Wrap a session whose inputs are registered and chunks emitted.
    pub fn new(session: BuildSession) -> Self {
        let resolver = session.passthrough_resolver();
        Self {
            session: Arc::new(Mutex::new(session)),
            resolver,
            json_file: None,
            html: None,
            published: Arc::new(Mutex::new(None)),
        }
    }

    /// Also emit the map as a standalone JSON asset.
    pub fn with_json_file(mut self, file_name: Option<String>) -> Self {
        self.json_file = file_name;
        self
    }

    pub fn with_html(mut self, template: Option<HtmlTemplate>) -> Self {
        self.html = template;
        self
    }

    /// Handle to the map published by `generate_bundle`.
    pub fn published(&self) -> Arc<Mutex<Option<ImportMap>>> {
        Arc::clone(&self.published)
    }
}

impl Plugin for ImportMapsPlugin {
    fn name(&self) -> Cow<'static, str> {
        "importmaps".into()
    }

    fn register_hook_usage(&self) -> HookUsage {
        HookUsage::ResolveId | HookUsage::Load | HookUsage::GenerateBundle
    }

    fn resolve_id(
        &self,
        _ctx: &PluginContext,
        args: &HookResolveIdArgs,
    ) -> impl std::future::Future<Output = HookResolveIdReturn> + Send {
        let specifier = args.specifier.to_string();
        let resolver = self.resolver.clone();

        async move {
            let Some(id) = resolver.and_then(|r| r.resolve_id(&specifier)) else {
                return Ok(None);
            };
            Ok(Some(HookResolveIdOutput {
                id: id.into(),
                external: Some(ResolvedExternal::Bool(false)),
                ..Default::default()
            }))
        }
    }

    fn load(
        &self,
        _ctx: &PluginContext,
        args: &HookLoadArgs<'_>,
    ) -> impl std::future::Future<Output = HookLoadReturn> + Send {
        let id = args.id.to_string();
        let resolver = self.resolver.clone();

        async move {
            let Some(resolver) = resolver else {
                return Ok(None);
            };
            let module = resolver
                .load(&id)
                .await
                .with_context(|| format!("Failed to generate passthrough module {}", id.escape_debug()))?;

            Ok(module.map(load_output))
        }
    }

    fn generate_bundle(
        &self,
        _ctx: &PluginContext,
        args: &mut HookGenerateBundleArgs<'_>,
    ) -> impl std::future::Future<Output = HookNoopReturn> + Send {
        let session = Arc::clone(&self.session);
        let published = Arc::clone(&self.published);
        let json_file = self.json_file.clone();
        let html = self.html.clone();

        async move {
            let chunks: Vec<OutputChunkInfo> = args
                .bundle
                .iter()
                .filter_map(|output| match output {
                    Output::Chunk(chunk) => Some(OutputChunkInfo {
                        name: chunk.name.to_string(),
                        file_name: chunk.filename.to_string(),
                        facade_module_id: chunk.facade_module_id.as_ref().map(|id| id.to_string()),
                        is_entry: chunk.is_entry,
                    }),
                    Output::Asset(_) => None,
                })
                .collect();

            let map = {
                let mut session = session.lock();
                let registered = session
                    .reconcile(&chunks)
                    .context("Failed to reconcile shared chunks")?;
                tracing::debug!(registered, chunks = chunks.len(), "reconciled output");
                session.publish().context("Failed to publish import map")?
            };

            let mut assets = Vec::new();
            if let Some(file_name) = json_file {
                assets.push(asset(file_name, map.to_pretty_json()));
            }
            if let Some(template) = html {
                assets.push(asset(template.file_name, map.inject_html(&template.source)));
            }
            args.bundle.extend(assets);

            *published.lock() = Some(map);
            Ok(())
        }
    }
}

fn load_output(module: PassthroughModule) -> HookLoadOutput {
    let side_effects = match module.side_effects {
        ModuleSideEffects::NoTreeshake => HookSideEffects::NoTreeshake,
    };
    HookLoadOutput {
        code: module.code.into(),
        module_type: Some(ModuleType::Js),
        side_effects: Some(side_effects),
        ..Default::default()
    }
}

fn asset(file_name: String, source: String) -> Output {
    Output::Asset(Arc::new(OutputAsset {
        names: vec![],
        original_file_names: vec![],
        filename: file_name.into(),
        source: source.into(),
    }))
}
