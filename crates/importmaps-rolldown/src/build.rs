//! One production build pass through rolldown.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use importmaps::{HostInputOptions, ImportMap, ImportMaps};
use path_clean::PathClean;
use rolldown::{BundleOutput, BundlerBuilder, BundlerOptions, InputItem, IsExternal, OutputFormat, Platform};
use rolldown_common::Output;
use rolldown_plugin::__inner::SharedPluginable;

use crate::host::FsModuleHost;
use crate::input::{
    InputItemEmitter, to_input_items, to_input_options, to_preserve_entry_signatures,
};
use crate::plugin::{HtmlTemplate, ImportMapsPlugin};
use crate::{Error, Result};

pub const DEFAULT_FILE_NAMES: &str = "assets/[name]-[hash].js";

/// What to bundle.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    pub root: PathBuf,
    /// Application inputs, in rolldown's own shape.
    pub input: Vec<InputItem>,
    /// HTML template (relative to `root`) that receives the import map.
    pub html: Option<PathBuf>,
    pub entry_file_names: String,
    pub chunk_file_names: String,
    pub external: Vec<String>,
}

impl BuildRequest {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            input: Vec::new(),
            html: None,
            entry_file_names: DEFAULT_FILE_NAMES.to_string(),
            chunk_file_names: DEFAULT_FILE_NAMES.to_string(),
            external: Vec::new(),
        }
    }

    /// Add an application entry named after its file stem.
    pub fn entry(mut self, import: impl Into<String>) -> Self {
        let import = import.into();
        let name = Path::new(&import)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned());
        self.input.push(InputItem { name, import });
        self
    }

    pub fn html(mut self, path: impl Into<PathBuf>) -> Self {
        self.html = Some(path.into());
        self
    }

    pub fn external(mut self, packages: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.external.extend(packages.into_iter().map(Into::into));
        self
    }
}

pub struct BuildOutput {
    pub bundle: BundleOutput,
    pub import_map: ImportMap,
}

impl std::fmt::Debug for BuildOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildOutput")
            .field("outputs", &self.file_names())
            .field("import_map", &self.import_map)
            .finish()
    }
}

impl BuildOutput {
    pub fn file_names(&self) -> Vec<String> {
        self.bundle
            .assets
            .iter()
            .map(|output| match output {
                Output::Chunk(chunk) => chunk.filename.to_string(),
                Output::Asset(asset) => asset.filename.to_string(),
            })
            .collect()
    }

    /// Write every chunk and asset below `dir`.
    pub fn write_to(&self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref().clean();
        for output in &self.bundle.assets {
            let (file_name, content) = match output {
                Output::Chunk(chunk) => (chunk.filename.as_str(), chunk.code.as_bytes()),
                Output::Asset(asset) => (asset.filename.as_str(), asset.source.as_bytes()),
            };
            let target = output_path(&dir, file_name)?;
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&target, content)?;
            tracing::debug!(path = %target.display(), "wrote output");
        }
        Ok(())
    }
}

fn output_path(dir: &Path, file_name: &str) -> Result<PathBuf> {
    let path = dir.join(Path::new(file_name).clean()).clean();
    if file_name.contains('\0') || !path.starts_with(dir) {
        return Err(Error::InvalidOutputPath(format!(
            "'{}' escapes output directory '{}'",
            file_name.escape_debug(),
            dir.display()
        )));
    }
    Ok(path)
}

/// Run a full pass: register inputs, emit shared chunks, bundle, publish.
pub async fn build(maps: &ImportMaps, request: BuildRequest) -> Result<BuildOutput> {
    // emitted local chunks and rolldown's facade ids are absolute, real paths
    let root = std::path::absolute(&request.root)?.clean();
    let root = root.canonicalize().unwrap_or(root);
    let seed = maps
        .options()
        .shared
        .iter()
        .map(|dep| dep.name())
        .collect::<Vec<_>>()
        .join(",");
    let host = Arc::new(FsModuleHost::new(&root).with_hash_seed(seed));
    let mut session = maps.build_session(&root, host);

    let mut input_options = HostInputOptions {
        input: to_input_options(&request.input),
        preserve_entry_signatures: None,
    };
    session.register_inputs(&mut input_options)?;
    let mut input = to_input_items(input_options.input);

    let mut emitter = InputItemEmitter::new();
    session.emit_chunks(&mut emitter)?;
    let preserve_signature = input_options
        .preserve_entry_signatures
        .or(emitter.preserve_signature());
    input.extend(emitter.into_items());

    if input.is_empty() {
        return Err(Error::NoInputs);
    }

    let html = match &request.html {
        Some(path) => {
            let source = tokio::fs::read_to_string(root.join(path)).await?;
            let file_name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| "index.html".to_string());
            Some(HtmlTemplate { file_name, source })
        }
        None => None,
    };

    let plugin = ImportMapsPlugin::new(session)
        .with_json_file(maps.import_map_file_name())
        .with_html(html);
    let published = plugin.published();
    let plugins: Vec<SharedPluginable> = vec![Arc::new(plugin)];

    tracing::info!(
        inputs = input.len(),
        strategy = %maps.strategy_kind(),
        root = %root.display(),
        "bundling"
    );

    let options = BundlerOptions {
        input: Some(input),
        cwd: Some(root.clone()),
        format: Some(OutputFormat::Esm),
        platform: Some(Platform::Browser),
        entry_filenames: Some(request.entry_file_names.into()),
        chunk_filenames: Some(request.chunk_file_names.into()),
        external: (!request.external.is_empty()).then(|| IsExternal::from(request.external)),
        preserve_entry_signatures: preserve_signature.map(to_preserve_entry_signatures),
        ..Default::default()
    };

    let mut bundler = BundlerBuilder::default()
        .with_options(options)
        .with_plugins(plugins)
        .build()
        .map_err(|e| Error::from_rolldown_batch(&e))?;

    let bundle = bundler
        .generate()
        .await
        .map_err(|e| Error::from_rolldown_batch(&e))?;

    for warning in &bundle.warnings {
        tracing::warn!("{warning:?}");
    }

    let import_map = published.lock().take().ok_or(Error::NotPublished)?;
    Ok(BuildOutput { bundle, import_map })
}
