//! Full build passes against a simulated bundler.

use std::sync::Arc;

use importmaps::testing::MemoryHost;
use importmaps::{
    EmittedChunk, HostInputOptions, ImportMap, ImportMaps, ImportMapsOptions, InputOptions,
    OutputChunkInfo, SharedDependencyConfig, StrategyKind,
};
use indexmap::IndexMap;

/// Stand-in for the bundler: names output files after chunk names, the way
/// `assets/[name]-[hash].js` does.
fn output_file(name: &str) -> String {
    format!("assets/{name}-{:08x}.js", name.len() * 2654435761 % 0xffff_ffff)
}

fn host() -> Arc<MemoryHost> {
    Arc::new(
        MemoryHost::new()
            .with_esm("shared-lib", "/project/node_modules/shared-lib/index.js", true)
            .with_esm("@scope/pkg", "/project/node_modules/@scope/pkg/index.mjs", false),
    )
}

/// Run one pass and return the published map.
async fn run_pass(maps: &ImportMaps, input: Option<InputOptions>) -> importmaps::Result<ImportMap> {
    let host = host();
    let mut session = maps.build_session("/project", host);

    let mut options = HostInputOptions {
        input,
        preserve_entry_signatures: None,
    };
    session.register_inputs(&mut options)?;

    let mut emitted: Vec<EmittedChunk> = Vec::new();
    session.emit_chunks(&mut emitted)?;

    let mut chunks = Vec::new();
    if let Some(InputOptions::Map(map)) = &options.input {
        for (name, id) in map {
            if let Some(resolver) = session.passthrough_resolver() {
                assert!(resolver.resolve_id(id).is_none());
            }
            chunks.push(OutputChunkInfo {
                name: name.clone(),
                file_name: output_file(name),
                facade_module_id: Some(id.clone()),
                is_entry: true,
            });
        }
    }
    for chunk in &emitted {
        if let Some(resolver) = session.passthrough_resolver() {
            if resolver.resolve_id(&chunk.id).is_some() {
                let module = resolver.load(&chunk.id).await?.expect("passthrough module");
                assert!(module.code.starts_with("export * from"));
            }
        }
        chunks.push(OutputChunkInfo {
            name: chunk.name.clone(),
            file_name: output_file(&chunk.name),
            facade_module_id: Some(chunk.id.clone()),
            is_entry: true,
        });
    }

    session.reconcile(&chunks)?;
    session.publish()
}

fn app_input() -> Option<InputOptions> {
    Some(InputOptions::Map(IndexMap::from([(
        "index".to_string(),
        "./index.html".to_string(),
    )])))
}

#[tokio::test]
async fn shared_lib_lands_under_shared_out_dir() {
    let maps = ImportMaps::new(ImportMapsOptions::new(["shared-lib"]).shared_out_dir("shared")).unwrap();
    let map = run_pass(&maps, app_input()).await.unwrap();

    let url = map.get("shared-lib").unwrap();
    assert!(url.starts_with("./assets/shared/shared-lib-"));
    assert_eq!(map.len(), 1);

    let html = map.inject_html("<html><head></head><body></body></html>");
    assert!(html.contains(&format!(
        r#"<script type="importmap">{{"imports":{{"shared-lib":"{url}"}}}}</script>"#
    )));
}

#[tokio::test]
async fn strategies_publish_identical_maps() {
    let shared = ["shared-lib", "@scope/pkg"];
    let entry = ImportMaps::new(ImportMapsOptions::new(shared).shared_out_dir("shared")).unwrap();
    let virt = ImportMaps::new(
        ImportMapsOptions::new(shared)
            .shared_out_dir("shared")
            .strategy(StrategyKind::VirtualModules),
    )
    .unwrap();

    let a = run_pass(&entry, app_input()).await.unwrap();
    let b = run_pass(&virt, app_input()).await.unwrap();
    assert_eq!(a, b);
    assert_eq!(a.get("@scope/pkg").unwrap(), format!("./{}", output_file("shared/@scope_pkg")));
}

#[tokio::test]
async fn repeated_passes_are_idempotent() {
    let maps = ImportMaps::new(ImportMapsOptions::new(["shared-lib", "@scope/pkg"])).unwrap();
    let first = run_pass(&maps, app_input()).await.unwrap();
    let second = run_pass(&maps, app_input()).await.unwrap();
    assert_eq!(first.to_json(), second.to_json());
    assert_eq!(maps.registry().read().inputs().len(), 2);
}

#[tokio::test]
async fn published_keys_are_declared_and_relative() {
    let maps = ImportMaps::new(
        ImportMapsOptions::new(["shared-lib"]).strategy(StrategyKind::VirtualModules),
    )
    .unwrap();
    let map = run_pass(&maps, None).await.unwrap();

    let declared: Vec<&str> = maps
        .options()
        .shared
        .iter()
        .map(SharedDependencyConfig::name)
        .collect();
    for (name, url) in map.as_map() {
        assert!(declared.contains(&name.as_str()));
        assert!(url.starts_with("./"));
    }
}

#[tokio::test]
async fn list_input_aborts_entry_strategy() {
    let maps = ImportMaps::new(ImportMapsOptions::new(["shared-lib"])).unwrap();
    let err = run_pass(&maps, Some(InputOptions::List(vec!["./index.html".into()])))
        .await
        .unwrap_err();
    assert!(err.is_fatal());
    assert!(maps.import_map().is_empty());
}

#[tokio::test]
async fn local_files_are_matched_by_absolute_path() {
    let maps = ImportMaps::new(
        ImportMapsOptions {
            shared: vec![SharedDependencyConfig::Detailed {
                name: "react".into(),
                entry: "./src/react-shim.js".into(),
            }],
            ..Default::default()
        }
        .strategy(StrategyKind::VirtualModules),
    )
    .unwrap();
    let map = run_pass(&maps, None).await.unwrap();
    assert_eq!(map.get("react").unwrap(), format!("./{}", output_file("react")));
}

#[tokio::test]
async fn transformer_rewrites_published_map() {
    let maps = ImportMaps::new(ImportMapsOptions::new(["shared-lib"]))
        .unwrap()
        .with_transformer(|imports, _entries| {
            imports
                .into_iter()
                .map(|(name, url)| (name, url.replacen("./", "https://cdn.example/", 1)))
                .collect()
        });
    let map = run_pass(&maps, app_input()).await.unwrap();
    assert!(map.get("shared-lib").unwrap().starts_with("https://cdn.example/assets/"));
}
