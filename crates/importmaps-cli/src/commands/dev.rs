//! `importmaps dev`.

use std::sync::Arc;

use importmaps_rolldown::FsModuleHost;

use crate::cli::DevArgs;
use crate::commands::{config_loader, current_dir, load_project};
use crate::error::Result;
use crate::server::DevServer;
use crate::ui;

pub async fn execute(args: DevArgs) -> Result<()> {
    let cwd = current_dir()?;
    let mut loader = config_loader(&args.config, &cwd)?;

    let mut dev = serde_json::Map::new();
    if let Some(port) = args.port {
        dev.insert("port".into(), port.into());
    }
    if let Some(host) = args.host {
        dev.insert("host".into(), host.into());
    }
    if !dev.is_empty() {
        loader = loader.set("dev", serde_json::Value::Object(dev));
    }

    let project = load_project(loader, &cwd)?;

    let maps = project.maps()?;
    let seed = project
        .config
        .options
        .shared
        .iter()
        .map(|dep| dep.name())
        .collect::<Vec<_>>()
        .join(",");
    let host = Arc::new(FsModuleHost::new(&project.root).with_hash_seed(seed));
    let resolver = Arc::new(maps.dev_resolver(&project.root, host.clone(), host));

    let resolved = resolver.resolve_dependencies().await;
    ui::info(&format!(
        "Resolved {resolved} of {} shared dependencies",
        project.config.options.shared.len()
    ));

    DevServer::new(project.root, project.config.dev, resolver)
        .with_json_file(maps.import_map_file_name())
        .start()
        .await
}
