//! `importmaps print`.

use std::sync::Arc;

use importmaps_rolldown::FsModuleHost;

use crate::cli::PrintArgs;
use crate::commands::{config_loader, current_dir, load_project};
use crate::error::Result;

/// Resolve every shared dependency once and print the dev import map.
pub async fn execute(args: PrintArgs) -> Result<()> {
    let cwd = current_dir()?;
    let project = load_project(config_loader(&args.config, &cwd)?, &cwd)?;
    let maps = project.maps()?;

    let host = Arc::new(FsModuleHost::new(&project.root));
    let resolver = maps.dev_resolver(&project.root, host.clone(), host);
    let map = resolver.import_map().await;

    println!("{}", map.to_pretty_json());
    Ok(())
}
