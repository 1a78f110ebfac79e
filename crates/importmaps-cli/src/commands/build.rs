//! `importmaps build`.

use std::fs;
use std::time::Instant;

use importmaps_rolldown::{BuildRequest, build};
use serde_json::Value;

use crate::cli::BuildArgs;
use crate::commands::{config_loader, current_dir, load_project};
use crate::error::{CliError, Result};
use crate::ui;

pub async fn execute(args: BuildArgs) -> Result<()> {
    let start = Instant::now();
    let cwd = current_dir()?;

    let mut loader = config_loader(&args.config, &cwd)?
        .set_opt("out_dir", args.out_dir.as_ref().map(|p| p.to_string_lossy().into_owned()))
        .set_opt("html", args.html.as_ref().map(|p| p.to_string_lossy().into_owned()));
    if !args.entries.is_empty() {
        loader = loader.set("entries", args.entries.clone());
    }
    if let Some(name) = &args.json {
        let value = if name.is_empty() { Value::Bool(true) } else { Value::String(name.clone()) };
        loader = loader.set("output_as_file", value);
    }

    let project = load_project(loader, &cwd)?;
    let maps = project.maps()?;

    let mut request = BuildRequest::new(&project.root);
    for entry in &project.config.entries {
        request = request.entry(entry.as_str());
    }
    if let Some(html) = &project.config.html {
        if project.path(html).is_file() {
            request = request.html(html);
        } else if args.html.is_some() {
            return Err(CliError::FileNotFound(project.path(html)));
        } else {
            tracing::debug!(html = %html.display(), "no html template, skipping injection");
        }
    }

    let output = build(&maps, request).await?;

    let out_dir = project.path(&project.config.out_dir);
    output.write_to(&out_dir)?;

    let files = output
        .file_names()
        .into_iter()
        .map(|name| {
            let size = fs::metadata(out_dir.join(&name)).map(|m| m.len()).unwrap_or(0);
            (name, size)
        })
        .collect::<Vec<_>>();

    ui::print_build_summary(&out_dir, &files, &output.import_map, start.elapsed());
    Ok(())
}
