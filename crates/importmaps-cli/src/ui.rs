//! Terminal output helpers.

use std::path::Path;
use std::time::Duration;

use console::style;
use importmaps::ImportMap;

pub fn success(message: &str) {
    eprintln!("{} {}", style("✓").green().bold(), message);
}

pub fn info(message: &str) {
    eprintln!("{} {}", style("ℹ").blue().bold(), message);
}

pub fn warning(message: &str) {
    eprintln!("{} {}", style("⚠").yellow().bold(), style(message).yellow());
}

/// Disable colors on stdout and stderr.
pub fn init_colors(no_color: bool) {
    if no_color || !crate::logger::should_use_colors() {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }
}

pub fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{size:.2} {}", UNITS[unit])
}

pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis < 1000 {
        format!("{millis}ms")
    } else {
        format!("{:.2}s", duration.as_secs_f64())
    }
}

/// Print written files and the published map.
pub fn print_build_summary(out_dir: &Path, files: &[(String, u64)], map: &ImportMap, elapsed: Duration) {
    eprintln!();
    for (name, size) in files {
        eprintln!(
            "  {}{}  {}",
            style(format!("{}/", out_dir.display())).dim(),
            style(name).cyan(),
            style(format_size(*size)).dim()
        );
    }
    eprintln!();

    if map.is_empty() {
        warning("No shared dependency produced a chunk");
    } else {
        for (specifier, url) in map.as_map() {
            eprintln!("  {} {} {}", style(specifier).bold(), style("→").dim(), url);
        }
        eprintln!();
    }

    success(&format!(
        "Built {} files with {} shared {} in {}",
        files.len(),
        map.len(),
        if map.len() == 1 { "dependency" } else { "dependencies" },
        format_duration(elapsed)
    ));
}
