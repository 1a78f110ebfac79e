//! Synthetic passthrough modules of the virtual-modules strategy.

use crate::normalize::normalize_dependency_name;
use crate::shape::ExportShape;

/// Prefix of every synthetic chunk id. The leading NUL keeps other plugins away.
pub const VIRTUAL_PREFIX: &str = "\0virtual:import-map-chunk/";

/// Tree-shaking behaviour requested for a generated module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleSideEffects {
    /// Keep every statement, even if no importer uses it.
    NoTreeshake,
}

/// Source of a generated passthrough module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassthroughModule {
    pub code: String,
    pub side_effects: ModuleSideEffects,
}

pub fn virtual_id(name: &str) -> String {
    format!("{VIRTUAL_PREFIX}{}", normalize_dependency_name(name))
}

pub fn is_virtual_id(id: &str) -> bool {
    id.starts_with(VIRTUAL_PREFIX)
}

/// Render the re-export source for `specifier`.
pub fn passthrough_source(specifier: &str, shape: ExportShape) -> PassthroughModule {
    // JSON string literals are valid JS string literals
    let literal = serde_json::Value::from(specifier).to_string();
    let mut code = format!("export * from {literal};\n");
    if shape.has_default() {
        code.push_str(&format!("export {{ default }} from {literal};\n"));
    }
    PassthroughModule {
        code,
        side_effects: ModuleSideEffects::NoTreeshake,
    }
}
