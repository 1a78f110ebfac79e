//! Static export scan of a module on disk.
//!
//! ES modules are read from the oxc AST. Files without module syntax are
//! checked for CommonJS patterns, which the bundler wraps for interop.

use std::path::Path;
use std::sync::LazyLock;

use oxc_allocator::Allocator;
use oxc_ast::ast::{BindingPatternKind, Declaration, ModuleDeclaration, ModuleExportName};
use oxc_parser::{Parser, ParserReturn};
use oxc_span::SourceType;
use regex::Regex;

use importmaps::shape::COMMONJS_INTEROP_MARKER;

static COMMONJS_EXPORTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bmodule\.exports\b|\bexports\.[A-Za-z_$][\w$]*\s*=")
        .expect("static CommonJS exports pattern")
});

static COMMONJS_NAMED_EXPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bexports\.([A-Za-z_$][\w$]*)\s*=").expect("static CommonJS named export pattern")
});

static REQUIRE_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\brequire\(\s*["']([^"']+)["']\s*\)"#).expect("static require pattern")
});

/// What a scan found out about a module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleScan {
    pub has_default_export: bool,
    pub exports: Vec<String>,
    pub is_commonjs: bool,
    /// Specifiers passed to `require()`, in source order.
    pub requires: Vec<String>,
}

pub fn scan_module(source: &str, path: &Path) -> ModuleScan {
    let allocator = Allocator::default();
    let source_type = SourceType::from_path(path).unwrap_or(SourceType::mjs());
    let ParserReturn { program, errors, .. } = Parser::new(&allocator, source, source_type).parse();

    let mut scan = ModuleScan::default();
    let mut has_module_syntax = false;

    if errors.is_empty() {
        for stmt in program.body.iter() {
            let Some(decl) = stmt.as_module_declaration() else {
                continue;
            };
            has_module_syntax = true;
            match decl {
                ModuleDeclaration::ExportDefaultDeclaration(_) => {
                    scan.push_export("default".to_string());
                }
                ModuleDeclaration::ExportNamedDeclaration(named) => {
                    for spec in &named.specifiers {
                        scan.push_export(export_name(&spec.exported));
                    }
                    match &named.declaration {
                        Some(Declaration::FunctionDeclaration(func)) => {
                            if let Some(id) = &func.id {
                                scan.push_export(id.name.to_string());
                            }
                        }
                        Some(Declaration::ClassDeclaration(class)) => {
                            if let Some(id) = &class.id {
                                scan.push_export(id.name.to_string());
                            }
                        }
                        Some(Declaration::VariableDeclaration(var)) => {
                            for declarator in &var.declarations {
                                if let BindingPatternKind::BindingIdentifier(ident) = &declarator.id.kind {
                                    scan.push_export(ident.name.to_string());
                                }
                            }
                        }
                        _ => {}
                    }
                }
                ModuleDeclaration::ExportAllDeclaration(all) => {
                    // `export * from` never re-exports default
                    if let Some(exported) = &all.exported {
                        scan.push_export(export_name(exported));
                    }
                }
                _ => {}
            }
        }
    }

    if !has_module_syntax && COMMONJS_EXPORTS.is_match(source) {
        scan.is_commonjs = true;
        scan.requires = REQUIRE_CALL
            .captures_iter(source)
            .map(|caps| caps[1].to_string())
            .collect();
        for caps in COMMONJS_NAMED_EXPORT.captures_iter(source) {
            scan.push_export(caps[1].to_string());
        }
        scan.push_export(COMMONJS_INTEROP_MARKER.to_string());
    }

    scan
}

impl ModuleScan {
    fn push_export(&mut self, name: String) {
        if name == "default" {
            self.has_default_export = true;
        }
        if !self.exports.contains(&name) {
            self.exports.push(name);
        }
    }
}

fn export_name(name: &ModuleExportName<'_>) -> String {
    match name {
        ModuleExportName::IdentifierName(ident) => ident.name.to_string(),
        ModuleExportName::IdentifierReference(ident) => ident.name.to_string(),
        ModuleExportName::StringLiteral(lit) => lit.value.to_string(),
    }
}
