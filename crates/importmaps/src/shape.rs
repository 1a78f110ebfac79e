//! Export-shape probing.
//!
//! A passthrough module always re-exports the dependency's namespace. Whether it
//! may also re-export `default` depends on the dependency: native ESM modules
//! tell us directly, CommonJS modules converted by the host only through the
//! modules they require.

use async_trait::async_trait;

use crate::host::{ModuleHost, ModuleInfo};
use crate::{Error, Result};

/// Export emitted by hosts on modules wrapped for CommonJS interop.
pub const COMMONJS_INTEROP_MARKER: &str = "__require";

/// Which re-export template the passthrough module uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportShape {
    WildcardOnly,
    WildcardWithDefault,
}

impl ExportShape {
    pub fn has_default(&self) -> bool {
        matches!(self, ExportShape::WildcardWithDefault)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Evidence {
    Default,
    NoDefault,
    Unknown,
}

/// Decides the export shape of a resolved dependency.
#[async_trait]
pub trait ExportShapeOracle: Send + Sync {
    async fn detect(&self, host: &dyn ModuleHost, specifier: &str, resolved_id: &str) -> Result<ExportShape>;
}

/// Guesses "no default" whenever the metadata is inconclusive.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicOracle;

/// Refuses to guess: inconclusive metadata is an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrictOracle;

#[async_trait]
impl ExportShapeOracle for HeuristicOracle {
    async fn detect(&self, host: &dyn ModuleHost, specifier: &str, resolved_id: &str) -> Result<ExportShape> {
        let evidence = gather_evidence(host, resolved_id).await;
        tracing::debug!(specifier, ?evidence, "detected export shape");
        Ok(match evidence {
            Evidence::Default => ExportShape::WildcardWithDefault,
            Evidence::NoDefault | Evidence::Unknown => ExportShape::WildcardOnly,
        })
    }
}

#[async_trait]
impl ExportShapeOracle for StrictOracle {
    async fn detect(&self, host: &dyn ModuleHost, specifier: &str, resolved_id: &str) -> Result<ExportShape> {
        match gather_evidence(host, resolved_id).await {
            Evidence::Default => Ok(ExportShape::WildcardWithDefault),
            Evidence::NoDefault => Ok(ExportShape::WildcardOnly),
            Evidence::Unknown => Err(Error::AmbiguousExportShape {
                specifier: specifier.to_string(),
            }),
        }
    }
}

/// Strip a `?query` suffix from a host module id.
pub fn strip_query(id: &str) -> &str {
    id.split_once('?').map_or(id, |(path, _)| path)
}

async fn gather_evidence(host: &dyn ModuleHost, resolved_id: &str) -> Evidence {
    let Some(info) = host.module_info(strip_query(resolved_id)).await else {
        return Evidence::Unknown;
    };

    if info.has_default_export {
        return Evidence::Default;
    }
    if !info.is_commonjs() {
        return Evidence::NoDefault;
    }

    walk_requires(host, &info).await
}

async fn walk_requires(host: &dyn ModuleHost, info: &ModuleInfo) -> Evidence {
    let Some(meta) = &info.commonjs else {
        return Evidence::Unknown;
    };

    for required in &meta.requires {
        let Some(resolved) = &required.resolved else {
            continue;
        };
        // A resolved require without metadata ends the walk.
        let Some(required_info) = host.module_info(strip_query(resolved)).await else {
            break;
        };
        if required_info.has_default_export
            || required_info
                .exports
                .iter()
                .any(|name| name == COMMONJS_INTEROP_MARKER)
        {
            return Evidence::Default;
        }
    }

    Evidence::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{CommonJsMeta, RequiredModule};
    use crate::testing::MemoryHost;

    fn cjs(id: &str, requires: &[(&str, Option<&str>)]) -> ModuleInfo {
        ModuleInfo {
            id: id.into(),
            has_default_export: false,
            exports: vec![],
            commonjs: Some(CommonJsMeta {
                is_commonjs: true,
                requires: requires
                    .iter()
                    .map(|(source, resolved)| RequiredModule {
                        source: source.to_string(),
                        resolved: resolved.map(str::to_string),
                    })
                    .collect(),
            }),
        }
    }

    #[tokio::test]
    async fn native_default_export_is_propagated() {
        let host = MemoryHost::new().with_esm("esm-lib", "/nm/esm-lib/index.js", true);
        let shape = HeuristicOracle
            .detect(&host, "esm-lib", "/nm/esm-lib/index.js?v=123")
            .await
            .unwrap();
        assert_eq!(shape, ExportShape::WildcardWithDefault);
    }

    #[tokio::test]
    async fn named_only_esm_has_no_default() {
        let host = MemoryHost::new().with_esm("named", "/nm/named/index.js", false);
        let shape = StrictOracle.detect(&host, "named", "/nm/named/index.js").await.unwrap();
        assert_eq!(shape, ExportShape::WildcardOnly);
    }

    #[tokio::test]
    async fn commonjs_marker_in_required_module_yields_default() {
        let host = MemoryHost::new()
            .with_module(cjs(
                "/nm/legacy/index.js",
                &[("./missing", None), ("./cjs/legacy.js", Some("/nm/legacy/cjs/legacy.js"))],
            ))
            .with_module(ModuleInfo {
                id: "/nm/legacy/cjs/legacy.js".into(),
                exports: vec![COMMONJS_INTEROP_MARKER.into()],
                ..Default::default()
            });

        let shape = StrictOracle.detect(&host, "legacy", "/nm/legacy/index.js").await.unwrap();
        assert_eq!(shape, ExportShape::WildcardWithDefault);
    }

    #[tokio::test]
    async fn missing_required_metadata_stops_the_walk() {
        let host = MemoryHost::new()
            .with_module(cjs(
                "/nm/legacy/index.js",
                &[("./gone", Some("/nm/legacy/gone.js")), ("./ok", Some("/nm/legacy/ok.js"))],
            ))
            .with_module(ModuleInfo {
                id: "/nm/legacy/ok.js".into(),
                has_default_export: true,
                ..Default::default()
            });

        let shape = HeuristicOracle
            .detect(&host, "legacy", "/nm/legacy/index.js")
            .await
            .unwrap();
        assert_eq!(shape, ExportShape::WildcardOnly);
    }

    #[tokio::test]
    async fn strict_oracle_rejects_unknown_modules() {
        let host = MemoryHost::new();
        let err = StrictOracle.detect(&host, "ghost", "/nm/ghost.js").await.unwrap_err();
        assert!(matches!(err, Error::AmbiguousExportShape { specifier } if specifier == "ghost"));

        let shape = HeuristicOracle.detect(&host, "ghost", "/nm/ghost.js").await.unwrap();
        assert_eq!(shape, ExportShape::WildcardOnly);
    }

    #[test]
    fn strips_query_suffix() {
        assert_eq!(strip_query("/a/b.js?v=1&x"), "/a/b.js");
        assert_eq!(strip_query("/a/b.js"), "/a/b.js");
    }
}
