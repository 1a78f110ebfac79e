#![cfg_attr(docsrs, feature(doc_cfg))]

//! # importmaps
//!
//! Builds declared "shared" dependencies as standalone chunks and publishes
//! where they ended up as a browser import map, so an application and any
//! number of independently built bundles load one copy of each package
//! through the browser's native module loader.
//!
//! The engine is host-agnostic. A bundler binding (see `importmaps-rolldown`)
//! drives a [`BuildSession`] through its hooks; a dev server drives a
//! [`DevResolver`] per HTML request.
//!
//! ```
//! use std::sync::Arc;
//! use importmaps::{EmittedChunk, HostInputOptions, ImportMaps, ImportMapsOptions, OutputChunkInfo};
//! use importmaps::testing::MemoryHost;
//!
//! let maps = ImportMaps::new(ImportMapsOptions::new(["shared-lib"]).shared_out_dir("shared"))?;
//! let mut session = maps.build_session("/project", Arc::new(MemoryHost::new()));
//!
//! session.register_inputs(&mut HostInputOptions::default())?;
//! session.emit_chunks(&mut Vec::<EmittedChunk>::new())?;
//! session.reconcile(&[OutputChunkInfo {
//!     name: "shared/shared-lib".into(),
//!     file_name: "assets/shared/shared-lib-4f2a.js".into(),
//!     facade_module_id: None,
//!     is_entry: true,
//! }])?;
//!
//! let map = session.publish()?;
//! assert_eq!(map.to_json(), r#"{"imports":{"shared-lib":"./assets/shared/shared-lib-4f2a.js"}}"#);
//! # Ok::<(), importmaps::Error>(())
//! ```

pub mod dev;
pub mod error;
pub mod host;
pub mod import_maps;
pub mod normalize;
pub mod options;
pub mod passthrough;
pub mod publish;
pub mod reconcile;
pub mod registry;
pub mod session;
pub mod shape;
pub mod strategy;

pub mod testing;

// Logging utilities (optional, enabled with "logging" feature)
#[cfg(feature = "logging")]
#[cfg_attr(docsrs, doc(cfg(feature = "logging")))]
pub mod logging;

#[cfg(feature = "logging")]
#[cfg_attr(docsrs, doc(cfg(feature = "logging")))]
pub use logging::{LogLevel, init_logging, init_logging_from_env};

pub use dev::{DevResolver, file_to_url};
pub use error::{Error, Result};
pub use host::{
    ChunkEmitter, CommonJsMeta, EmittedChunk, HostInputOptions, InputOptions, ModuleHost,
    ModuleInfo, OptimizerState, OutputChunkInfo, PreserveSignature, RequiredModule,
    ResolvedModule,
};
pub use import_maps::ImportMaps;
pub use normalize::{is_local_file_entry, normalize_dependency_name};
pub use options::{
    BuildStrategyOptions, ImportMapsOptions, OutputAsFile, SharedDependencyConfig, StrategyKind,
};
pub use passthrough::{ModuleSideEffects, PassthroughModule, VIRTUAL_PREFIX};
pub use publish::ImportMap;
pub use registry::{
    ChunkEntrypoint, ImportMapTransformer, RegisteredDependency, Registry, SharedDependency,
    SharedRegistry,
};
pub use session::{BuildSession, Phase};
pub use shape::{ExportShape, ExportShapeOracle, HeuristicOracle, StrictOracle};
pub use strategy::{BuildStrategy, EntryAsInput, VirtualChunkResolver, VirtualModules};
