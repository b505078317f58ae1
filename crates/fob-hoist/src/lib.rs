//! # fob-hoist
//!
//! Scope hoisting for the fob optimizer: merges a set of modules into one
//! scope by giving every top-level declaration a collision-free name and by
//! resolving every cross-module reference to its final binding.
//!
//! ## Architecture
//!
//! ```text
//!   ModuleGraph (analysis done)
//!          │ reader()
//!          ▼
//!   ┌─────────────┐   ┌────────────┐   ┌──────────────────┐
//!   │  MergeSet   │──▶│  Renamer   │──▶│ BindingResolver  │──▶ final names
//!   │ (entries)   │   │ RenameTable│   │ + NeededObjects  │
//!   └─────────────┘   └────────────┘   └──────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use fob_hoist::{
//!     BindingResolver, ConcatenatedModule, HoistOptions, MergeSet, ModuleScope, Renamer,
//!     ResolveOptions,
//! };
//! use fob_module_graph::{ExportsType, Module, ModuleGraph, ModuleId};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let graph = ModuleGraph::new()?;
//! let util = ModuleId::new("./src/util.js")?;
//! graph.add_module(Module::builder(util.clone()).exports_type(ExportsType::Namespace).build())?;
//!
//! let mut scope = ModuleScope::new();
//! scope.declare("helper", []);
//! let merge_set = MergeSet::builder(util.clone())
//!     .concatenated(
//!         ConcatenatedModule::new(util.clone())
//!             .with_export("helper", "helper")
//!             .with_scope(scope),
//!     )
//!     .build()?;
//!
//! let reader = graph.reader();
//! let options = HoistOptions::default();
//! let names = Renamer::new(&options).allocate(&reader, &merge_set)?;
//! let mut resolver = BindingResolver::new(&reader, &merge_set, &names, &options);
//! let name = resolver.final_name(&util, &["helper".to_string()], &ResolveOptions::default())?;
//! assert_eq!(name, "helper");
//! # Ok(())
//! # }
//! ```
//!
//! ## Logging
//!
//! The crate emits `tracing` events. With the `logging` feature,
//! [`logging::init_logging`] installs a compact subscriber.

pub mod binding;
pub mod config;
pub mod error;
pub mod identifier;
pub mod merge_set;
pub mod renamer;
pub mod scope;

#[cfg(feature = "logging")]
pub mod logging;

pub use binding::{Binding, BindingResolver, NeededObjects, ResolveOptions};
pub use config::HoistOptions;
pub use error::{HoistError, Result};
pub use merge_set::{ConcatenatedModule, ExternalModule, MergeEntry, MergeSet, MergeSetBuilder};
pub use renamer::{ModuleNames, RenameTable, Renamer};
pub use scope::{
    DEFAULT_EXPORT_SYMBOL, Declaration, ImportReference, ImportedBinding, ModuleScope,
    NAMESPACE_OBJECT_SYMBOL, Scope, ScopeId, ScopeTree,
};
