//! # fob-module-graph
//!
//! Module graph and export bookkeeping for the fob optimizer.
//!
//! This crate records which modules reference each other and, for every
//! export of every module, whether it is provided and whether it is used. It
//! performs no I/O and no parsing: the parser feeds modules and dependencies
//! in, usage propagation promotes the lattices, and the hoisting crate reads
//! the result to merge modules into one scope.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────┐
//! │                     ModuleGraph                       │
//! │            (Arc<RwLock<..>>, cheap to clone)          │
//! └───────┬──────────────────┬──────────────────┬─────────┘
//!         │                  │                  │
//!         ▼                  ▼                  ▼
//!   ┌───────────┐     ┌────────────┐     ┌──────────────┐
//!   │  Module   │     │ Connection │     │ ExportsArena │
//!   │ (+ side   │◀────│  (edge)    │     │ descriptors  │
//!   │  table)   │     └────────────┘     │ + records    │
//!   └───────────┘                        └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use fob_module_graph::{Dependency, Module, ModuleGraph, ModuleId, UsageState, UsedExports};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let graph = ModuleGraph::new()?;
//! let index = ModuleId::new("./src/index.js")?;
//! let util = ModuleId::new("./src/util.js")?;
//! graph.add_module(Module::builder(index.clone()).build())?;
//! let util_exports = graph.add_module(Module::builder(util.clone()).build())?;
//!
//! let dep = graph.add_dependency(Some(&index), Dependency::builder("./util").ids(["helper"]).build())?;
//! graph.connect(Some(&index), dep, &util)?;
//! assert_eq!(graph.resolve(dep)?, Some(util.clone()));
//!
//! {
//!     let mut exports = graph.exports_mut();
//!     exports.get_or_create(util_exports, "helper");
//!     exports.mark_has_use_info(util_exports);
//! }
//! graph.mark_export_used(&util, &["helper".to_string()], UsageState::Used)?;
//! assert_eq!(graph.used_exports(&util)?, UsedExports::Names(vec!["helper".into()]));
//! # Ok(())
//! # }
//! ```
//!
//! ## Phases
//!
//! Mutation (connecting modules, promoting lattices) belongs to the analysis
//! phase. Code generation should take a [`GraphReader`], which holds the read
//! lock until it is dropped.

pub mod connection;
pub mod dependency;
pub mod exports;
pub mod module;
pub mod module_id;
pub mod runtime;

mod memory;

pub use connection::{Connection, ConnectionId, ConnectionState};
pub use dependency::{Condition, Dependency, DependencyBuilder, DependencyId};
pub use exports::{
    DescriptorId, ExportDescriptor, ExportRecord, ExportTarget, ExportsArena, ProvidedDiff,
    ProvidedExports, ProvidedState, RecordId, ReexportTarget, RestoreProvidedData, UsageState,
    UsedExports, UsedName, can_mangle,
};
pub use memory::{FORMAT_VERSION, FindTarget, GraphReader, ModuleGraph};
pub use module::{BuildMeta, DefaultObject, ExportShape, ExportsType, Module, ModuleBuilder};
pub use module_id::{ModuleId, ModuleIdError};
pub use runtime::{RuntimeSpec, merge_runtime_condition, runtime_matches};

/// Error types for graph operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The module was never added to the graph.
    #[error("Module not found: {0}")]
    ModuleNotFound(ModuleId),

    #[error("Unknown dependency {0:?}")]
    UnknownDependency(DependencyId),

    /// The operation needs a resolved dependency.
    #[error("Dependency {0:?} has no connection")]
    DependencyNotConnected(DependencyId),

    /// Redirect chains must stay acyclic.
    #[error("Redirecting {descriptor} to {target} would create a cycle")]
    RedirectCycle {
        descriptor: DescriptorId,
        target: DescriptorId,
    },

    #[error("Invalid module id: {0}")]
    InvalidModuleId(#[from] ModuleIdError),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Incompatible graph format version: expected {expected}, got {found}")]
    IncompatibleFormat { expected: u32, found: u32 },
}

/// Result type alias for graph operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests;
