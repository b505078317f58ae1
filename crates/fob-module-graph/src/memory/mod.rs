//! In-memory ModuleGraph implementation.
//!
//! The graph is split into `impl` blocks by concern; each file adds methods
//! to [`ModuleGraph`] (and, where the resolution phase needs them, to
//! [`GraphReader`]).

mod attributes;
mod construction;
mod exports;
mod graph;
mod mutations;
mod queries;
mod serialization;

pub use exports::FindTarget;
pub use graph::{GraphReader, ModuleGraph};
pub use serialization::FORMAT_VERSION;
