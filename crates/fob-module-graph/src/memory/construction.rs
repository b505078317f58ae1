//! Construction methods for ModuleGraph.

use std::sync::Arc;

use parking_lot::RwLock;

use super::super::Module;
use super::graph::{GraphInner, ModuleGraph};
use crate::Result;

impl ModuleGraph {
    /// Create a new empty graph.
    pub fn new() -> Result<Self> {
        Ok(Self {
            inner: Arc::new(RwLock::new(GraphInner::default())),
        })
    }

    /// Construct a graph from an iterator of modules (without edges).
    pub fn from_modules<I>(modules: I) -> Result<Self>
    where
        I: IntoIterator<Item = Module>,
    {
        let graph = Self::new()?;
        for module in modules {
            graph.add_module(module)?;
        }
        Ok(graph)
    }
}
