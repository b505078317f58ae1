//! Core ModuleGraph structure and inner state.

use std::sync::Arc;

use indexmap::IndexSet;
use parking_lot::{RwLock, RwLockReadGuard};
use rustc_hash::FxHashMap as HashMap;
use serde::{Deserialize, Serialize};

use super::super::connection::{Connection, ConnectionId};
use super::super::dependency::{DependencyEntry, DependencyId};
use super::super::exports::{DescriptorId, ExportsArena};
use super::super::{Module, ModuleId};
use crate::{Error, Result};

/// In-memory module graph with connection and export side tables.
///
/// Cloning is cheap and clones share state. Mutation happens during the
/// analysis phase through `&self` methods that take the write lock; the
/// resolution phase should hold a [`GraphReader`] so that every lookup sees
/// the same snapshot.
#[derive(Debug, Clone)]
pub struct ModuleGraph {
    pub(super) inner: Arc<RwLock<GraphInner>>,
}

/// Per-module side table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(super) struct ModuleGraphModule {
    pub incoming: IndexSet<ConnectionId>,
    /// `None` until the first outgoing connection is registered.
    pub outgoing: Option<IndexSet<ConnectionId>>,
    pub exports: DescriptorId,
    /// Dependencies declared by this module, in declaration order.
    pub dependencies: Vec<DependencyId>,
    pub issuer: Option<ModuleId>,
    pub pre_order_index: Option<u32>,
    pub post_order_index: Option<u32>,
    pub depth: Option<u32>,
    pub is_async: bool,
    pub optimization_bailout: Vec<String>,
}

impl ModuleGraphModule {
    pub fn new(exports: DescriptorId) -> Self {
        Self {
            incoming: IndexSet::new(),
            outgoing: None,
            exports,
            dependencies: Vec::new(),
            issuer: None,
            pre_order_index: None,
            post_order_index: None,
            depth: None,
            is_async: false,
            optimization_bailout: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct GraphInner {
    /// All modules indexed by ID (wrapped in Arc for cheap cloning)
    pub modules: HashMap<ModuleId, Arc<Module>>,
    pub module_graph_modules: HashMap<ModuleId, ModuleGraphModule>,
    /// Dependency arena, indexed by `DependencyId`.
    pub dependencies: Vec<DependencyEntry>,
    /// Connection arena, indexed by `ConnectionId`; removed connections leave `None`.
    pub connections: Vec<Option<Connection>>,
    /// Current connection of every resolved dependency.
    pub dependency_map: HashMap<DependencyId, ConnectionId>,
    pub exports: ExportsArena,
}

impl GraphInner {
    pub fn mgm(&self, id: &ModuleId) -> Result<&ModuleGraphModule> {
        self.module_graph_modules
            .get(id)
            .ok_or_else(|| Error::ModuleNotFound(id.clone()))
    }

    pub fn mgm_mut(&mut self, id: &ModuleId) -> Result<&mut ModuleGraphModule> {
        self.module_graph_modules
            .get_mut(id)
            .ok_or_else(|| Error::ModuleNotFound(id.clone()))
    }

    pub fn module(&self, id: &ModuleId) -> Result<&Module> {
        self.modules
            .get(id)
            .map(|module| module.as_ref())
            .ok_or_else(|| Error::ModuleNotFound(id.clone()))
    }

    pub fn dependency_entry(&self, id: DependencyId) -> Result<&DependencyEntry> {
        self.dependencies
            .get(id.index())
            .ok_or(Error::UnknownDependency(id))
    }

    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(id.index()).and_then(Option::as_ref)
    }

    pub fn connection_mut(&mut self, id: ConnectionId) -> Option<&mut Connection> {
        self.connections.get_mut(id.index()).and_then(Option::as_mut)
    }

    pub fn push_connection(&mut self, build: impl FnOnce(ConnectionId) -> Connection) -> ConnectionId {
        let id = ConnectionId(self.connections.len() as u32);
        self.connections.push(Some(build(id)));
        id
    }

    /// Live connections for a list of ids, skipping removed ones.
    pub fn collect_connections<'a>(
        &'a self,
        ids: impl IntoIterator<Item = &'a ConnectionId>,
    ) -> Vec<&'a Connection> {
        ids.into_iter().filter_map(|id| self.connection(*id)).collect()
    }

    pub fn incoming(&self, id: &ModuleId) -> Result<Vec<&Connection>> {
        Ok(self.collect_connections(&self.mgm(id)?.incoming))
    }

    pub fn outgoing(&self, id: &ModuleId) -> Result<Vec<&Connection>> {
        let mgm = self.mgm(id)?;
        Ok(match &mgm.outgoing {
            Some(outgoing) => self.collect_connections(outgoing),
            None => Vec::new(),
        })
    }
}

/// Read-only view of a graph for the resolution phase.
///
/// Holds the read lock for its whole lifetime, so analysis-phase mutations
/// cannot interleave with resolution.
pub struct GraphReader<'a> {
    pub(super) inner: RwLockReadGuard<'a, GraphInner>,
}

impl ModuleGraph {
    /// Enter the read-only resolution phase.
    pub fn reader(&self) -> GraphReader<'_> {
        GraphReader {
            inner: self.inner.read(),
        }
    }
}
