//! Query methods for ModuleGraph.

use indexmap::IndexMap;

use super::super::connection::{Connection, ConnectionId};
use super::super::dependency::{Dependency, DependencyId};
use super::super::{Module, ModuleId};
use super::graph::{GraphInner, GraphReader, ModuleGraph};
use crate::Result;

impl ModuleGraph {
    /// Retrieve a module by ID.
    ///
    /// Returns an owned `Module`; modules are stored behind `Arc`, so the
    /// clone is inexpensive.
    pub fn module(&self, id: &ModuleId) -> Result<Option<Module>> {
        let inner = self.inner.read();
        Ok(inner.modules.get(id).map(|arc| (**arc).clone()))
    }

    /// Get all modules, sorted by id.
    pub fn modules(&self) -> Result<Vec<Module>> {
        let inner = self.inner.read();
        let mut modules: Vec<Module> = inner.modules.values().map(|arc| (**arc).clone()).collect();
        modules.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(modules)
    }

    /// Whether a module is present.
    pub fn contains(&self, id: &ModuleId) -> Result<bool> {
        let inner = self.inner.read();
        Ok(inner.modules.contains_key(id))
    }

    /// Return total module count.
    pub fn len(&self) -> Result<usize> {
        let inner = self.inner.read();
        Ok(inner.modules.len())
    }

    /// Check whether graph is empty.
    pub fn is_empty(&self) -> Result<bool> {
        let inner = self.inner.read();
        Ok(inner.modules.is_empty())
    }

    /// The dependency registered under `id`.
    pub fn dependency(&self, id: DependencyId) -> Result<Dependency> {
        let inner = self.inner.read();
        Ok(inner.dependency_entry(id)?.dependency.clone())
    }

    /// Dependencies declared by a module, in declaration order.
    pub fn module_dependencies(&self, id: &ModuleId) -> Result<Vec<DependencyId>> {
        let inner = self.inner.read();
        Ok(inner.mgm(id)?.dependencies.clone())
    }

    /// Module that declared `dependency`, if any.
    pub fn parent_module(&self, dependency: DependencyId) -> Result<Option<ModuleId>> {
        let inner = self.inner.read();
        Ok(inner.dependency_entry(dependency)?.parent.clone())
    }

    /// Connections pointing at `id`.
    pub fn incoming_connections(&self, id: &ModuleId) -> Result<Vec<Connection>> {
        let inner = self.inner.read();
        Ok(inner.incoming(id)?.into_iter().cloned().collect())
    }

    /// Connections leaving `id`; empty when the module has none.
    pub fn outgoing_connections(&self, id: &ModuleId) -> Result<Vec<Connection>> {
        let inner = self.inner.read();
        Ok(inner.outgoing(id)?.into_iter().cloned().collect())
    }

    /// Incoming connections grouped by origin module, in registration order.
    pub fn incoming_connections_by_origin(
        &self,
        id: &ModuleId,
    ) -> Result<IndexMap<Option<ModuleId>, Vec<Connection>>> {
        let inner = self.inner.read();
        let mut grouped: IndexMap<Option<ModuleId>, Vec<Connection>> = IndexMap::new();
        for connection in inner.incoming(id)? {
            grouped
                .entry(connection.origin_module.clone())
                .or_default()
                .push(connection.clone());
        }
        Ok(grouped)
    }

    /// Outgoing connections grouped by target module, in registration order.
    pub fn outgoing_connections_by_module(&self, id: &ModuleId) -> Result<IndexMap<ModuleId, Vec<Connection>>> {
        let inner = self.inner.read();
        let mut grouped: IndexMap<ModuleId, Vec<Connection>> = IndexMap::new();
        for connection in inner.outgoing(id)? {
            grouped
                .entry(connection.module.clone())
                .or_default()
                .push(connection.clone());
        }
        Ok(grouped)
    }

    /// Current connection of `dependency`.
    pub fn connection(&self, dependency: DependencyId) -> Result<Option<Connection>> {
        let inner = self.inner.read();
        Ok(inner.dependency_connection(dependency).cloned())
    }

    pub fn connection_by_id(&self, id: ConnectionId) -> Result<Option<Connection>> {
        let inner = self.inner.read();
        Ok(inner.connection(id).cloned())
    }

    /// Target module of `dependency`; `None` while it is unresolved.
    pub fn resolve(&self, dependency: DependencyId) -> Result<Option<ModuleId>> {
        let inner = self.inner.read();
        Ok(inner.dependency_connection(dependency).map(|c| c.module.clone()))
    }

    /// Module the dependency originally resolved to, before any retargeting.
    pub fn resolved_module(&self, dependency: DependencyId) -> Result<Option<ModuleId>> {
        let inner = self.inner.read();
        Ok(inner
            .dependency_connection(dependency)
            .map(|c| c.resolved_module.clone()))
    }

    /// Origin module of the connection of `dependency`.
    pub fn origin(&self, dependency: DependencyId) -> Result<Option<ModuleId>> {
        let inner = self.inner.read();
        Ok(inner
            .dependency_connection(dependency)
            .and_then(|c| c.origin_module.clone()))
    }
}

impl GraphInner {
    pub(super) fn dependency_connection(&self, dependency: DependencyId) -> Option<&Connection> {
        self.dependency_map
            .get(&dependency)
            .and_then(|id| self.connection(*id))
    }
}

impl GraphReader<'_> {
    pub fn module(&self, id: &ModuleId) -> Result<&Module> {
        self.inner.module(id)
    }

    pub fn contains(&self, id: &ModuleId) -> bool {
        self.inner.modules.contains_key(id)
    }

    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.inner.connection(id)
    }

    pub fn incoming_connections(&self, id: &ModuleId) -> Result<Vec<&Connection>> {
        self.inner.incoming(id)
    }

    pub fn outgoing_connections(&self, id: &ModuleId) -> Result<Vec<&Connection>> {
        self.inner.outgoing(id)
    }

    pub fn resolve(&self, dependency: DependencyId) -> Option<&ModuleId> {
        self.inner.dependency_connection(dependency).map(|c| &c.module)
    }
}
