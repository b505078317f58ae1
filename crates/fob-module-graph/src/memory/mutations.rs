//! Mutation methods for ModuleGraph.

use std::sync::Arc;

use indexmap::IndexSet;
use tracing::{debug, trace};

use super::super::connection::{Connection, ConnectionId};
use super::super::dependency::{Dependency, DependencyEntry, DependencyId};
use super::super::exports::DescriptorId;
use super::super::{Module, ModuleId};
use super::graph::{GraphInner, ModuleGraph, ModuleGraphModule};
use crate::{Error, Result};

impl ModuleGraph {
    /// Add a module into the graph and return its export descriptor.
    ///
    /// Re-adding a module replaces the `Module` value but keeps its
    /// connections and export information.
    pub fn add_module(&self, module: Module) -> Result<DescriptorId> {
        let mut inner = self.inner.write();
        let id = module.id.clone();
        inner.modules.insert(id.clone(), Arc::new(module));

        if let Some(mgm) = inner.module_graph_modules.get(&id) {
            return Ok(mgm.exports);
        }
        let exports = inner.exports.new_descriptor();
        inner
            .module_graph_modules
            .insert(id, ModuleGraphModule::new(exports));
        Ok(exports)
    }

    /// Register a dependency declared by `parent` (`None` for entry dependencies).
    pub fn add_dependency(&self, parent: Option<&ModuleId>, dependency: Dependency) -> Result<DependencyId> {
        let mut inner = self.inner.write();
        let id = DependencyId(inner.dependencies.len() as u32);
        if let Some(parent) = parent {
            inner.mgm_mut(parent)?.dependencies.push(id);
        }
        inner.dependencies.push(DependencyEntry {
            dependency,
            parent: parent.cloned(),
        });
        Ok(id)
    }

    /// Resolve `dependency` to `target`, creating a connection registered on
    /// both endpoints.
    pub fn connect(
        &self,
        origin: Option<&ModuleId>,
        dependency: DependencyId,
        target: &ModuleId,
    ) -> Result<ConnectionId> {
        let mut inner = self.inner.write();
        inner.connect(origin, dependency, target)
    }

    /// Point an already resolved dependency at a different module.
    ///
    /// The old connection stays registered but is deactivated, so explanations
    /// and history survive for diagnostics.
    pub fn update_module(&self, dependency: DependencyId, module: &ModuleId) -> Result<ConnectionId> {
        let mut inner = self.inner.write();
        inner.mgm(module)?;
        let old_id = *inner
            .dependency_map
            .get(&dependency)
            .ok_or(Error::DependencyNotConnected(dependency))?;
        let old = inner
            .connection(old_id)
            .ok_or(Error::DependencyNotConnected(dependency))?;
        if &old.module == module {
            return Ok(old_id);
        }

        let origin = old.origin_module.clone();
        let template = old.clone();
        let new_id = inner.push_connection(|id| {
            let mut connection = template.clone_with_id(id);
            connection.module = module.clone();
            connection
        });
        if let Some(old) = inner.connection_mut(old_id) {
            old.set_active(false);
        }
        inner.dependency_map.insert(dependency, new_id);
        if let Some(origin) = &origin {
            inner
                .mgm_mut(origin)?
                .outgoing
                .get_or_insert_with(IndexSet::new)
                .insert(new_id);
        }
        inner.mgm_mut(module)?.incoming.insert(new_id);
        debug!(?dependency, target = %module, "dependency retargeted");
        Ok(new_id)
    }

    /// Drop the connection of `dependency` from both endpoints.
    pub fn remove_connection(&self, dependency: DependencyId) -> Result<Option<ConnectionId>> {
        let mut inner = self.inner.write();
        let Some(id) = inner.dependency_map.remove(&dependency) else {
            return Ok(None);
        };
        let Some(connection) = inner.connections.get_mut(id.index()).and_then(Option::take) else {
            return Ok(None);
        };
        if let Some(origin) = &connection.origin_module {
            if let Some(outgoing) = inner.mgm_mut(origin)?.outgoing.as_mut() {
                outgoing.shift_remove(&id);
            }
        }
        inner.mgm_mut(&connection.module)?.incoming.shift_remove(&id);
        trace!(?dependency, connection = ?id, "connection removed");
        Ok(Some(id))
    }

    /// Record why the connection of `dependency` exists.
    pub fn add_explanation(&self, dependency: DependencyId, explanation: impl Into<String>) -> Result<()> {
        let mut inner = self.inner.write();
        let id = *inner
            .dependency_map
            .get(&dependency)
            .ok_or(Error::DependencyNotConnected(dependency))?;
        if let Some(connection) = inner.connection_mut(id) {
            connection.add_explanation(explanation);
        }
        Ok(())
    }

    /// Access a connection mutably, e.g. to narrow its condition.
    pub fn update_connection<R>(
        &self,
        dependency: DependencyId,
        update: impl FnOnce(&mut Connection) -> R,
    ) -> Result<R> {
        let mut inner = self.inner.write();
        let id = *inner
            .dependency_map
            .get(&dependency)
            .ok_or(Error::DependencyNotConnected(dependency))?;
        let connection = inner
            .connection_mut(id)
            .ok_or(Error::DependencyNotConnected(dependency))?;
        Ok(update(connection))
    }

    /// Migrate every connection accepted by `filter` from `old` to `new`.
    ///
    /// Outgoing connections get `new` as their origin and incoming
    /// connections get `new` as their target. Both directions move under one
    /// write lock, so readers never see a half-migrated state.
    pub fn move_module_connections(
        &self,
        old: &ModuleId,
        new: &ModuleId,
        filter: impl Fn(&Connection) -> bool,
    ) -> Result<usize> {
        if old == new {
            return Ok(0);
        }
        let mut inner = self.inner.write();
        inner.mgm(new)?;
        let mut moved = 0;

        let outgoing: Vec<ConnectionId> = inner
            .mgm(old)?
            .outgoing
            .iter()
            .flatten()
            .copied()
            .filter(|id| inner.connection(*id).is_some_and(&filter))
            .collect();
        for id in &outgoing {
            if let Some(connection) = inner.connection_mut(*id) {
                connection.origin_module = Some(new.clone());
            }
            if let Some(set) = inner.mgm_mut(old)?.outgoing.as_mut() {
                set.shift_remove(id);
            }
            inner
                .mgm_mut(new)?
                .outgoing
                .get_or_insert_with(IndexSet::new)
                .insert(*id);
        }
        moved += outgoing.len();

        let incoming: Vec<ConnectionId> = inner
            .mgm(old)?
            .incoming
            .iter()
            .copied()
            .filter(|id| inner.connection(*id).is_some_and(&filter))
            .collect();
        for id in &incoming {
            if let Some(connection) = inner.connection_mut(*id) {
                connection.module = new.clone();
            }
            inner.mgm_mut(old)?.incoming.shift_remove(id);
            inner.mgm_mut(new)?.incoming.insert(*id);
        }
        moved += incoming.len();

        debug!(from = %old, to = %new, moved, "module connections moved");
        Ok(moved)
    }

    /// Duplicate the outgoing connections of `old` accepted by `filter` onto `new`.
    ///
    /// The copies are registered on their targets but not in the dependency
    /// map, which keeps pointing at the original connections.
    pub fn copy_outgoing_module_connections(
        &self,
        old: &ModuleId,
        new: &ModuleId,
        filter: impl Fn(&Connection) -> bool,
    ) -> Result<usize> {
        if old == new {
            return Ok(0);
        }
        let mut inner = self.inner.write();
        inner.mgm(new)?;
        let templates: Vec<Connection> = inner
            .outgoing(old)?
            .into_iter()
            .filter(|connection| filter(*connection))
            .cloned()
            .collect();

        for template in &templates {
            let id = inner.push_connection(|id| {
                let mut connection = template.clone_with_id(id);
                connection.origin_module = Some(new.clone());
                connection
            });
            inner
                .mgm_mut(new)?
                .outgoing
                .get_or_insert_with(IndexSet::new)
                .insert(id);
            inner.mgm_mut(&template.module)?.incoming.insert(id);
        }
        Ok(templates.len())
    }
}

impl GraphInner {
    pub(super) fn connect(
        &mut self,
        origin: Option<&ModuleId>,
        dependency: DependencyId,
        target: &ModuleId,
    ) -> Result<ConnectionId> {
        self.mgm(target)?;
        if let Some(origin) = origin {
            self.mgm(origin)?;
        }
        let entry = self.dependency_entry(dependency)?;
        let weak = entry.dependency.weak;
        let deferred = entry.dependency.deferred;
        let condition = entry.dependency.condition.clone();

        let id = self.push_connection(|id| {
            Connection::new(
                id,
                origin.cloned(),
                Some(dependency),
                target.clone(),
                weak,
                deferred,
                condition,
            )
        });
        self.mgm_mut(target)?.incoming.insert(id);
        if let Some(origin) = origin {
            self.mgm_mut(origin)?
                .outgoing
                .get_or_insert_with(IndexSet::new)
                .insert(id);
        }
        self.dependency_map.insert(dependency, id);
        trace!(?dependency, target = %target, "dependency connected");
        Ok(id)
    }
}
