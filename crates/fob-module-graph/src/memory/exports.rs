//! Export information attached to graph modules.

use parking_lot::{MappedRwLockReadGuard, MappedRwLockWriteGuard, RwLockReadGuard, RwLockWriteGuard};
use rustc_hash::FxHashSet as HashSet;
use tracing::trace;

use super::super::dependency::DependencyId;
use super::super::exports::{
    DescriptorId, ExportsArena, ProvidedExports, ProvidedState, RecordId, UsageState, UsedExports,
};
use super::super::module::ExportShape;
use super::super::ModuleId;
use super::graph::{GraphInner, GraphReader, ModuleGraph};
use crate::{Error, Result};

/// Outcome of following a re-export chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FindTarget {
    /// The export is not a re-export.
    NoTarget,
    /// The chain ends before reaching a module accepted by the filter.
    NotFound,
    /// The chain loops back onto itself.
    Circular,
    Found {
        module: ModuleId,
        /// Export path in `module`; `None` means its whole namespace.
        export: Option<Vec<String>>,
        /// Every hop of the chain is deferred.
        deferred: bool,
    },
}

impl ModuleGraph {
    /// Shared access to the export arena.
    pub fn exports(&self) -> MappedRwLockReadGuard<'_, ExportsArena> {
        RwLockReadGuard::map(self.inner.read(), |inner| &inner.exports)
    }

    /// Exclusive access to the export arena for the analysis phase.
    pub fn exports_mut(&self) -> MappedRwLockWriteGuard<'_, ExportsArena> {
        RwLockWriteGuard::map(self.inner.write(), |inner| &mut inner.exports)
    }

    /// Export descriptor of `module`.
    pub fn exports_info(&self, module: &ModuleId) -> Result<DescriptorId> {
        let inner = self.inner.read();
        Ok(inner.mgm(module)?.exports)
    }

    pub fn used_exports(&self, module: &ModuleId) -> Result<UsedExports> {
        let inner = self.inner.read();
        let desc = inner.mgm(module)?.exports;
        Ok(inner.exports.used_exports(desc))
    }

    pub fn provided_exports(&self, module: &ModuleId) -> Result<ProvidedExports> {
        let inner = self.inner.read();
        let desc = inner.mgm(module)?.exports;
        Ok(inner.exports.provided_exports(desc))
    }

    /// Mark the export at `path` of `module` as used.
    pub fn mark_export_used(&self, module: &ModuleId, path: &[String], state: UsageState) -> Result<bool> {
        let mut inner = self.inner.write();
        let desc = inner.mgm(module)?.exports;
        Ok(inner.exports.mark_export_used(desc, path, state))
    }

    /// Declare that export `name` of `module` re-exports `export` of whatever
    /// `dependency` resolves to.
    pub fn set_export_target(
        &self,
        module: &ModuleId,
        name: &str,
        dependency: DependencyId,
        export: Option<Vec<String>>,
        priority: i32,
    ) -> Result<bool> {
        let mut inner = self.inner.write();
        let connection = *inner
            .dependency_map
            .get(&dependency)
            .ok_or(Error::DependencyNotConnected(dependency))?;
        let desc = inner.mgm(module)?.exports;
        let record = inner.exports.get_or_create(desc, name);
        let changed = inner
            .exports
            .record_mut(record)
            .set_target(dependency, connection, export, priority);
        if changed {
            trace!(module = %module, name, ?dependency, "re-export target set");
        }
        Ok(changed)
    }

    /// Follow the re-export chain of `name` until `filter` accepts a module.
    pub fn find_target(
        &self,
        module: &ModuleId,
        name: &str,
        filter: impl Fn(&ModuleId) -> bool,
    ) -> Result<FindTarget> {
        let inner = self.inner.read();
        inner.find_target(module, name, &filter)
    }

    /// Interop shape of `module` as seen by a strict or non-strict importer.
    pub fn exports_shape(&self, module: &ModuleId, strict: bool) -> Result<ExportShape> {
        let inner = self.inner.read();
        inner.exports_shape(module, strict)
    }
}

impl GraphInner {
    pub(super) fn find_target(
        &self,
        module: &ModuleId,
        name: &str,
        filter: &dyn Fn(&ModuleId) -> bool,
    ) -> Result<FindTarget> {
        let desc = self.mgm(module)?.exports;
        let record = self.exports.read_only_record(desc, name);
        let mut visited = HashSet::default();
        self.find_record_target(record, name, filter, &mut visited)
    }

    fn find_record_target(
        &self,
        record: RecordId,
        requested: &str,
        filter: &dyn Fn(&ModuleId) -> bool,
        visited: &mut HashSet<RecordId>,
    ) -> Result<FindTarget> {
        let info = self.exports.record(record);
        let Some(raw) = info.max_targets().into_iter().next() else {
            return Ok(FindTarget::NoTarget);
        };
        let Some(connection) = self.connection(raw.connection) else {
            return Ok(FindTarget::NoTarget);
        };
        if !visited.insert(record) {
            return Ok(FindTarget::Circular);
        }

        // A catch-all target without a path forwards the requested name.
        let mut export = match (&raw.export, info.name()) {
            (None, None) => Some(vec![requested.to_string()]),
            (export, _) => export.clone(),
        };
        let mut target = connection.module.clone();
        let mut deferred = connection.deferred;

        loop {
            if filter(&target) {
                return Ok(FindTarget::Found {
                    module: target,
                    export,
                    deferred,
                });
            }
            let Some(path) = export.as_ref().filter(|path| !path.is_empty()) else {
                return Ok(FindTarget::NotFound);
            };
            let desc = self.mgm(&target)?.exports;
            let next = self.exports.read_only_record(desc, &path[0]);
            if visited.contains(&next) {
                return Ok(FindTarget::Circular);
            }
            match self.find_record_target(next, &path[0], filter, visited)? {
                FindTarget::NoTarget | FindTarget::NotFound => return Ok(FindTarget::NotFound),
                FindTarget::Circular => return Ok(FindTarget::Circular),
                FindTarget::Found {
                    module,
                    export: next_export,
                    deferred: next_deferred,
                } => {
                    let rest = &path[1..];
                    export = if rest.is_empty() {
                        next_export
                    } else {
                        let mut joined = next_export.unwrap_or_default();
                        joined.extend(rest.iter().cloned());
                        Some(joined)
                    };
                    target = module;
                    deferred = deferred && next_deferred;
                }
            }
        }
    }

    pub(super) fn exports_shape(&self, module: &ModuleId, strict: bool) -> Result<ExportShape> {
        let build_meta = &self.module(module)?.build_meta;
        let desc = self.mgm(module)?.exports;
        let esmodule = self.exports.read_only_record(desc, "__esModule");
        let not_provided = self.exports.record(esmodule).provided() == ProvidedState::NotProvided;
        Ok(build_meta.shape(strict, not_provided))
    }
}

impl GraphReader<'_> {
    pub fn exports(&self) -> &ExportsArena {
        &self.inner.exports
    }

    pub fn exports_info(&self, module: &ModuleId) -> Result<DescriptorId> {
        Ok(self.inner.mgm(module)?.exports)
    }

    pub fn find_target(
        &self,
        module: &ModuleId,
        name: &str,
        filter: impl Fn(&ModuleId) -> bool,
    ) -> Result<FindTarget> {
        self.inner.find_target(module, name, &filter)
    }

    pub fn exports_shape(&self, module: &ModuleId, strict: bool) -> Result<ExportShape> {
        self.inner.exports_shape(module, strict)
    }
}
