//! Merge sets: modules emitted into one shared scope.
//!
//! A merge set is an ordered list of entries. Concatenated entries are the
//! members whose code is inlined; external entries are modules the members
//! import but which stay separate and are referenced through a bound name.
//! Dependencies come before their dependents and the root is always last.

use fob_module_graph::{Connection, GraphReader, ModuleId, RuntimeSpec, merge_runtime_condition};
use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace, warn};

use crate::error::{HoistError, Result};
use crate::scope::ModuleScope;

/// A member whose code is inlined into the merged scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcatenatedModule {
    pub module: ModuleId,
    /// Export name to the local symbol that holds it.
    pub export_map: IndexMap<String, String>,
    /// Export name to raw expression text.
    pub raw_export_map: IndexMap<String, String>,
    /// Local symbol bound to the module's own namespace (`export * as ns`).
    pub namespace_export_symbol: Option<String>,
    pub scope: ModuleScope,
}

impl ConcatenatedModule {
    pub fn new(module: ModuleId) -> Self {
        Self {
            module,
            export_map: IndexMap::new(),
            raw_export_map: IndexMap::new(),
            namespace_export_symbol: None,
            scope: ModuleScope::new(),
        }
    }

    /// Export `name` backed by the local `symbol`.
    pub fn with_export(mut self, name: impl Into<String>, symbol: impl Into<String>) -> Self {
        self.export_map.insert(name.into(), symbol.into());
        self
    }

    /// Export `name` as a raw expression.
    pub fn with_raw_export(mut self, name: impl Into<String>, expression: impl Into<String>) -> Self {
        self.raw_export_map.insert(name.into(), expression.into());
        self
    }

    pub fn with_namespace_export_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.namespace_export_symbol = Some(symbol.into());
        self
    }

    pub fn with_scope(mut self, scope: ModuleScope) -> Self {
        self.scope = scope;
        self
    }
}

/// A module referenced from the merged scope but emitted elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalModule {
    pub module: ModuleId,
    /// Runtimes in which the reference is needed; `None` means always.
    pub runtime_condition: Option<RuntimeSpec>,
    /// Every import of the module is deferred.
    pub deferred: bool,
}

impl ExternalModule {
    pub fn new(module: ModuleId) -> Self {
        Self {
            module,
            runtime_condition: None,
            deferred: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeEntry {
    Concatenated(ConcatenatedModule),
    External(ExternalModule),
}

impl MergeEntry {
    pub fn module(&self) -> &ModuleId {
        match self {
            MergeEntry::Concatenated(info) => &info.module,
            MergeEntry::External(info) => &info.module,
        }
    }

    pub fn is_concatenated(&self) -> bool {
        matches!(self, MergeEntry::Concatenated(_))
    }
}

/// Ordered entries of one merged scope.
#[derive(Debug, Clone)]
pub struct MergeSet {
    root: ModuleId,
    runtime: Option<RuntimeSpec>,
    entries: Vec<MergeEntry>,
    index: FxHashMap<ModuleId, usize>,
}

impl MergeSet {
    pub fn builder(root: ModuleId) -> MergeSetBuilder {
        MergeSetBuilder {
            root,
            runtime: None,
            entries: Vec::new(),
        }
    }

    /// Build the entry list for `root` by walking active connections.
    ///
    /// `members` are the modules chosen for concatenation (the root must be
    /// among them, and every member must be reachable from it). Targets
    /// outside `members` become external entries, with the runtimes in which
    /// they are needed.
    pub fn from_graph(
        graph: &GraphReader<'_>,
        root: ModuleId,
        members: Vec<ConcatenatedModule>,
        runtime: Option<RuntimeSpec>,
    ) -> Result<MergeSet> {
        let mut members: FxHashMap<ModuleId, ConcatenatedModule> = members
            .into_iter()
            .map(|member| (member.module.clone(), member))
            .collect();
        let root_member = members
            .remove(&root)
            .ok_or_else(|| HoistError::ModuleNotInMergeSet(root.clone()))?;

        let mut walk = Walk {
            graph,
            runtime: runtime.as_ref(),
            members,
            entered: FxHashSet::default(),
            entries: Vec::new(),
            index: FxHashMap::default(),
        };
        walk.entered.insert(root.clone());
        for (target, condition, deferred) in walk.concatenated_imports(&root)? {
            walk.enter(target, condition, deferred)?;
        }
        walk.push(MergeEntry::Concatenated(root_member));

        let Walk {
            members,
            entries,
            index,
            ..
        } = walk;
        if !members.is_empty() {
            let mut unreached: Vec<ModuleId> = members.into_keys().collect();
            unreached.sort();
            warn!(root = %root, ?unreached, "merge set members not reachable from root");
            return Err(HoistError::UnreachableMembers { root, members: unreached });
        }

        debug!(root = %root, entries = entries.len(), "merge set built");

        Ok(MergeSet {
            root,
            runtime,
            entries,
            index,
        })
    }

    pub fn root(&self) -> &ModuleId {
        &self.root
    }

    /// Runtime the merged scope is generated for; `None` means every runtime.
    pub fn runtime(&self) -> Option<&RuntimeSpec> {
        self.runtime.as_ref()
    }

    pub fn entries(&self) -> &[MergeEntry] {
        &self.entries
    }

    pub fn entry(&self, module: &ModuleId) -> Option<&MergeEntry> {
        self.index.get(module).map(|i| &self.entries[*i])
    }

    pub fn contains(&self, module: &ModuleId) -> bool {
        self.index.contains_key(module)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Readable identities of all entries, for diagnostics.
    pub fn member_names(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|entry| match entry {
                MergeEntry::Concatenated(info) => format!(" * {}", info.module.readable()),
                MergeEntry::External(info) => format!(" * {} (external)", info.module.readable()),
            })
            .collect()
    }
}

/// Builder for hand-assembled merge sets.
pub struct MergeSetBuilder {
    root: ModuleId,
    runtime: Option<RuntimeSpec>,
    entries: Vec<MergeEntry>,
}

impl MergeSetBuilder {
    pub fn runtime(mut self, runtime: RuntimeSpec) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn concatenated(mut self, module: ConcatenatedModule) -> Self {
        self.entries.push(MergeEntry::Concatenated(module));
        self
    }

    pub fn external(mut self, module: ExternalModule) -> Self {
        self.entries.push(MergeEntry::External(module));
        self
    }

    /// Finish the set. The root must be a concatenated entry; later entries
    /// for an already listed module are ignored.
    pub fn build(self) -> Result<MergeSet> {
        let mut entries = Vec::with_capacity(self.entries.len());
        let mut index = FxHashMap::default();
        for entry in self.entries {
            if index.contains_key(entry.module()) {
                continue;
            }
            index.insert(entry.module().clone(), entries.len());
            entries.push(entry);
        }

        match index.get(&self.root).map(|i| &entries[*i]) {
            Some(MergeEntry::Concatenated(_)) => {}
            _ => return Err(HoistError::ModuleNotInMergeSet(self.root)),
        }

        Ok(MergeSet {
            root: self.root,
            runtime: self.runtime,
            entries,
            index,
        })
    }
}

struct Walk<'g, 'a> {
    graph: &'a GraphReader<'g>,
    runtime: Option<&'a RuntimeSpec>,
    members: FxHashMap<ModuleId, ConcatenatedModule>,
    entered: FxHashSet<ModuleId>,
    entries: Vec<MergeEntry>,
    index: FxHashMap<ModuleId, usize>,
}

impl Walk<'_, '_> {
    fn push(&mut self, entry: MergeEntry) {
        self.index.insert(entry.module().clone(), self.entries.len());
        self.entries.push(entry);
    }

    /// Targets imported by `module`, deduplicated, with merged conditions.
    fn concatenated_imports(
        &self,
        module: &ModuleId,
    ) -> Result<Vec<(ModuleId, Option<RuntimeSpec>, bool)>> {
        let mut imports: IndexMap<ModuleId, (Option<RuntimeSpec>, bool)> = IndexMap::new();
        for connection in self.graph.outgoing_connections(module)? {
            if connection.dependency.is_none()
                || connection.resolved_origin_module.as_ref() != Some(module)
            {
                continue;
            }
            let Some(condition) = self.runtime_condition(connection) else {
                continue;
            };
            match imports.get_mut(&connection.module) {
                Some((existing, deferred)) => {
                    *existing = merge_runtime_condition(existing.as_ref(), condition.as_ref());
                    *deferred = *deferred && connection.deferred;
                }
                None => {
                    imports.insert(connection.module.clone(), (condition, connection.deferred));
                }
            }
        }
        Ok(imports
            .into_iter()
            .map(|(target, (condition, deferred))| (target, condition, deferred))
            .collect())
    }

    /// `None` when inactive everywhere; `Some(None)` when active in every
    /// runtime of the walk.
    fn runtime_condition(&self, connection: &Connection) -> Option<Option<RuntimeSpec>> {
        if !connection.is_target_active(self.runtime) {
            return None;
        }
        if !connection.is_conditional() {
            return Some(None);
        }
        let Some(runtime) = self.runtime else {
            return Some(None);
        };
        let active: Vec<&str> = runtime
            .iter()
            .filter(|name| connection.is_target_active(Some(&RuntimeSpec::single(*name))))
            .collect();
        if active.len() == runtime.len() {
            Some(None)
        } else {
            Some(Some(RuntimeSpec::from_names(active)))
        }
    }

    fn enter(
        &mut self,
        target: ModuleId,
        condition: Option<RuntimeSpec>,
        deferred: bool,
    ) -> Result<()> {
        if self.entered.contains(&target) {
            return Ok(());
        }

        if let Some(member) = self.members.remove(&target) {
            if condition.is_some() {
                return Err(HoistError::ConditionalMember(target));
            }
            self.entered.insert(target.clone());
            for (next, condition, deferred) in self.concatenated_imports(&target)? {
                self.enter(next, condition, deferred)?;
            }
            trace!(module = %target, "concatenated entry");
            self.push(MergeEntry::Concatenated(member));
            return Ok(());
        }

        match self.index.get(&target).map(|i| &mut self.entries[*i]) {
            Some(MergeEntry::External(existing)) => {
                existing.runtime_condition = merge_runtime_condition(
                    existing.runtime_condition.as_ref(),
                    condition.as_ref(),
                );
                existing.deferred = existing.deferred && deferred;
            }
            Some(MergeEntry::Concatenated(_)) => {}
            None => {
                trace!(module = %target, "external entry");
                self.push(MergeEntry::External(ExternalModule {
                    module: target,
                    runtime_condition: condition,
                    deferred,
                }));
            }
        }
        Ok(())
    }
}
