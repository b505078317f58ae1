//! Final names for everything declared in a merged scope.
//!
//! Names are allocated in one deterministic pass over the merge set entries:
//! for each module its declarations in order, then the synthesised objects the
//! module may need (namespace object, external binding, interop wrappers).
//! Every accepted name is added to the allocated set immediately, so later
//! allocations see it.

use fob_module_graph::{ExportShape, GraphReader, ModuleId};
use indexmap::{IndexMap, IndexSet};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace};

use crate::config::HoistOptions;
use crate::error::{HoistError, Result};
use crate::identifier::{RESERVED_NAMES, clean_readable, to_identifier};
use crate::merge_set::{MergeEntry, MergeSet};
use crate::scope::{
    DEFAULT_EXPORT_SYMBOL, ImportedBinding, ModuleScope, NAMESPACE_OBJECT_SYMBOL, ScopeId,
};

/// Names allocated for one merge set entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleNames {
    /// Original top-level symbol to final name.
    pub internal: IndexMap<String, String>,
    /// Namespace object of a concatenated module.
    pub namespace_object: Option<String>,
    /// Binding that holds an external module.
    pub external_name: Option<String>,
    /// Namespace wrapper for modules that are not real namespaces.
    pub interop_namespace: Option<String>,
    /// Namespace wrapper exposing only `default`.
    pub interop_namespace2: Option<String>,
    /// Accessor probing the default export at run time.
    pub interop_default: Option<String>,
}

/// Allocation result for a whole merge set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenameTable {
    modules: IndexMap<ModuleId, ModuleNames>,
}

impl RenameTable {
    pub fn module(&self, module: &ModuleId) -> Option<&ModuleNames> {
        self.modules.get(module)
    }

    /// Final name of `symbol` declared in `module`.
    pub fn internal_name(&self, module: &ModuleId, symbol: &str) -> Option<&str> {
        self.modules
            .get(module)
            .and_then(|names| names.internal.get(symbol))
            .map(String::as_str)
    }

    /// Every `(module, symbol) -> final name` mapping in allocation order.
    pub fn symbols(&self) -> impl Iterator<Item = (&ModuleId, &str, &str)> {
        self.modules.iter().flat_map(|(module, names)| {
            names
                .internal
                .iter()
                .map(move |(symbol, name)| (module, symbol.as_str(), name.as_str()))
        })
    }

    /// All names declared at the top of the merged scope.
    pub fn top_level_declarations(&self) -> IndexSet<&str> {
        let mut names = IndexSet::new();
        for module in self.modules.values() {
            names.extend(module.internal.values().map(String::as_str));
            let extras = [
                &module.namespace_object,
                &module.external_name,
                &module.interop_namespace,
                &module.interop_namespace2,
                &module.interop_default,
            ];
            names.extend(extras.into_iter().flatten().map(String::as_str));
        }
        names
    }
}

/// Names visible from the reference sites of one binding.
#[derive(Default)]
struct Visibility {
    names: FxHashSet<String>,
    checked: FxHashSet<(ModuleId, ScopeId)>,
}

impl Visibility {
    /// Walk from `from` in `owner`'s tree towards its module scope, stopping
    /// at scopes already walked.
    fn add_scope_chain(&mut self, owner: &ModuleId, scope: &ModuleScope, from: ScopeId) {
        let mut current = Some(from);
        while let Some(id) = current {
            if id == scope.module_scope || !self.checked.insert((owner.clone(), id)) {
                break;
            }
            let Some(data) = scope.tree.scope(id) else {
                break;
            };
            self.names.extend(data.variables.iter().cloned());
            current = data.upper;
        }
    }
}

/// Visibility per `(module, binding)`, gathered from declaring and importing
/// modules alike.
type VisibilityMap = FxHashMap<(ModuleId, ImportedBinding), Visibility>;

fn visible_names<'a>(
    visibility: &'a VisibilityMap,
    empty: &'a FxHashSet<String>,
    module: &ModuleId,
    binding: ImportedBinding,
) -> &'a FxHashSet<String> {
    visibility
        .get(&(module.clone(), binding))
        .map_or(empty, |seen| &seen.names)
}

fn collect_visibility(merge_set: &MergeSet) -> VisibilityMap {
    let mut visibility = VisibilityMap::default();
    for entry in merge_set.entries() {
        let MergeEntry::Concatenated(info) = entry else {
            continue;
        };
        for declaration in &info.scope.declarations {
            let key = (info.module.clone(), ImportedBinding::Symbol(declaration.name.clone()));
            let seen = visibility.entry(key).or_default();
            for reference in &declaration.references {
                seen.add_scope_chain(&info.module, &info.scope, *reference);
            }
        }
        for import in &info.scope.imports {
            // An external is only ever reached through its bound name.
            let binding = match merge_set.entry(&import.target) {
                Some(MergeEntry::Concatenated(_)) => import.binding.clone(),
                Some(MergeEntry::External(_)) => ImportedBinding::Module,
                None => {
                    trace!(importer = %info.module, target = %import.target, "import from outside the merge set");
                    continue;
                }
            };
            let seen = visibility.entry((import.target.clone(), binding)).or_default();
            for reference in &import.references {
                seen.add_scope_chain(&info.module, &info.scope, *reference);
            }
        }
    }
    visibility
}

/// Allocates collision-free names for a merge set.
pub struct Renamer {
    reserved: FxHashSet<String>,
    namespace_object_name: String,
}

impl Renamer {
    pub fn new(options: &HoistOptions) -> Self {
        let mut reserved: FxHashSet<String> =
            RESERVED_NAMES.iter().map(|name| name.to_string()).collect();
        reserved.insert(DEFAULT_EXPORT_SYMBOL.to_string());
        reserved.insert(NAMESPACE_OBJECT_SYMBOL.to_string());
        reserved.extend(options.reserved_names.iter().cloned());
        Self {
            reserved,
            namespace_object_name: options.namespace_object_name.clone(),
        }
    }

    /// Allocate final names for every entry of `merge_set`.
    pub fn allocate(&self, graph: &GraphReader<'_>, merge_set: &MergeSet) -> Result<RenameTable> {
        let mut allocated = self.reserved.clone();
        for entry in merge_set.entries() {
            if let MergeEntry::Concatenated(info) = entry {
                allocated.extend(info.scope.globals.iter().cloned());
            }
        }

        let visibility = collect_visibility(merge_set);
        let empty = FxHashSet::default();
        let visible_from = |module: &ModuleId, binding: ImportedBinding| {
            visible_names(&visibility, &empty, module, binding)
        };
        let mut table = RenameTable::default();

        for entry in merge_set.entries() {
            let module_id = entry.module();
            let readable = graph.module(module_id)?.readable_identifier();
            let whole_module = visible_from(module_id, ImportedBinding::Module);
            let mut names = ModuleNames::default();

            match entry {
                MergeEntry::Concatenated(info) => {
                    for declaration in &info.scope.declarations {
                        let name = &declaration.name;
                        let own = visible_from(module_id, ImportedBinding::Symbol(name.clone()));
                        // The namespace export symbol also stands for the whole module.
                        let merged: FxHashSet<String>;
                        let visible = if info.namespace_export_symbol.as_ref() == Some(name) {
                            merged = own.union(whole_module).cloned().collect();
                            &merged
                        } else {
                            own
                        };

                        let final_name = if allocated.contains(name) || visible.contains(name) {
                            let renamed = self.find_new_name(name, &allocated, visible, &readable);
                            trace!(module = %module_id, from = %name, to = %renamed, "renamed symbol");
                            renamed
                        } else {
                            name.clone()
                        };
                        allocated.insert(final_name.clone());
                        names.internal.insert(name.clone(), final_name);
                    }

                    let namespace_object = match &info.namespace_export_symbol {
                        Some(symbol) => names.internal.get(symbol).cloned().ok_or_else(|| {
                            HoistError::MissingInternalName {
                                module: module_id.clone(),
                                name: symbol.clone(),
                            }
                        })?,
                        None => self.allocate_name(
                            NAMESPACE_OBJECT_SYMBOL,
                            &mut allocated,
                            whole_module,
                            &readable,
                        ),
                    };
                    names.namespace_object = Some(namespace_object);
                }
                MergeEntry::External(_) => {
                    names.external_name = Some(self.allocate_name(
                        DEFAULT_EXPORT_SYMBOL,
                        &mut allocated,
                        whole_module,
                        &readable,
                    ));
                }
            }

            let shapes = [
                graph.exports_shape(module_id, false)?,
                graph.exports_shape(module_id, true)?,
            ];
            self.allocate_interop(&shapes, &mut names, &mut allocated, whole_module, &readable);
            table.modules.insert(module_id.clone(), names);
        }

        debug!(
            root = %merge_set.root(),
            modules = table.modules.len(),
            symbols = table.symbols().count(),
            "names allocated"
        );
        Ok(table)
    }

    /// Wrapper names for every shape the module can present to an importer.
    fn allocate_interop(
        &self,
        shapes: &[ExportShape],
        names: &mut ModuleNames,
        allocated: &mut FxHashSet<String>,
        visible: &FxHashSet<String>,
        readable: &str,
    ) {
        if shapes.contains(&ExportShape::DefaultWithNamed) {
            names.interop_namespace = Some(self.allocate_name(
                NAMESPACE_OBJECT_SYMBOL,
                allocated,
                visible,
                readable,
            ));
        }
        if shapes.contains(&ExportShape::DefaultOnly) {
            let base = format!("{}2", self.namespace_object_name);
            names.interop_namespace2 = Some(self.allocate_name(&base, allocated, visible, readable));
        }
        if shapes.contains(&ExportShape::Dynamic) {
            names.interop_default = Some(self.allocate_name("default", allocated, visible, readable));
        }
    }

    fn allocate_name(
        &self,
        base: &str,
        allocated: &mut FxHashSet<String>,
        visible: &FxHashSet<String>,
        readable: &str,
    ) -> String {
        let name = self.find_new_name(base, allocated, visible, readable);
        allocated.insert(name.clone());
        name
    }

    /// First free candidate derived from `old_name` and the module identity.
    ///
    /// Path segments of the identity are prepended one at a time from the
    /// end; when they run out, a numeric suffix is appended.
    pub fn find_new_name(
        &self,
        old_name: &str,
        allocated: &FxHashSet<String>,
        visible: &FxHashSet<String>,
        readable: &str,
    ) -> String {
        let mut name = match old_name {
            DEFAULT_EXPORT_SYMBOL => String::new(),
            NAMESPACE_OBJECT_SYMBOL => self.namespace_object_name.clone(),
            other => other.to_string(),
        };
        let is_free = |candidate: &str| {
            !candidate.is_empty() && !allocated.contains(candidate) && !visible.contains(candidate)
        };

        let cleaned = clean_readable(readable);
        for segment in cleaned.rsplit('/') {
            name = if name.is_empty() {
                segment.to_string()
            } else {
                format!("{segment}_{name}")
            };
            let candidate = to_identifier(&name);
            if is_free(&candidate) {
                return candidate;
            }
        }

        let mut i = 0usize;
        loop {
            let candidate = to_identifier(&format!("{name}_{i}"));
            if is_free(&candidate) {
                return candidate;
            }
            i += 1;
        }
    }
}
