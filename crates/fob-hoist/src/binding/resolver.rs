use fob_module_graph::{DescriptorId, ExportShape, FindTarget, GraphReader, ModuleId, ProvidedState};
use rustc_hash::FxHashSet;
use tracing::{trace, warn};

use super::{
    Binding, CIRCULAR_REEXPORT, ESMODULE_MARKER, NON_DEFAULT_IMPORT, NeededObjects, ResolveOptions,
    UNUSED_EXPORT,
};
use crate::config::HoistOptions;
use crate::error::{HoistError, Result};
use crate::identifier::to_comment;
use crate::merge_set::{MergeEntry, MergeSet};
use crate::renamer::{ModuleNames, RenameTable};

/// Cycle guard for one top-level request.
type Visited = FxHashSet<(DescriptorId, String)>;

/// Resolves export paths of merge set members to final bindings.
///
/// Holds the graph in its read-only phase. Synthesised objects touched while
/// resolving are collected in [`NeededObjects`].
pub struct BindingResolver<'a> {
    pub(super) graph: &'a GraphReader<'a>,
    pub(super) merge_set: &'a MergeSet,
    pub(super) names: &'a RenameTable,
    pub(super) options: &'a HoistOptions,
    needed: NeededObjects,
}

impl<'a> BindingResolver<'a> {
    pub fn new(
        graph: &'a GraphReader<'a>,
        merge_set: &'a MergeSet,
        names: &'a RenameTable,
        options: &'a HoistOptions,
    ) -> Self {
        Self {
            graph,
            merge_set,
            names,
            options,
            needed: NeededObjects::default(),
        }
    }

    /// Resolve `path` as exported by `module`.
    pub fn resolve(
        &mut self,
        module: &ModuleId,
        path: &[String],
        options: &ResolveOptions,
    ) -> Result<Binding> {
        let mut visited = Visited::default();
        self.final_binding(
            module,
            path.to_vec(),
            options.strict,
            options.deferred,
            options,
            &mut visited,
        )
    }

    pub fn needed(&self) -> &NeededObjects {
        &self.needed
    }

    pub fn into_needed(self) -> NeededObjects {
        self.needed
    }

    fn final_binding(
        &mut self,
        module: &ModuleId,
        mut path: Vec<String>,
        strict: bool,
        deferred: bool,
        options: &ResolveOptions,
        visited: &mut Visited,
    ) -> Result<Binding> {
        let graph = self.graph;
        let merge_set = self.merge_set;
        let entry = merge_set
            .entry(module)
            .ok_or_else(|| HoistError::ModuleNotInMergeSet(module.clone()))?;
        let shape = graph.exports_shape(module, strict)?;

        if path.is_empty() {
            match shape {
                ExportShape::DefaultOnly => {
                    self.needed.interop_namespaces2.insert(module.clone());
                    let name = self.synthesized(module, |n| &n.interop_namespace2, "interop namespace")?;
                    return Ok(raw(module, name, Vec::new(), path, deferred));
                }
                ExportShape::DefaultWithNamed => {
                    self.needed.interop_namespaces.insert(module.clone());
                    let name = self.synthesized(module, |n| &n.interop_namespace, "interop namespace")?;
                    return Ok(raw(module, name, Vec::new(), path, deferred));
                }
                ExportShape::NamespaceOnly | ExportShape::Dynamic => {}
            }
        } else {
            match shape {
                ExportShape::NamespaceOnly => {}
                ExportShape::DefaultWithNamed => match path[0].as_str() {
                    "default" => {
                        path.remove(0);
                    }
                    "__esModule" => {
                        let ids = path[1..].to_vec();
                        return Ok(raw(module, ESMODULE_MARKER.to_string(), ids, path, deferred));
                    }
                    _ => {}
                },
                ExportShape::DefaultOnly => {
                    let first = path.remove(0);
                    if first == "__esModule" {
                        let ids = path.clone();
                        return Ok(raw(module, ESMODULE_MARKER.to_string(), ids, path, deferred));
                    }
                    if first != "default" {
                        let ids = path.clone();
                        return Ok(raw(module, NON_DEFAULT_IMPORT.to_string(), ids, path, deferred));
                    }
                }
                ExportShape::Dynamic => match path[0].as_str() {
                    "default" => {
                        path.remove(0);
                        self.needed.interop_defaults.insert(module.clone());
                        let accessor = self.synthesized(module, |n| &n.interop_default, "interop default")?;
                        let text = if options.as_call {
                            format!("{accessor}()")
                        } else {
                            match options.asi_safe {
                                Some(true) => format!("({accessor}())"),
                                Some(false) => format!(";({accessor}())"),
                                None => format!("{accessor}.a"),
                            }
                        };
                        let ids = path.clone();
                        return Ok(raw(module, text, ids, path, deferred));
                    }
                    "__esModule" => {
                        let ids = path[1..].to_vec();
                        return Ok(raw(module, ESMODULE_MARKER.to_string(), ids, path, deferred));
                    }
                    _ => {}
                },
            }
        }

        if path.is_empty() {
            return match entry {
                MergeEntry::Concatenated(_) => {
                    self.needed.namespace_objects.insert(module.clone());
                    let name = self.synthesized(module, |n| &n.namespace_object, "namespace object")?;
                    Ok(raw(module, name, Vec::new(), path, deferred))
                }
                MergeEntry::External(external) => {
                    let name = self.synthesized(module, |n| &n.external_name, "external binding")?;
                    Ok(raw(module, name, Vec::new(), path, deferred && external.deferred))
                }
            };
        }

        let exports = graph.exports();
        let desc = graph.exports_info(module)?;
        if !visited.insert((desc, path[0].clone())) {
            warn!(module = %module, export = ?path, "circular reexport");
            return Ok(raw(module, CIRCULAR_REEXPORT.to_string(), Vec::new(), path, deferred));
        }

        match entry {
            MergeEntry::Concatenated(info) => {
                let record = exports.read_only_record(desc, &path[0]);
                if exports.record(record).provided() == ProvidedState::NotProvided {
                    // May still exist on the namespace at run time.
                    self.needed.namespace_objects.insert(module.clone());
                    let name = self.synthesized(module, |n| &n.namespace_object, "namespace object")?;
                    let ids = path.clone();
                    return Ok(raw(module, name, ids, path, deferred));
                }

                if let Some(symbol) = info.export_map.get(&path[0]) {
                    return Ok(match exports.used_name(desc, &path) {
                        None => {
                            let ids = path[1..].to_vec();
                            raw(module, UNUSED_EXPORT.to_string(), ids, path, deferred)
                        }
                        Some(used) => Binding::Symbol {
                            module: module.clone(),
                            symbol: symbol.clone(),
                            ids: used.get(1..).map(<[String]>::to_vec).unwrap_or_default(),
                            export: path,
                            deferred,
                        },
                    });
                }

                if let Some(expression) = info.raw_export_map.get(&path[0]) {
                    let ids = path[1..].to_vec();
                    return Ok(raw(module, expression.clone(), ids, path, deferred));
                }

                match graph.find_target(module, &path[0], |m| merge_set.contains(m))? {
                    FindTarget::NotFound => {
                        return Err(HoistError::UnresolvableReexport {
                            module: module.clone(),
                            export: path,
                            members: merge_set.member_names(),
                        });
                    }
                    FindTarget::Circular => {
                        warn!(module = %module, export = ?path, "circular reexport");
                        return Ok(raw(module, CIRCULAR_REEXPORT.to_string(), Vec::new(), path, deferred));
                    }
                    FindTarget::Found {
                        module: target,
                        export,
                        deferred: hop_deferred,
                    } => {
                        let mut next = export.unwrap_or_default();
                        next.extend(path[1..].iter().cloned());
                        trace!(from = %module, to = %target, export = ?next, "following reexport");
                        let strict = graph.module(module)?.build_meta.strict_esm;
                        return self.final_binding(
                            &target,
                            next,
                            strict,
                            deferred && hop_deferred,
                            options,
                            visited,
                        );
                    }
                    FindTarget::NoTarget => {}
                }

                if info.namespace_export_symbol.is_some() {
                    let name = self.synthesized(module, |n| &n.namespace_object, "namespace object")?;
                    let ids = exports.used_name(desc, &path).unwrap_or_else(|| path.clone());
                    return Ok(raw(module, name, ids, path, deferred));
                }

                Err(HoistError::UnknownExport {
                    module: module.clone(),
                    export: path,
                })
            }
            MergeEntry::External(external) => {
                let deferred = deferred && external.deferred;
                let Some(used) = exports.used_name(desc, &path) else {
                    let ids = path[1..].to_vec();
                    return Ok(raw(module, UNUSED_EXPORT.to_string(), ids, path, deferred));
                };
                let name = self.synthesized(module, |n| &n.external_name, "external binding")?;
                let comment = (used != path && self.options.property_comments)
                    .then(|| to_comment(&path.join(".")));
                Ok(Binding::Raw {
                    module: module.clone(),
                    name,
                    comment,
                    ids: used,
                    export: path,
                    deferred,
                })
            }
        }
    }

    /// Name allocated by the renamer for one of the module's synthesised objects.
    fn synthesized(
        &self,
        module: &ModuleId,
        pick: impl Fn(&ModuleNames) -> &Option<String>,
        what: &str,
    ) -> Result<String> {
        self.names
            .module(module)
            .and_then(|names| pick(names).clone())
            .ok_or_else(|| HoistError::MissingInternalName {
                module: module.clone(),
                name: format!("<{what}>"),
            })
    }
}

fn raw(module: &ModuleId, name: String, ids: Vec<String>, export: Vec<String>, deferred: bool) -> Binding {
    Binding::Raw {
        module: module.clone(),
        name,
        comment: None,
        ids,
        export,
        deferred,
    }
}
