//! Shared test utilities for fob-hoist tests
//!
//! Small builders for graphs, export state and merge sets so the scenario
//! tests read like the situations they describe.

#![allow(dead_code)]

use fob_hoist::{ConcatenatedModule, ModuleScope};
use fob_module_graph::{
    DependencyId, Dependency, DescriptorId, ExportsType, Module, ModuleGraph, ModuleId,
    ProvidedState, UsageState,
};

pub fn id(path: &str) -> ModuleId {
    ModuleId::new(path).expect("valid module id")
}

pub fn path(segments: &[&str]) -> Vec<String> {
    segments.iter().map(|s| s.to_string()).collect()
}

/// Add an ES module (namespace shape).
pub fn esm(graph: &ModuleGraph, module: &ModuleId) -> DescriptorId {
    graph
        .add_module(
            Module::builder(module.clone())
                .exports_type(ExportsType::Namespace)
                .build(),
        )
        .expect("add module")
}

/// Mark `names` provided and finish provision analysis for `module`.
pub fn provide(graph: &ModuleGraph, module: &ModuleId, names: &[&str]) {
    let desc = graph.exports_info(module).expect("module exists");
    let mut exports = graph.exports_mut();
    for name in names {
        let record = exports.get_or_create(desc, name);
        exports.record_mut(record).set_provided(ProvidedState::Provided);
    }
    exports.mark_has_provide_info(desc);
}

/// Mark `names` used and finish usage analysis for `module`.
pub fn use_exports(graph: &ModuleGraph, module: &ModuleId, names: &[&str]) {
    let desc = graph.exports_info(module).expect("module exists");
    let mut exports = graph.exports_mut();
    for name in names {
        let record = exports.get_or_create(desc, name);
        exports.record_mut(record).set_used(UsageState::Used);
    }
    exports.mark_has_use_info(desc);
}

/// `from` imports `to` through a fresh dependency.
pub fn import(graph: &ModuleGraph, from: &ModuleId, to: &ModuleId, deferred: bool) -> DependencyId {
    let dep = graph
        .add_dependency(
            Some(from),
            Dependency::builder(to.readable()).deferred(deferred).build(),
        )
        .expect("add dependency");
    graph.connect(Some(from), dep, to).expect("connect");
    dep
}

/// `from` re-exports `target` of `to` under `name`.
pub fn reexport(
    graph: &ModuleGraph,
    from: &ModuleId,
    name: &str,
    to: &ModuleId,
    target: &[&str],
    deferred: bool,
) -> DependencyId {
    let dep = import(graph, from, to, deferred);
    graph
        .set_export_target(from, name, dep, Some(path(target)), 0)
        .expect("set target");
    dep
}

/// A concatenated member declaring and exporting `names` under their own name.
pub fn member(module: &ModuleId, names: &[&str]) -> ConcatenatedModule {
    let mut scope = ModuleScope::new();
    let mut info = ConcatenatedModule::new(module.clone());
    for name in names {
        scope.declare(*name, []);
        info = info.with_export(*name, *name);
    }
    info.with_scope(scope)
}
