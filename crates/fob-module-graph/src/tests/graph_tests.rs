//! Connection migration, retargeting and per-module attributes.

use crate::{Condition, Dependency, Error, Module, ModuleGraph, ModuleId, RuntimeSpec};

fn id(path: &str) -> ModuleId {
    ModuleId::new(path).expect("valid module id")
}

fn graph_with(paths: &[&str]) -> ModuleGraph {
    let graph = ModuleGraph::new().expect("Failed to create graph");
    for path in paths {
        graph.add_module(Module::builder(id(path)).build()).unwrap();
    }
    graph
}

fn link(graph: &ModuleGraph, from: &ModuleId, to: &ModuleId, request: &str) -> crate::DependencyId {
    let dep = graph
        .add_dependency(Some(from), Dependency::builder(request).build())
        .unwrap();
    graph.connect(Some(from), dep, to).unwrap();
    dep
}

#[test]
fn move_migrates_matching_edges_only() {
    let graph = graph_with(&["./a.js", "./b.js", "./c.js", "./merged.js"]);
    let (a, b, c, merged) = (id("./a.js"), id("./b.js"), id("./c.js"), id("./merged.js"));
    let a_to_b = link(&graph, &a, &b, "./b");
    let b_to_c = link(&graph, &b, &c, "./c");
    let b_to_a = link(&graph, &b, &a, "./a");

    let moved = graph
        .move_module_connections(&b, &merged, |connection| connection.module != a)
        .unwrap();
    // b -> c (outgoing) and a -> b (incoming) match; b -> a does not.
    assert_eq!(moved, 2);

    assert_eq!(graph.resolve(a_to_b).unwrap(), Some(merged.clone()));
    assert_eq!(graph.origin(b_to_c).unwrap(), Some(merged.clone()));
    assert_eq!(graph.origin(b_to_a).unwrap(), Some(b.clone()));

    let incoming_b = graph.incoming_connections(&b).unwrap();
    assert!(incoming_b.is_empty());
    let outgoing_b = graph.outgoing_connections(&b).unwrap();
    assert_eq!(outgoing_b.len(), 1);
    assert_eq!(outgoing_b[0].module, a);
    assert_eq!(graph.outgoing_connections(&merged).unwrap().len(), 1);
    assert_eq!(graph.incoming_connections(&merged).unwrap().len(), 1);
}

#[test]
fn move_onto_itself_is_a_no_op() {
    let graph = graph_with(&["./a.js", "./b.js"]);
    let (a, b) = (id("./a.js"), id("./b.js"));
    link(&graph, &a, &b, "./b");
    assert_eq!(graph.move_module_connections(&a, &a, |_| true).unwrap(), 0);
    assert_eq!(graph.outgoing_connections(&a).unwrap().len(), 1);
}

#[test]
fn update_module_deactivates_old_connection() {
    let graph = graph_with(&["./a.js", "./b.js", "./c.js"]);
    let (a, b, c) = (id("./a.js"), id("./b.js"), id("./c.js"));
    let dep = link(&graph, &a, &b, "./b");
    let old = graph.connection(dep).unwrap().unwrap();

    let new_id = graph.update_module(dep, &c).unwrap();
    assert_ne!(new_id, old.id);
    assert_eq!(graph.resolve(dep).unwrap(), Some(c.clone()));
    assert_eq!(graph.resolved_module(dep).unwrap(), Some(b.clone()));

    let old = graph.connection_by_id(old.id).unwrap().unwrap();
    assert!(!old.is_active(None));
    assert_eq!(graph.incoming_connections(&c).unwrap().len(), 1);
    assert_eq!(graph.outgoing_connections(&a).unwrap().len(), 2);
}

#[test]
fn update_module_requires_a_connection() {
    let graph = graph_with(&["./a.js", "./b.js"]);
    let a = id("./a.js");
    let dep = graph
        .add_dependency(Some(&a), Dependency::builder("./b").build())
        .unwrap();
    assert!(matches!(
        graph.update_module(dep, &id("./b.js")),
        Err(Error::DependencyNotConnected(_))
    ));
}

#[test]
fn remove_connection_unregisters_edges() {
    let graph = graph_with(&["./a.js", "./b.js"]);
    let (a, b) = (id("./a.js"), id("./b.js"));
    let dep = link(&graph, &a, &b, "./b");

    assert!(graph.remove_connection(dep).unwrap().is_some());
    assert_eq!(graph.resolve(dep).unwrap(), None);
    assert!(graph.outgoing_connections(&a).unwrap().is_empty());
    assert!(graph.incoming_connections(&b).unwrap().is_empty());
    assert!(graph.remove_connection(dep).unwrap().is_none());
}

#[test]
fn copy_outgoing_duplicates_edges() {
    let graph = graph_with(&["./a.js", "./b.js", "./copy.js"]);
    let (a, b, copy) = (id("./a.js"), id("./b.js"), id("./copy.js"));
    let dep = link(&graph, &a, &b, "./b");

    assert_eq!(graph.copy_outgoing_module_connections(&a, &copy, |_| true).unwrap(), 1);
    assert_eq!(graph.outgoing_connections(&a).unwrap().len(), 1);
    assert_eq!(graph.outgoing_connections(&copy).unwrap().len(), 1);
    assert_eq!(graph.incoming_connections(&b).unwrap().len(), 2);
    assert_eq!(graph.origin(dep).unwrap(), Some(a));
}

#[test]
fn grouped_connections_keep_duplicates() {
    let graph = graph_with(&["./a.js", "./b.js"]);
    let (a, b) = (id("./a.js"), id("./b.js"));
    link(&graph, &a, &b, "./b");
    link(&graph, &a, &b, "./b?again");

    let by_origin = graph.incoming_connections_by_origin(&b).unwrap();
    assert_eq!(by_origin.len(), 1);
    assert_eq!(by_origin[&Some(a.clone())].len(), 2);

    let by_module = graph.outgoing_connections_by_module(&a).unwrap();
    assert_eq!(by_module[&b].len(), 2);
}

#[test]
fn explanations_accumulate_on_the_connection() {
    let graph = graph_with(&["./a.js", "./b.js"]);
    let dep = link(&graph, &id("./a.js"), &id("./b.js"), "./b");
    graph.add_explanation(dep, "harmony import").unwrap();
    graph.add_explanation(dep, "harmony import").unwrap();
    let connection = graph.connection(dep).unwrap().unwrap();
    assert_eq!(connection.explanation().as_deref(), Some("harmony import"));
}

#[test]
fn runtime_conditions_flow_into_connections() {
    let graph = graph_with(&["./a.js", "./b.js"]);
    let (a, b) = (id("./a.js"), id("./b.js"));
    let dep = graph
        .add_dependency(
            Some(&a),
            Dependency::builder("./b")
                .condition(Condition::InRuntimes(RuntimeSpec::single("main")))
                .build(),
        )
        .unwrap();
    graph.connect(Some(&a), dep, &b).unwrap();

    let connection = graph.connection(dep).unwrap().unwrap();
    assert!(connection.is_active(Some(&RuntimeSpec::single("main"))));
    assert!(!connection.is_active(Some(&RuntimeSpec::single("worker"))));

    graph
        .update_connection(dep, |connection| connection.set_active(false))
        .unwrap();
    assert!(!graph.connection(dep).unwrap().unwrap().is_active(None));
}

#[test]
fn attributes_only_move_one_way() {
    let graph = graph_with(&["./a.js", "./b.js"]);
    let (a, b) = (id("./a.js"), id("./b.js"));

    assert!(graph.set_issuer_if_unset(&b, a.clone()).unwrap());
    assert!(!graph.set_issuer_if_unset(&b, b.clone()).unwrap());
    assert_eq!(graph.issuer(&b).unwrap(), Some(a.clone()));

    assert!(graph.set_pre_order_index_if_unset(&a, 0).unwrap());
    assert!(!graph.set_pre_order_index_if_unset(&a, 5).unwrap());
    assert_eq!(graph.pre_order_index(&a).unwrap(), Some(0));
    assert!(graph.set_post_order_index_if_unset(&a, 3).unwrap());
    assert_eq!(graph.post_order_index(&a).unwrap(), Some(3));

    assert!(graph.set_depth_if_lower(&b, 4).unwrap());
    assert!(graph.set_depth_if_lower(&b, 1).unwrap());
    assert!(!graph.set_depth_if_lower(&b, 2).unwrap());
    assert_eq!(graph.depth(&b).unwrap(), Some(1));

    graph.add_optimization_bailout(&a, "module is an entry point").unwrap();
    assert_eq!(graph.optimization_bailouts(&a).unwrap().len(), 1);
}

#[test]
fn deferred_needs_every_incoming_edge_deferred() {
    let graph = graph_with(&["./a.js", "./b.js", "./c.js"]);
    let (a, b, c) = (id("./a.js"), id("./b.js"), id("./c.js"));
    assert!(!graph.is_deferred(&c).unwrap());

    let deferred = graph
        .add_dependency(Some(&a), Dependency::builder("./c").deferred(true).build())
        .unwrap();
    graph.connect(Some(&a), deferred, &c).unwrap();
    assert!(graph.is_deferred(&c).unwrap());

    link(&graph, &b, &c, "./c");
    assert!(!graph.is_deferred(&c).unwrap());

    graph.set_async(&a).unwrap();
    assert!(graph.is_async(&a).unwrap());
}
