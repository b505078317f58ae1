//! End-to-end scope hoisting tests
//!
//! Each test builds an analysed graph, assembles a merge set, allocates names
//! and resolves references the way a code generator would.

mod helpers;

use fob_hoist::binding::CIRCULAR_REEXPORT;
use fob_hoist::identifier::RESERVED_NAMES;
use fob_hoist::{
    Binding, BindingResolver, ConcatenatedModule, ExternalModule, HoistOptions, ImportedBinding,
    MergeSet, ModuleScope, Renamer, ResolveOptions,
};
use fob_module_graph::{DefaultObject, ExportShape, ExportsType, Module, ModuleGraph};
use helpers::*;

#[test]
fn named_export_resolves_to_its_declaration() {
    let graph = ModuleGraph::new().unwrap();
    let x = id("./src/x.js");
    graph
        .add_module(
            Module::builder(x.clone())
                .exports_type(ExportsType::Default)
                .default_object(DefaultObject::Redirect)
                .build(),
        )
        .unwrap();
    provide(&graph, &x, &["foo"]);
    use_exports(&graph, &x, &["foo"]);
    assert_eq!(graph.exports_shape(&x, false).unwrap(), ExportShape::DefaultWithNamed);

    let set = MergeSet::builder(x.clone())
        .concatenated(member(&x, &["foo"]))
        .build()
        .unwrap();
    let reader = graph.reader();
    let options = HoistOptions::default();
    let names = Renamer::new(&options).allocate(&reader, &set).unwrap();
    let mut resolver = BindingResolver::new(&reader, &set, &names, &options);

    let binding = resolver.resolve(&x, &path(&["foo"]), &ResolveOptions::default()).unwrap();
    assert_eq!(
        binding,
        Binding::Symbol {
            module: x.clone(),
            symbol: "foo".to_string(),
            ids: Vec::new(),
            export: path(&["foo"]),
            deferred: false,
        }
    );
    assert_eq!(resolver.render(&binding, &ResolveOptions::default()).unwrap(), "foo");
    assert!(resolver.needed().is_empty());
}

#[test]
fn reexport_of_external_module_binds_to_its_name() {
    let graph = ModuleGraph::new().unwrap();
    let y = id("./src/y.js");
    let z = id("./src/z.js");
    esm(&graph, &y);
    esm(&graph, &z);
    reexport(&graph, &y, "bar", &z, &["baz"], false);

    let set = MergeSet::from_graph(&graph.reader(), y.clone(), vec![member(&y, &[])], None).unwrap();
    assert_eq!(set.len(), 2);
    assert!(!set.entry(&z).unwrap().is_concatenated());

    let reader = graph.reader();
    let options = HoistOptions::default();
    let names = Renamer::new(&options).allocate(&reader, &set).unwrap();
    assert_eq!(names.module(&z).unwrap().external_name.as_deref(), Some("z"));

    let mut resolver = BindingResolver::new(&reader, &set, &names, &options);
    let binding = resolver.resolve(&y, &path(&["bar"]), &ResolveOptions::default()).unwrap();
    match &binding {
        Binding::Raw { module, name, ids, comment, .. } => {
            assert_eq!(module, &z);
            assert_eq!(name, "z");
            assert_eq!(ids, &path(&["baz"]));
            assert_eq!(comment, &None);
        }
        other => panic!("expected an external binding, got {other:?}"),
    }
    assert_eq!(resolver.render(&binding, &ResolveOptions::default()).unwrap(), "z.baz");
}

#[test]
fn same_symbol_in_two_modules_gets_distinct_names() {
    let graph = ModuleGraph::new().unwrap();
    let a = id("./src/a/value.mod");
    let b = id("./src/b/value.mod");
    esm(&graph, &a);
    esm(&graph, &b);

    let set = MergeSet::builder(b.clone())
        .concatenated(member(&a, &["value"]))
        .concatenated(member(&b, &["value"]))
        .build()
        .unwrap();
    let reader = graph.reader();
    let names = Renamer::new(&HoistOptions::default()).allocate(&reader, &set).unwrap();

    let first = names.internal_name(&a, "value").unwrap();
    let second = names.internal_name(&b, "value").unwrap();
    assert_eq!(first, "value");
    assert_eq!(second, "value_value");
    for name in [first, second] {
        assert!(!RESERVED_NAMES.contains(&name));
    }
}

#[test]
fn circular_reexport_terminates_with_a_stub() {
    let graph = ModuleGraph::new().unwrap();
    let a = id("./src/a.js");
    let b = id("./src/b.js");
    esm(&graph, &a);
    esm(&graph, &b);
    reexport(&graph, &a, "x", &b, &["y"], false);
    reexport(&graph, &b, "y", &a, &["x"], false);

    let set = MergeSet::builder(a.clone())
        .concatenated(ConcatenatedModule::new(b.clone()))
        .concatenated(ConcatenatedModule::new(a.clone()))
        .build()
        .unwrap();
    let reader = graph.reader();
    let options = HoistOptions::default();
    let names = Renamer::new(&options).allocate(&reader, &set).unwrap();
    let mut resolver = BindingResolver::new(&reader, &set, &names, &options);

    for request in [path(&["x"]), path(&["x", "deep"])] {
        let name = resolver.final_name(&a, &request, &ResolveOptions::default()).unwrap();
        assert_eq!(name, CIRCULAR_REEXPORT);
    }
    let name = resolver.final_name(&b, &path(&["y"]), &ResolveOptions::default()).unwrap();
    assert_eq!(name, CIRCULAR_REEXPORT);
}

#[test]
fn default_of_legacy_module_is_resolved_once() {
    let graph = ModuleGraph::new().unwrap();
    let entry = id("./src/index.js");
    let legacy = id("./src/legacy.js");
    esm(&graph, &entry);
    graph
        .add_module(
            Module::builder(legacy.clone())
                .exports_type(ExportsType::Default)
                .default_object(DefaultObject::Redirect)
                .build(),
        )
        .unwrap();

    let set = MergeSet::builder(entry.clone())
        .concatenated(member(&legacy, &[]))
        .concatenated(member(&entry, &[]))
        .build()
        .unwrap();
    let reader = graph.reader();
    let options = HoistOptions::default();
    let names = Renamer::new(&options).allocate(&reader, &set).unwrap();
    let mut resolver = BindingResolver::new(&reader, &set, &names, &options);

    let first = resolver.resolve(&legacy, &path(&["default"]), &ResolveOptions::default()).unwrap();
    let second = resolver.resolve(&legacy, &path(&["default"]), &ResolveOptions::default()).unwrap();
    assert_eq!(first, second);

    let namespace = names.module(&legacy).unwrap().namespace_object.clone().unwrap();
    assert_eq!(resolver.render(&first, &ResolveOptions::default()).unwrap(), namespace);

    let needed = resolver.into_needed();
    assert_eq!(needed.namespace_objects.len(), 1);
    assert!(needed.namespace_objects.contains(&legacy));
}

#[test]
fn whole_namespace_of_legacy_module_uses_interop_wrapper() {
    let graph = ModuleGraph::new().unwrap();
    let entry = id("./src/index.js");
    let legacy = id("./src/legacy.js");
    esm(&graph, &entry);
    graph
        .add_module(
            Module::builder(legacy.clone())
                .exports_type(ExportsType::Default)
                .default_object(DefaultObject::Redirect)
                .build(),
        )
        .unwrap();

    let set = MergeSet::builder(entry.clone())
        .concatenated(member(&legacy, &[]))
        .concatenated(member(&entry, &[]))
        .build()
        .unwrap();
    let reader = graph.reader();
    let options = HoistOptions::default();
    let names = Renamer::new(&options).allocate(&reader, &set).unwrap();
    let mut resolver = BindingResolver::new(&reader, &set, &names, &options);

    let wrapper = names.module(&legacy).unwrap().interop_namespace.clone().unwrap();
    for _ in 0..3 {
        let name = resolver.final_name(&legacy, &[], &ResolveOptions::default()).unwrap();
        assert_eq!(name, wrapper);
    }
    assert_eq!(resolver.needed().interop_namespaces.len(), 1);
    assert!(resolver.needed().namespace_objects.is_empty());
}

#[test]
fn every_allocated_name_is_unique_across_the_set() {
    let graph = ModuleGraph::new().unwrap();
    let entry = id("./src/index.js");
    let util = id("./src/util.js");
    let legacy = id("./lib/util.js");
    esm(&graph, &entry);
    esm(&graph, &util);
    graph
        .add_module(Module::builder(legacy.clone()).exports_type(ExportsType::Dynamic).build())
        .unwrap();
    import(&graph, &entry, &util, false);
    import(&graph, &entry, &legacy, false);

    let mut scope = ModuleScope::new();
    scope.declare("util", []).declare("name", []).add_global("window");
    let entry_member = ConcatenatedModule::new(entry.clone()).with_scope(scope);
    let members = vec![member(&util, &["util", "helper"]), entry_member];
    let set = MergeSet::from_graph(&graph.reader(), entry.clone(), members, None).unwrap();

    let reader = graph.reader();
    let names = Renamer::new(&HoistOptions::default()).allocate(&reader, &set).unwrap();

    let all: Vec<&str> = names
        .module(&util)
        .into_iter()
        .chain(names.module(&legacy))
        .chain(names.module(&entry))
        .flat_map(|module| {
            module.internal.values().map(String::as_str).chain(
                [
                    &module.namespace_object,
                    &module.external_name,
                    &module.interop_namespace,
                    &module.interop_namespace2,
                    &module.interop_default,
                ]
                .into_iter()
                .flatten()
                .map(String::as_str),
            )
        })
        .collect();
    let unique = names.top_level_declarations();
    assert_eq!(all.len(), unique.len());
    assert!(!unique.contains("window"));
    assert!(!unique.contains("name"));
    assert_eq!(names.internal_name(&util, "util"), Some("util"));
    assert_ne!(names.internal_name(&entry, "util"), Some("util"));
}

#[test]
fn imported_symbol_avoids_locals_at_the_importing_site() {
    let graph = ModuleGraph::new().unwrap();
    let a = id("./src/a.js");
    let b = id("./src/b.js");
    esm(&graph, &a);
    esm(&graph, &b);
    import(&graph, &a, &b, false);
    provide(&graph, &b, &["helper"]);
    use_exports(&graph, &b, &["helper"]);

    // `function run(helper) { return importedHelper(helper) }` in a.js
    let mut scope = ModuleScope::new();
    let root = scope.module_scope;
    let run = scope.add_scope(root, ["helper"]);
    scope.reference_import(b.clone(), ImportedBinding::Symbol("helper".into()), [run]);
    let importer = ConcatenatedModule::new(a.clone()).with_scope(scope);

    let set = MergeSet::builder(a.clone())
        .concatenated(member(&b, &["helper"]))
        .concatenated(importer)
        .build()
        .unwrap();
    let reader = graph.reader();
    let options = HoistOptions::default();
    let names = Renamer::new(&options).allocate(&reader, &set).unwrap();
    let mut resolver = BindingResolver::new(&reader, &set, &names, &options);

    let name = resolver.final_name(&b, &path(&["helper"]), &ResolveOptions::default()).unwrap();
    assert_ne!(name, "helper");
    assert_eq!(name, "b_helper");
}

#[test]
fn external_name_avoids_locals_at_the_importing_site() {
    let graph = ModuleGraph::new().unwrap();
    let entry = id("./src/index.js");
    let ext = id("./src/ext.js");
    esm(&graph, &entry);
    esm(&graph, &ext);
    import(&graph, &entry, &ext, false);

    // `function load(ext) { return ext_ns.read(ext) }` in index.js
    let mut scope = ModuleScope::new();
    let root = scope.module_scope;
    let load = scope.add_scope(root, ["ext"]);
    scope.reference_import(ext.clone(), ImportedBinding::Symbol("read".into()), [load]);
    let entry_member = ConcatenatedModule::new(entry.clone()).with_scope(scope);

    let set = MergeSet::builder(entry.clone())
        .external(ExternalModule::new(ext.clone()))
        .concatenated(entry_member)
        .build()
        .unwrap();
    let reader = graph.reader();
    let options = HoistOptions::default();
    let names = Renamer::new(&options).allocate(&reader, &set).unwrap();
    let external = names.module(&ext).unwrap().external_name.clone().unwrap();
    assert_ne!(external, "ext");

    let mut resolver = BindingResolver::new(&reader, &set, &names, &options);
    let rendered = resolver.final_name(&ext, &path(&["read"]), &ResolveOptions::default()).unwrap();
    assert_eq!(rendered, format!("{external}.read"));
}
