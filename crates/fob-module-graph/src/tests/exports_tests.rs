//! Export descriptor behaviour: lattice promotion, summaries and redirects.

use crate::{
    DescriptorId, Error, ExportsArena, ProvidedExports, ProvidedState, UsageState, UsedExports,
    UsedName,
};

fn path(segments: &[&str]) -> Vec<String> {
    segments.iter().map(|s| s.to_string()).collect()
}

/// Descriptor with analysis complete and the given names provided.
fn analysed(arena: &mut ExportsArena, names: &[&str]) -> DescriptorId {
    let desc = arena.new_descriptor();
    for name in names {
        let id = arena.get_or_create(desc, name);
        arena.record_mut(id).set_provided(ProvidedState::Provided);
    }
    arena.mark_has_provide_info(desc);
    arena.mark_has_use_info(desc);
    desc
}

#[test]
fn used_exports_lists_only_used_names() {
    let mut arena = ExportsArena::new();
    let desc = analysed(&mut arena, &["a", "b"]);
    arena.mark_export_used(desc, &path(&["a"]), UsageState::Used);

    assert_eq!(arena.used_exports(desc), UsedExports::Names(vec!["a".into()]));
}

#[test]
fn used_exports_is_unknown_before_use_info() {
    let mut arena = ExportsArena::new();
    let desc = arena.new_descriptor();
    arena.get_or_create(desc, "a");
    assert_eq!(arena.used_exports(desc), UsedExports::Unknown);
}

#[test]
fn unknown_way_means_everything() {
    let mut arena = ExportsArena::new();
    let desc = analysed(&mut arena, &["a"]);
    assert!(arena.mark_used_unknown_way(desc));
    assert!(!arena.mark_used_unknown_way(desc));
    assert_eq!(arena.used_exports(desc), UsedExports::Everything);

    let a = arena.read_only_record(desc, "a");
    assert_eq!(arena.record(a).can_mangle(), Some(false));
}

#[test]
fn maybe_provided_catch_all_provides_everything() {
    let mut arena = ExportsArena::new();
    let desc = arena.new_descriptor();
    let other = arena.descriptor(desc).other();
    arena.record_mut(other).set_provided(ProvidedState::MaybeProvided);
    assert_eq!(arena.provided_exports(desc), ProvidedExports::Everything);
}

#[test]
fn provided_exports_collects_provided_names() {
    let mut arena = ExportsArena::new();
    let desc = analysed(&mut arena, &["z", "a"]);
    arena.get_or_create(desc, "absent");
    assert_eq!(
        arena.provided_exports(desc),
        ProvidedExports::Names(vec!["a".into(), "z".into()])
    );

    let fresh = arena.new_descriptor();
    assert_eq!(arena.provided_exports(fresh), ProvidedExports::Unknown);
}

#[test]
fn redirect_merges_both_sides() {
    let mut arena = ExportsArena::new();
    let target = analysed(&mut arena, &["b"]);
    arena.mark_export_used(target, &path(&["b"]), UsageState::Used);

    let local = arena.new_descriptor();
    let a = arena.get_or_create(local, "a");
    arena.record_mut(a).set_provided(ProvidedState::Provided);
    arena.record_mut(a).set_used(UsageState::Used);
    arena.set_redirect(local, Some(target)).unwrap();
    arena.mark_has_use_info(local);

    assert_eq!(
        arena.used_exports(local),
        UsedExports::Names(vec!["a".into(), "b".into()])
    );
    assert_eq!(
        arena.provided_exports(local),
        ProvidedExports::Names(vec!["a".into(), "b".into()])
    );
}

#[test]
fn redirect_everything_wins() {
    let mut arena = ExportsArena::new();
    let target = analysed(&mut arena, &[]);
    arena.mark_used_unknown_way(target);

    let local = arena.new_descriptor();
    arena.get_or_create(local, "a");
    arena.set_redirect(local, Some(target)).unwrap();
    arena.mark_has_use_info(local);
    assert_eq!(arena.used_exports(local), UsedExports::Everything);
}

#[test]
fn redirected_empty_result_uses_local_side_effects_record() {
    let mut arena = ExportsArena::new();
    let target = analysed(&mut arena, &["b"]);
    // The target is kept for side effects, the redirecting descriptor is not.
    arena.mark_used_for_side_effects_only(target);

    let local = arena.new_descriptor();
    arena.set_redirect(local, Some(target)).unwrap();
    assert_eq!(arena.used_exports(local), UsedExports::Unknown);

    arena.mark_has_use_info(local);
    assert_eq!(arena.used_exports(local), UsedExports::Never);

    arena.mark_used_for_side_effects_only(local);
    assert_eq!(arena.used_exports(local), UsedExports::Names(Vec::new()));
}

#[test]
fn side_effects_only_without_redirect() {
    let mut arena = ExportsArena::new();
    let desc = analysed(&mut arena, &["a"]);
    assert_eq!(arena.used_exports(desc), UsedExports::Never);
    assert!(!arena.is_module_used(desc));

    assert!(arena.mark_used_for_side_effects_only(desc));
    assert_eq!(arena.used_exports(desc), UsedExports::Names(Vec::new()));
    assert!(arena.is_module_used(desc));
    assert!(!arena.is_used(desc));
}

#[test]
fn redirect_cycles_are_rejected() {
    let mut arena = ExportsArena::new();
    let a = arena.new_descriptor();
    let b = arena.new_descriptor();
    let c = arena.new_descriptor();
    assert!(arena.set_redirect(a, Some(b)).unwrap());
    assert!(arena.set_redirect(b, Some(c)).unwrap());
    assert!(!arena.set_redirect(b, Some(c)).unwrap());

    let err = arena.set_redirect(c, Some(a)).unwrap_err();
    assert!(matches!(err, Error::RedirectCycle { .. }));
    assert!(matches!(arena.set_redirect(a, Some(a)), Err(Error::RedirectCycle { .. })));
    assert_eq!(arena.descriptor(c).redirect(), None);
}

#[test]
fn records_created_through_redirect_live_in_target() {
    let mut arena = ExportsArena::new();
    let target = arena.new_descriptor();
    let local = arena.new_descriptor();
    arena.set_redirect(local, Some(target)).unwrap();

    let id = arena.get_or_create(local, "x");
    assert_eq!(arena.descriptor(target).own_export("x"), Some(id));
    assert_eq!(arena.descriptor(local).own_export("x"), None);
    assert_eq!(arena.read_only_record(local, "x"), id);
}

#[test]
fn new_records_inherit_catch_all_policy() {
    let mut arena = ExportsArena::new();
    let desc = arena.new_descriptor();
    arena.mark_has_provide_info(desc);
    arena.mark_unknown_provided(desc, false);

    let late = arena.get_or_create(desc, "late");
    assert_eq!(arena.record(late).provided(), ProvidedState::MaybeProvided);
    assert_eq!(arena.record(late).can_mangle_provide(), Some(false));
}

#[test]
fn mark_unknown_provided_is_idempotent() {
    let mut arena = ExportsArena::new();
    let desc = analysed(&mut arena, &["a"]);
    arena.get_or_create(desc, "b");

    assert!(arena.mark_unknown_provided(desc, true));
    assert!(!arena.mark_unknown_provided(desc, true));

    let a = arena.read_only_record(desc, "a");
    let b = arena.read_only_record(desc, "b");
    assert_eq!(arena.record(a).provided(), ProvidedState::Provided);
    assert_eq!(arena.record(b).provided(), ProvidedState::MaybeProvided);
    assert_eq!(arena.record(a).can_mangle_provide(), Some(true));

    assert!(arena.mark_unknown_provided(desc, false));
    assert_eq!(arena.record(a).can_mangle_provide(), Some(false));
}

#[test]
fn excluded_names_keep_their_provision() {
    let mut arena = ExportsArena::new();
    let desc = arena.new_descriptor();
    arena.mark_has_provide_info(desc);
    arena.mark_unknown_provided_with(desc, true, &["default"], None);

    let default = arena.read_only_record(desc, "default");
    assert_eq!(arena.record(default).provided(), ProvidedState::NotProvided);
    let other = arena.read_only_record(desc, "anything");
    assert_eq!(arena.record(other).provided(), ProvidedState::MaybeProvided);
}

#[test]
fn mark_all_known_used_skips_unprovided() {
    let mut arena = ExportsArena::new();
    let desc = analysed(&mut arena, &["a"]);
    arena.get_or_create(desc, "b");
    assert!(arena.mark_all_known_used(desc));
    assert!(!arena.mark_all_known_used(desc));
    assert_eq!(arena.used_exports(desc), UsedExports::Names(vec!["a".into()]));
}

#[test]
fn nested_paths_mark_properties_used() {
    let mut arena = ExportsArena::new();
    let desc = analysed(&mut arena, &["ns"]);
    let ns = arena.read_only_record(desc, "ns");
    let nested = arena.create_nested(ns);
    arena.get_or_create(nested, "inner");
    arena.mark_has_use_info(nested);

    arena.mark_export_used(desc, &path(&["ns", "inner"]), UsageState::Used);
    assert_eq!(arena.used_state(desc, &path(&["ns"])), UsageState::PropertiesUsed);
    assert_eq!(arena.used_state(desc, &path(&["ns", "inner"])), UsageState::Used);
    assert!(arena.is_export_used(desc, &path(&["ns", "inner"])));
    assert_eq!(arena.nested_descriptor(desc, &path(&["ns"])), Some(nested));
    assert_eq!(arena.create_nested(ns), nested);
}

#[test]
fn used_name_follows_renames_and_virtual_records() {
    let mut arena = ExportsArena::new();
    let desc = analysed(&mut arena, &["long", "virt", "skipped"]);
    arena.mark_export_used(desc, &path(&["long"]), UsageState::Used);
    arena.mark_export_used(desc, &path(&["virt"]), UsageState::Used);

    let long = arena.read_only_record(desc, "long");
    arena.record_mut(long).set_used_name(UsedName::Renamed("a".into()));
    let virt = arena.read_only_record(desc, "virt");
    arena.record_mut(virt).set_used_name(UsedName::Virtual);

    assert_eq!(arena.used_name(desc, &path(&["long", "x"])), Some(path(&["a", "x"])));
    assert_eq!(arena.used_name(desc, &path(&["virt", "y"])), Some(path(&["y"])));
    assert_eq!(arena.used_name(desc, &path(&["skipped"])), None);
}

#[test]
fn is_provided_distinguishes_unknown() {
    let mut arena = ExportsArena::new();
    let desc = analysed(&mut arena, &["a"]);
    assert_eq!(arena.is_provided(desc, &path(&["a"])), Some(true));
    assert_eq!(arena.is_provided(desc, &path(&["missing"])), Some(false));
    assert_eq!(arena.is_provided(desc, &path(&["a", "deep"])), None);

    arena.mark_unknown_provided(desc, true);
    assert_eq!(arena.is_provided(desc, &path(&["missing"])), None);
}

#[test]
fn relevant_exports_skip_unused_and_unprovided() {
    let mut arena = ExportsArena::new();
    let desc = analysed(&mut arena, &["a", "b"]);
    arena.get_or_create(desc, "c");
    arena.mark_export_used(desc, &path(&["a"]), UsageState::Used);
    arena.mark_export_used(desc, &path(&["c"]), UsageState::Used);

    let names: Vec<_> = arena
        .relevant_exports(desc)
        .into_iter()
        .map(|id| arena.record(id).name().map(str::to_string))
        .collect();
    assert_eq!(names, vec![Some("a".to_string())]);
}

#[test]
fn ordered_exports_merge_redirect_targets() {
    let mut arena = ExportsArena::new();
    let target = arena.new_descriptor();
    arena.get_or_create(target, "b");
    let shadowed = arena.get_or_create(target, "a");
    let local = arena.new_descriptor();
    let a = arena.get_or_create(local, "a");
    arena.set_redirect(local, Some(target)).unwrap();

    let merged = arena.exports(local);
    assert_eq!(merged.len(), 2);
    assert!(merged.contains(&a));
    assert!(!merged.contains(&shadowed));
}
