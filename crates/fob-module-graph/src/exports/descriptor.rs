//! Descriptor-level operations: lookups, lattice promotion and summaries.

use rustc_hash::FxHashMap;
use tracing::trace;

use super::state::{ProvidedExports, ProvidedState, UsageState, UsedExports};
use super::{DescriptorId, ExportsArena, RecordId, ReexportTarget};
use crate::{Error, Result};

impl ExportsArena {
    /// Existing record for `name`, or a new one seeded from the catch-all.
    ///
    /// Lookups that miss locally follow the redirect; the record is created in
    /// the first descriptor without a redirect.
    pub fn get_or_create(&mut self, desc: DescriptorId, name: &str) -> RecordId {
        if let Some(id) = self.descriptor(desc).own_export(name) {
            return id;
        }
        match self.descriptor(desc).redirect() {
            Some(redirect) => self.get_or_create(redirect, name),
            None => self.insert_local(desc, name),
        }
    }

    /// Local record for `name`, or the local catch-all. Never follows the redirect.
    pub fn own_record(&self, desc: DescriptorId, name: &str) -> RecordId {
        let descriptor = self.descriptor(desc);
        descriptor.own_export(name).unwrap_or(descriptor.other())
    }

    /// Record for `name` without creating anything.
    pub fn read_only_record(&self, desc: DescriptorId, name: &str) -> RecordId {
        let descriptor = self.descriptor(desc);
        if let Some(id) = descriptor.own_export(name) {
            return id;
        }
        match descriptor.redirect() {
            Some(redirect) => self.read_only_record(redirect, name),
            None => descriptor.other(),
        }
    }

    /// Record addressed by a property path, descending nested descriptors.
    pub fn read_only_record_recursive(&self, desc: DescriptorId, path: &[String]) -> Option<RecordId> {
        let (first, rest) = path.split_first()?;
        let record = self.read_only_record(desc, first);
        if rest.is_empty() {
            return Some(record);
        }
        let nested = self.record(record).nested()?;
        self.read_only_record_recursive(nested, rest)
    }

    /// Descriptor reached by following `path` through nested descriptors.
    pub fn nested_descriptor(&self, desc: DescriptorId, path: &[String]) -> Option<DescriptorId> {
        match path.split_first() {
            None => Some(desc),
            Some((first, rest)) => {
                let record = self.read_only_record(desc, first);
                let nested = self.record(record).nested()?;
                self.nested_descriptor(nested, rest)
            }
        }
    }

    /// Create (or return) the descriptor owned by `record`.
    ///
    /// A previously linked, non-owned descriptor becomes the redirect target of
    /// the new one so that nothing already known is lost.
    pub fn create_nested(&mut self, record: RecordId) -> DescriptorId {
        let current = self.record(record);
        if current.owns_nested() {
            if let Some(nested) = current.nested() {
                return nested;
            }
        }
        let previous = current.nested();
        let nested = self.new_descriptor_owned_by(Some(record));
        self.mark_has_provide_info(nested);
        if let Some(previous) = previous {
            self.descriptor_mut(nested).redirect = Some(previous);
        }
        let record = self.record_mut(record);
        record.nested = Some(nested);
        record.nested_owned = true;
        nested
    }

    /// Point `record` at a descriptor it does not own (e.g. a re-exported
    /// namespace). Owned descriptors are never replaced.
    pub fn link_nested(&mut self, record: RecordId, desc: DescriptorId) -> bool {
        let record = self.record_mut(record);
        if record.owns_nested() || record.nested() == Some(desc) {
            return false;
        }
        record.nested = Some(desc);
        true
    }

    /// Effective catch-all record (follows the redirect).
    pub fn other(&self, desc: DescriptorId) -> RecordId {
        let descriptor = self.descriptor(desc);
        match descriptor.redirect() {
            Some(redirect) => self.other(redirect),
            None => descriptor.other(),
        }
    }

    pub fn side_effects_only(&self, desc: DescriptorId) -> RecordId {
        self.descriptor(desc).side_effects_only()
    }

    /// Redirect named lookups of `desc` to `target`.
    ///
    /// Returns whether anything changed. A redirect that would close a cycle
    /// is rejected, since every merge below assumes redirect chains end.
    pub fn set_redirect(&mut self, desc: DescriptorId, target: Option<DescriptorId>) -> Result<bool> {
        if self.descriptor(desc).redirect() == target {
            return Ok(false);
        }
        if let Some(target) = target {
            let mut cursor = Some(target);
            while let Some(current) = cursor {
                if current == desc {
                    return Err(Error::RedirectCycle {
                        descriptor: desc,
                        target,
                    });
                }
                cursor = self.descriptor(current).redirect();
            }
        }
        trace!(%desc, ?target, "export descriptor redirect changed");
        self.descriptor_mut(desc).redirect = target;
        Ok(true)
    }

    /// Every export visible through `desc`, local entries overriding the
    /// redirect target's, sorted by name.
    pub fn exports(&self, desc: DescriptorId) -> Vec<RecordId> {
        let mut by_name: FxHashMap<String, RecordId> = FxHashMap::default();
        self.collect_exports(desc, &mut by_name);
        let mut entries: Vec<(String, RecordId)> = by_name.into_iter().collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries.into_iter().map(|(_, id)| id).collect()
    }

    fn collect_exports(&self, desc: DescriptorId, into: &mut FxHashMap<String, RecordId>) {
        if let Some(redirect) = self.descriptor(desc).redirect() {
            self.collect_exports(redirect, into);
        }
        for (name, id) in &self.descriptor(desc).exports {
            into.insert(name.clone(), *id);
        }
    }

    /// Provision analysis for the module is complete: undetermined becomes
    /// not provided.
    pub fn mark_has_provide_info(&mut self, desc: DescriptorId) {
        for id in self.local_ids(desc) {
            self.record_mut(id).mark_has_provide_info();
        }
        match self.descriptor(desc).redirect() {
            Some(redirect) => self.mark_has_provide_info(redirect),
            None => {
                let other = self.descriptor(desc).other();
                self.record_mut(other).mark_has_provide_info();
            }
        }
    }

    /// Usage analysis for the module is complete: no info becomes unused.
    pub fn mark_has_use_info(&mut self, desc: DescriptorId) {
        for id in self.local_ids(desc) {
            self.record_mut(id).mark_has_use_info();
            let record = self.record(id);
            if record.owns_nested() {
                if let Some(nested) = record.nested() {
                    self.mark_has_use_info(nested);
                }
            }
        }
        let side_effects = self.descriptor(desc).side_effects_only();
        self.record_mut(side_effects).mark_has_use_info();
        match self.descriptor(desc).redirect() {
            Some(redirect) => self.mark_has_use_info(redirect),
            None => {
                let other = self.descriptor(desc).other();
                self.record_mut(other).mark_has_use_info();
            }
        }
    }

    /// The module exports names that cannot be determined statically.
    pub fn mark_unknown_provided(&mut self, desc: DescriptorId, can_mangle: bool) -> bool {
        self.mark_unknown_provided_with(desc, can_mangle, &[], None)
    }

    /// Like [`mark_unknown_provided`](Self::mark_unknown_provided), keeping the
    /// provision of `exclude` untouched and pointing every export at `target`.
    pub fn mark_unknown_provided_with(
        &mut self,
        desc: DescriptorId,
        can_mangle: bool,
        exclude: &[&str],
        target: Option<ReexportTarget>,
    ) -> bool {
        let mut changed = false;
        for name in exclude {
            self.get_or_create(desc, name);
        }

        for id in self.local_ids(desc) {
            let record = self.record_mut(id);
            if !can_mangle && record.can_mangle_provide != Some(false) {
                record.can_mangle_provide = Some(false);
                changed = true;
            }
            let name = record.name().unwrap_or_default().to_string();
            if exclude.contains(&name.as_str()) {
                continue;
            }
            if record.set_provided(ProvidedState::MaybeProvided) {
                changed = true;
            }
            if let Some(target) = target {
                record.set_target(target.key, target.connection, Some(vec![name]), -1);
            }
        }

        match self.descriptor(desc).redirect() {
            Some(redirect) => {
                if self.mark_unknown_provided_with(redirect, can_mangle, exclude, target) {
                    changed = true;
                }
            }
            None => {
                let other = self.descriptor(desc).other();
                let record = self.record_mut(other);
                if record.set_provided(ProvidedState::MaybeProvided) {
                    changed = true;
                }
                if !can_mangle && record.can_mangle_provide != Some(false) {
                    record.can_mangle_provide = Some(false);
                    changed = true;
                }
                if let Some(target) = target {
                    record.set_target(target.key, target.connection, None, target.priority);
                }
            }
        }
        changed
    }

    /// The module is consumed in a way the analysis cannot follow.
    pub fn mark_used_unknown_way(&mut self, desc: DescriptorId) -> bool {
        let mut changed = false;
        for id in self.local_ids(desc) {
            if self.record_mut(id).set_used_in_unknown_way() {
                changed = true;
            }
        }
        match self.descriptor(desc).redirect() {
            Some(redirect) => {
                if self.mark_used_unknown_way(redirect) {
                    changed = true;
                }
            }
            None => {
                let other = self.descriptor(desc).other();
                if self.record_mut(other).set_used_in_unknown_way() {
                    changed = true;
                }
            }
        }
        changed
    }

    /// Every export known to be provided is used.
    pub fn mark_all_known_used(&mut self, desc: DescriptorId) -> bool {
        let mut changed = false;
        for id in self.local_ids(desc) {
            let record = self.record_mut(id);
            if record.provided() != ProvidedState::Provided {
                continue;
            }
            if record.set_used(UsageState::Used) {
                changed = true;
            }
        }
        changed
    }

    /// The module is kept only for its side effects.
    pub fn mark_used_for_side_effects_only(&mut self, desc: DescriptorId) -> bool {
        let side_effects = self.descriptor(desc).side_effects_only();
        self.record_mut(side_effects)
            .set_used_conditionally(|used| used <= UsageState::Unused, UsageState::Used)
    }

    /// Mark the export at `path` as used with `state`.
    ///
    /// Intermediate segments with a nested descriptor become
    /// `PropertiesUsed`; the walk stops at the first segment without one. An
    /// empty path means the whole namespace is used in an unknown way.
    pub fn mark_export_used(&mut self, desc: DescriptorId, path: &[String], state: UsageState) -> bool {
        let Some((first, rest)) = path.split_first() else {
            return self.mark_used_unknown_way(desc);
        };
        let id = self.get_or_create(desc, first);
        if !rest.is_empty() {
            if let Some(nested) = self.record(id).nested() {
                let changed = self
                    .record_mut(id)
                    .set_used_conditionally(|used| used <= UsageState::Unused, UsageState::PropertiesUsed);
                return self.mark_export_used(nested, rest, state) || changed;
            }
        }
        self.record_mut(id).set_used(state)
    }

    /// Any export (or the catch-all) may be used.
    pub fn is_used(&self, desc: DescriptorId) -> bool {
        let descriptor = self.descriptor(desc);
        match descriptor.redirect() {
            Some(redirect) => {
                if self.is_used(redirect) {
                    return true;
                }
            }
            None => {
                if self.record(descriptor.other()).used().is_used() {
                    return true;
                }
            }
        }
        descriptor
            .exports
            .values()
            .any(|id| self.record(*id).used().is_used())
    }

    /// Used for exports or kept for side effects.
    pub fn is_module_used(&self, desc: DescriptorId) -> bool {
        self.is_used(desc)
            || self
                .record(self.descriptor(desc).side_effects_only())
                .used()
                .is_used()
    }

    /// Summarise which exports are consumed.
    pub fn used_exports(&self, desc: DescriptorId) -> UsedExports {
        let descriptor = self.descriptor(desc);
        if descriptor.redirect().is_none() {
            match self.record(descriptor.other()).used() {
                UsageState::NoInfo => return UsedExports::Unknown,
                UsageState::Unknown | UsageState::PropertiesUsed | UsageState::Used => {
                    return UsedExports::Everything;
                }
                UsageState::Unused => {}
            }
        }

        let mut names = Vec::new();
        for id in self.ordered_own_exports(desc) {
            let record = self.record(*id);
            match record.used() {
                UsageState::NoInfo => return UsedExports::Unknown,
                UsageState::Unknown => return UsedExports::Everything,
                UsageState::PropertiesUsed | UsageState::Used => {
                    names.push(record.name().unwrap_or_default().to_string());
                }
                UsageState::Unused => {}
            }
        }

        if let Some(redirect) = descriptor.redirect() {
            match self.used_exports(redirect) {
                UsedExports::Unknown => return UsedExports::Unknown,
                UsedExports::Everything => return UsedExports::Everything,
                UsedExports::Never => {}
                UsedExports::Names(inner) => names.extend(inner),
            }
        }

        // Only the local side-effects record decides an empty answer, even
        // when the descriptor is redirected.
        if names.is_empty() {
            match self.record(descriptor.side_effects_only()).used() {
                UsageState::NoInfo => return UsedExports::Unknown,
                UsageState::Unused => return UsedExports::Never,
                _ => {}
            }
        }

        names.sort();
        names.dedup();
        UsedExports::Names(names)
    }

    /// Summarise which exports exist.
    pub fn provided_exports(&self, desc: DescriptorId) -> ProvidedExports {
        let descriptor = self.descriptor(desc);
        if descriptor.redirect().is_none() {
            match self.record(descriptor.other()).provided() {
                ProvidedState::Undetermined => return ProvidedExports::Unknown,
                ProvidedState::MaybeProvided | ProvidedState::Provided => {
                    return ProvidedExports::Everything;
                }
                ProvidedState::NotProvided => {}
            }
        }

        let mut names = Vec::new();
        for id in self.ordered_own_exports(desc) {
            let record = self.record(*id);
            match record.provided() {
                ProvidedState::Undetermined => return ProvidedExports::Unknown,
                ProvidedState::MaybeProvided => return ProvidedExports::Everything,
                ProvidedState::Provided => names.push(record.name().unwrap_or_default().to_string()),
                ProvidedState::NotProvided => {}
            }
        }

        if let Some(redirect) = descriptor.redirect() {
            match self.provided_exports(redirect) {
                ProvidedExports::Unknown => return ProvidedExports::Unknown,
                ProvidedExports::Everything => return ProvidedExports::Everything,
                ProvidedExports::Names(inner) => {
                    for name in inner {
                        if !names.contains(&name) {
                            names.push(name);
                        }
                    }
                }
            }
        }

        names.sort();
        ProvidedExports::Names(names)
    }

    /// Records that may matter for code generation: not unused and not known
    /// to be absent. Includes the catch-all when it qualifies.
    pub fn relevant_exports(&self, desc: DescriptorId) -> Vec<RecordId> {
        let descriptor = self.descriptor(desc);
        let relevant = |id: &RecordId| {
            let record = self.record(*id);
            record.used().is_used() && record.provided() != ProvidedState::NotProvided
        };

        let mut list: Vec<RecordId> = self
            .ordered_own_exports(desc)
            .iter()
            .copied()
            .filter(relevant)
            .collect();

        match descriptor.redirect() {
            Some(redirect) => {
                for id in self.relevant_exports(redirect) {
                    let shadowed = self
                        .record(id)
                        .name()
                        .is_some_and(|name| descriptor.own_export(name).is_some());
                    if !shadowed {
                        list.push(id);
                    }
                }
            }
            None => {
                if relevant(&descriptor.other()) {
                    list.push(descriptor.other());
                }
            }
        }
        list
    }

    /// Usage of the export at `path` (the catch-all for an empty path).
    pub fn used_state(&self, desc: DescriptorId, path: &[String]) -> UsageState {
        let Some((first, rest)) = path.split_first() else {
            return self.record(self.other(desc)).used();
        };
        let record = self.record(self.read_only_record(desc, first));
        match record.nested() {
            Some(nested) if !rest.is_empty() => self.used_state(nested, rest),
            _ => record.used(),
        }
    }

    /// Whether the export at `path` may be consumed.
    pub fn is_export_used(&self, desc: DescriptorId, path: &[String]) -> bool {
        if path.is_empty() {
            return self.is_used(desc);
        }
        self.used_state(desc, path).is_used()
    }

    /// `Some(true)` when the export at `path` definitely exists,
    /// `Some(false)` when it definitely does not, `None` when unknown.
    pub fn is_provided(&self, desc: DescriptorId, path: &[String]) -> Option<bool> {
        let (first, rest) = path.split_first()?;
        let record = self.record(self.read_only_record(desc, first));
        if let Some(nested) = record.nested() {
            if !rest.is_empty() {
                return self.is_provided(nested, rest);
            }
        }
        match record.provided() {
            ProvidedState::Provided if rest.is_empty() => Some(true),
            ProvidedState::Provided => None,
            other => other.as_option(),
        }
    }

    /// Output path for the export at `path`, or `None` when it is unused.
    ///
    /// Virtual records contribute no segment.
    pub fn used_name(&self, desc: DescriptorId, path: &[String]) -> Option<Vec<String>> {
        let Some((first, rest)) = path.split_first() else {
            return self.is_used(desc).then(Vec::new);
        };
        let record = self.record(self.read_only_record(desc, first));
        let head = record.resolved_used_name(first)?;
        let mut result: Vec<String> = head.into_iter().collect();
        if rest.is_empty() {
            return Some(result);
        }
        match record.nested() {
            Some(nested) if record.used() == UsageState::PropertiesUsed => {
                result.extend(self.used_name(nested, rest)?);
            }
            _ => result.extend(rest.iter().cloned()),
        }
        Some(result)
    }
}
