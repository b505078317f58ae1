use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::state::{ProvidedState, UsageState, UsedName, can_mangle};
use super::DescriptorId;
use crate::connection::ConnectionId;
use crate::dependency::DependencyId;

/// Where a re-exported binding comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportTarget {
    /// Connection to the module that really provides the binding.
    pub connection: ConnectionId,
    /// Export path in the target module. `None` means the whole module
    /// namespace, except on a catch-all record where it means "the same name".
    pub export: Option<Vec<String>>,
    pub priority: i32,
}

/// Per-export metadata: usage, provision, mangling and re-export targets.
///
/// Records are stored in the [`ExportsArena`](super::ExportsArena); a record
/// may own one nested descriptor for exports that behave like a namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRecord {
    name: Option<String>,
    used: UsageState,
    pub(crate) provided: ProvidedState,
    pub(crate) can_mangle_provide: Option<bool>,
    can_mangle_use: Option<bool>,
    used_name: UsedName,
    pub(crate) terminal_binding: bool,
    targets: IndexMap<DependencyId, ExportTarget>,
    pub(crate) nested: Option<DescriptorId>,
    pub(crate) nested_owned: bool,
}

impl ExportRecord {
    /// Construct a record, optionally seeded from a catch-all record.
    pub(crate) fn new(name: Option<String>, init_from: Option<&ExportRecord>) -> Self {
        let Some(from) = init_from else {
            return Self {
                name,
                used: UsageState::NoInfo,
                provided: ProvidedState::Undetermined,
                can_mangle_provide: None,
                can_mangle_use: None,
                used_name: UsedName::Original,
                terminal_binding: false,
                targets: IndexMap::new(),
                nested: None,
                nested_owned: false,
            };
        };

        // Inherited targets point at the same name unless they name a path.
        let targets = from
            .targets
            .iter()
            .map(|(key, target)| {
                let export = target
                    .export
                    .clone()
                    .or_else(|| name.as_ref().map(|n| vec![n.clone()]));
                (
                    *key,
                    ExportTarget {
                        connection: target.connection,
                        export,
                        priority: target.priority,
                    },
                )
            })
            .collect();

        Self {
            name,
            used: from.used,
            provided: from.provided,
            can_mangle_provide: from.can_mangle_provide,
            can_mangle_use: from.can_mangle_use,
            used_name: from.used_name.clone(),
            terminal_binding: from.terminal_binding,
            targets,
            nested: None,
            nested_owned: false,
        }
    }

    /// Export name; `None` for catch-all and side-effects-only records.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn used(&self) -> UsageState {
        self.used
    }

    pub fn provided(&self) -> ProvidedState {
        self.provided
    }

    pub fn can_mangle_provide(&self) -> Option<bool> {
        self.can_mangle_provide
    }

    pub fn can_mangle_use(&self) -> Option<bool> {
        self.can_mangle_use
    }

    pub fn can_mangle(&self) -> Option<bool> {
        can_mangle(self.can_mangle_provide, self.can_mangle_use)
    }

    pub fn terminal_binding(&self) -> bool {
        self.terminal_binding
    }

    pub fn set_terminal_binding(&mut self, terminal_binding: bool) {
        self.terminal_binding = terminal_binding;
    }

    pub fn nested(&self) -> Option<DescriptorId> {
        self.nested
    }

    pub fn owns_nested(&self) -> bool {
        self.nested_owned
    }

    /// Promote usage; returns whether it changed.
    pub fn set_used(&mut self, state: UsageState) -> bool {
        self.used.promote(state)
    }

    /// Promote usage only when `condition` holds for the current value.
    pub fn set_used_conditionally(
        &mut self,
        condition: impl FnOnce(UsageState) -> bool,
        state: UsageState,
    ) -> bool {
        if condition(self.used) {
            self.used.promote(state)
        } else {
            false
        }
    }

    /// Used in a way the analysis cannot follow; also forbids use-side mangling.
    pub fn set_used_in_unknown_way(&mut self) -> bool {
        let mut changed = self.used.promote(UsageState::Unknown);
        if self.can_mangle_use != Some(false) {
            self.can_mangle_use = Some(false);
            changed = true;
        }
        changed
    }

    /// Promote provision; returns whether it changed.
    pub fn set_provided(&mut self, state: ProvidedState) -> bool {
        self.provided.promote(state)
    }

    pub fn set_can_mangle_provide(&mut self, value: Option<bool>) -> bool {
        let changed = self.can_mangle_provide != value;
        self.can_mangle_provide = value;
        changed
    }

    pub fn set_can_mangle_use(&mut self, value: Option<bool>) -> bool {
        let changed = self.can_mangle_use != value;
        self.can_mangle_use = value;
        changed
    }

    pub(crate) fn mark_has_provide_info(&mut self) {
        if self.provided == ProvidedState::Undetermined {
            self.provided = ProvidedState::NotProvided;
        }
        if self.can_mangle_provide.is_none() {
            self.can_mangle_provide = Some(true);
        }
    }

    pub(crate) fn mark_has_use_info(&mut self) {
        self.used.promote(UsageState::Unused);
        if self.can_mangle_use.is_none() {
            self.can_mangle_use = Some(true);
        }
    }

    pub fn used_name(&self) -> &UsedName {
        &self.used_name
    }

    pub fn set_used_name(&mut self, used_name: UsedName) {
        self.used_name = used_name;
    }

    pub fn is_virtual(&self) -> bool {
        self.used_name == UsedName::Virtual
    }

    /// Name this export has in the output.
    ///
    /// `None` when the export is unused, `Some(None)` when it exists only
    /// virtually, otherwise the textual name (`fallback` for unnamed records).
    pub fn resolved_used_name(&self, fallback: &str) -> Option<Option<String>> {
        if self.used == UsageState::Unused {
            return None;
        }
        Some(match &self.used_name {
            UsedName::Virtual => None,
            UsedName::Renamed(name) => Some(name.clone()),
            UsedName::Original => Some(self.name.clone().unwrap_or_else(|| fallback.to_string())),
        })
    }

    /// Register a re-export target under `key`; returns whether anything changed.
    pub fn set_target(
        &mut self,
        key: DependencyId,
        connection: ConnectionId,
        export: Option<Vec<String>>,
        priority: i32,
    ) -> bool {
        let target = ExportTarget {
            connection,
            export,
            priority,
        };
        match self.targets.get(&key) {
            Some(existing) if *existing == target => false,
            _ => {
                self.targets.insert(key, target);
                true
            }
        }
    }

    pub fn unset_target(&mut self, key: DependencyId) -> bool {
        self.targets.shift_remove(&key).is_some()
    }

    pub fn has_targets(&self) -> bool {
        !self.targets.is_empty()
    }

    /// The highest-priority targets, in registration order.
    pub fn max_targets(&self) -> Vec<&ExportTarget> {
        let Some(max) = self.targets.values().map(|t| t.priority).max() else {
            return Vec::new();
        };
        self.targets.values().filter(|t| t.priority == max).collect()
    }

    pub(crate) fn retarget_connections(&mut self, from: ConnectionId, to: ConnectionId) {
        for target in self.targets.values_mut() {
            if target.connection == from {
                target.connection = to;
            }
        }
    }
}
