//! Resolved edges between modules.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use super::dependency::{Condition, DependencyId};
use super::runtime::RuntimeSpec;
use super::ModuleId;

/// Index of a connection in the graph's connection arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectionId(pub(crate) u32);

impl ConnectionId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Activity of a connection in one runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionState {
    Active,
    Inactive,
    /// Only keeps ordering, contributes no bindings.
    TransitiveOnly,
    /// Part of a cycle; treated as active by consumers that can cope with cycles.
    Circular,
}

impl ConnectionState {
    /// Combine two alternative states (either edge may apply).
    pub fn union(self, other: ConnectionState) -> ConnectionState {
        use ConnectionState::*;
        match (self, other) {
            (Active, _) | (_, Active) => Active,
            (Inactive, b) => b,
            (a, Inactive) => a,
            (TransitiveOnly, b) => b,
            (a, TransitiveOnly) => a,
            (a, _) => a,
        }
    }

    /// Combine two states that must both hold.
    pub fn intersect(self, other: ConnectionState) -> ConnectionState {
        use ConnectionState::*;
        match (self, other) {
            (Inactive, _) | (_, Inactive) => Inactive,
            (Active, b) => b,
            (a, Active) => a,
            (Circular, b) => b,
            (a, Circular) => a,
            (a, _) => a,
        }
    }

    /// Anything but `Inactive`.
    pub fn is_active(self) -> bool {
        self != ConnectionState::Inactive
    }
}

/// A resolved edge instantiated from a dependency.
///
/// Several connections may join the same pair of modules. `module` is the
/// current target and can be swapped by the graph's move operations, while
/// `resolved_module` always remembers what the dependency originally resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub id: ConnectionId,
    pub origin_module: Option<ModuleId>,
    pub resolved_origin_module: Option<ModuleId>,
    pub dependency: Option<DependencyId>,
    pub module: ModuleId,
    pub resolved_module: ModuleId,
    pub weak: bool,
    pub deferred: bool,
    active: bool,
    condition: Option<Condition>,
    explanations: IndexSet<String>,
}

impl Connection {
    pub(crate) fn new(
        id: ConnectionId,
        origin_module: Option<ModuleId>,
        dependency: Option<DependencyId>,
        module: ModuleId,
        weak: bool,
        deferred: bool,
        condition: Condition,
    ) -> Self {
        let condition = match condition {
            Condition::Always => None,
            other => Some(other),
        };

        Self {
            id,
            resolved_origin_module: origin_module.clone(),
            origin_module,
            dependency,
            resolved_module: module.clone(),
            module,
            weak,
            deferred,
            active: true,
            condition,
            explanations: IndexSet::new(),
        }
    }

    /// Copy of this connection under a new id (used when retargeting).
    pub(crate) fn clone_with_id(&self, id: ConnectionId) -> Self {
        let mut copy = self.clone();
        copy.id = id;
        copy
    }

    /// Whether the connection depends on a runtime condition.
    pub fn is_conditional(&self) -> bool {
        self.condition.is_some()
    }

    /// Narrow the connection with an additional condition.
    pub fn add_condition(&mut self, condition: Condition) {
        if let Some(existing) = self.condition.take() {
            self.condition = Some(existing.and(condition));
        } else if self.active {
            self.condition = Some(condition);
        }
    }

    /// Force the connection on or off, dropping any condition.
    pub fn set_active(&mut self, active: bool) {
        self.condition = None;
        self.active = active;
    }

    pub fn active_state(&self, runtime: Option<&RuntimeSpec>) -> ConnectionState {
        match &self.condition {
            Some(condition) => condition.evaluate(runtime),
            None if self.active => ConnectionState::Active,
            None => ConnectionState::Inactive,
        }
    }

    /// Active in any sense (including transitive-only and circular).
    pub fn is_active(&self, runtime: Option<&RuntimeSpec>) -> bool {
        self.active_state(runtime).is_active()
    }

    /// Active with bindings flowing through it.
    pub fn is_target_active(&self, runtime: Option<&RuntimeSpec>) -> bool {
        self.active_state(runtime) == ConnectionState::Active
    }

    pub fn add_explanation(&mut self, explanation: impl Into<String>) {
        self.explanations.insert(explanation.into());
    }

    pub fn explanations(&self) -> impl Iterator<Item = &str> {
        self.explanations.iter().map(String::as_str)
    }

    /// All explanations joined for display.
    pub fn explanation(&self) -> Option<String> {
        if self.explanations.is_empty() {
            None
        } else {
            Some(
                self.explanations
                    .iter()
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join(" "),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ConnectionState::*;

    #[test]
    fn union_prefers_active() {
        assert_eq!(Inactive.union(TransitiveOnly), TransitiveOnly);
        assert_eq!(TransitiveOnly.union(Circular), Circular);
        assert_eq!(Circular.union(Active), Active);
        assert_eq!(Inactive.union(Inactive), Inactive);
    }

    #[test]
    fn intersect_prefers_inactive() {
        assert_eq!(Active.intersect(TransitiveOnly), TransitiveOnly);
        assert_eq!(Circular.intersect(TransitiveOnly), TransitiveOnly);
        assert_eq!(Active.intersect(Inactive), Inactive);
    }

    #[test]
    fn set_active_drops_condition() {
        let target = ModuleId::new("src/b.js").unwrap();
        let mut connection = Connection::new(
            ConnectionId(0),
            None,
            None,
            target,
            false,
            false,
            Condition::InRuntimes(RuntimeSpec::single("main")),
        );
        assert!(connection.is_conditional());
        assert!(!connection.is_active(Some(&RuntimeSpec::single("worker"))));
        connection.set_active(false);
        assert!(!connection.is_conditional());
        assert!(!connection.is_active(None));
        connection.add_condition(Condition::Always);
        assert!(!connection.is_conditional());
    }

    #[test]
    fn explanations_are_deduplicated() {
        let target = ModuleId::new("src/b.js").unwrap();
        let mut connection = Connection::new(
            ConnectionId(0),
            None,
            None,
            target,
            false,
            false,
            Condition::Always,
        );
        connection.add_explanation("import of b");
        connection.add_explanation("import of b");
        connection.add_explanation("reexport");
        assert_eq!(connection.explanation().as_deref(), Some("import of b reexport"));
    }
}
