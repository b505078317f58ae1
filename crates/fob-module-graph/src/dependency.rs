//! Dependencies and their activation conditions.

use serde::{Deserialize, Serialize};

use super::connection::ConnectionState;
use super::runtime::{RuntimeSpec, runtime_matches};
use super::ModuleId;

/// Index of a dependency in the graph's dependency arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DependencyId(pub(crate) u32);

impl DependencyId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Activation predicate of a dependency, evaluated per runtime.
///
/// Kept as a closed enum (rather than a closure) so that conditions can be
/// persisted together with the graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Condition {
    #[default]
    Always,
    Never,
    /// Active only in the listed runtimes.
    InRuntimes(RuntimeSpec),
    /// Only needed for ordering, does not contribute bindings.
    TransitiveOnly,
    /// Intersection of all conditions.
    All(Vec<Condition>),
}

impl Condition {
    /// Evaluate the condition for `runtime` (`None` means every runtime).
    pub fn evaluate(&self, runtime: Option<&RuntimeSpec>) -> ConnectionState {
        match self {
            Condition::Always => ConnectionState::Active,
            Condition::Never => ConnectionState::Inactive,
            Condition::InRuntimes(spec) => {
                if runtime_matches(spec, runtime) {
                    ConnectionState::Active
                } else {
                    ConnectionState::Inactive
                }
            }
            Condition::TransitiveOnly => ConnectionState::TransitiveOnly,
            Condition::All(conditions) => conditions
                .iter()
                .fold(ConnectionState::Active, |state, condition| {
                    state.intersect(condition.evaluate(runtime))
                }),
        }
    }

    /// Combine with another condition (both must hold).
    pub fn and(self, other: Condition) -> Condition {
        match (self, other) {
            (Condition::Always, other) | (other, Condition::Always) => other,
            (Condition::All(mut list), Condition::All(rest)) => {
                list.extend(rest);
                Condition::All(list)
            }
            (Condition::All(mut list), other) | (other, Condition::All(mut list)) => {
                list.push(other);
                Condition::All(list)
            }
            (a, b) => Condition::All(vec![a, b]),
        }
    }
}

/// An intent to reference another module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    /// Request text as written in the source (used for diagnostics).
    pub request: String,
    /// Which export is wanted; empty means the whole module.
    pub ids: Vec<String>,
    /// Must not force inclusion of the target.
    pub weak: bool,
    /// Target evaluation may be postponed.
    pub deferred: bool,
    pub condition: Condition,
}

impl Dependency {
    pub fn builder(request: impl Into<String>) -> DependencyBuilder {
        DependencyBuilder {
            dependency: Self {
                request: request.into(),
                ids: Vec::new(),
                weak: false,
                deferred: false,
                condition: Condition::Always,
            },
        }
    }
}

/// Builder for `Dependency`.
pub struct DependencyBuilder {
    dependency: Dependency,
}

impl DependencyBuilder {
    pub fn ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependency.ids = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn weak(mut self, weak: bool) -> Self {
        self.dependency.weak = weak;
        self
    }

    pub fn deferred(mut self, deferred: bool) -> Self {
        self.dependency.deferred = deferred;
        self
    }

    pub fn condition(mut self, condition: Condition) -> Self {
        self.dependency.condition = condition;
        self
    }

    pub fn build(self) -> Dependency {
        self.dependency
    }
}

/// A dependency registered in the graph together with the module that declared it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct DependencyEntry {
    pub dependency: Dependency,
    pub parent: Option<ModuleId>,
}
