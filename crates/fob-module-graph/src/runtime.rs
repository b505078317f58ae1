//! Build-variant ("runtime") specs.
//!
//! A runtime here is not an execution engine: it names one build variant of
//! the compilation (for example `main` and `worker`). Connections can be
//! active in some variants and inactive in others. `None` in an
//! `Option<&RuntimeSpec>` position always means "every variant".

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Sorted set of runtime names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuntimeSpec(BTreeSet<String>);

impl RuntimeSpec {
    /// A spec containing exactly one runtime.
    pub fn single(name: impl Into<String>) -> Self {
        let mut set = BTreeSet::new();
        set.insert(name.into());
        Self(set)
    }

    /// Build a spec from any number of names.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// True when both specs share at least one runtime.
    pub fn intersects(&self, other: &RuntimeSpec) -> bool {
        self.0.iter().any(|name| other.0.contains(name))
    }

    /// Union of two specs.
    pub fn merge(&self, other: &RuntimeSpec) -> RuntimeSpec {
        Self(self.0.union(&other.0).cloned().collect())
    }
}

impl fmt::Display for RuntimeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().collect();
        write!(f, "{}", names.join("|"))
    }
}

/// Merge two optional runtime conditions where `None` means "always".
pub fn merge_runtime_condition(
    a: Option<&RuntimeSpec>,
    b: Option<&RuntimeSpec>,
) -> Option<RuntimeSpec> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.merge(b)),
        _ => None,
    }
}

/// Whether `runtime` (or every runtime, when `None`) is covered by `condition`.
pub fn runtime_matches(condition: &RuntimeSpec, runtime: Option<&RuntimeSpec>) -> bool {
    match runtime {
        None => !condition.is_empty(),
        Some(runtime) => condition.intersects(runtime),
    }
}
