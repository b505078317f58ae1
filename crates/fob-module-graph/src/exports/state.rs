//! Usage and provision lattices.

use serde::{Deserialize, Serialize};

/// How an export is consumed, ordered by increasing definiteness.
///
/// Within one analysis pass a value only moves forward along this order;
/// see [`UsageState::promote`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UsageState {
    /// Usage analysis has not run yet.
    #[default]
    NoInfo,
    Unused,
    /// Consumed in a way the analysis cannot follow.
    Unknown,
    /// Only some properties of the export are read.
    PropertiesUsed,
    Used,
}

impl UsageState {
    /// Join with `other`, returning whether the value changed.
    pub fn promote(&mut self, other: UsageState) -> bool {
        if other > *self {
            *self = other;
            true
        } else {
            false
        }
    }

    /// Anything that may consume the export. `NoInfo` counts as used.
    pub fn is_used(self) -> bool {
        self != UsageState::Unused
    }
}

/// Whether an export exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProvidedState {
    #[default]
    Undetermined,
    NotProvided,
    /// Determined only at run time.
    MaybeProvided,
    Provided,
}

impl ProvidedState {
    /// Move away from "no information" states. `MaybeProvided` and `Provided`
    /// are both final: neither is ever turned into the other by promotion.
    pub fn promote(&mut self, other: ProvidedState) -> bool {
        let open = matches!(self, ProvidedState::Undetermined | ProvidedState::NotProvided);
        if open && other > *self {
            *self = other;
            true
        } else {
            false
        }
    }

    /// `Some(true)` when definitely present, `Some(false)` when definitely
    /// absent, `None` when unknown at compile time.
    pub fn as_option(self) -> Option<bool> {
        match self {
            ProvidedState::Provided => Some(true),
            ProvidedState::NotProvided => Some(false),
            ProvidedState::Undetermined | ProvidedState::MaybeProvided => None,
        }
    }
}

/// Explicit textual name of an export in the output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UsedName {
    /// Use the original name.
    #[default]
    Original,
    Renamed(String),
    /// Exists only virtually; it has no textual name in the output.
    Virtual,
}

/// Answer of `used_exports`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UsedExports {
    /// Not enough information; assume the worst case.
    Unknown,
    /// The module is not used at all.
    Never,
    /// Every export may be used.
    Everything,
    /// Exactly these exports are used (sorted; may be empty when the module is
    /// only kept for side effects).
    Names(Vec<String>),
}

impl UsedExports {
    /// Whether `name` may be used according to this answer.
    pub fn may_use(&self, name: &str) -> bool {
        match self {
            UsedExports::Unknown | UsedExports::Everything => true,
            UsedExports::Never => false,
            UsedExports::Names(names) => names.iter().any(|n| n == name),
        }
    }
}

/// Answer of `provided_exports`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProvidedExports {
    Unknown,
    Everything,
    Names(Vec<String>),
}

/// Combine the two mangle permissions of a record.
///
/// The name may be shortened only when the provide side says it is safe and
/// the use side does not object.
pub fn can_mangle(provide: Option<bool>, usage: Option<bool>) -> Option<bool> {
    match (provide, usage) {
        (Some(true), Some(false)) => Some(false),
        (Some(true), _) => Some(true),
        (Some(false), _) => Some(false),
        (None, Some(false)) => Some(false),
        (None, _) => None,
    }
}
