//! Binding resolution for merged scopes.
//!
//! A [`Binding`] is the final source-level reference for an export path
//! requested from some module of a merge set. Resolution follows re-export
//! chains, applies interop rules for modules that are not real namespaces,
//! and records which synthesised objects the emitted code will need.

mod final_name;
mod resolver;

use fob_module_graph::ModuleId;
use indexmap::IndexSet;

pub use resolver::BindingResolver;

/// Placeholder for a re-export chain that loops; throws when evaluated.
pub const CIRCULAR_REEXPORT: &str = "/* circular reexport */ Object(function x() { x() }())";

/// Reference to an export nobody uses.
pub const UNUSED_EXPORT: &str = "/* unused export */ undefined";

/// `__esModule` read on a module that is not a real namespace.
pub const ESMODULE_MARKER: &str = "/* __esModule */true";

/// Named import from a module that only has a default export.
pub const NON_DEFAULT_IMPORT: &str = "/* non-default import from default-exporting module */undefined";

/// Resolved reference for an export path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    /// Raw expression text (external modules, interop wrappers, markers).
    Raw {
        module: ModuleId,
        name: String,
        /// Original path, shown when the used name differs.
        comment: Option<String>,
        /// Property path still to apply.
        ids: Vec<String>,
        /// Path as requested at the module where resolution ended.
        export: Vec<String>,
        deferred: bool,
    },
    /// Top-level declaration of a concatenated module.
    Symbol {
        module: ModuleId,
        symbol: String,
        ids: Vec<String>,
        export: Vec<String>,
        deferred: bool,
    },
}

impl Binding {
    pub fn module(&self) -> &ModuleId {
        match self {
            Binding::Raw { module, .. } | Binding::Symbol { module, .. } => module,
        }
    }

    pub fn ids(&self) -> &[String] {
        match self {
            Binding::Raw { ids, .. } | Binding::Symbol { ids, .. } => ids,
        }
    }

    pub fn export(&self) -> &[String] {
        match self {
            Binding::Raw { export, .. } | Binding::Symbol { export, .. } => export,
        }
    }

    /// Every hop to the binding went through a deferred import.
    pub fn is_deferred(&self) -> bool {
        match self {
            Binding::Raw { deferred, .. } | Binding::Symbol { deferred, .. } => *deferred,
        }
    }
}

/// How a reference is used at its site.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    /// The reference is the callee of a call.
    pub as_call: bool,
    /// The call keeps its receiver (`obj.fn()` semantics are wanted).
    pub call_context: bool,
    /// The requesting module is a strict ES module.
    pub strict: bool,
    /// Whether a statement separator precedes the site; `None` if unknown.
    pub asi_safe: Option<bool>,
    /// The site is reached through a deferred import.
    pub deferred: bool,
}

impl ResolveOptions {
    pub fn call() -> Self {
        Self {
            as_call: true,
            ..Self::default()
        }
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn asi_safe(mut self, asi_safe: Option<bool>) -> Self {
        self.asi_safe = asi_safe;
        self
    }

    pub fn deferred(mut self, deferred: bool) -> Self {
        self.deferred = deferred;
        self
    }
}

/// Synthesised objects the merged code must materialise, in first-use order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NeededObjects {
    pub namespace_objects: IndexSet<ModuleId>,
    pub interop_namespaces: IndexSet<ModuleId>,
    pub interop_namespaces2: IndexSet<ModuleId>,
    pub interop_defaults: IndexSet<ModuleId>,
}

impl NeededObjects {
    pub fn is_empty(&self) -> bool {
        self.namespace_objects.is_empty()
            && self.interop_namespaces.is_empty()
            && self.interop_namespaces2.is_empty()
            && self.interop_defaults.is_empty()
    }
}
