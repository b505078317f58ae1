use serde::{Deserialize, Serialize};

use super::ModuleId;

/// A compilation unit known to the graph.
///
/// Per-module side tables (connections, export descriptor, ordering indices)
/// live in the graph, not here, so a `Module` stays cheap to clone and can be
/// handed out behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub id: ModuleId,
    /// Export structure recorded by the parser.
    pub build_meta: BuildMeta,
    pub has_side_effects: bool,
    /// Modules provided by the host environment are never merged.
    pub is_external: bool,
}

impl Module {
    /// Create a new module builder with sensible defaults.
    pub fn builder(id: ModuleId) -> ModuleBuilder {
        ModuleBuilder {
            module: Self {
                id,
                build_meta: BuildMeta::default(),
                has_side_effects: true,
                is_external: false,
            },
        }
    }

    /// Mark the module as an external dependency.
    pub fn mark_external(&mut self) {
        self.is_external = true;
    }

    /// Toggle side-effect tracking on the module.
    pub fn set_side_effects(&mut self, has_side_effects: bool) {
        self.has_side_effects = has_side_effects;
    }

    /// Identity used in diagnostics.
    pub fn readable_identifier(&self) -> String {
        self.id.readable()
    }
}

/// Builder for `Module` to avoid long argument lists in constructors.
pub struct ModuleBuilder {
    module: Module,
}

impl ModuleBuilder {
    pub fn build_meta(mut self, build_meta: BuildMeta) -> Self {
        self.module.build_meta = build_meta;
        self
    }

    pub fn exports_type(mut self, exports_type: ExportsType) -> Self {
        self.module.build_meta.exports_type = Some(exports_type);
        self
    }

    pub fn default_object(mut self, default_object: DefaultObject) -> Self {
        self.module.build_meta.default_object = default_object;
        self
    }

    pub fn strict_esm(mut self, strict_esm: bool) -> Self {
        self.module.build_meta.strict_esm = strict_esm;
        self
    }

    pub fn side_effects(mut self, has_side_effects: bool) -> Self {
        self.module.has_side_effects = has_side_effects;
        self
    }

    pub fn external(mut self, is_external: bool) -> Self {
        self.module.is_external = is_external;
        self
    }

    pub fn build(self) -> Module {
        self.module
    }
}

/// Facts about a module's export structure, recorded while parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildMeta {
    /// `None` when the parser could not decide (treated like `Dynamic`).
    pub exports_type: Option<ExportsType>,
    pub default_object: DefaultObject,
    /// The module itself is a strict ES module (e.g. `.mjs`); this changes how
    /// it sees the modules it imports.
    pub strict_esm: bool,
}

/// Raw export structure of a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExportsType {
    /// A real ES module namespace.
    Namespace,
    /// Legacy module flagged with `__esModule`.
    Flagged,
    /// Legacy single-object module.
    Default,
    /// Shape only known at run time.
    Dynamic,
}

/// How the default export of a `Default` module relates to its named exports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DefaultObject {
    /// No named exports are derived from the default object.
    #[default]
    False,
    /// Named accesses redirect to properties of the default object.
    Redirect,
    /// Like `Redirect`, but strict importers must not rely on it.
    RedirectWarn,
}

/// Interop shape of a module as seen by one importer.
///
/// The same module can present different shapes to strict and non-strict
/// importers, so a shape is always computed for a `(module, strict)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExportShape {
    /// Direct property access is always correct.
    NamespaceOnly,
    /// Has a default slot and named properties.
    DefaultWithNamed,
    /// Only `default` exists; any other name is statically `undefined`.
    DefaultOnly,
    /// Undecidable until run time.
    Dynamic,
}

impl BuildMeta {
    /// Classify the shape from build meta alone.
    ///
    /// `esmodule_not_provided` reports whether the module's `__esModule`
    /// export is known to be absent; it only matters for dynamic modules
    /// imported by non-strict importers.
    pub fn shape(&self, strict: bool, esmodule_not_provided: bool) -> ExportShape {
        let handle_default = || match self.default_object {
            DefaultObject::Redirect | DefaultObject::RedirectWarn => ExportShape::DefaultWithNamed,
            DefaultObject::False => ExportShape::DefaultOnly,
        };

        match self.exports_type {
            Some(ExportsType::Namespace) => ExportShape::NamespaceOnly,
            Some(ExportsType::Flagged) => {
                if strict {
                    ExportShape::DefaultWithNamed
                } else {
                    ExportShape::NamespaceOnly
                }
            }
            Some(ExportsType::Default) => match self.default_object {
                DefaultObject::Redirect => ExportShape::DefaultWithNamed,
                DefaultObject::RedirectWarn if !strict => ExportShape::DefaultWithNamed,
                DefaultObject::RedirectWarn | DefaultObject::False => ExportShape::DefaultOnly,
            },
            Some(ExportsType::Dynamic) => {
                if strict {
                    ExportShape::DefaultWithNamed
                } else if esmodule_not_provided {
                    handle_default()
                } else {
                    ExportShape::Dynamic
                }
            }
            None => {
                if strict {
                    ExportShape::DefaultWithNamed
                } else {
                    ExportShape::Dynamic
                }
            }
        }
    }
}
