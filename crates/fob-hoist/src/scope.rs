//! Lexical scope input for the renamer.
//!
//! The scope analyzer hands over one [`ModuleScope`] per merged module: an
//! arena of scopes linked to their enclosing scope, the module's top-level
//! declarations with the scopes that reference them, the bindings it reads
//! from other modules, and the free (global) names it reads.

use fob_module_graph::ModuleId;
use serde::{Deserialize, Serialize};

/// Synthetic symbol holding a module's anonymous default export.
pub const DEFAULT_EXPORT_SYMBOL: &str = "__FOB_DEFAULT_EXPORT__";

/// Synthetic symbol holding a module's namespace object.
pub const NAMESPACE_OBJECT_SYMBOL: &str = "__FOB_NAMESPACE_OBJECT__";

/// Index of a scope inside one module's [`ScopeTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScopeId(u32);

impl ScopeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    pub upper: Option<ScopeId>,
    /// Names declared directly in this scope.
    pub variables: Vec<String>,
}

/// Arena of scopes with parent links.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
}

impl ScopeTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a scope nested in `upper` (or a root when `None`).
    pub fn add_scope<I, S>(&mut self, upper: Option<ScopeId>, variables: I) -> ScopeId
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope {
            upper,
            variables: variables.into_iter().map(Into::into).collect(),
        });
        id
    }

    pub fn scope(&self, id: ScopeId) -> Option<&Scope> {
        self.scopes.get(id.index())
    }

    pub fn upper(&self, id: ScopeId) -> Option<ScopeId> {
        self.scope(id).and_then(|scope| scope.upper)
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    fn declare(&mut self, id: ScopeId, name: &str) {
        if let Some(scope) = self.scopes.get_mut(id.index()) {
            if !scope.variables.iter().any(|existing| existing == name) {
                scope.variables.push(name.to_string());
            }
        }
    }
}

/// A top-level declaration and the scopes its references sit in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
    pub name: String,
    pub references: Vec<ScopeId>,
}

/// Binding of another module read by an importer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImportedBinding {
    /// A top-level symbol declared by the target.
    Symbol(String),
    /// The target as a whole: its namespace object, external binding or
    /// interop wrappers.
    Module,
}

/// Scopes of the importing module from which a binding of `target` is read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReference {
    pub target: ModuleId,
    pub binding: ImportedBinding,
    /// Scope ids in the importer's own tree.
    pub references: Vec<ScopeId>,
}

/// Everything the renamer needs to know about one module's scopes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleScope {
    pub tree: ScopeTree,
    pub module_scope: ScopeId,
    pub declarations: Vec<Declaration>,
    pub imports: Vec<ImportReference>,
    /// Free names read by the module (`window`, `console`, ...).
    pub globals: Vec<String>,
}

impl Default for ModuleScope {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleScope {
    /// A module with an empty top-level scope.
    pub fn new() -> Self {
        let mut tree = ScopeTree::new();
        let module_scope = tree.add_scope(None, std::iter::empty::<String>());
        Self {
            tree,
            module_scope,
            declarations: Vec::new(),
            imports: Vec::new(),
            globals: Vec::new(),
        }
    }

    /// Open a scope nested in `upper` declaring `variables`.
    pub fn add_scope<I, S>(&mut self, upper: ScopeId, variables: I) -> ScopeId
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tree.add_scope(Some(upper), variables)
    }

    /// Declare a top-level symbol referenced from `references`.
    ///
    /// Redeclaring a name merges the reference lists.
    pub fn declare(&mut self, name: impl Into<String>, references: impl IntoIterator<Item = ScopeId>) -> &mut Self {
        let name = name.into();
        self.tree.declare(self.module_scope, &name);
        match self.declarations.iter_mut().find(|decl| decl.name == name) {
            Some(existing) => existing.references.extend(references),
            None => self.declarations.push(Declaration {
                name,
                references: references.into_iter().collect(),
            }),
        }
        self
    }

    /// Record that `binding` of `target` is read from `references`.
    ///
    /// Repeated calls for the same binding merge the reference lists.
    pub fn reference_import(
        &mut self,
        target: ModuleId,
        binding: ImportedBinding,
        references: impl IntoIterator<Item = ScopeId>,
    ) -> &mut Self {
        match self
            .imports
            .iter_mut()
            .find(|import| import.target == target && import.binding == binding)
        {
            Some(existing) => existing.references.extend(references),
            None => self.imports.push(ImportReference {
                target,
                binding,
                references: references.into_iter().collect(),
            }),
        }
        self
    }

    pub fn add_global(&mut self, name: impl Into<String>) -> &mut Self {
        let name = name.into();
        if !self.globals.contains(&name) {
            self.globals.push(name);
        }
        self
    }

    pub fn declaration(&self, name: &str) -> Option<&Declaration> {
        self.declarations.iter().find(|decl| decl.name == name)
    }
}
