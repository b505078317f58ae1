//! Error types for binding resolution, renaming and option loading.

use fob_module_graph::ModuleId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, HoistError>;

#[derive(Debug, Error)]
pub enum HoistError {
    // Resolution errors
    #[error(
        "target module of reexport from '{module}' is not part of the merge set (export '{}')\nmodules in the merge set:\n{}",
        .export.join("."),
        .members.join("\n")
    )]
    UnresolvableReexport {
        module: ModuleId,
        export: Vec<String>,
        members: Vec<String>,
    },

    #[error("cannot get final name for export '{}' of {module}", .export.join("."))]
    UnknownExport { module: ModuleId, export: Vec<String> },

    /// The renamer ran on a different merge set than the resolver.
    #[error("the symbol '{name}' in '{module}' has no internal name")]
    MissingInternalName { module: ModuleId, name: String },

    #[error("module '{0}' is not part of the merge set")]
    ModuleNotInMergeSet(ModuleId),

    /// Members must be unconditionally reachable from the root.
    #[error("cannot merge module '{0}' under a runtime condition")]
    ConditionalMember(ModuleId),

    #[error(
        "modules chosen for merging into '{root}' are not reachable from it: {}",
        .members.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
    )]
    UnreachableMembers { root: ModuleId, members: Vec<ModuleId> },

    #[error(transparent)]
    Graph(#[from] fob_module_graph::Error),

    // Option loading errors
    #[error("invalid option '{field}'{}", .hint.as_ref().map(|h| format!(": {h}")).unwrap_or_default())]
    InvalidConfig { field: String, hint: Option<String> },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HoistError {
    pub(crate) fn invalid_config(field: impl Into<String>, hint: impl Into<String>) -> Self {
        HoistError::InvalidConfig {
            field: field.into(),
            hint: Some(hint.into()),
        }
    }
}
