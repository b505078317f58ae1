use std::borrow::Cow;
use std::fmt;
use std::path::{Path, PathBuf};

use path_clean::PathClean;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

const VIRTUAL_PREFIX: &str = "virtual:";

/// Stable identity of a module in the optimizer graph.
///
/// Identities are path-like strings handed over by the parser (for example
/// `./src/a/value.mod`). Redundant `.`/`..` components are cleaned so that two
/// spellings of the same request compare equal, but the identity is never
/// resolved against the filesystem: the graph is a pure data structure.
/// Synthetic modules use the `virtual:` prefix and skip cleaning altogether.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(PathBuf);

impl ModuleId {
    /// Create a new module identifier from a path-like identity.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, ModuleIdError> {
        let path = path.as_ref();

        if path.as_os_str().is_empty() {
            return Err(ModuleIdError::EmptyPath);
        }

        if looks_like_virtual(path) {
            return Ok(Self(normalize_virtual(path)));
        }

        let relative = path.starts_with(".") && !path.starts_with("..");
        let cleaned = path.to_path_buf().clean();

        if cleaned.as_os_str() == "." {
            return Err(ModuleIdError::NoFileComponent(path.to_path_buf()));
        }

        // Keep the `./` marker of relative requests, it is part of the identity
        // the rest of the toolchain prints.
        if relative && !cleaned.starts_with("..") {
            return Ok(Self(Path::new(".").join(cleaned)));
        }

        Ok(Self(cleaned))
    }

    /// Create a module identifier for a synthetic module (e.g. `virtual:runtime`).
    pub fn new_virtual(id: impl Into<String>) -> Self {
        let id = id.into();

        if id.is_empty() {
            return Self(PathBuf::from(VIRTUAL_PREFIX));
        }

        let normalized = if id.starts_with(VIRTUAL_PREFIX) {
            id
        } else {
            format!("{VIRTUAL_PREFIX}{id}")
        };

        Self(PathBuf::from(normalized))
    }

    /// Returns the underlying path representation.
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Returns `true` if the identifier represents a virtual module.
    pub fn is_virtual(&self) -> bool {
        self.path_string().starts_with(VIRTUAL_PREFIX)
    }

    /// Borrow the identifier as a string for logging/serialization.
    pub fn path_string(&self) -> Cow<'_, str> {
        self.0.to_string_lossy()
    }

    /// Human readable form used in diagnostics and for deriving fallback names.
    pub fn readable(&self) -> String {
        let text = self.path_string();
        text.strip_prefix(VIRTUAL_PREFIX)
            .map(str::to_string)
            .unwrap_or_else(|| text.into_owned())
    }

    fn from_serialized_path(path: PathBuf) -> Self {
        Self(path)
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path_string())
    }
}

impl Serialize for ModuleId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.path_string())
    }
}

impl<'de> Deserialize<'de> for ModuleId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;

        if value.starts_with(VIRTUAL_PREFIX) {
            Ok(ModuleId::new_virtual(value))
        } else {
            Ok(ModuleId::from_serialized_path(PathBuf::from(value)))
        }
    }
}

/// Error type for `ModuleId` construction failures.
#[derive(Debug, Error)]
pub enum ModuleIdError {
    /// The provided path was empty.
    #[error("module id path is empty")]
    EmptyPath,

    /// The path cleaned down to the current directory and names no module.
    #[error("module id '{0}' does not name a module")]
    NoFileComponent(PathBuf),
}

fn looks_like_virtual(path: &Path) -> bool {
    let text = path.to_string_lossy();
    text.starts_with(VIRTUAL_PREFIX) || text.starts_with('\0')
}

fn normalize_virtual(path: &Path) -> PathBuf {
    let text = path.to_string_lossy();
    if text.starts_with(VIRTUAL_PREFIX) {
        PathBuf::from(text.into_owned())
    } else {
        let trimmed = text.trim_start_matches('\0');
        PathBuf::from(format!("{VIRTUAL_PREFIX}{trimmed}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleans_redundant_components() {
        let a = ModuleId::new("./src/../src/a/value.mod").unwrap();
        let b = ModuleId::new("./src/a/./value.mod").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.path_string(), "./src/a/value.mod");
    }

    #[test]
    fn rejects_empty_and_dot() {
        assert!(matches!(ModuleId::new(""), Err(ModuleIdError::EmptyPath)));
        assert!(matches!(
            ModuleId::new("./"),
            Err(ModuleIdError::NoFileComponent(_))
        ));
    }

    #[test]
    fn virtual_ids_keep_prefix() {
        let id = ModuleId::new("\0runtime").unwrap();
        assert!(id.is_virtual());
        assert_eq!(id.path_string(), "virtual:runtime");
        assert_eq!(id.readable(), "runtime");
        assert_eq!(ModuleId::new_virtual("runtime"), id);
    }

    #[test]
    fn serde_round_trips_as_string() {
        let id = ModuleId::new("src/lib.js").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"src/lib.js\"");
        let back: ModuleId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
