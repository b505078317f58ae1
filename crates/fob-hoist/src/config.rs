//! Options for the hoisting pass.
//!
//! Options can be built in code, deserialised from JSON, or loaded from a TOML
//! file. All loaders finish with [`HoistOptions::validate`].

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{HoistError, Result};
use crate::identifier::{RESERVED_NAMES, is_identifier};

/// Options shared by the renamer and the binding resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HoistOptions {
    /// Extra names that must never be allocated (host globals, runtime helpers).
    pub reserved_names: Vec<String>,

    /// Base name for synthesised namespace objects.
    pub namespace_object_name: String,

    /// Annotate raw external references with the original property path
    /// when the used name differs.
    pub property_comments: bool,

    /// Level for the optional logging helpers (`silent`, `error`, `warn`,
    /// `info`, `debug`, `trace`).
    pub log_level: Option<String>,
}

impl Default for HoistOptions {
    fn default() -> Self {
        Self {
            reserved_names: Vec::new(),
            namespace_object_name: "namespaceObject".to_string(),
            property_comments: true,
            log_level: None,
        }
    }
}

impl HoistOptions {
    /// Build options from a `serde_json::Value`.
    pub fn from_value(value: Value) -> Result<Self> {
        let options: HoistOptions =
            serde_json::from_value(value).map_err(|e| HoistError::InvalidConfig {
                field: "options".to_string(),
                hint: Some(e.to_string()),
            })?;
        options.validate()?;
        Ok(options)
    }

    /// Parse options from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let toml_val: toml::Value = toml::from_str(content).map_err(|e| HoistError::InvalidConfig {
            field: "toml".to_string(),
            hint: Some(format!("Invalid TOML syntax: {}", e)),
        })?;

        let value = serde_json::to_value(toml_val).map_err(|e| HoistError::InvalidConfig {
            field: "toml".to_string(),
            hint: Some(format!("TOML to JSON conversion failed: {}", e)),
        })?;

        Self::from_value(value)
    }

    /// Load options from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Check that every configured name can actually be used as an identifier.
    pub fn validate(&self) -> Result<()> {
        if !is_identifier(&self.namespace_object_name) {
            return Err(HoistError::invalid_config(
                "namespaceObjectName",
                format!("'{}' is not a valid identifier", self.namespace_object_name),
            ));
        }
        if RESERVED_NAMES.contains(&self.namespace_object_name.as_str())
            || self.reserved_names.contains(&self.namespace_object_name)
        {
            return Err(HoistError::invalid_config(
                "namespaceObjectName",
                format!("'{}' is reserved", self.namespace_object_name),
            ));
        }
        if let Some(name) = self.reserved_names.iter().find(|name| !is_identifier(name)) {
            return Err(HoistError::invalid_config(
                "reservedNames",
                format!("'{}' is not a valid identifier", name),
            ));
        }
        Ok(())
    }

    /// Builder-style setter for additional reserved names.
    pub fn with_reserved_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reserved_names.extend(names.into_iter().map(Into::into));
        self
    }

    /// Builder-style setter for property comments.
    pub fn with_property_comments(mut self, enabled: bool) -> Self {
        self.property_comments = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn defaults_are_valid() {
        let options = HoistOptions::default();
        assert_eq!(options.namespace_object_name, "namespaceObject");
        assert!(options.property_comments);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn from_value_uses_camel_case_and_defaults() {
        let options = HoistOptions::from_value(json!({
            "reservedNames": ["__runtime"],
            "propertyComments": false
        }))
        .unwrap();
        assert_eq!(options.reserved_names, vec!["__runtime".to_string()]);
        assert!(!options.property_comments);
        assert_eq!(options.namespace_object_name, "namespaceObject");
    }

    #[test]
    fn rejects_invalid_names() {
        let err = HoistOptions::from_value(json!({ "namespaceObjectName": "not valid" })).unwrap_err();
        assert!(matches!(err, HoistError::InvalidConfig { ref field, .. } if field == "namespaceObjectName"));

        let err = HoistOptions::from_value(json!({ "namespaceObjectName": "window" })).unwrap_err();
        assert!(matches!(err, HoistError::InvalidConfig { .. }));

        let err = HoistOptions::from_value(json!({ "reservedNames": ["ok", "1bad"] })).unwrap_err();
        assert!(matches!(err, HoistError::InvalidConfig { ref field, .. } if field == "reservedNames"));
    }

    #[test]
    fn rejects_unknown_types() {
        let err = HoistOptions::from_value(json!({ "propertyComments": "yes" })).unwrap_err();
        assert!(matches!(err, HoistError::InvalidConfig { ref field, .. } if field == "options"));
    }

    #[test]
    fn loads_toml_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hoist.toml");
        fs::write(
            &path,
            r#"
reservedNames = ["__fob_require__"]
namespaceObjectName = "ns"
logLevel = "debug"
"#,
        )
        .unwrap();

        let options = HoistOptions::from_file(&path).unwrap();
        assert_eq!(options.namespace_object_name, "ns");
        assert_eq!(options.log_level.as_deref(), Some("debug"));
        assert_eq!(options.reserved_names, vec!["__fob_require__".to_string()]);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = HoistOptions::from_file(dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, HoistError::Io(_)));
    }

    #[test]
    fn invalid_toml_is_reported() {
        let err = HoistOptions::from_toml_str("reservedNames = [").unwrap_err();
        assert!(matches!(err, HoistError::InvalidConfig { ref field, .. } if field == "toml"));
    }
}
