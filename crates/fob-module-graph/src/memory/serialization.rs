//! Serialization methods for ModuleGraph.

use std::fmt::Write as _;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::graph::{GraphInner, ModuleGraph};
use crate::{Error, Result};

/// Version of the binary format produced by [`ModuleGraph::to_bytes`].
///
/// - Version 1: modules, side tables, dependency/connection arenas and the
///   export arena (lattice values and redirect topology).
pub const FORMAT_VERSION: u32 = 1;

/// Helper to escape labels for DOT format.
fn escape_label(label: &str) -> String {
    label.replace('"', "\\\"")
}

#[derive(Serialize)]
struct SerializedGraphRef<'a> {
    version: u32,
    graph: &'a GraphInner,
}

#[derive(Deserialize)]
struct SerializedGraph {
    version: u32,
    graph: GraphInner,
}

impl ModuleGraph {
    /// Export the graph as DOT format for visualization.
    ///
    /// Inactive connections are dashed; conditional ones are labelled.
    pub fn to_dot_format(&self) -> Result<String> {
        let inner = self.inner.read();
        let mut output = String::from("digraph ModuleGraph {\n");

        let mut ids: Vec<_> = inner.modules.keys().collect();
        ids.sort();
        for id in &ids {
            let _ = writeln!(output, "    \"{}\";", escape_label(&id.path_string()));
        }

        for connection in inner.connections.iter().flatten() {
            let Some(origin) = &connection.origin_module else {
                continue;
            };
            let mut attributes = Vec::new();
            if !connection.is_active(None) {
                attributes.push("style=dashed".to_string());
            }
            if connection.is_conditional() {
                attributes.push("label=\"conditional\"".to_string());
            }
            let _ = write!(
                output,
                "    \"{}\" -> \"{}\"",
                escape_label(&origin.path_string()),
                escape_label(&connection.module.path_string()),
            );
            if !attributes.is_empty() {
                let _ = write!(output, " [{}]", attributes.join(", "));
            }
            output.push_str(";\n");
        }

        output.push_str("}\n");
        Ok(output)
    }

    /// Serialize the graph to binary format using bincode.
    ///
    /// The payload starts with [`FORMAT_VERSION`] and carries the full graph
    /// state, so a restored graph resolves bindings exactly like the original.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let inner = self.inner.read();
        let serialized = SerializedGraphRef {
            version: FORMAT_VERSION,
            graph: &*inner,
        };

        bincode::serde::encode_to_vec(&serialized, bincode::config::standard())
            .map_err(|e| Error::Serialization(format!("failed to serialize graph to bytes: {e}")))
    }

    /// Deserialize the graph from binary format.
    ///
    /// # Errors
    ///
    /// Returns an error if decoding fails or the format version differs from
    /// [`FORMAT_VERSION`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let (serialized, _): (SerializedGraph, _) =
            bincode::serde::decode_from_slice(bytes, bincode::config::standard()).map_err(|e| {
                Error::Serialization(format!("failed to deserialize graph from bytes: {e}"))
            })?;

        if serialized.version != FORMAT_VERSION {
            return Err(Error::IncompatibleFormat {
                expected: FORMAT_VERSION,
                found: serialized.version,
            });
        }

        Ok(ModuleGraph {
            inner: Arc::new(RwLock::new(serialized.graph)),
        })
    }
}
