//! Export descriptors and export records.
//!
//! Every module owns one descriptor. All descriptors and records live in a
//! single [`ExportsArena`] and refer to each other by index: a record that
//! behaves like a namespace owns a nested descriptor by id, and a descriptor
//! may redirect named lookups to another descriptor. Keeping everything in one
//! arena makes snapshots and persistence plain data copies.

mod descriptor;
mod record;
mod snapshot;
mod state;

use std::fmt;

use once_cell::sync::OnceCell;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::connection::ConnectionId;
use crate::dependency::DependencyId;

pub use record::{ExportRecord, ExportTarget};
pub use snapshot::{ProvidedDiff, RestoreProvidedData};
pub use state::{ProvidedExports, ProvidedState, UsageState, UsedExports, UsedName, can_mangle};

/// Index of a descriptor in the [`ExportsArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DescriptorId(u32);

/// Index of a record in the [`ExportsArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordId(u32);

impl fmt::Display for DescriptorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "exports#{}", self.0)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "export#{}", self.0)
    }
}

/// Target applied to every export by `mark_unknown_provided_with`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReexportTarget {
    pub key: DependencyId,
    pub connection: ConnectionId,
    pub priority: i32,
}

/// Per-module export metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportDescriptor {
    exports: FxHashMap<String, RecordId>,
    #[serde(skip)]
    sorted: OnceCell<Vec<RecordId>>,
    other: RecordId,
    side_effects_only: RecordId,
    redirect: Option<DescriptorId>,
    owner: Option<RecordId>,
}

impl ExportDescriptor {
    /// Catch-all record for every export not listed explicitly.
    pub fn other(&self) -> RecordId {
        self.other
    }

    pub fn side_effects_only(&self) -> RecordId {
        self.side_effects_only
    }

    pub fn redirect(&self) -> Option<DescriptorId> {
        self.redirect
    }

    /// Record owning this descriptor, for nested descriptors.
    pub fn owner(&self) -> Option<RecordId> {
        self.owner
    }

    pub fn own_export(&self, name: &str) -> Option<RecordId> {
        self.exports.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.exports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exports.is_empty()
    }
}

/// Arena holding every export descriptor and record of a graph.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportsArena {
    descriptors: Vec<ExportDescriptor>,
    records: Vec<ExportRecord>,
}

impl ExportsArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh descriptor with empty catch-all and side-effects records.
    pub fn new_descriptor(&mut self) -> DescriptorId {
        self.new_descriptor_owned_by(None)
    }

    pub(crate) fn new_descriptor_owned_by(&mut self, owner: Option<RecordId>) -> DescriptorId {
        let other = self.push_record(ExportRecord::new(None, None));
        let side_effects_only = self.push_record(ExportRecord::new(None, None));
        let id = DescriptorId(self.descriptors.len() as u32);
        self.descriptors.push(ExportDescriptor {
            exports: FxHashMap::default(),
            sorted: OnceCell::new(),
            other,
            side_effects_only,
            redirect: None,
            owner,
        });
        id
    }

    fn push_record(&mut self, record: ExportRecord) -> RecordId {
        let id = RecordId(self.records.len() as u32);
        self.records.push(record);
        id
    }

    /// Create a record in `desc` itself, seeded from its local catch-all.
    fn insert_local(&mut self, desc: DescriptorId, name: &str) -> RecordId {
        let other = self.descriptor(desc).other;
        let record = ExportRecord::new(Some(name.to_string()), Some(&self.records[other.0 as usize]));
        let id = self.push_record(record);
        let descriptor = self.descriptor_mut(desc);
        descriptor.exports.insert(name.to_string(), id);
        descriptor.sorted.take();
        id
    }

    pub fn descriptor(&self, id: DescriptorId) -> &ExportDescriptor {
        &self.descriptors[id.0 as usize]
    }

    fn descriptor_mut(&mut self, id: DescriptorId) -> &mut ExportDescriptor {
        &mut self.descriptors[id.0 as usize]
    }

    pub fn record(&self, id: RecordId) -> &ExportRecord {
        &self.records[id.0 as usize]
    }

    pub fn record_mut(&mut self, id: RecordId) -> &mut ExportRecord {
        &mut self.records[id.0 as usize]
    }

    pub fn descriptor_count(&self) -> usize {
        self.descriptors.len()
    }

    /// Records explicitly listed in `desc`, in no particular order.
    fn local_ids(&self, desc: DescriptorId) -> Vec<RecordId> {
        self.descriptor(desc).exports.values().copied().collect()
    }

    /// Records explicitly listed in `desc`, sorted by name. The order is
    /// cached until the next insertion.
    pub fn ordered_own_exports(&self, desc: DescriptorId) -> &[RecordId] {
        let descriptor = self.descriptor(desc);
        descriptor.sorted.get_or_init(|| {
            let mut entries: Vec<(&String, RecordId)> =
                descriptor.exports.iter().map(|(name, id)| (name, *id)).collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            entries.into_iter().map(|(_, id)| id).collect()
        })
    }
}
