//! Capture and replay of provision information.
//!
//! Incremental rebuilds keep the provision analysis of modules that did not
//! change. A snapshot only stores what differs from the catch-all record, so
//! restoring onto a descriptor that already holds other records first resets
//! those records to the catch-all values.

use serde::{Deserialize, Serialize};

use super::state::ProvidedState;
use super::{DescriptorId, ExportsArena};

/// Provision state of one export that differs from the catch-all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvidedDiff {
    pub name: String,
    pub provided: ProvidedState,
    pub can_mangle_provide: Option<bool>,
    pub terminal_binding: bool,
    /// Snapshot of the owned nested descriptor, if any.
    pub nested: Option<Box<RestoreProvidedData>>,
}

/// Provision snapshot of a descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestoreProvidedData {
    pub exports: Vec<ProvidedDiff>,
    pub other_provided: ProvidedState,
    pub other_can_mangle_provide: Option<bool>,
    pub other_terminal_binding: bool,
}

impl ExportsArena {
    /// Capture the provision state of `desc` (its own records only).
    pub fn snapshot_provided(&self, desc: DescriptorId) -> RestoreProvidedData {
        let other = self.record(self.descriptor(desc).other());
        let mut exports = Vec::new();

        for id in self.ordered_own_exports(desc) {
            let record = self.record(*id);
            let nested = match record.nested() {
                Some(nested) if record.owns_nested() => Some(Box::new(self.snapshot_provided(nested))),
                _ => None,
            };
            let differs = record.provided() != other.provided()
                || record.can_mangle_provide() != other.can_mangle_provide()
                || record.terminal_binding() != other.terminal_binding();
            if !differs && nested.is_none() {
                continue;
            }
            exports.push(ProvidedDiff {
                name: record.name().unwrap_or_default().to_string(),
                provided: record.provided(),
                can_mangle_provide: record.can_mangle_provide(),
                terminal_binding: record.terminal_binding(),
                nested,
            });
        }

        RestoreProvidedData {
            exports,
            other_provided: other.provided(),
            other_can_mangle_provide: other.can_mangle_provide(),
            other_terminal_binding: other.terminal_binding(),
        }
    }

    /// Replay a snapshot taken with [`snapshot_provided`](Self::snapshot_provided).
    ///
    /// Provision is assigned rather than promoted, so restoring may move a
    /// record backwards relative to whatever the descriptor held before.
    pub fn restore_provided(&mut self, desc: DescriptorId, data: &RestoreProvidedData) {
        for id in self.local_ids(desc) {
            let record = self.record_mut(id);
            record.provided = data.other_provided;
            record.can_mangle_provide = data.other_can_mangle_provide;
            record.terminal_binding = data.other_terminal_binding;
        }

        let other = self.descriptor(desc).other();
        let record = self.record_mut(other);
        record.provided = data.other_provided;
        record.can_mangle_provide = data.other_can_mangle_provide;
        record.terminal_binding = data.other_terminal_binding;

        for diff in &data.exports {
            let id = match self.descriptor(desc).own_export(&diff.name) {
                Some(id) => id,
                None => self.insert_local(desc, &diff.name),
            };
            let record = self.record_mut(id);
            record.provided = diff.provided;
            record.can_mangle_provide = diff.can_mangle_provide;
            record.terminal_binding = diff.terminal_binding;
            if let Some(nested_data) = &diff.nested {
                let nested = self.create_nested(id);
                self.restore_provided(nested, nested_data);
            }
        }
    }
}
