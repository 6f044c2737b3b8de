// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Per-object write-reference records.

use std::collections::HashMap;

use tracing::warn;

use crate::ObjectId;

/// Write state of one object for one output target.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WriteRecord {
    /// Remaining number of times the object will be written or used.
    pub writeref: i32,
    /// Reachable from the root of the current traversal.
    pub in_graph: bool,
    /// User name captured for diagnostics.
    pub name: String,
}

/// Record storage shared by every output context copied from one target.
#[derive(Debug, Default)]
pub struct RecordTable {
    records: HashMap<ObjectId, WriteRecord>,
}

impl RecordTable {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record for `id`, if present.
    pub fn get(&self, id: ObjectId) -> Option<&WriteRecord> {
        self.records.get(&id)
    }

    /// Record for `id`, created with `name` when absent.
    pub fn entry(&mut self, id: ObjectId, name: &str) -> &mut WriteRecord {
        self.records.entry(id).or_insert_with(|| WriteRecord {
            name: name.to_owned(),
            ..WriteRecord::default()
        })
    }

    /// Remove and return the record for `id`.
    pub fn remove(&mut self, id: ObjectId) -> Option<WriteRecord> {
        self.records.remove(&id)
    }

    /// Number of live records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` when no records are live.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Report every remaining record as a leak, then clear the table.
    ///
    /// Returns the number of records reported. Leaks are sorted by id so
    /// the log is stable.
    pub fn debug_sweep(&mut self) -> usize {
        let mut leaked: Vec<_> = self.records.drain().collect();
        leaked.sort_by_key(|(id, _)| *id);
        for (id, record) in &leaked {
            let name = if record.name.is_empty() {
                "<noname>"
            } else {
                record.name.as_str()
            };
            warn!(
                object = %id,
                name,
                writeref = record.writeref,
                "not removed from write-reference table"
            );
        }
        leaked.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_creates_once() {
        let mut table = RecordTable::new();
        let id = ObjectId(7);
        table.entry(id, "A").writeref = 2;
        table.entry(id, "ignored").in_graph = true;
        let record = table.get(id);
        assert_eq!(
            record,
            Some(&WriteRecord {
                writeref: 2,
                in_graph: true,
                name: "A".to_owned()
            })
        );
    }

    #[test]
    fn sweep_counts_and_clears() {
        let mut table = RecordTable::new();
        table.entry(ObjectId(1), "");
        table.entry(ObjectId(2), "B");
        assert_eq!(table.debug_sweep(), 2);
        assert!(table.is_empty());
        assert_eq!(table.debug_sweep(), 0);
    }
}
