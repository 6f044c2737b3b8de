// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Per-target write state: shared reference counts plus an owned id table.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::{ObjectId, RecordTable, WriteObject};

/// Id-table entry for an object that has been written in this traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefId {
    /// Written under its bare user name; later `USE`s carry no suffix.
    NoSuffix,
    /// Written as `name<prefix><id>`.
    Id(u32),
}

impl fmt::Display for RefId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSuffix => f.write_str("<nosuffix>"),
            Self::Id(id) => write!(f, "{id}"),
        }
    }
}

/// Write-reference state for one output target.
///
/// The record table (counts and in-graph flags) lives behind an `Arc` and is
/// shared with every context created by [`copy_from`](Self::copy_from);
/// mutations through one are visible through all, and the table is freed
/// with the last sharer. The id table is owned: a copy starts from a
/// snapshot and assigns ids independently afterwards.
#[derive(Debug, Default)]
pub struct WriterefCounter {
    records: Arc<Mutex<RecordTable>>,
    ids: HashMap<ObjectId, RefId>,
    next_id: u32,
}

impl WriterefCounter {
    /// Fresh state with its own record table.
    pub fn new() -> Self {
        Self::default()
    }

    /// State for a copied output context: shares `source`'s records,
    /// snapshots its id table, and continues its id sequence so the two
    /// never hand out the same suffix.
    ///
    /// A fresh counter ([`new`](Self::new)) starts its ids at 0; a copy
    /// does not. It resumes at `source`'s next id instead, so a name minted
    /// by the copy can never shadow one the source already wrote.
    pub fn copy_from(source: &Self) -> Self {
        Self {
            records: Arc::clone(&source.records),
            ids: source.ids.clone(),
            next_id: source.next_id,
        }
    }

    /// Returns `true` if both states see the same record table.
    pub fn shares_records_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.records, &other.records)
    }

    /// Returns `true` if no other context shares this record table.
    pub fn is_last_sharer(&self) -> bool {
        Arc::strong_count(&self.records) == 1
    }

    fn records(&self) -> MutexGuard<'_, RecordTable> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of live records.
    pub fn record_count(&self) -> usize {
        self.records().len()
    }

    /// Current write-reference count; 0 if no record exists.
    pub fn get_writeref(&self, id: ObjectId) -> i32 {
        self.records().get(id).map_or(0, |r| r.writeref)
    }

    /// Reachable in the current traversal; `false` if no record exists.
    pub fn is_in_graph(&self, id: ObjectId) -> bool {
        self.records().get(id).is_some_and(|r| r.in_graph)
    }

    /// Whether the object belongs in the output at all.
    pub fn should_write(&self, id: ObjectId) -> bool {
        self.is_in_graph(id)
    }

    /// `writeref > 1`: the object must be DEF'd and USE'd.
    pub fn has_multiple_write_refs(&self, id: ObjectId) -> bool {
        self.records().get(id).is_some_and(|r| r.writeref > 1)
    }

    /// Set the in-graph flag, creating the record if needed.
    pub fn set_in_graph<O: WriteObject + ?Sized>(&self, obj: &O, in_graph: bool) {
        self.records().entry(obj.object_id(), obj.name()).in_graph = in_graph;
    }

    /// Set the write-reference count.
    ///
    /// Zero removes the record and the object's id-table entry, so a later
    /// pass over the same output writes the object in full again. A
    /// negative count is an upstream over-decrement: it is logged and kept,
    /// and the record then never goes away.
    pub fn set_writeref<O: WriteObject + ?Sized>(&mut self, obj: &O, writeref: i32) {
        let id = obj.object_id();
        self.records().entry(id, obj.name()).writeref = writeref;

        if writeref == 0 {
            self.remove_writeref(obj);
            self.ids.remove(&id);
        } else if writeref < 0 {
            let name = if obj.name().is_empty() {
                "<noname>"
            } else {
                obj.name()
            };
            warn!(object = %id, name, writeref, "writeref < 0");
        }
    }

    /// `set_writeref(obj, get_writeref(obj) - 1)`.
    pub fn decrement_writeref<O: WriteObject + ?Sized>(&mut self, obj: &O) {
        let current = self.get_writeref(obj.object_id());
        self.set_writeref(obj, current - 1);
    }

    fn remove_writeref<O: WriteObject + ?Sized>(&self, obj: &O) {
        let id = obj.object_id();
        if self.records().remove(id).is_some() {
            debug!(object = %id, name = obj.name(), "write record released");
        } else {
            warn!(object = %id, "write record not found");
        }
    }

    /// Assign the next reference id to `id` and return it.
    pub fn add_reference(&mut self, id: ObjectId) -> u32 {
        let refid = self.next_id;
        self.next_id += 1;
        self.ids.insert(id, RefId::Id(refid));
        refid
    }

    /// Id-table entry for `id`; `None` until the object's first write.
    pub fn find_reference(&self, id: ObjectId) -> Option<RefId> {
        self.ids.get(&id).copied()
    }

    /// Force the id-table entry for `id`.
    pub fn set_reference(&mut self, id: ObjectId, refid: RefId) {
        self.ids.insert(id, refid);
    }

    /// Drop the id-table entry for `id`.
    pub fn remove_reference(&mut self, id: ObjectId) -> Option<RefId> {
        self.ids.remove(&id)
    }

    /// Report remaining records as leaks and clear both tables. Returns the
    /// number of leaked records.
    pub fn debug_cleanup(&mut self) -> usize {
        self.ids.clear();
        self.records().debug_sweep()
    }
}
