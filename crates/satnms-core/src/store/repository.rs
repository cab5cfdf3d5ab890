// ── Object repository ──
//
// Session-local bookkeeping of the objects this session created or read:
// handle allocation per type and the last-known parameters of each object.
// Concurrent reads are lock-free through `DashMap`; records are shared as
// `Arc` snapshots so readers never observe a half-applied update.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::trace;

use crate::model::{Handle, ObjectRecord, Params, merge_params};

/// Handle allocator plus last-known values of every tracked object.
#[derive(Default)]
pub struct ObjectRepository {
    /// Primary storage: handle -> record.
    records: DashMap<Handle, Arc<ObjectRecord>>,

    /// Next free index per object type.
    next_index: DashMap<String, u32>,
}

impl ObjectRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// The index the next object of `kind` will receive. Does not allocate.
    pub fn peek_index(&self, kind: &str) -> u32 {
        self.next_index.get(kind).map_or(0, |n| *n)
    }

    /// Raise the next `kind` index to at least `next`. Used when objects of
    /// that type already exist on the NMS from an earlier session.
    pub fn reserve_index(&self, kind: &str, next: u32) {
        self.next_index
            .entry(kind.to_owned())
            .and_modify(|n| *n = (*n).max(next))
            .or_insert(next);
    }

    /// Record a successfully created object and consume its index.
    pub fn commit_create(
        &self,
        handle: Handle,
        parent: Option<Handle>,
        params: Params,
    ) -> Arc<ObjectRecord> {
        let next = handle.index().saturating_add(1);
        self.next_index
            .entry(handle.kind().to_owned())
            .and_modify(|n| *n = (*n).max(next))
            .or_insert(next);

        let record = Arc::new(ObjectRecord::new(handle.clone(), parent, params));
        self.records.insert(handle, Arc::clone(&record));
        trace!(handle = %record.handle, "record created");
        record
    }

    /// Parameters of `handle` with `changes` overlaid, without committing.
    pub fn merged(&self, handle: &Handle, changes: &Params) -> Params {
        self.records
            .get(handle)
            .map_or_else(|| changes.clone(), |r| merge_params(&r.params, changes))
    }

    /// Replace the parameters of `handle` with an already merged map.
    ///
    /// Objects this session did not create are tracked from here on.
    pub fn commit_params(&self, handle: &Handle, params: Params) -> Arc<ObjectRecord> {
        let record = match self.records.get(handle) {
            Some(existing) => ObjectRecord {
                params,
                ..ObjectRecord::clone(&existing)
            },
            None => ObjectRecord::new(handle.clone(), None, params),
        };
        let record = Arc::new(record);
        self.records.insert(handle.clone(), Arc::clone(&record));
        record
    }

    /// Overlay values read back from the NMS onto the record.
    pub fn absorb(&self, handle: &Handle, remote: &Params) -> Arc<ObjectRecord> {
        let merged = self.merged(handle, remote);
        self.commit_params(handle, merged)
    }

    pub fn get(&self, handle: &Handle) -> Option<Arc<ObjectRecord>> {
        self.records.get(handle).map(|r| Arc::clone(r.value()))
    }

    pub fn contains(&self, handle: &Handle) -> bool {
        self.records.contains_key(handle)
    }

    /// Records created directly under `parent`, ordered by handle.
    pub fn children(&self, parent: &Handle) -> Vec<Arc<ObjectRecord>> {
        let mut out: Vec<_> = self
            .records
            .iter()
            .filter(|r| r.parent.as_ref() == Some(parent))
            .map(|r| Arc::clone(r.value()))
            .collect();
        out.sort_by(|a, b| a.handle.cmp(&b.handle));
        out
    }

    /// Every record, ordered by handle.
    pub fn records(&self) -> Vec<Arc<ObjectRecord>> {
        let mut out: Vec<_> = self.records.iter().map(|r| Arc::clone(r.value())).collect();
        out.sort_by(|a, b| a.handle.cmp(&b.handle));
        out
    }

    /// Forget every record and restart every index at zero.
    pub fn reset(&self) {
        self.records.clear();
        self.next_index.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
