// ── Object records ──
//
// Last-known state of one NMS object as seen by this session: what was
// submitted, merged with whatever the NMS echoed or reported on re-read.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use super::fault::Faults;
use super::handle::Handle;
use crate::enums::{EnumFamily, ObjectState};

/// Parameter map as sent to and returned by the NMS.
pub type Params = Map<String, Value>;

#[derive(Debug, Clone, Serialize)]
pub struct ObjectRecord {
    pub handle: Handle,
    pub parent: Option<Handle>,
    pub params: Params,
    pub created_at: DateTime<Utc>,
}

impl ObjectRecord {
    pub fn new(handle: Handle, parent: Option<Handle>, params: Params) -> Self {
        Self {
            handle,
            parent,
            params,
            created_at: Utc::now(),
        }
    }

    pub fn kind(&self) -> &str {
        self.handle.kind()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    /// Decoded `state` parameter, if present and known.
    pub fn state(&self) -> Option<ObjectState> {
        self.get("state").and_then(ObjectState::from_json)
    }

    /// Decoded `faults` parameter; empty when absent.
    pub fn faults(&self) -> Faults {
        self.get("faults")
            .and_then(Faults::from_json)
            .unwrap_or_default()
    }
}

/// Overlay `changes` onto `base`, keeping keys `changes` doesn't mention.
pub fn merge_params(base: &Params, changes: &Params) -> Params {
    let mut merged = base.clone();
    for (k, v) in changes {
        merged.insert(k.clone(), v.clone());
    }
    merged
}
