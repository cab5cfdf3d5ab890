// ── Object handles ──
//
// A handle is the NMS address of a configuration object: the object type
// plus a per-type sequential index, written `type:index`. Handles are also
// embedded as plain strings inside other objects' parameters, so they
// convert to and from JSON strings losslessly.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::CoreError;

/// Parent placeholder for top-level objects.
pub const ROOT: &str = "root";

/// `type:index` reference to an NMS object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle {
    kind: String,
    index: u32,
}

impl Handle {
    pub fn new(kind: impl Into<String>, index: u32) -> Self {
        Self {
            kind: kind.into(),
            index,
        }
    }

    /// Object type, e.g. `station`.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    /// The handle as an embeddable parameter value.
    pub fn to_value(&self) -> Value {
        Value::String(self.to_string())
    }

    /// Wire form of an optional parent (`root` when absent).
    pub fn parent_path(parent: Option<&Handle>) -> String {
        parent.map_or_else(|| ROOT.to_owned(), ToString::to_string)
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.index)
    }
}

impl FromStr for Handle {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoreError::InvalidUsage {
            message: format!("malformed handle {s:?}, expected `type:index`"),
        };

        let (kind, index) = s.rsplit_once(':').ok_or_else(invalid)?;
        let kind = kind.trim();
        if kind.is_empty() || kind.contains(char::is_whitespace) {
            return Err(invalid());
        }
        let index = index.trim().parse::<u32>().map_err(|_| invalid())?;
        Ok(Self::new(kind, index))
    }
}

impl From<&Handle> for Value {
    fn from(handle: &Handle) -> Self {
        handle.to_value()
    }
}

impl Serialize for Handle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Handle {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
