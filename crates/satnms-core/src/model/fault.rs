// ── Fault decoding ──
//
// The NMS reports an object's faults as an integer bitmask. Each flag is
// one power of two; unknown high bits are dropped on decode.

use std::fmt;

use bitflags::bitflags;
use serde::Serialize;
use serde_json::Value;

use crate::error::CoreError;

bitflags! {
    /// Decoded fault set of one NMS object.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
    pub struct Faults: u32 {
        const LAN = 1;
        const RX1 = 1 << 1;
        const RX2 = 1 << 2;
        const TX = 1 << 3;
        const NETWORK = 1 << 4;
        const QOS = 1 << 5;
        const SYSTEM = 1 << 6;
        const DOWN = 1 << 7;
        const HUB_CN_LOW = 1 << 8;
        const HUB_CN_HIGH = 1 << 9;
        const STN_CN_LOW = 1 << 10;
        const STN_CN_HIGH = 1 << 11;
    }
}

impl Faults {
    /// Decode a raw bitmask.
    pub fn decode(bitmask: u64) -> Self {
        let known = bitmask & u64::from(Self::all().bits());
        Self::from_bits_truncate(u32::try_from(known).unwrap_or_default())
    }

    /// `strict`: the sets are equal. Otherwise `expected` must be a subset,
    /// tolerating extra faults that come and go during transitions.
    pub fn matches(self, expected: Self, strict: bool) -> bool {
        if strict {
            self == expected
        } else {
            self.contains(expected)
        }
    }

    /// Flag names in bit order.
    pub fn names(self) -> Vec<&'static str> {
        self.iter_names().map(|(name, _)| name).collect()
    }

    /// Parse flag names (case-insensitive). An empty list is the empty set.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self, CoreError> {
        names.iter().try_fold(Self::empty(), |acc, raw| {
            let raw = raw.as_ref().trim();
            Self::all()
                .iter_names()
                .find(|(name, _)| name.eq_ignore_ascii_case(raw))
                .map(|(_, flag)| acc | flag)
                .ok_or_else(|| CoreError::UnknownEnumValue {
                    family: "fault".into(),
                    value: raw.to_owned(),
                })
        })
    }

    /// Decode the `faults` parameter as the NMS returned it: a number, a
    /// decimal string, or a list of flag names.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_u64().map(Self::decode),
            Value::String(s) if s.trim().is_empty() => Some(Self::empty()),
            Value::String(s) => s.trim().parse::<u64>().ok().map(Self::decode),
            Value::Array(items) => {
                let names: Option<Vec<&str>> = items.iter().map(Value::as_str).collect();
                Self::from_names(&names?).ok()
            }
            Value::Null => Some(Self::empty()),
            _ => None,
        }
    }
}

impl fmt::Display for Faults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        f.write_str(&self.names().join("|"))
    }
}
