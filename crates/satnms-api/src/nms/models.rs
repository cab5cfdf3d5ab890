// NMS API response types
//
// All responses are wrapped in the `NmsResponse` envelope. `data` stays a raw
// `serde_json::Value` until the caller decides what shape it expects, since
// the payload of object reads differs per object type and NMS version.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Standard NMS response envelope.
///
/// ```json
/// { "error_code": 0, "error_desc": null, "data": { ... } }
/// ```
#[derive(Debug, Deserialize)]
pub struct NmsResponse {
    pub error_code: i64,
    #[serde(default)]
    pub error_desc: Option<String>,
    #[serde(default)]
    pub data: Value,
}

/// Body of `POST /api/object/insert/{parent}`.
#[derive(Debug, Serialize)]
pub struct InsertRequest<'a> {
    pub new_item: &'a str,
    pub index: u32,
    pub params: &'a serde_json::Map<String, Value>,
}

/// Payload of `GET /api/realtime/tick`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TickInfo {
    pub tick: u64,
}

/// Body of the shared-store snapshot commands.
#[derive(Debug, Serialize)]
pub struct SnapshotRequest<'a> {
    pub name: &'a str,
}
