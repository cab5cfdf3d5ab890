// NMS API client modules
//
// Hand-written client for the satellite NMS management API. Every endpoint
// answers with the `{ error_code, error_desc, data }` envelope; the client
// strips it before callers see the payload.

pub mod auth;
pub mod client;
pub mod config;
pub mod models;
pub mod objects;

pub use client::NmsClient;

/// `error_code` values with a dedicated meaning in the NMS envelope.
///
/// Any other non-zero code is a validation rejection.
pub mod codes {
    pub const OK: i64 = 0;
    /// The addressed object does not exist.
    pub const NOT_FOUND: i64 = 3;
    /// The object is in a management mode that blocks NMS-originated writes.
    pub const CONTROLLED_MODE: i64 = 5;
    /// The named configuration snapshot does not exist.
    pub const SNAPSHOT_NOT_FOUND: i64 = 7;
}
