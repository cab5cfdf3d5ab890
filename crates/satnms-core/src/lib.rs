//! Object and configuration convergence client for a satellite NMS.
//!
//! Built on the transports in `satnms-api`, this crate keeps a local view of
//! everything a test run creates and turns the NMS's asynchronous behavior
//! into bounded waits:
//!
//! - **[`NmsSession`]**: creates and updates NMS objects by [`Handle`],
//!   mirrors their parameters in an [`ObjectRepository`], and waits for
//!   ticks, object states and fault masks to converge.
//!
//! - **[`SnapshotManager`]**: whole-configuration capture and restore,
//!   either as named configurations on the NMS or as local `.cfg` files.
//!
//! - **Enum registry** ([`enums`]): the closed vocabularies of the NMS wire
//!   format, each with a numeric and a label view, plus a name-addressed
//!   [`EnumRegistry`] for runtime translation.
//!
//! - **Fault decoding** ([`Faults`]): the bitmask behind an object's
//!   `faults` field, with strict and subset matching.
//!
//! - **Device drivers** ([`driver`]): UHP modem setup over HTTP forms or the
//!   Telnet CLI behind one [`DeviceDriver`] trait, gated by the hardware
//!   [`Capabilities`] of each model.

pub mod config;
pub mod driver;
pub mod enums;
pub mod error;
pub mod model;
pub mod session;
pub mod snapshot;
pub mod store;
pub mod wait;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{Credentials, SessionConfig, TlsVerification};
pub use driver::{
    Carrier, DamaStation, DeviceDriver, DeviceEndpoint, DeviceOverview, DeviceTransport,
    HttpDriver, HubbedKind, HubbedStation, PingReport, PingRequest, ScpcModem, StarStation,
    TelnetDriver, TrafficGenerator,
};
pub use enums::{
    AccessLevel, ControllerMode, DeviceModel, DeviceState, Direction, EnumFamily, EnumRegistry,
    EnumValue, Modulation, ObjectState, RollOff, RouteType, ShaperMode, StationMode,
};
pub use error::CoreError;
pub use model::{Capabilities, Faults, Handle, ObjectRecord, Params, ROOT};
pub use session::NmsSession;
pub use snapshot::{SnapshotInfo, SnapshotManager};
pub use store::ObjectRepository;
pub use wait::{Convergence, poll_until};
