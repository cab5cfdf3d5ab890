// satnms-api: async transports for the satellite NMS and UHP modems

pub mod device;
pub mod error;
pub mod nms;
pub mod transport;

pub use device::{FormFields, HttpFormClient, TelnetConfig, TelnetSession};
pub use error::Error;
pub use nms::NmsClient;
pub use transport::{TlsMode, TransportConfig};
