// UHP modem transports
//
// Two independent ways into the same hardware: the web management
// interface (HTTP forms) and the Telnet CLI.

pub mod http;
pub mod telnet;

pub use http::{FormFields, HttpFormClient, parse_form};
pub use telnet::{NegotiationFilter, TelnetConfig, TelnetSession};
