//! UHP modem drivers.
//!
//! One capability surface, two transports. [`HttpDriver`] drives the
//! modem's web forms; [`TelnetDriver`] drives its command line. Every
//! high-level operation starts by overwriting the profile or feature it
//! touches, so repeating a setup call converges on the same state instead of
//! stacking changes.
//!
//! Model differences are resolved through [`Capabilities`]: operations the
//! hardware can't perform fail with `InvalidUsage` before anything is sent.

use std::net::Ipv4Addr;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::enums::{AccessLevel, DeviceModel, DeviceState, Modulation, RollOff, StationMode};
use crate::error::CoreError;
use crate::model::{Capabilities, Faults};

mod http;
mod parse;
mod telnet;

pub use http::HttpDriver;
pub use parse::{parse_key_values, parse_ping};
pub use telnet::TelnetDriver;

/// Ordered field map of a modem form or `key: value` listing.
pub type FormMap = satnms_api::FormFields;

// ── Operation inputs ─────────────────────────────────────────────────

/// One RF carrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Carrier {
    pub frequency_khz: u64,
    pub symbol_rate_ksps: u32,
}

impl Carrier {
    pub fn new(frequency_khz: u64, symbol_rate_ksps: u32) -> Self {
        Self {
            frequency_khz,
            symbol_rate_ksps,
        }
    }

    fn validate(self, what: &str) -> Result<Self, CoreError> {
        if self.frequency_khz == 0 || self.symbol_rate_ksps == 0 {
            return Err(CoreError::invalid_usage(format!(
                "{what} carrier needs a non-zero frequency and symbol rate"
            )));
        }
        Ok(self)
    }
}

/// TDM/TDMA star remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StarStation {
    pub rx: Carrier,
    pub tx: Carrier,
}

/// DAMA remote on a given DAMA channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamaStation {
    pub rx: Carrier,
    pub tx: Carrier,
    pub channel: u16,
}

/// Station variants that don't depend on a star hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HubbedKind {
    Hubless,
    /// Needs the second demodulator for the peer carrier.
    Mesh,
    Crosspol,
}

impl HubbedKind {
    pub fn station_mode(self) -> StationMode {
        match self {
            Self::Hubless => StationMode::Hubless,
            Self::Mesh => StationMode::Mesh,
            Self::Crosspol => StationMode::Crosspol,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HubbedStation {
    pub kind: HubbedKind,
    pub rx: Carrier,
    pub tx: Carrier,
    /// Second receive carrier; required for mesh.
    pub rx2: Option<Carrier>,
}

/// Point-to-point SCPC modem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScpcModem {
    pub rx: Carrier,
    pub tx: Carrier,
    pub modulation: Modulation,
    pub roll_off: RollOff,
}

/// Built-in traffic generator settings. `enabled: false` just stops it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrafficGenerator {
    pub enabled: bool,
    pub destination: Ipv4Addr,
    pub rate_kbps: u32,
    pub packet_size: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PingRequest {
    pub target: Ipv4Addr,
    pub count: u32,
    pub size: u16,
}

impl PingRequest {
    pub fn new(target: Ipv4Addr) -> Self {
        Self {
            target,
            count: 5,
            size: 64,
        }
    }
}

// ── Operation outputs ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PingReport {
    pub sent: u32,
    pub received: u32,
    pub rtt_avg_ms: Option<f64>,
}

impl PingReport {
    /// Lost packets as a percentage of sent ones.
    pub fn loss_percent(&self) -> f64 {
        if self.sent == 0 {
            return 100.0;
        }
        let lost = self.sent.saturating_sub(self.received);
        f64::from(lost) * 100.0 / f64::from(self.sent)
    }

    pub fn is_success(&self) -> bool {
        self.received > 0
    }
}

/// Normalized status page of a modem.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceOverview {
    pub state: Option<DeviceState>,
    pub model: Option<String>,
    pub serial: Option<String>,
    pub software: Option<String>,
    pub faults: Faults,
    /// Every field as reported.
    pub fields: FormMap,
}

// ── Driver trait ─────────────────────────────────────────────────────

/// High-level modem operations, independent of transport.
#[async_trait]
pub trait DeviceDriver: Send {
    /// Address the driver talks to.
    fn address(&self) -> &str;

    fn model(&self) -> DeviceModel;

    fn capabilities(&self) -> Capabilities {
        Capabilities::for_model(self.model())
    }

    async fn star_station(&mut self, station: &StarStation) -> Result<(), CoreError>;

    async fn dama_station(&mut self, station: &DamaStation) -> Result<(), CoreError>;

    async fn hubbed_station(&mut self, station: &HubbedStation) -> Result<(), CoreError>;

    async fn scpc_modem(&mut self, modem: &ScpcModem) -> Result<(), CoreError>;

    /// How much of the modem's configuration the NMS may change.
    async fn set_nms_permission(&mut self, level: AccessLevel) -> Result<(), CoreError>;

    async fn traffic_generator(&mut self, generator: &TrafficGenerator) -> Result<(), CoreError>;

    /// Restart the modem. The transport session ends with it.
    async fn reboot(&mut self) -> Result<(), CoreError>;

    /// Replace the modem's network script with `lines` and run it.
    async fn network_script(&mut self, lines: &[String]) -> Result<(), CoreError>;

    async fn ping(&mut self, request: &PingRequest) -> Result<PingReport, CoreError>;

    async fn get_state(&mut self) -> Result<DeviceState, CoreError>;

    async fn get_overview(&mut self) -> Result<DeviceOverview, CoreError>;

    /// Release the transport. Telnet sessions log out; HTTP has nothing to do.
    async fn close(self: Box<Self>) -> Result<(), CoreError>;
}

// ── Construction ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceTransport {
    #[default]
    Http,
    Telnet,
}

/// Where and how to reach one modem.
#[derive(Debug, Clone)]
pub struct DeviceEndpoint {
    /// Host, `host:port`, or for HTTP a full base URL.
    pub address: String,
    pub model: DeviceModel,
    pub transport: DeviceTransport,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    pub timeout: Duration,
}

impl DeviceEndpoint {
    pub fn new(address: impl Into<String>, model: DeviceModel, transport: DeviceTransport) -> Self {
        Self {
            address: address.into(),
            model,
            transport,
            username: None,
            password: None,
            timeout: Duration::from_secs(15),
        }
    }
}

/// Open a driver for `endpoint` on its configured transport.
pub async fn connect(endpoint: &DeviceEndpoint) -> Result<Box<dyn DeviceDriver>, CoreError> {
    match endpoint.transport {
        DeviceTransport::Http => Ok(Box::new(HttpDriver::new(endpoint)?)),
        DeviceTransport::Telnet => Ok(Box::new(TelnetDriver::connect(endpoint).await?)),
    }
}

// ── Shared validation ────────────────────────────────────────────────

pub(crate) fn check_star(station: &StarStation) -> Result<(), CoreError> {
    station.rx.validate("rx")?;
    station.tx.validate("tx")?;
    Ok(())
}

pub(crate) fn check_dama(caps: &Capabilities, station: &DamaStation) -> Result<(), CoreError> {
    caps.ensure_station_mode(StationMode::Dama)?;
    station.rx.validate("rx")?;
    station.tx.validate("tx")?;
    Ok(())
}

pub(crate) fn check_hubbed(caps: &Capabilities, station: &HubbedStation) -> Result<(), CoreError> {
    caps.ensure_station_mode(station.kind.station_mode())?;
    station.rx.validate("rx")?;
    station.tx.validate("tx")?;
    match (station.kind, station.rx2) {
        (HubbedKind::Mesh, None) => Err(CoreError::invalid_usage(
            "mesh station needs a second receive carrier",
        )),
        (_, Some(rx2)) => {
            if !caps.second_demodulator {
                return Err(CoreError::invalid_usage(format!(
                    "{} has no second demodulator",
                    caps.model
                )));
            }
            rx2.validate("rx2").map(|_| ())
        }
        (_, None) => Ok(()),
    }
}

pub(crate) fn check_scpc(modem: &ScpcModem) -> Result<(), CoreError> {
    modem.rx.validate("rx")?;
    modem.tx.validate("tx")?;
    Ok(())
}

pub(crate) fn check_traffic_generator(
    caps: &Capabilities,
    generator: &TrafficGenerator,
) -> Result<(), CoreError> {
    caps.ensure_traffic_generator()?;
    if generator.enabled && (generator.rate_kbps == 0 || generator.packet_size == 0) {
        return Err(CoreError::invalid_usage(
            "traffic generator needs a non-zero rate and packet size",
        ));
    }
    Ok(())
}
