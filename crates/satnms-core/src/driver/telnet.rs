// ── Telnet CLI modem driver ──
//
// Operations are short command scripts. Each one starts from the profile or
// feature type command, which resets that block on the modem, so scripts are
// safe to replay.

use async_trait::async_trait;
use satnms_api::{TelnetConfig, TelnetSession};
use tracing::{debug, info};

use super::parse::{overview_from_fields, parse_key_values, parse_ping};
use super::{
    Carrier, DamaStation, DeviceDriver, DeviceEndpoint, DeviceOverview, HubbedKind,
    HubbedStation, PingReport, PingRequest, ScpcModem, StarStation, TrafficGenerator,
    check_dama, check_hubbed, check_scpc, check_star, check_traffic_generator,
};
use crate::enums::{AccessLevel, DeviceModel, DeviceState, EnumFamily};
use crate::error::{CoreError, Operation};
use crate::model::Capabilities;

const PROFILE: u8 = 1;

/// Modem driven through its Telnet command line.
pub struct TelnetDriver {
    address: String,
    model: DeviceModel,
    caps: Capabilities,
    /// `None` once the modem was rebooted or the driver closed.
    session: Option<TelnetSession>,
}

impl TelnetDriver {
    /// Open a session. `address` may carry a port as `host:port`.
    pub async fn connect(endpoint: &DeviceEndpoint) -> Result<Self, CoreError> {
        let (host, port) = split_host_port(&endpoint.address)?;
        let config = TelnetConfig {
            port,
            read_timeout: endpoint.timeout,
            username: endpoint.username.clone(),
            password: endpoint.password.clone(),
            ..TelnetConfig::default()
        };
        let session = TelnetSession::connect(host, config).await.map_err(|e| {
            CoreError::from_api(
                e,
                Operation::Device {
                    address: &endpoint.address,
                },
            )
        })?;
        debug!(device = %endpoint.address, "telnet session open");

        Ok(Self {
            address: endpoint.address.clone(),
            model: endpoint.model,
            caps: Capabilities::for_model(endpoint.model),
            session: Some(session),
        })
    }

    /// Whether the underlying session is still usable.
    pub fn is_connected(&self) -> bool {
        self.session.as_ref().is_some_and(TelnetSession::is_open)
    }

    fn session(&mut self) -> Result<&mut TelnetSession, CoreError> {
        let address = &self.address;
        self.session.as_mut().ok_or_else(|| CoreError::ProtocolError {
            device: address.clone(),
            message: "telnet session is closed".into(),
        })
    }

    async fn run(&mut self, commands: &[String]) -> Result<Vec<String>, CoreError> {
        let result = self.session()?.run_script(commands).await;
        result.map_err(|e| self.map_err(e))
    }

    async fn query(&mut self, command: &str) -> Result<String, CoreError> {
        let result = self.session()?.command(command).await;
        result.map_err(|e| self.map_err(e))
    }

    fn map_err(&self, err: satnms_api::Error) -> CoreError {
        CoreError::from_api(
            err,
            Operation::Device {
                address: &self.address,
            },
        )
    }
}

#[async_trait]
impl DeviceDriver for TelnetDriver {
    fn address(&self) -> &str {
        &self.address
    }

    fn model(&self) -> DeviceModel {
        self.model
    }

    async fn star_station(&mut self, station: &StarStation) -> Result<(), CoreError> {
        check_star(station)?;
        self.run(&profile_script("starrem", station.rx, station.tx, &[]))
            .await?;
        info!(device = %self.address, "star station configured");
        Ok(())
    }

    async fn dama_station(&mut self, station: &DamaStation) -> Result<(), CoreError> {
        check_dama(&self.caps, station)?;
        let extra = [format!("pro {PROFILE} dama channel {}", station.channel)];
        self.run(&profile_script("damarem", station.rx, station.tx, &extra))
            .await?;
        info!(device = %self.address, channel = station.channel, "dama station configured");
        Ok(())
    }

    async fn hubbed_station(&mut self, station: &HubbedStation) -> Result<(), CoreError> {
        check_hubbed(&self.caps, station)?;
        let extra: Vec<String> = station
            .rx2
            .map(|c| format!("pro {PROFILE} rx2 {} {}", c.frequency_khz, c.symbol_rate_ksps))
            .into_iter()
            .collect();
        self.run(&profile_script(
            hubbed_type(station.kind),
            station.rx,
            station.tx,
            &extra,
        ))
        .await?;
        info!(device = %self.address, kind = ?station.kind, "station configured");
        Ok(())
    }

    async fn scpc_modem(&mut self, modem: &ScpcModem) -> Result<(), CoreError> {
        check_scpc(modem)?;
        let extra = [
            format!("pro {PROFILE} mod {}", modem.modulation.label()),
            format!("pro {PROFILE} rolloff {}", modem.roll_off.code()),
        ];
        self.run(&profile_script("scpc", modem.rx, modem.tx, &extra))
            .await?;
        info!(device = %self.address, "scpc modem configured");
        Ok(())
    }

    async fn set_nms_permission(&mut self, level: AccessLevel) -> Result<(), CoreError> {
        self.query(&format!("nms access {}", level.label())).await?;
        info!(device = %self.address, level = level.label(), "nms access set");
        Ok(())
    }

    async fn traffic_generator(&mut self, generator: &TrafficGenerator) -> Result<(), CoreError> {
        check_traffic_generator(&self.caps, generator)?;
        self.run(&tgen_script(generator)).await?;
        Ok(())
    }

    async fn reboot(&mut self) -> Result<(), CoreError> {
        let session = self.session.take().ok_or_else(|| CoreError::ProtocolError {
            device: self.address.clone(),
            message: "telnet session is closed".into(),
        })?;
        session
            .command_and_disconnect("reboot")
            .await
            .map_err(|e| self.map_err(e))?;
        info!(device = %self.address, "reboot requested");
        Ok(())
    }

    async fn network_script(&mut self, lines: &[String]) -> Result<(), CoreError> {
        let mut script = Vec::with_capacity(lines.len() + 2);
        script.push("script clear".to_owned());
        script.extend(lines.iter().map(|l| format!("script add {l}")));
        script.push("script run".to_owned());
        self.run(&script).await?;
        info!(device = %self.address, lines = lines.len(), "network script applied");
        Ok(())
    }

    async fn ping(&mut self, request: &PingRequest) -> Result<PingReport, CoreError> {
        let command = format!("ping {} {} {}", request.target, request.count, request.size);
        let reply = self.query(&command).await?;
        parse_ping(&reply).ok_or_else(|| CoreError::ProtocolError {
            device: self.address.clone(),
            message: "ping reply has no packet summary".into(),
        })
    }

    async fn get_state(&mut self) -> Result<DeviceState, CoreError> {
        let reply = self.query("sh state").await?;
        let fields = parse_key_values(&reply);
        let raw = fields.get("state").ok_or_else(|| CoreError::ProtocolError {
            device: self.address.clone(),
            message: format!("unexpected state reply {reply:?}"),
        })?;
        DeviceState::parse(raw)
    }

    async fn get_overview(&mut self) -> Result<DeviceOverview, CoreError> {
        let reply = self.query("sh sys").await?;
        Ok(overview_from_fields(parse_key_values(&reply)))
    }

    async fn close(mut self: Box<Self>) -> Result<(), CoreError> {
        match self.session.take() {
            Some(session) => session.close().await.map_err(|e| self.map_err(e)),
            None => Ok(()),
        }
    }
}

fn hubbed_type(kind: HubbedKind) -> &'static str {
    match kind {
        HubbedKind::Hubless => "hublessrem",
        HubbedKind::Mesh => "meshrem",
        HubbedKind::Crosspol => "crosspol",
    }
}

/// Profile script: type, carriers, extras, then activate.
fn profile_script(kind: &str, rx: Carrier, tx: Carrier, extra: &[String]) -> Vec<String> {
    let mut script = vec![
        format!("pro {PROFILE} type manual {kind}"),
        format!("pro {PROFILE} rx {} {}", rx.frequency_khz, rx.symbol_rate_ksps),
        format!("pro {PROFILE} tx {} {}", tx.frequency_khz, tx.symbol_rate_ksps),
    ];
    script.extend_from_slice(extra);
    script.push(format!("pro {PROFILE} run"));
    script
}

fn tgen_script(generator: &TrafficGenerator) -> Vec<String> {
    let mut script = vec!["tgen off".to_owned()];
    if generator.enabled {
        script.push(format!("tgen dst {}", generator.destination));
        script.push(format!("tgen rate {}", generator.rate_kbps));
        script.push(format!("tgen size {}", generator.packet_size));
        script.push("tgen on".to_owned());
    }
    script
}

fn split_host_port(address: &str) -> Result<(&str, u16), CoreError> {
    match address.rsplit_once(':') {
        Some((host, port)) if !host.is_empty() => port
            .parse()
            .map(|port| (host, port))
            .map_err(|_| CoreError::invalid_usage(format!("invalid telnet port in {address:?}"))),
        Some(_) => Err(CoreError::invalid_usage(format!(
            "invalid telnet address {address:?}"
        ))),
        None => Ok((address, TelnetConfig::default().port)),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::net::Ipv4Addr;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn star_script_resets_profile_first() {
        let script = profile_script(
            "starrem",
            Carrier::new(1_150_000, 2_000),
            Carrier::new(1_250_000, 1_000),
            &[],
        );
        assert_eq!(
            script,
            [
                "pro 1 type manual starrem",
                "pro 1 rx 1150000 2000",
                "pro 1 tx 1250000 1000",
                "pro 1 run",
            ]
        );
    }

    #[test]
    fn stopped_generator_is_one_command() {
        let generator = TrafficGenerator {
            enabled: false,
            destination: Ipv4Addr::new(10, 0, 0, 1),
            rate_kbps: 256,
            packet_size: 512,
        };
        assert_eq!(tgen_script(&generator), ["tgen off"]);
    }

    #[test]
    fn host_port_split() {
        assert_eq!(split_host_port("10.0.0.5").unwrap(), ("10.0.0.5", 23));
        assert_eq!(split_host_port("127.0.0.1:2323").unwrap(), ("127.0.0.1", 2323));
        assert!(split_host_port("modem:telnet").is_err());
        assert!(split_host_port(":23").is_err());
    }
}
