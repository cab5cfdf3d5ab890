// ── Web-form modem driver ──
//
// Every operation posts a complete form, never a delta, so the modem ends up
// in the same state however many times a setup call runs.

use async_trait::async_trait;
use satnms_api::{HttpFormClient, TransportConfig};
use tracing::{debug, info, warn};
use url::Url;

use super::parse::{overview_from_fields, parse_key_values, parse_ping, strip_tags};
use super::{
    Carrier, DamaStation, DeviceDriver, DeviceEndpoint, DeviceOverview, FormMap, HubbedStation,
    PingReport, PingRequest, ScpcModem, StarStation, TrafficGenerator, check_dama, check_hubbed,
    check_scpc, check_star, check_traffic_generator,
};
use crate::enums::{AccessLevel, DeviceModel, DeviceState, EnumFamily, StationMode};
use crate::error::{CoreError, Operation};
use crate::model::Capabilities;

/// Modem driven through its HTTP management forms.
pub struct HttpDriver {
    address: String,
    model: DeviceModel,
    caps: Capabilities,
    client: HttpFormClient,
}

impl HttpDriver {
    pub fn new(endpoint: &DeviceEndpoint) -> Result<Self, CoreError> {
        let base_url = base_url(&endpoint.address)?;
        let credentials = endpoint.username.clone().zip(endpoint.password.clone());
        let transport = TransportConfig::default().with_timeout(endpoint.timeout);
        let client = HttpFormClient::new(base_url, &transport, credentials).map_err(|e| {
            CoreError::from_api(
                e,
                Operation::Device {
                    address: &endpoint.address,
                },
            )
        })?;

        Ok(Self::with_client(&endpoint.address, endpoint.model, client))
    }

    /// Wrap an already configured form client.
    pub fn with_client(address: &str, model: DeviceModel, client: HttpFormClient) -> Self {
        Self {
            address: address.to_owned(),
            model,
            caps: Capabilities::for_model(model),
            client,
        }
    }

    /// Read a form. `Ok(None)` when this model doesn't serve it.
    pub async fn get_form(&self, form: &str) -> Result<Option<FormMap>, CoreError> {
        if !self.caps.has_form(form) {
            debug!(device = %self.address, form, "form not available on {}", self.model);
            return Ok(None);
        }
        self.client.fetch_form(form).await.map_err(|e| self.map_err(e))
    }

    /// Post a form. `Ok(None)` when this model doesn't serve it, otherwise
    /// the reply page.
    pub async fn set_form(
        &self,
        form: &str,
        fields: &FormMap,
    ) -> Result<Option<String>, CoreError> {
        if !self.caps.has_form(form) {
            debug!(device = %self.address, form, "form not available on {}", self.model);
            return Ok(None);
        }
        self.client
            .submit_form(form, fields)
            .await
            .map_err(|e| self.map_err(e))
    }

    /// Post a form the operation can't do without.
    async fn submit(&self, form: &str, fields: &FormMap) -> Result<String, CoreError> {
        self.set_form(form, fields)
            .await?
            .ok_or_else(|| CoreError::ProtocolError {
                device: self.address.clone(),
                message: format!("form '{form}' is missing"),
            })
    }

    async fn status_fields(&self) -> Result<FormMap, CoreError> {
        let page = self
            .client
            .fetch_page("status")
            .await
            .map_err(|e| self.map_err(e))?
            .ok_or_else(|| CoreError::ProtocolError {
                device: self.address.clone(),
                message: "status page is missing".into(),
            })?;

        // Inputs first, then the `Key: value` text of the page for anything
        // that is only displayed.
        let mut fields = satnms_api::device::parse_form(&page);
        for (key, value) in parse_key_values(&strip_tags(&page)) {
            fields.entry(key).or_insert(value);
        }
        Ok(fields)
    }

    async fn write_profile(
        &self,
        mode: &str,
        rx: Carrier,
        tx: Carrier,
        extra: &[(&str, String)],
    ) -> Result<(), CoreError> {
        let mut fields = profile_fields(mode, rx, tx);
        for (key, value) in extra {
            fields.insert((*key).to_owned(), value.clone());
        }
        fields.insert("run".into(), "1".into());
        self.submit("profile", &fields).await?;
        info!(device = %self.address, mode, "profile applied");
        Ok(())
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
impl DeviceDriver for HttpDriver {
    fn address(&self) -> &str {
        &self.address
    }

    fn model(&self) -> DeviceModel {
        self.model
    }

    async fn star_station(&mut self, station: &StarStation) -> Result<(), CoreError> {
        check_star(station)?;
        self.write_profile(StationMode::Star.label(), station.rx, station.tx, &[])
            .await
    }

    async fn dama_station(&mut self, station: &DamaStation) -> Result<(), CoreError> {
        check_dama(&self.caps, station)?;
        self.write_profile(
            StationMode::Dama.label(),
            station.rx,
            station.tx,
            &[("dama_channel", station.channel.to_string())],
        )
        .await
    }

    async fn hubbed_station(&mut self, station: &HubbedStation) -> Result<(), CoreError> {
        check_hubbed(&self.caps, station)?;

        // The second demodulator is rewritten on every call, off included.
        if self.caps.has_form("rx2") {
            let mut rx2 = FormMap::new();
            match station.rx2 {
                Some(carrier) => {
                    rx2.insert("enable".into(), "1".into());
                    rx2.insert("frequency".into(), carrier.frequency_khz.to_string());
                    rx2.insert("symbol_rate".into(), carrier.symbol_rate_ksps.to_string());
                }
                None => {
                    rx2.insert("enable".into(), "0".into());
                }
            }
            self.submit("rx2", &rx2).await?;
        }

        self.write_profile(station.kind.station_mode().label(), station.rx, station.tx, &[])
            .await
    }

    async fn scpc_modem(&mut self, modem: &ScpcModem) -> Result<(), CoreError> {
        check_scpc(modem)?;
        self.write_profile(
            "scpc",
            modem.rx,
            modem.tx,
            &[
                ("modulation", modem.modulation.label().to_owned()),
                ("roll_off", modem.roll_off.code().to_string()),
            ],
        )
        .await
    }

    async fn set_nms_permission(&mut self, level: AccessLevel) -> Result<(), CoreError> {
        let mut fields = FormMap::new();
        fields.insert("nms".into(), level.label().to_owned());
        self.submit("access", &fields).await?;
        info!(device = %self.address, level = level.label(), "nms access set");
        Ok(())
    }

    async fn traffic_generator(&mut self, generator: &TrafficGenerator) -> Result<(), CoreError> {
        check_traffic_generator(&self.caps, generator)?;
        let mut fields = FormMap::new();
        fields.insert("enable".into(), u8::from(generator.enabled).to_string());
        if generator.enabled {
            fields.insert("destination".into(), generator.destination.to_string());
            fields.insert("rate".into(), generator.rate_kbps.to_string());
            fields.insert("size".into(), generator.packet_size.to_string());
        }
        self.submit("tgen", &fields).await?;
        Ok(())
    }

    async fn reboot(&mut self) -> Result<(), CoreError> {
        let mut fields = FormMap::new();
        fields.insert("confirm".into(), "1".into());
        match self.client.submit_form("reboot", &fields).await {
            Ok(_) => {}
            // The modem may drop the connection before answering.
            Err(e @ (satnms_api::Error::Transport(_) | satnms_api::Error::Timeout { .. })) => {
                warn!(device = %self.address, error = %e, "no reply to reboot request");
            }
            Err(e) => return Err(self.map_err(e)),
        }
        info!(device = %self.address, "reboot requested");
        Ok(())
    }

    async fn network_script(&mut self, lines: &[String]) -> Result<(), CoreError> {
        let mut fields = FormMap::new();
        fields.insert("script".into(), lines.join("\n"));
        fields.insert("run".into(), "1".into());
        self.submit("script", &fields).await?;
        info!(device = %self.address, lines = lines.len(), "network script applied");
        Ok(())
    }

    async fn ping(&mut self, request: &PingRequest) -> Result<PingReport, CoreError> {
        let mut fields = FormMap::new();
        fields.insert("target".into(), request.target.to_string());
        fields.insert("count".into(), request.count.to_string());
        fields.insert("size".into(), request.size.to_string());
        let reply = self.submit("ping", &fields).await?;

        parse_ping(&strip_tags(&reply)).ok_or_else(|| CoreError::ProtocolError {
            device: self.address.clone(),
            message: "ping reply has no packet summary".into(),
        })
    }

    async fn get_state(&mut self) -> Result<DeviceState, CoreError> {
        let fields = self.status_fields().await?;
        let raw = fields.get("state").ok_or_else(|| CoreError::ProtocolError {
            device: self.address.clone(),
            message: "status page has no state".into(),
        })?;
        DeviceState::parse(raw)
    }

    async fn get_overview(&mut self) -> Result<DeviceOverview, CoreError> {
        Ok(overview_from_fields(self.status_fields().await?))
    }

    async fn close(self: Box<Self>) -> Result<(), CoreError> {
        Ok(())
    }
}

fn base_url(address: &str) -> Result<Url, CoreError> {
    let raw = if address.contains("://") {
        address.to_owned()
    } else {
        format!("http://{address}/")
    };
    Url::parse(&raw)
        .map_err(|e| CoreError::invalid_usage(format!("invalid device address {address:?}: {e}")))
}

fn profile_fields(mode: &str, rx: Carrier, tx: Carrier) -> FormMap {
    let mut fields = FormMap::new();
    fields.insert("mode".into(), mode.to_owned());
    fields.insert("rx_frequency".into(), rx.frequency_khz.to_string());
    fields.insert("rx_symbol_rate".into(), rx.symbol_rate_ksps.to_string());
    fields.insert("tx_frequency".into(), tx.frequency_khz.to_string());
    fields.insert("tx_symbol_rate".into(), tx.symbol_rate_ksps.to_string());
    fields
}
