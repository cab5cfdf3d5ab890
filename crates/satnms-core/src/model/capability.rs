// ── Hardware capability table ──
//
// What each UHP model can do. Consulted when creating NMS controllers and
// stations, and by the device drivers before touching a form or command
// group the model lacks.

use serde::Serialize;

use crate::enums::{ControllerMode, DeviceModel, EnumFamily, StationMode};
use crate::error::CoreError;

/// Web forms every model serves.
const BASE_FORMS: &[&str] = &["status", "profile", "access", "script", "ping", "reboot", "nat"];
/// Forms of the models with a second demodulator and QoS engine.
const FULL_FORMS: &[&str] = &[
    "status", "profile", "access", "script", "ping", "reboot", "nat", "rx2", "dama", "hubless",
    "tgen", "shaper", "policy",
];
const COMPACT_FORMS: &[&str] = &[
    "status", "profile", "access", "script", "ping", "reboot", "nat", "dama", "hubless", "shaper",
];

const HUB_MODES: &[ControllerMode] = &[
    ControllerMode::Off,
    ControllerMode::MfHub,
    ControllerMode::Outroute,
    ControllerMode::DamaHub,
    ControllerMode::HublessMaster,
    ControllerMode::Inroute,
    ControllerMode::DamaInroute,
    ControllerMode::Hub,
];
const REMOTE_MODES: &[ControllerMode] = &[ControllerMode::Off];
const COMPACT_HUB_MODES: &[ControllerMode] = &[
    ControllerMode::Off,
    ControllerMode::Outroute,
    ControllerMode::Inroute,
    ControllerMode::DamaInroute,
];

/// Feature set of one hardware model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub model: DeviceModel,
    pub forms: &'static [&'static str],
    pub second_demodulator: bool,
    pub dama: bool,
    pub hubless: bool,
    pub traffic_generator: bool,
    pub controller_modes: &'static [ControllerMode],
}

impl Capabilities {
    pub fn for_model(model: DeviceModel) -> Self {
        match model {
            DeviceModel::Uhp100 => Self {
                model,
                forms: BASE_FORMS,
                second_demodulator: false,
                dama: false,
                hubless: false,
                traffic_generator: false,
                controller_modes: REMOTE_MODES,
            },
            DeviceModel::Uhp100X => Self {
                model,
                forms: COMPACT_FORMS,
                second_demodulator: false,
                dama: true,
                hubless: true,
                traffic_generator: false,
                controller_modes: COMPACT_HUB_MODES,
            },
            DeviceModel::Uhp200 | DeviceModel::Uhp200X | DeviceModel::Uhp232 => Self {
                model,
                forms: FULL_FORMS,
                second_demodulator: true,
                dama: true,
                hubless: true,
                traffic_generator: true,
                controller_modes: HUB_MODES,
            },
        }
    }

    pub fn has_form(&self, form: &str) -> bool {
        self.forms.contains(&form)
    }

    pub fn supports_controller_mode(&self, mode: ControllerMode) -> bool {
        self.controller_modes.contains(&mode)
    }

    pub fn supports_station_mode(&self, mode: StationMode) -> bool {
        match mode {
            StationMode::Off | StationMode::Star | StationMode::RxOnly => true,
            StationMode::Dama => self.dama,
            StationMode::Hubless => self.hubless,
            StationMode::Mesh | StationMode::Crosspol => self.second_demodulator,
        }
    }

    pub fn ensure_controller_mode(&self, mode: ControllerMode) -> Result<(), CoreError> {
        if self.supports_controller_mode(mode) {
            Ok(())
        } else {
            Err(self.unsupported("controller mode", mode.label()))
        }
    }

    pub fn ensure_station_mode(&self, mode: StationMode) -> Result<(), CoreError> {
        if self.supports_station_mode(mode) {
            Ok(())
        } else {
            Err(self.unsupported("station mode", mode.label()))
        }
    }

    pub fn ensure_traffic_generator(&self) -> Result<(), CoreError> {
        if self.traffic_generator {
            Ok(())
        } else {
            Err(self.unsupported("feature", "traffic generator"))
        }
    }

    fn unsupported(&self, what: &str, name: &str) -> CoreError {
        CoreError::InvalidUsage {
            message: format!("{} does not support {what} {name}", self.model.label()),
        }
    }
}
