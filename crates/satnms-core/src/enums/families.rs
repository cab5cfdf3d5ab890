// ── Built-in enum families ──
//
// Codes are the NMS wire values. Order matters: it is the iteration order
// of both views and of the registry tables.

enum_family! {
    /// Object-level state reported in an NMS object's `state` field.
    pub enum ObjectState("object_state") {
        Up = 0 => "Up",
        Down = 1 => "Down",
        Fault = 2 => "Fault",
        Idle = 3 => "Idle",
        Unreachable = 4 => "Unreachable",
    }
}

enum_family! {
    /// Modem-side operating state. Not interchangeable with [`ObjectState`].
    pub enum DeviceState("device_state") {
        Off = 0 => "off",
        Idle = 1 => "idle",
        Acquisition = 2 => "acquisition",
        Operation = 3 => "operation",
        Fault = 4 => "fault",
        Redundant = 5 => "redundant",
    }
}

enum_family! {
    /// Role of a hub controller.
    pub enum ControllerMode("controller_mode") {
        Off = 0 => "none",
        MfHub = 1 => "MF_hub",
        Outroute = 2 => "outroute",
        DamaHub = 3 => "DAMA_hub",
        HublessMaster = 4 => "hubless_master",
        Inroute = 5 => "inroute",
        DamaInroute = 6 => "DAMA_inroute",
        /// Single-channel hub, superseded by `MF_hub`.
        Hub = 7 => "hub",
    }
    deprecated: [Hub]
}

enum_family! {
    /// Role of a remote station.
    pub enum StationMode("station_mode") {
        Off = 0 => "off",
        Star = 1 => "star",
        Mesh = 2 => "mesh",
        Dama = 3 => "DAMA",
        Hubless = 4 => "hubless",
        Crosspol = 5 => "crosspol_test",
        RxOnly = 6 => "rx_only",
    }
}

enum_family! {
    /// UHP hardware model.
    pub enum DeviceModel("device_model") {
        Uhp100 = 0 => "UHP-100",
        Uhp100X = 1 => "UHP-100X",
        Uhp200 = 2 => "UHP-200",
        Uhp200X = 3 => "UHP-200X",
        Uhp232 = 4 => "UHP-232",
    }
}

enum_family! {
    pub enum Modulation("modulation") {
        Bpsk = 0 => "BPSK",
        Qpsk = 1 => "QPSK",
        Psk8 = 2 => "8PSK",
        Apsk16 = 3 => "16APSK",
        Apsk32 = 4 => "32APSK",
    }
}

enum_family! {
    pub enum RollOff("roll_off") {
        R35 = 0 => "35%",
        R25 = 1 => "25%",
        R20 = 2 => "20%",
        R15 = 3 => "15%",
        R10 = 4 => "10%",
        R05 = 5 => "5%",
    }
}

enum_family! {
    /// Rate limiting discipline of a shaper object.
    pub enum ShaperMode("shaper_mode") {
        Off = 0 => "none",
        Cir = 1 => "CIR",
        Mir = 2 => "MIR",
        CirMir = 3 => "CIR_MIR",
    }
}

enum_family! {
    /// Kind of a station routing-table entry.
    pub enum RouteType("route_type") {
        IpAddress = 0 => "ip_address",
        StaticRoute = 1 => "static_route",
        DefaultRoute = 2 => "default_route",
        L2Bridge = 3 => "l2_bridge",
    }
}

enum_family! {
    /// How much of a modem's configuration the NMS may change.
    pub enum AccessLevel("access_level") {
        NoAccess = 0 => "no_access",
        ReadOnly = 1 => "read_only",
        Full = 2 => "full",
    }
}
