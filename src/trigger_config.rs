//! Trigger modes and thresholds.

use crate::acquisition_config::ConfigError;
use crate::registers::Channel;

/// Full-scale span, in volts, that the 14-bit threshold code covers.
const THRESHOLD_VOLTAGE_SPAN: f32 = 14.0;
/// Trigger voltages must lie strictly inside `-VOLTAGE_LIMIT..VOLTAGE_LIMIT`.
const VOLTAGE_LIMIT: f32 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Rising,
    Falling,
}

impl Edge {
    pub fn as_str(&self) -> &'static str {
        match self {
            Edge::Rising => "positive edge",
            Edge::Falling => "negative edge",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExternalPort {
    Port0,
    Port1,
}

/// What the trigger logic waits for. Edge triggers carry the channel whose
/// threshold register they use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerMode {
    NoAcquisition,
    Immediate,
    Edge { channel: Channel, edge: Edge },
    External(ExternalPort),
}

impl TriggerMode {
    /// Maps the numeric selector of the command surface (1..=7) to a mode.
    pub fn from_selector(selector: i32) -> Result<Self, ConfigError> {
        match selector {
            1 => Ok(TriggerMode::Immediate),
            2 => Ok(EdgeTriggerBuilder::on(Channel::A).rising_edge()),
            3 => Ok(EdgeTriggerBuilder::on(Channel::A).falling_edge()),
            4 => Ok(EdgeTriggerBuilder::on(Channel::B).rising_edge()),
            5 => Ok(EdgeTriggerBuilder::on(Channel::B).falling_edge()),
            6 => Ok(TriggerMode::External(ExternalPort::Port0)),
            7 => Ok(TriggerMode::External(ExternalPort::Port1)),
            other => Err(ConfigError::InvalidTriggerSelector(other)),
        }
    }

    /// Value written to the trigger register to select this mode.
    pub fn register_value(&self) -> u32 {
        match self {
            TriggerMode::NoAcquisition => 0,
            TriggerMode::Immediate => 1,
            TriggerMode::Edge {
                channel: Channel::A,
                edge: Edge::Rising,
            } => 2,
            TriggerMode::Edge {
                channel: Channel::A,
                edge: Edge::Falling,
            } => 3,
            TriggerMode::Edge {
                channel: Channel::B,
                edge: Edge::Rising,
            } => 4,
            TriggerMode::Edge {
                channel: Channel::B,
                edge: Edge::Falling,
            } => 5,
            TriggerMode::External(ExternalPort::Port0) => 6,
            TriggerMode::External(ExternalPort::Port1) => 7,
        }
    }

    /// Channel whose threshold register must be programmed, if any.
    pub fn threshold_channel(&self) -> Option<Channel> {
        match self {
            TriggerMode::Edge { channel, .. } => Some(*channel),
            _ => None,
        }
    }

    pub fn is_edge(&self) -> bool {
        self.threshold_channel().is_some()
    }

    pub fn description(&self) -> &'static str {
        match self {
            TriggerMode::NoAcquisition => "No Acquisition",
            TriggerMode::Immediate => "Immediate",
            TriggerMode::Edge {
                channel: Channel::A,
                edge: Edge::Rising,
            } => "Channel A, positive edge",
            TriggerMode::Edge {
                channel: Channel::A,
                edge: Edge::Falling,
            } => "Channel A, negative edge",
            TriggerMode::Edge {
                channel: Channel::B,
                edge: Edge::Rising,
            } => "Channel B, positive edge",
            TriggerMode::Edge {
                channel: Channel::B,
                edge: Edge::Falling,
            } => "Channel B, negative edge",
            TriggerMode::External(ExternalPort::Port0) => "External trigger, port 0",
            TriggerMode::External(ExternalPort::Port1) => "External trigger, port 1",
        }
    }
}

impl std::fmt::Display for TriggerMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.description())
    }
}

#[derive(Debug)]
pub struct EdgeTriggerBuilder {
    channel: Channel,
}

impl EdgeTriggerBuilder {
    pub fn on(channel: Channel) -> Self {
        Self { channel }
    }

    pub fn rising_edge(self) -> TriggerMode {
        TriggerMode::Edge {
            channel: self.channel,
            edge: Edge::Rising,
        }
    }

    pub fn falling_edge(self) -> TriggerMode {
        TriggerMode::Edge {
            channel: self.channel,
            edge: Edge::Falling,
        }
    }
}

/// Trigger level as the unsigned 14-bit code the threshold registers expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TriggerThreshold {
    code: u16,
}

impl TriggerThreshold {
    /// From a signed level in `-8192..=8191`.
    pub fn from_signed(value: i32) -> Result<Self, ConfigError> {
        if !(-8192..=8191).contains(&value) {
            return Err(ConfigError::TriggerValueOutOfRange(value));
        }
        let code = if value < 0 { value + 16384 } else { value };
        Ok(Self { code: code as u16 })
    }

    /// From a voltage strictly between -5 V and 5 V.
    pub fn from_voltage(volts: f32) -> Result<Self, ConfigError> {
        if !(volts > -VOLTAGE_LIMIT && volts < VOLTAGE_LIMIT) {
            return Err(ConfigError::TriggerVoltageOutOfRange(volts));
        }
        Self::from_signed(Self::voltage_to_signed(volts))
    }

    pub fn voltage_to_signed(volts: f32) -> i32 {
        (8192.0 * f64::from(volts) / f64::from(THRESHOLD_VOLTAGE_SPAN)).round() as i32
    }

    pub fn code(&self) -> u32 {
        u32::from(self.code)
    }

    pub fn signed(&self) -> i32 {
        crate::ring_buffer::decode(self.code())
    }

    /// Voltage equivalent of the code.
    pub fn voltage(&self) -> f32 {
        (f64::from(self.signed()) * f64::from(THRESHOLD_VOLTAGE_SPAN) / 8192.0) as f32
    }
}
