use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Protocol role of a node, fixed at startup
///
/// Exactly one master and one follower share the bus. The discriminants are
/// the on-wire identity bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Drives mode changes and originates periodic status frames
    Master = 0,
    /// Reacts only to master frames and replies synchronously
    Follower = 1,
}

impl Role {
    /// The identity byte this role writes into frames it produces
    pub fn wire(self) -> u8 {
        self as u8
    }

    /// Resolves an identity byte back to a role, if it names a known one
    pub fn from_wire(raw: u8) -> Option<Role> {
        match raw {
            0 => Some(Role::Master),
            1 => Some(Role::Follower),
            _ => None,
        }
    }

    /// The opposite role on the bus
    pub fn peer(self) -> Role {
        match self {
            Role::Master => Role::Follower,
            Role::Follower => Role::Master,
        }
    }
}

/// Operating mode shared across both nodes
///
/// Power means active reference distribution; idle means quiescence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    Idle = 0,
    Power = 1,
}

impl Mode {
    /// The status byte this mode is announced with
    pub fn wire(self) -> u8 {
        self as u8
    }

    /// Resolves a status byte: the power code reads as power, anything
    /// else reads as idle
    pub fn from_wire(raw: u8) -> Mode {
        match raw {
            1 => Mode::Power,
            _ => Mode::Idle,
        }
    }
}

/// Identifies an acquisition channel on the measurement source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SensorChannel(pub u8);

impl SensorChannel {
    /// High-side voltage channel, the default telemetry source
    pub const V_HIGH: SensorChannel = SensorChannel(0);
}

/// Configuration for a link node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkConfig {
    /// This node's fixed protocol role
    pub role: Role,
    /// Period of the control task driving periodic transmission
    #[serde(serialize_with = "super::serde::serialize_duration")]
    #[serde(deserialize_with = "super::serde::deserialize_duration")]
    pub control_period: Duration,
    /// Bus speed in bits per second
    pub bus_speed: u32,
    /// Reference voltage distributed while in power mode
    pub voltage_ref: f32,
    /// Acquisition channel polled on every tick
    pub sensor_channel: SensorChannel,
    /// Capacity of the frame and command channels
    pub channel_capacity: usize,
}

impl LinkConfig {
    /// Creates a configuration for `role` with default timing and levels
    pub fn new(role: Role) -> Self {
        LinkConfig {
            role,
            ..LinkConfig::default()
        }
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        LinkConfig {
            role: Role::Master,
            control_period: super::DEFAULT_CONTROL_PERIOD,
            bus_speed: super::DEFAULT_BUS_SPEED,
            voltage_ref: super::DEFAULT_VOLTAGE_REF,
            sensor_channel: SensorChannel::V_HIGH,
            channel_capacity: super::DEFAULT_CHANNEL_CAPACITY,
        }
    }
}
