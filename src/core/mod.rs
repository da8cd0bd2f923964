//! Core types for the RS-485 synchronization link
//!
//! This module contains the fundamental building blocks used throughout the library.

pub mod error;
pub mod serde;
pub mod types;

pub use self::error::{Error, Result};
pub use self::types::{LinkConfig, Mode, Role, SensorChannel};

use std::time::Duration;

/// Default control task period (the periodic transmit schedule)
pub const DEFAULT_CONTROL_PERIOD: Duration = Duration::from_micros(100);

/// Default bus speed in bits per second
pub const DEFAULT_BUS_SPEED: u32 = 20_000_000;

/// Default reference voltage distributed while in power mode
pub const DEFAULT_VOLTAGE_REF: f32 = 32.0;

/// Default capacity of the frame and command channels
pub const DEFAULT_CHANNEL_CAPACITY: usize = 32;
