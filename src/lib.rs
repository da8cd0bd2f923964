//! RS485 Sync: two-node master/follower synchronization link
//!
//! This library implements a fixed-frame synchronization protocol for a
//! half-duplex RS-485 bus shared by exactly two nodes. The master distributes
//! the operating mode and a reference value on a periodic schedule; the
//! follower answers each validated master frame, and only those, with its
//! latest measurement.
pub mod core;

pub mod link;
pub mod measure;
pub mod protocol;
pub mod transport;

// Re-export commonly used items
pub use crate::core::{Error, LinkConfig, Mode, Result, Role};
pub use crate::link::{Link, LinkHandle, LinkStatus};
pub use crate::protocol::{Frame, FRAME_SIZE};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
