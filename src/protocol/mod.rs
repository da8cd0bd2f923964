//! Frame protocol implementation
//!
//! This module defines the fixed-layout frame exchanged on the bus and its
//! encoding/decoding.

pub mod codec;
pub mod frame;

pub use self::codec::FrameCodec;
pub use self::frame::{Frame, FRAME_SIZE};
