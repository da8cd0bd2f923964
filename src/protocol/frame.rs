use bytes::{Buf, BufMut};

use crate::core::{Mode, Role};

/// Number of bytes in an encoded frame
pub const FRAME_SIZE: usize = 10;

/// The unit of exchange between the two nodes
///
/// Wire layout, version 1: little-endian `voltage_ref` (4 bytes),
/// little-endian `voltage_meas` (4 bytes), `sender_id` (1 byte),
/// `status_code` (1 byte). Both builds must agree on this layout
/// byte-for-byte; every field is written and read explicitly, so no
/// target-specific struct layout or padding is involved.
///
/// The identity and status fields stay raw bytes so that a frame carrying
/// values this build does not know still decodes; the typed accessors
/// classify them. No validation or clamping is applied to the voltages.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Frame {
    /// Target value set by the master
    pub voltage_ref: f32,
    /// Measured value reported by whichever node last measured it
    pub voltage_meas: f32,
    /// Identity byte of the role that produced this frame
    pub sender_id: u8,
    /// Operating mode the sender is asserting
    pub status_code: u8,
}

impl Frame {
    /// Builds the status frame the master emits on every tick while in
    /// power mode. The measurement field is a placeholder; measurements
    /// flow follower-to-master only.
    pub fn power_status(voltage_ref: f32) -> Frame {
        Frame {
            voltage_ref,
            voltage_meas: 0.0,
            sender_id: Role::Master.wire(),
            status_code: Mode::Power.wire(),
        }
    }

    /// Builds the one-shot announcement the master emits on entering idle
    pub fn idle_status(voltage_ref: f32) -> Frame {
        Frame {
            voltage_ref,
            voltage_meas: 0.0,
            sender_id: Role::Master.wire(),
            status_code: Mode::Idle.wire(),
        }
    }

    /// The producing role, if the identity byte names a known one
    pub fn sender(&self) -> Option<Role> {
        Role::from_wire(self.sender_id)
    }

    /// The mode asserted by the sender
    pub fn status(&self) -> Mode {
        Mode::from_wire(self.status_code)
    }

    /// Encodes into the fixed wire layout
    pub fn encode(&self) -> [u8; FRAME_SIZE] {
        let mut raw = [0u8; FRAME_SIZE];
        let mut dst = &mut raw[..];
        dst.put_f32_le(self.voltage_ref);
        dst.put_f32_le(self.voltage_meas);
        dst.put_u8(self.sender_id);
        dst.put_u8(self.status_code);
        raw
    }

    /// Decodes from the fixed wire layout
    ///
    /// Wrong-length input is ruled out by the argument type; the transport
    /// only delivers full frames.
    pub fn decode(raw: &[u8; FRAME_SIZE]) -> Frame {
        let mut src = &raw[..];
        Frame {
            voltage_ref: src.get_f32_le(),
            voltage_meas: src.get_f32_le(),
            sender_id: src.get_u8(),
            status_code: src.get_u8(),
        }
    }
}
