//! Bus transport seam
//!
//! The link core talks to the bus through a pair of frame channels: one
//! carrying frames to transmit, one delivering completed receptions. The
//! transport behind the pair owns the byte-level concerns (framing, bus
//! arbitration, transmission completion) and only ever hands the core
//! fully decoded frames, so a partial buffer can never reach the protocol
//! logic. Outbound frames are drained in order, one frame fully on the
//! wire before the next begins.

pub mod serial;

#[cfg(target_os = "linux")]
pub mod rs485;

pub use self::serial::SerialBus;

use tokio::sync::mpsc;

use crate::protocol::Frame;

/// One side of a bus
///
/// Frames pushed to `tx` go out on the wire; completed receptions arrive on
/// `rx`, one message per frame. Sending is fire-and-forget from the link's
/// perspective.
#[derive(Debug)]
pub struct BusEndpoint {
    /// Outbound frames
    pub tx: mpsc::Sender<Frame>,
    /// Inbound frames, one per completed reception
    pub rx: mpsc::Receiver<Frame>,
}

/// Creates an in-memory bus connecting two endpoints, one per node
///
/// Frames sent by one endpoint arrive at the other already decoded, which
/// is exactly the delivery contract the serial transport provides. Used by
/// hosted tests and the demo to run both roles in one process.
pub fn loopback(capacity: usize) -> (BusEndpoint, BusEndpoint) {
    let (a_tx, b_rx) = mpsc::channel(capacity);
    let (b_tx, a_rx) = mpsc::channel(capacity);

    (
        BusEndpoint { tx: a_tx, rx: a_rx },
        BusEndpoint { tx: b_tx, rx: b_rx },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loopback_crosses_frames() {
        tokio_test::block_on(async {
            let (mut left, mut right) = loopback(4);

            let frame = Frame::power_status(32.0);
            left.tx.send(frame).await.unwrap();
            assert_eq!(right.rx.recv().await, Some(frame));

            let reply = Frame {
                sender_id: 1,
                ..Frame::default()
            };
            right.tx.send(reply).await.unwrap();
            assert_eq!(left.rx.recv().await, Some(reply));
        });
    }

    #[test]
    fn test_loopback_closes_with_peer() {
        tokio_test::block_on(async {
            let (left, mut right) = loopback(4);
            drop(left);
            assert_eq!(right.rx.recv().await, None);
        });
    }
}
