use std::io::{self, Read, Write};
use std::thread;
use std::time::Duration;

use bytes::BytesMut;
use tokio::sync::mpsc;
use tokio_util::codec::{Decoder, Encoder};
use tracing::{debug, warn};

use super::BusEndpoint;
use crate::core::{LinkConfig, Result};
use crate::protocol::{Frame, FrameCodec, FRAME_SIZE};

/// Serial-port bus transport
///
/// Owns the port and two pump threads. The receive pump accumulates bytes
/// until a full frame is buffered and forwards it decoded; the transmit
/// pump drains the outbound queue one frame at a time, so a frame is fully
/// on the wire before the next transmission begins. Both pumps stop when
/// the link side of the channels goes away or the port fails.
pub struct SerialBus;

impl SerialBus {
    /// Opens `path` at the configured bus speed, starts the pumps, and
    /// returns the endpoint for the link. On Linux the port is first
    /// switched into half-duplex RS-485 line discipline.
    pub fn open(path: &str, config: &LinkConfig) -> Result<BusEndpoint> {
        let builder = serialport::new(path, config.bus_speed)
            // Short read timeout so the receive pump can notice shutdown.
            .timeout(Duration::from_millis(10));

        #[cfg(target_os = "linux")]
        let port: Box<dyn serialport::SerialPort> = {
            let native = builder.open_native()?;
            super::rs485::configure_half_duplex(&native)?;
            Box::new(native)
        };
        #[cfg(not(target_os = "linux"))]
        let port = builder.open()?;

        let reader = port.try_clone()?;
        let writer = port;

        let (out_tx, out_rx) = mpsc::channel(config.channel_capacity);
        let (in_tx, in_rx) = mpsc::channel(config.channel_capacity);

        debug!(path, bus_speed = config.bus_speed, "serial bus open");

        thread::spawn(move || receive_pump(reader, in_tx));
        thread::spawn(move || transmit_pump(writer, out_rx));

        Ok(BusEndpoint {
            tx: out_tx,
            rx: in_rx,
        })
    }
}

/// Reads port bytes into the codec and forwards each completed frame
fn receive_pump(mut port: Box<dyn serialport::SerialPort>, frames: mpsc::Sender<Frame>) {
    let mut codec = FrameCodec::new();
    let mut chunk = [0u8; FRAME_SIZE];
    let mut buffer = BytesMut::with_capacity(FRAME_SIZE * 4);

    loop {
        match port.read(&mut chunk) {
            Ok(0) => continue,
            Ok(n) => {
                buffer.extend_from_slice(&chunk[..n]);
                // Frame decode is total, so the codec never errors here.
                while let Ok(Some(frame)) = codec.decode(&mut buffer) {
                    if frames.blocking_send(frame).is_err() {
                        return; // link side is gone
                    }
                }
            }
            Err(ref e) if e.kind() == io::ErrorKind::TimedOut => continue,
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                warn!(error = %e, "serial read failed, stopping receive pump");
                return;
            }
        }
    }
}

/// Drains the outbound queue onto the wire, one frame at a time
fn transmit_pump(mut port: Box<dyn serialport::SerialPort>, mut frames: mpsc::Receiver<Frame>) {
    let mut codec = FrameCodec::new();
    let mut buffer = BytesMut::with_capacity(FRAME_SIZE);

    while let Some(frame) = frames.blocking_recv() {
        buffer.clear();
        if codec.encode(frame, &mut buffer).is_err() {
            continue;
        }

        if let Err(e) = port.write_all(&buffer).and_then(|_| port.flush()) {
            warn!(error = %e, "serial write failed, stopping transmit pump");
            return;
        }
    }
}
