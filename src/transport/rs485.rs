//! RS-485 line discipline for Linux serial drivers
//!
//! Half-duplex RS-485 needs the UART driver to assert driver-enable around
//! each transmission and release the bus afterwards. Linux exposes that
//! through the `TIOCSRS485` ioctl; applying it here is the hosted
//! counterpart of configuring the transceiver on the target hardware.

use std::os::unix::io::AsRawFd;

use crate::core::{Error, Result};

/// Mirror of the kernel's `struct serial_rs485` (linux/serial.h)
#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
struct SerialRs485 {
    flags: u32,
    delay_rts_before_send: u32,
    delay_rts_after_send: u32,
    padding: [u32; 5],
}

const SER_RS485_ENABLED: u32 = 1;
const SER_RS485_RTS_ON_SEND: u32 = 1 << 1;

const TIOCSRS485: libc::c_ulong = 0x542F;

nix::ioctl_write_ptr_bad!(tiocsrs485, TIOCSRS485, SerialRs485);

/// Switches an open port into half-duplex RS-485 mode, with driver-enable
/// asserted for the duration of each transmission
pub fn configure_half_duplex(port: &impl AsRawFd) -> Result<()> {
    let rs485 = SerialRs485 {
        flags: SER_RS485_ENABLED | SER_RS485_RTS_ON_SEND,
        ..SerialRs485::default()
    };

    // Safety: the fd stays owned by `port` for the whole call and the
    // struct matches the kernel layout.
    unsafe { tiocsrs485(port.as_raw_fd(), &rs485) }
        .map_err(|e| Error::transport(format!("TIOCSRS485 failed: {}", e)))?;

    Ok(())
}
