//! Send a command, optionally wait for the answer.
//!
//! This layer only builds frames. Every transport error comes back as is.

use std::time::Duration;

use tracing::debug;

use crate::device::transport::{Received, Transport};
use crate::device::usb::UsbBus;
use crate::error::Result;
use crate::protocol::{Opcode, build_frame};

/// Build a frame and write it.
pub fn send<B: UsbBus>(
    transport: &mut Transport<B>,
    opcode: Opcode,
    payload: &[u8],
    timeout: Duration,
) -> Result<()> {
    let frame = build_frame(opcode, payload)?;
    debug!("Sending {} with {} payload bytes", opcode, payload.len());
    transport.write(&frame, timeout)?;
    Ok(())
}

/// Send, give the firmware `settle_delay` to process, then read one frame.
///
/// The delay is empirical: the device answers asynchronously and nothing in
/// the response says which request it belongs to. If the write fails no read
/// is attempted.
pub fn send_and_receive<'t, B: UsbBus>(
    transport: &'t mut Transport<B>,
    opcode: Opcode,
    payload: &[u8],
    settle_delay: Duration,
    timeout: Duration,
) -> Result<Received<'t>> {
    send(transport, opcode, payload, timeout)?;

    if !settle_delay.is_zero() {
        std::thread::sleep(settle_delay);
    }

    transport.read(timeout)
}
