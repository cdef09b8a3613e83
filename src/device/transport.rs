//! Exclusive interrupt-transfer channel to one cooler.
//!
//! A [`Transport`] moves through `Unopened -> Claimed -> Released`. Only
//! `acquire` is meaningful before the claim, only `release` after it, and
//! `release` runs again (as a no-op) when the transport is dropped.

use std::fmt;
use std::time::Duration;

use tracing::{debug, warn};

use crate::device::usb::{UsbBus, UsbDevice};
use crate::error::{CoolerError, Result};
use crate::protocol::{
    CORSAIR_VID, CommandFrame, DEFAULT_INTERFACE, EP_IN, EP_OUT, FRAME_SIZE, H80I_V2_PID,
    ResponseFrame,
};

// =============================================================================
// Target
// =============================================================================

/// Which device, interface and endpoints to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsbTarget {
    pub vendor_id: u16,
    pub product_id: u16,
    pub interface: u8,
    pub endpoint_out: u8,
    pub endpoint_in: u8,
}

impl Default for UsbTarget {
    fn default() -> Self {
        Self {
            vendor_id: CORSAIR_VID,
            product_id: H80I_V2_PID,
            interface: DEFAULT_INTERFACE,
            endpoint_out: EP_OUT,
            endpoint_in: EP_IN,
        }
    }
}

// =============================================================================
// State
// =============================================================================

/// Observable lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Unopened,
    Claimed,
    Released,
}

struct Claim<D> {
    device: D,
    driver_detached: bool,
}

enum State<D> {
    Unopened,
    Claimed(Claim<D>),
    Released,
}

// =============================================================================
// Received
// =============================================================================

/// Result of one interrupt read.
///
/// Borrows the transport's inbound buffer, so it has to be consumed before
/// the next transfer.
#[derive(Debug, Clone, Copy)]
pub struct Received<'a> {
    frame: &'a ResponseFrame,
    len: usize,
}

impl<'a> Received<'a> {
    pub fn frame(&self) -> &'a ResponseFrame {
        self.frame
    }

    /// Bytes actually transferred.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_complete(&self) -> bool {
        self.len >= FRAME_SIZE
    }

    /// Accept the frame only if at least `min_len` bytes arrived.
    ///
    /// # Errors
    /// Returns `ShortRead` otherwise.
    pub fn require(self, min_len: usize) -> Result<&'a ResponseFrame> {
        if self.len < min_len {
            return Err(CoolerError::ShortRead {
                expected: min_len,
                actual: self.len,
            });
        }
        Ok(self.frame)
    }
}

// =============================================================================
// Transport
// =============================================================================

/// Owner of the USB context and of the claimed interface.
pub struct Transport<B: UsbBus> {
    state: State<B::Device>,
    target: UsbTarget,
    inbound: ResponseFrame,
    bus: B,
}

impl<B: UsbBus> Transport<B> {
    /// Create an unopened transport. Nothing touches the bus until `acquire`.
    pub fn new(bus: B, target: UsbTarget) -> Self {
        Self {
            state: State::Unopened,
            target,
            inbound: ResponseFrame::zeroed(),
            bus,
        }
    }

    pub fn state(&self) -> TransportState {
        match self.state {
            State::Unopened => TransportState::Unopened,
            State::Claimed(_) => TransportState::Claimed,
            State::Released => TransportState::Released,
        }
    }

    pub fn target(&self) -> &UsbTarget {
        &self.target
    }

    /// Open the target device, detach any kernel driver and claim the interface.
    ///
    /// # Errors
    /// `NotFound`, `AccessDenied` or `AlreadyClaimed` from opening/claiming,
    /// `DriverDetachFailed` if the kernel driver will not let go. On any error
    /// nothing stays claimed and the transport remains `Unopened`.
    pub fn acquire(&mut self) -> Result<()> {
        match self.state {
            State::Unopened => {}
            State::Claimed(_) => return Err(CoolerError::AlreadyClaimed),
            State::Released => return Err(CoolerError::TransportClosed),
        }

        let UsbTarget {
            vendor_id,
            product_id,
            interface,
            ..
        } = self.target;

        let mut device = self.bus.open(vendor_id, product_id)?;

        let driver_detached = match device.kernel_driver_active(interface) {
            Ok(true) => {
                debug!("Detaching kernel driver from interface {}", interface);
                device
                    .detach_kernel_driver(interface)
                    .map_err(CoolerError::DriverDetachFailed)?;
                true
            }
            Ok(false) => false,
            Err(e) => {
                // Not supported on every platform.
                debug!("Could not query kernel driver on interface {}: {}", interface, e);
                false
            }
        };

        if let Err(e) = device.claim_interface(interface) {
            warn!("Failed to claim interface {}: {}", interface, e);
            if driver_detached && let Err(e) = device.attach_kernel_driver(interface) {
                warn!("Failed to reattach kernel driver: {}", e);
            }
            return Err(CoolerError::from_open(e));
        }

        debug!(
            "Claimed interface {} on {:04x}:{:04x}",
            interface, vendor_id, product_id
        );
        self.state = State::Claimed(Claim {
            device,
            driver_detached,
        });
        Ok(())
    }

    /// Write one full frame to the OUT endpoint.
    ///
    /// # Errors
    /// `TransportClosed` if not claimed, `Timeout`, or `Io`.
    pub fn write(&mut self, frame: &CommandFrame, timeout: Duration) -> Result<usize> {
        let State::Claimed(claim) = &self.state else {
            return Err(CoolerError::TransportClosed);
        };

        let written = claim
            .device
            .write_interrupt(self.target.endpoint_out, frame.as_bytes(), timeout)
            .map_err(CoolerError::from_transfer)?;

        if written < FRAME_SIZE {
            warn!(
                "Short write for opcode {:#04x}: {} of {} bytes",
                frame.opcode(),
                written,
                FRAME_SIZE
            );
        } else {
            debug!("Wrote frame with opcode {:#04x}", frame.opcode());
        }
        Ok(written)
    }

    /// Read one frame from the IN endpoint into the inbound buffer.
    ///
    /// A transfer shorter than a frame is not an error here; see
    /// [`Received::require`].
    ///
    /// # Errors
    /// `TransportClosed` if not claimed, `Timeout`, or `Io`.
    pub fn read(&mut self, timeout: Duration) -> Result<Received<'_>> {
        let State::Claimed(claim) = &self.state else {
            return Err(CoolerError::TransportClosed);
        };

        let buf = self.inbound.buffer_mut();
        buf.fill(0);

        let len = claim
            .device
            .read_interrupt(self.target.endpoint_in, buf, timeout)
            .map_err(CoolerError::from_transfer)?;

        debug!("Read {} bytes", len);
        Ok(Received {
            frame: &self.inbound,
            len,
        })
    }

    /// Release the interface and hand the device back to the kernel driver.
    ///
    /// Failures are logged and swallowed. Calling this more than once, or
    /// before `acquire`, does nothing.
    pub fn release(&mut self) {
        let State::Claimed(mut claim) = std::mem::replace(&mut self.state, State::Released) else {
            return;
        };

        let interface = self.target.interface;
        if let Err(e) = claim.device.release_interface(interface) {
            warn!("Failed to release interface {}: {}", interface, e);
        }

        if claim.driver_detached {
            match claim.device.attach_kernel_driver(interface) {
                Ok(()) => debug!("Reattached kernel driver to interface {}", interface),
                Err(e) => warn!("Failed to reattach kernel driver: {}", e),
            }
        }

        debug!("Released interface {}", interface);
    }
}

impl<B: UsbBus> Drop for Transport<B> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<B: UsbBus> fmt::Debug for Transport<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transport")
            .field("state", &self.state())
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}
