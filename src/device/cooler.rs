//! Corsair Hydro H80i V2 device implementation.
//!
//! High-level interface over the transport and framer.

use std::fmt;
use std::time::Duration;

use rusb::Context;
use tracing::{debug, info, warn};

use crate::config::CoolerSettings;
use crate::device::framer;
use crate::device::transport::{Transport, TransportState};
use crate::device::usb::UsbBus;
use crate::error::{CoolerError, Result};
use crate::protocol::{
    LedCommand, Opcode, StatusLayout, StatusSnapshot, clamp_percent, decode_status_with,
};

#[derive(Debug, Clone, Copy)]
struct Timing {
    timeout: Duration,
    init_settle: Duration,
    status_settle: Duration,
}

// =============================================================================
// HydroCooler
// =============================================================================

/// An initialized H80i V2.
///
/// Owns the USB context and the claimed interface; both go away when the
/// cooler is closed or dropped.
///
/// # Example
///
/// ```no_run
/// use corsair_rust_devices::config::CoolerSettings;
/// use corsair_rust_devices::device::HydroCooler;
/// use corsair_rust_devices::protocol::{LedCommand, LedMode};
///
/// let mut cooler = HydroCooler::open(&CoolerSettings::default())?;
///
/// let status = cooler.get_status()?;
/// println!("{}", status);
///
/// cooler.set_pump_speed(70)?;
/// cooler.set_fan_speed(0, 60)?;
/// cooler.set_led(LedCommand::new(LedMode::Pulse, 0, 0, 255))?;
/// # Ok::<(), corsair_rust_devices::error::CoolerError>(())
/// ```
pub struct HydroCooler<B: UsbBus = Context> {
    transport: Transport<B>,
    layout: StatusLayout,
    timing: Timing,
}

impl HydroCooler<Context> {
    /// Open and initialize the configured cooler using a fresh libusb context.
    ///
    /// # Errors
    /// Any acquire or initialization error. The interface is released before
    /// the error is returned.
    pub fn open(settings: &CoolerSettings) -> Result<Self> {
        let context = Context::new().map_err(CoolerError::Io)?;
        Self::open_with(context, settings)
    }
}

impl<B: UsbBus> HydroCooler<B> {
    /// Open and initialize the configured cooler on `bus`.
    ///
    /// # Errors
    /// `Config` if `settings` fail validation; nothing is opened then.
    pub fn open_with(bus: B, settings: &CoolerSettings) -> Result<Self> {
        settings.validate()?;
        let layout = settings.layout()?;
        let mut transport = Transport::new(bus, settings.target());
        transport.acquire()?;

        let mut cooler = Self {
            transport,
            layout,
            timing: Timing {
                timeout: settings.timeout(),
                init_settle: settings.init_settle(),
                status_settle: settings.status_settle(),
            },
        };

        if let Err(e) = cooler.initialize() {
            warn!("Initialization failed: {}", e);
            cooler.close();
            return Err(e);
        }

        info!(
            "Connected to {:04x}:{:04x}",
            settings.vendor_id, settings.product_id
        );
        Ok(cooler)
    }

    /// Send `INIT` and wait for the device to reset its internal state.
    ///
    /// Called by `open`; calling it again re-runs the handshake.
    pub fn initialize(&mut self) -> Result<()> {
        framer::send(&mut self.transport, Opcode::Init, &[], self.timing.timeout)?;
        if !self.timing.init_settle.is_zero() {
            std::thread::sleep(self.timing.init_settle);
        }
        debug!("Device initialized");
        Ok(())
    }

    /// Set the pump duty. Values above 100 are capped.
    ///
    /// Returns the duty actually sent.
    pub fn set_pump_speed(&mut self, percent: u8) -> Result<u8> {
        let duty = clamp_percent(percent);
        framer::send(
            &mut self.transport,
            Opcode::SetPump,
            &[duty, 0],
            self.timing.timeout,
        )?;
        Ok(duty)
    }

    /// Set one fan's duty. Values above 100 are capped.
    ///
    /// `fan` is passed through unchecked; the firmware decides whether it
    /// exists.
    pub fn set_fan_speed(&mut self, fan: u8, percent: u8) -> Result<u8> {
        let duty = clamp_percent(percent);
        framer::send(
            &mut self.transport,
            Opcode::SetFan,
            &[fan, duty],
            self.timing.timeout,
        )?;
        Ok(duty)
    }

    /// Set lighting mode and colour.
    pub fn set_led(&mut self, led: LedCommand) -> Result<()> {
        framer::send(
            &mut self.transport,
            Opcode::SetLed,
            &led.payload(),
            self.timing.timeout,
        )
    }

    /// Request and decode a status frame.
    ///
    /// # Errors
    /// Transport errors as is, or `ShortRead` if the answer is too short to
    /// hold every field of the layout.
    pub fn get_status(&mut self) -> Result<StatusSnapshot> {
        let received = framer::send_and_receive(
            &mut self.transport,
            Opcode::GetStatus,
            &[],
            self.timing.status_settle,
            self.timing.timeout,
        )?;

        if !received.is_complete() {
            warn!("Status response was {} bytes", received.len());
        }
        let frame = received.require(self.layout.min_len())?;

        Ok(decode_status_with(frame, &self.layout))
    }

    /// Number of fans reported in status frames.
    pub fn fan_count(&self) -> usize {
        self.layout.fan_count()
    }

    pub fn is_open(&self) -> bool {
        self.transport.state() == TransportState::Claimed
    }

    /// Release the device. Safe to call more than once.
    pub fn close(&mut self) {
        self.transport.release();
    }
}

impl<B: UsbBus> fmt::Debug for HydroCooler<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HydroCooler")
            .field("transport", &self.transport)
            .field("layout", &self.layout)
            .finish_non_exhaustive()
    }
}
