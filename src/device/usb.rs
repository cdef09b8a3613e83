//! USB primitives consumed by the transport.
//!
//! The transport never calls libusb directly; it goes through [`UsbBus`] and
//! [`UsbDevice`]. The production implementation is `rusb`, and the whole
//! USB context is an explicit value owned by whoever owns the transport.

use std::time::Duration;

use rusb::{Context, DeviceHandle, UsbContext};
use tracing::debug;

use crate::error::{CoolerError, Result};

/// Something that can find and open a device by vendor/product id.
pub trait UsbBus {
    type Device: UsbDevice;

    /// Open the first device with an exact id match.
    ///
    /// # Errors
    /// `NotFound` if nothing matches, `AccessDenied` if the match cannot be
    /// opened, `AlreadyClaimed` if the device reports busy.
    fn open(&self, vendor_id: u16, product_id: u16) -> Result<Self::Device>;
}

/// An opened device. Mirrors the subset of libusb the protocol needs.
pub trait UsbDevice {
    fn kernel_driver_active(&self, interface: u8) -> rusb::Result<bool>;
    fn detach_kernel_driver(&mut self, interface: u8) -> rusb::Result<()>;
    fn attach_kernel_driver(&mut self, interface: u8) -> rusb::Result<()>;
    fn claim_interface(&mut self, interface: u8) -> rusb::Result<()>;
    fn release_interface(&mut self, interface: u8) -> rusb::Result<()>;
    fn write_interrupt(&self, endpoint: u8, buf: &[u8], timeout: Duration) -> rusb::Result<usize>;
    fn read_interrupt(&self, endpoint: u8, buf: &mut [u8], timeout: Duration)
    -> rusb::Result<usize>;
}

impl UsbBus for Context {
    type Device = DeviceHandle<Context>;

    fn open(&self, vendor_id: u16, product_id: u16) -> Result<Self::Device> {
        let devices = self.devices().map_err(CoolerError::Io)?;

        for device in devices.iter() {
            let Ok(descriptor) = device.device_descriptor() else {
                continue;
            };
            if descriptor.vendor_id() != vendor_id || descriptor.product_id() != product_id {
                continue;
            }

            debug!(
                "Found {:04x}:{:04x} on bus {} address {}",
                vendor_id,
                product_id,
                device.bus_number(),
                device.address()
            );
            return device.open().map_err(CoolerError::from_open);
        }

        Err(CoolerError::NotFound)
    }
}

impl<T: UsbContext> UsbDevice for DeviceHandle<T> {
    fn kernel_driver_active(&self, interface: u8) -> rusb::Result<bool> {
        DeviceHandle::kernel_driver_active(self, interface)
    }

    fn detach_kernel_driver(&mut self, interface: u8) -> rusb::Result<()> {
        DeviceHandle::detach_kernel_driver(self, interface)
    }

    fn attach_kernel_driver(&mut self, interface: u8) -> rusb::Result<()> {
        DeviceHandle::attach_kernel_driver(self, interface)
    }

    fn claim_interface(&mut self, interface: u8) -> rusb::Result<()> {
        DeviceHandle::claim_interface(self, interface)
    }

    fn release_interface(&mut self, interface: u8) -> rusb::Result<()> {
        DeviceHandle::release_interface(self, interface)
    }

    fn write_interrupt(&self, endpoint: u8, buf: &[u8], timeout: Duration) -> rusb::Result<usize> {
        DeviceHandle::write_interrupt(self, endpoint, buf, timeout)
    }

    fn read_interrupt(
        &self,
        endpoint: u8,
        buf: &mut [u8],
        timeout: Duration,
    ) -> rusb::Result<usize> {
        DeviceHandle::read_interrupt(self, endpoint, buf, timeout)
    }
}
