//! Device abstraction layer for Corsair Hydro coolers.
//!
//! `usb` is the platform seam, `transport` owns the claim, `framer` sends
//! commands, and `cooler` puts them together.

pub mod cooler;
pub mod framer;
pub mod transport;
pub mod usb;

pub use cooler::HydroCooler;
pub use transport::{Received, Transport, TransportState, UsbTarget};
pub use usb::{UsbBus, UsbDevice};
