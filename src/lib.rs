//! Corsair Rust Devices Library
//!
//! A Rust driver for Corsair Hydro H80i V2 liquid coolers.
//!
//! # Features
//!
//! - Read device status (liquid temperature, pump and fan RPM)
//! - Control fan and pump speeds
//! - Set LED mode and colour
//!
//! # Example
//!
//! ```no_run
//! use corsair_rust_devices::config::CoolerSettings;
//! use corsair_rust_devices::device::HydroCooler;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Open, claim and initialize the device
//!     let settings = CoolerSettings::load()?;
//!     let mut cooler = HydroCooler::open(&settings)?;
//!
//!     // Read current status
//!     let status = cooler.get_status()?;
//!     println!("{}", status);
//!
//!     // Set fixed speeds
//!     cooler.set_pump_speed(80)?;
//!     cooler.set_fan_speed(0, 50)?;
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod device;
pub mod error;
pub mod logging;
pub mod protocol;
pub mod utils;

#[cfg(test)]
mod testing;

// Re-exports for convenience
pub use config::CoolerSettings;
pub use device::HydroCooler;
pub use error::{CoolerError, Result};
pub use protocol::{LedCommand, LedMode, StatusSnapshot};
