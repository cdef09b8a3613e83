//! Custom error types for Corsair Hydro devices.
//!
//! Transport and framing failures keep their original kind all the way up to
//! the controller; nothing in this crate translates one kind into another.

use thiserror::Error;

/// Main error type for cooler operations.
#[derive(Error, Debug)]
pub enum CoolerError {
    /// No attached device matches the configured vendor/product id.
    #[error("Cooler not found. Check USB connection and the configured product id.")]
    NotFound,

    /// A matching device exists but cannot be opened.
    #[error("Access denied opening cooler. Check udev rules or run with elevated permissions.")]
    AccessDenied,

    /// Another process (or this one) already holds the interface.
    #[error("Cooler interface is already claimed")]
    AlreadyClaimed,

    /// The kernel driver bound to the interface could not be detached.
    #[error("Failed to detach kernel driver: {0}")]
    DriverDetachFailed(rusb::Error),

    /// A transfer did not complete within its timeout.
    #[error("Timeout waiting for device")]
    Timeout,

    /// Fewer bytes arrived than the caller needs.
    #[error("Short read: expected {expected} bytes, got {actual}")]
    ShortRead { expected: usize, actual: usize },

    /// Payload does not fit in a command frame.
    #[error("Payload of {len} bytes exceeds frame capacity of {max} bytes")]
    PayloadTooLarge { len: usize, max: usize },

    /// The transport is not in the claimed state.
    #[error("Transport is closed")]
    TransportClosed,

    /// Any other USB transfer failure.
    #[error("USB I/O error: {0}")]
    Io(rusb::Error),

    /// Invalid configuration value or file.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Generic invalid input error.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl CoolerError {
    /// Map a transfer-level `rusb` error.
    ///
    /// Only timeouts get their own kind; everything else is `Io`.
    pub fn from_transfer(err: rusb::Error) -> Self {
        match err {
            rusb::Error::Timeout => CoolerError::Timeout,
            other => CoolerError::Io(other),
        }
    }

    /// Map an error raised while opening or claiming the device.
    pub fn from_open(err: rusb::Error) -> Self {
        match err {
            rusb::Error::NotFound | rusb::Error::NoDevice => CoolerError::NotFound,
            rusb::Error::Access => CoolerError::AccessDenied,
            rusb::Error::Busy => CoolerError::AlreadyClaimed,
            other => CoolerError::Io(other),
        }
    }
}

/// Result type alias for cooler operations.
pub type Result<T> = std::result::Result<T, CoolerError>;
