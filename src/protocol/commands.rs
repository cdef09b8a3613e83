//! Command definitions and frame builder for the H80i V2.
//!
//! Every command travels as one 64-byte interrupt frame: the opcode in byte 0,
//! the payload from byte 1, zeros for the rest. The device sends no checksum
//! or sequence number, so a late response cannot be told apart from a fresh
//! one except by timing.

use std::fmt;

use crate::error::{CoolerError, Result};

// =============================================================================
// Constants
// =============================================================================

/// Size of every frame, in both directions.
pub const FRAME_SIZE: usize = 64;

/// Largest payload a single frame can carry (everything after the opcode).
pub const MAX_PAYLOAD: usize = FRAME_SIZE - 1;

/// Corsair Vendor ID.
pub const CORSAIR_VID: u16 = 0x1B1C;

/// Hydro H80i V2 Product ID.
pub const H80I_V2_PID: u16 = 0x0C12;

/// Alternative product id seen for the same device family.
///
/// Some units enumerate with this id instead; select it in the config file
/// or with `--pid` if the default is not found.
pub const H80I_V2_PID_ALT: u16 = 0x0C04;

/// Interface carrying both interrupt endpoints.
pub const DEFAULT_INTERFACE: u8 = 0;

/// Interrupt OUT endpoint (host to device).
pub const EP_OUT: u8 = 0x02;

/// Interrupt IN endpoint (device to host).
pub const EP_IN: u8 = 0x81;

// =============================================================================
// Opcodes
// =============================================================================

/// Command opcodes understood by the firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    /// Reset internal state; must precede any other command.
    Init = 0x00,
    /// Ask for a status frame on the IN endpoint.
    GetStatus = 0x01,
    /// Set fan duty: `[fan_index, percent]`.
    SetFan = 0x12,
    /// Set pump duty: `[percent, 0]`.
    SetPump = 0x13,
    /// Set lighting: `[mode, r, g, b]`.
    SetLed = 0x23,
}

impl Opcode {
    pub const fn code(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} ({:#04x})", self, self.code())
    }
}

// =============================================================================
// Lighting
// =============================================================================

/// LED animation modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LedMode {
    Static = 0x00,
    Blink = 0x01,
    Pulse = 0x02,
    Rainbow = 0x03,
}

impl LedMode {
    pub const fn code(self) -> u8 {
        self as u8
    }

    pub fn name(&self) -> &'static str {
        match self {
            LedMode::Static => "static",
            LedMode::Blink => "blink",
            LedMode::Pulse => "pulse",
            LedMode::Rainbow => "rainbow",
        }
    }
}

impl fmt::Display for LedMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A lighting request: mode plus colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedCommand {
    pub mode: LedMode,
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl LedCommand {
    pub const fn new(mode: LedMode, r: u8, g: u8, b: u8) -> Self {
        Self { mode, r, g, b }
    }

    /// Payload bytes for `SET_LED`.
    pub const fn payload(&self) -> [u8; 4] {
        [self.mode.code(), self.r, self.g, self.b]
    }
}

impl fmt::Display for LedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} #{:02X}{:02X}{:02X}",
            self.mode, self.r, self.g, self.b
        )
    }
}

// =============================================================================
// Frames
// =============================================================================

/// An outbound frame, always exactly [`FRAME_SIZE`] bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct CommandFrame([u8; FRAME_SIZE]);

impl CommandFrame {
    pub fn opcode(&self) -> u8 {
        self.0[0]
    }

    pub fn as_bytes(&self) -> &[u8; FRAME_SIZE] {
        &self.0
    }
}

impl fmt::Debug for CommandFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CommandFrame({:02X?})", &self.0[..])
    }
}

/// An inbound frame.
///
/// The transport keeps a single one of these and overwrites it on every read,
/// so a borrowed `&ResponseFrame` is only meaningful until the next transfer.
#[derive(Clone, PartialEq, Eq)]
pub struct ResponseFrame([u8; FRAME_SIZE]);

impl ResponseFrame {
    pub const fn zeroed() -> Self {
        Self([0u8; FRAME_SIZE])
    }

    pub const fn from_bytes(bytes: [u8; FRAME_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; FRAME_SIZE] {
        &self.0
    }

    pub(crate) fn buffer_mut(&mut self) -> &mut [u8; FRAME_SIZE] {
        &mut self.0
    }
}

impl Default for ResponseFrame {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl fmt::Debug for ResponseFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResponseFrame({:02X?})", &self.0[..])
    }
}

/// Build a command frame.
///
/// # Errors
/// Returns `PayloadTooLarge` if `payload` does not fit after the opcode.
pub fn build_frame(opcode: Opcode, payload: &[u8]) -> Result<CommandFrame> {
    if payload.len() > MAX_PAYLOAD {
        return Err(CoolerError::PayloadTooLarge {
            len: payload.len(),
            max: MAX_PAYLOAD,
        });
    }

    let mut buf = [0u8; FRAME_SIZE];
    buf[0] = opcode.code();
    buf[1..1 + payload.len()].copy_from_slice(payload);

    Ok(CommandFrame(buf))
}

/// Clamp a duty percentage to 0-100. Larger values are capped, never rejected.
pub const fn clamp_percent(percent: u8) -> u8 {
    if percent > 100 { 100 } else { percent }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opcode_values() {
        assert_eq!(Opcode::Init.code(), 0x00);
        assert_eq!(Opcode::GetStatus.code(), 0x01);
        assert_eq!(Opcode::SetFan.code(), 0x12);
        assert_eq!(Opcode::SetPump.code(), 0x13);
        assert_eq!(Opcode::SetLed.code(), 0x23);
    }

    #[test]
    fn test_led_mode_values() {
        assert_eq!(LedMode::Static.code(), 0x00);
        assert_eq!(LedMode::Blink.code(), 0x01);
        assert_eq!(LedMode::Pulse.code(), 0x02);
        assert_eq!(LedMode::Rainbow.code(), 0x03);
    }

    #[test]
    fn test_build_frame_layout() {
        let frame = build_frame(Opcode::SetLed, &[0x02, 0, 0, 0xFF]).unwrap();
        let bytes = frame.as_bytes();
        assert_eq!(bytes.len(), FRAME_SIZE);
        assert_eq!(bytes[..5], [0x23, 0x02, 0x00, 0x00, 0xFF]);
        assert!(bytes[5..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_build_frame_zero_fills_every_length() {
        let payload = [0xAAu8; MAX_PAYLOAD];
        for len in 0..=MAX_PAYLOAD {
            let frame = build_frame(Opcode::SetFan, &payload[..len]).unwrap();
            let bytes = frame.as_bytes();
            assert_eq!(frame.opcode(), 0x12);
            assert!(bytes[1..=len].iter().all(|&b| b == 0xAA));
            assert!(bytes[len + 1..].iter().all(|&b| b == 0), "len {len}");
        }
    }

    #[test]
    fn test_payload_too_large() {
        let payload = [0u8; FRAME_SIZE];
        let err = build_frame(Opcode::Init, &payload).unwrap_err();
        assert!(matches!(
            err,
            CoolerError::PayloadTooLarge { len: 64, max: 63 }
        ));
    }

    #[test]
    fn test_clamp_percent() {
        assert_eq!(clamp_percent(0), 0);
        assert_eq!(clamp_percent(70), 70);
        assert_eq!(clamp_percent(100), 100);
        assert_eq!(clamp_percent(101), 100);
        assert_eq!(clamp_percent(255), 100);
        assert_eq!(clamp_percent(clamp_percent(200)), 100);
    }

    #[test]
    fn test_led_payload() {
        let led = LedCommand::new(LedMode::Pulse, 0, 0, 255);
        assert_eq!(led.payload(), [0x02, 0x00, 0x00, 0xFF]);
        assert_eq!(led.to_string(), "pulse #0000FF");
    }
}
