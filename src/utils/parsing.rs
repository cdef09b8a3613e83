//! Parsing utilities for CLI arguments and configuration values.

use crate::error::{CoolerError, Result};
use crate::protocol::LedMode;

// =============================================================================
// Color Parsing
// =============================================================================

/// Parse a hex color string into RGB components.
///
/// Accepts formats: `#RRGGBB` or `RRGGBB`
///
/// # Example
/// ```
/// use corsair_rust_devices::utils::parsing::parse_hex_color;
///
/// let (r, g, b) = parse_hex_color("#FF5500").unwrap();
/// assert_eq!(r, 255);
/// assert_eq!(g, 85);
/// assert_eq!(b, 0);
/// ```
pub fn parse_hex_color(hex: &str) -> Result<(u8, u8, u8)> {
    let digits = hex.trim_start_matches('#');
    if digits.len() != 6 || !digits.is_ascii() {
        return Err(CoolerError::InvalidInput(format!(
            "Invalid color hex: {}",
            hex
        )));
    }

    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&digits[range], 16)
            .map_err(|_| CoolerError::InvalidInput(format!("Invalid color hex: {}", hex)))
    };

    Ok((channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

// =============================================================================
// LED Mode Parsing
// =============================================================================

/// Parse an LED mode name: static, blink, pulse or rainbow.
pub fn parse_led_mode(name: &str) -> Result<LedMode> {
    match name.to_lowercase().as_str() {
        "static" => Ok(LedMode::Static),
        "blink" => Ok(LedMode::Blink),
        "pulse" => Ok(LedMode::Pulse),
        "rainbow" => Ok(LedMode::Rainbow),
        _ => Err(CoolerError::InvalidInput(format!(
            "Unknown LED mode '{}'. Use: static, blink, pulse or rainbow",
            name
        ))),
    }
}

// =============================================================================
// USB Id Parsing
// =============================================================================

/// Parse a vendor or product id, hex with `0x` prefix or plain decimal.
///
/// # Example
/// ```
/// use corsair_rust_devices::utils::parsing::parse_usb_id;
///
/// assert_eq!(parse_usb_id("0x0c04").unwrap(), 0x0C04);
/// assert_eq!(parse_usb_id("3076").unwrap(), 0x0C04);
/// ```
pub fn parse_usb_id(s: &str) -> Result<u16> {
    let s = s.trim();
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => s.parse(),
    };

    parsed.map_err(|_| CoolerError::InvalidInput(format!("Invalid USB id: {}", s)))
}

// =============================================================================
// Tests
// =============================================================================
