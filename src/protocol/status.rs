//! Status frame decoding for the H80i V2.
//!
//! The byte offsets below were observed on one firmware, not taken from any
//! published protocol description. A firmware change invalidates the table,
//! not the decoding logic, so the offsets live in a [`StatusLayout`] keyed by
//! [`ProtocolRevision`].

use std::fmt;

use byteorder::{BigEndian, ByteOrder};
use serde::{Deserialize, Serialize};

use crate::error::{CoolerError, Result};
use crate::protocol::commands::{FRAME_SIZE, ResponseFrame};

// =============================================================================
// Layout Table
// =============================================================================

/// Known response layouts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProtocolRevision {
    /// Hydro H80i V2 as shipped.
    #[default]
    H80iV2,
}

impl ProtocolRevision {
    pub const fn layout(self) -> StatusLayout {
        match self {
            ProtocolRevision::H80iV2 => StatusLayout::H80I_V2,
        }
    }
}

/// Where each reading sits in a status frame.
///
/// Fields are private so a layout can only exist if every offset fits in a
/// frame, which keeps [`decode_status_with`] total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusLayout {
    temp_int: usize,
    temp_frac: usize,
    pump_rpm: usize,
    fan_rpm_base: usize,
    fan_count: usize,
}

impl StatusLayout {
    /// `[_, temp, temp/10, pump_hi, pump_lo, fan1_hi, fan1_lo, fan2_hi, fan2_lo]`
    pub const H80I_V2: StatusLayout = StatusLayout {
        temp_int: 1,
        temp_frac: 2,
        pump_rpm: 3,
        fan_rpm_base: 5,
        fan_count: 2,
    };

    /// Same offsets, different number of fan fields.
    ///
    /// # Errors
    /// Returns `Config` if the last fan field would run past the frame.
    pub fn with_fan_count(self, fan_count: usize) -> Result<Self> {
        let layout = Self { fan_count, ..self };
        match layout.checked_min_len() {
            Some(len) if len <= FRAME_SIZE => Ok(layout),
            _ => Err(CoolerError::Config(format!(
                "{} fans do not fit in a {}-byte status frame",
                fan_count, FRAME_SIZE
            ))),
        }
    }

    pub fn fan_count(&self) -> usize {
        self.fan_count
    }

    /// Number of leading bytes a response needs to be decodable.
    pub fn min_len(&self) -> usize {
        self.checked_min_len().unwrap_or(usize::MAX)
    }

    fn checked_min_len(&self) -> Option<usize> {
        let fans_end = self
            .fan_count
            .checked_mul(2)?
            .checked_add(self.fan_rpm_base)?;
        let pump_end = self.pump_rpm.checked_add(2)?;
        let temp_end = self.temp_int.max(self.temp_frac).checked_add(1)?;
        Some(fans_end.max(pump_end).max(temp_end))
    }
}

impl Default for StatusLayout {
    fn default() -> Self {
        Self::H80I_V2
    }
}

// =============================================================================
// Status Structures
// =============================================================================

/// One decoded set of readings.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusSnapshot {
    /// Liquid coolant temperature in Celsius.
    pub liquid_temp_c: f32,
    /// Pump speed in RPM.
    pub pump_rpm: u16,
    /// Fan speeds in RPM, indexed by fan.
    pub fan_rpm: Vec<u16>,
}

/// Decode a status frame with the H80i V2 layout.
pub fn decode_status(frame: &ResponseFrame) -> StatusSnapshot {
    decode_status_with(frame, &StatusLayout::H80I_V2)
}

/// Decode a status frame with an explicit layout.
pub fn decode_status_with(frame: &ResponseFrame, layout: &StatusLayout) -> StatusSnapshot {
    let buf = frame.as_bytes();

    let liquid_temp_c = buf[layout.temp_int] as f32 + buf[layout.temp_frac] as f32 / 10.0;
    let pump_rpm = BigEndian::read_u16(&buf[layout.pump_rpm..layout.pump_rpm + 2]);

    let fan_rpm = (0..layout.fan_count)
        .map(|i| {
            let offset = layout.fan_rpm_base + 2 * i;
            BigEndian::read_u16(&buf[offset..offset + 2])
        })
        .collect();

    StatusSnapshot {
        liquid_temp_c,
        pump_rpm,
        fan_rpm,
    }
}

impl fmt::Display for StatusSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "+-----------------------------------+")?;
        writeln!(f, "|     Corsair H80i V2 Status        |")?;
        writeln!(f, "+-----------------------------------+")?;
        writeln!(
            f,
            "|  Liquid Temp:    {:>5.1} C          |",
            self.liquid_temp_c
        )?;
        writeln!(f, "|  Pump Speed:    {:>5} RPM         |", self.pump_rpm)?;
        writeln!(f, "+-----------------------------------+")?;
        for (i, rpm) in self.fan_rpm.iter().enumerate() {
            writeln!(f, "|  Fan {} Speed:   {:>5} RPM         |", i + 1, rpm)?;
        }
        writeln!(f, "+-----------------------------------+")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_with(prefix: &[u8]) -> ResponseFrame {
        let mut buf = [0u8; FRAME_SIZE];
        buf[..prefix.len()].copy_from_slice(prefix);
        ResponseFrame::from_bytes(buf)
    }

    /// Inverse of the decoder, for values the byte encoding can represent.
    fn encode(temp_int: u8, temp_tenths: u8, pump: u16, fans: &[u16]) -> ResponseFrame {
        let mut buf = [0u8; FRAME_SIZE];
        buf[1] = temp_int;
        buf[2] = temp_tenths;
        BigEndian::write_u16(&mut buf[3..5], pump);
        for (i, rpm) in fans.iter().enumerate() {
            BigEndian::write_u16(&mut buf[5 + 2 * i..7 + 2 * i], *rpm);
        }
        ResponseFrame::from_bytes(buf)
    }

    #[test]
    fn test_decode_known_frame() {
        let frame = frame_with(&[0x00, 25, 5, 0x0B, 0xB8, 0x0C, 0x1C, 0x0C, 0x1C]);
        let status = decode_status(&frame);
        assert_eq!(status.liquid_temp_c, 25.5);
        assert_eq!(status.pump_rpm, 3000);
        assert_eq!(status.fan_rpm, vec![3100, 3100]);
    }

    #[test]
    fn test_decode_is_deterministic() {
        let frame = frame_with(&[0x7F, 31, 9, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06]);
        assert_eq!(decode_status(&frame), decode_status(&frame));
    }

    #[test]
    fn test_decode_extremes() {
        let status = decode_status(&ResponseFrame::from_bytes([0xFF; FRAME_SIZE]));
        assert_eq!(status.liquid_temp_c, 255.0 + 25.5);
        assert_eq!(status.pump_rpm, u16::MAX);
        assert_eq!(status.fan_rpm, vec![u16::MAX, u16::MAX]);

        let status = decode_status(&ResponseFrame::zeroed());
        assert_eq!(status.liquid_temp_c, 0.0);
        assert_eq!(status.pump_rpm, 0);
    }

    #[test]
    fn test_round_trip() {
        let cases = [
            (20u8, 0u8, 0u16, [0u16, 0u16]),
            (32, 7, 2800, [1200, 1350]),
            (45, 9, u16::MAX, [1, 65534]),
        ];
        for (t, tenths, pump, fans) in cases {
            let status = decode_status(&encode(t, tenths, pump, &fans));
            assert_eq!(status.liquid_temp_c, t as f32 + tenths as f32 / 10.0);
            assert_eq!(status.pump_rpm, pump);
            assert_eq!(status.fan_rpm, fans.to_vec());
        }
    }

    #[test]
    fn test_layout_fan_count() {
        let layout = StatusLayout::H80I_V2.with_fan_count(3).unwrap();
        assert_eq!(layout.min_len(), 11);

        let frame = encode(30, 0, 1000, &[1, 2, 3]);
        let status = decode_status_with(&frame, &layout);
        assert_eq!(status.fan_rpm, vec![1, 2, 3]);
    }

    #[test]
    fn test_layout_rejects_overflow() {
        assert!(StatusLayout::H80I_V2.with_fan_count(29).is_ok());
        assert!(StatusLayout::H80I_V2.with_fan_count(30).is_err());
        assert!(StatusLayout::H80I_V2.with_fan_count(usize::MAX / 2).is_err());
        assert!(StatusLayout::H80I_V2.with_fan_count(usize::MAX).is_err());
    }

    #[test]
    fn test_default_min_len() {
        assert_eq!(StatusLayout::H80I_V2.min_len(), 9);
        assert_eq!(ProtocolRevision::H80iV2.layout(), StatusLayout::H80I_V2);
    }
}
