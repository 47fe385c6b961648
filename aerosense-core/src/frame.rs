//! Airspeed Transducer Frame Decoding
//!
//! ## Wire Format
//!
//! The transducer answers a 4-byte read with status, a 14-bit pressure count
//! and an 11-bit temperature count, all big-endian:
//!
//! ```text
//!  byte 0           byte 1     byte 2     byte 3
//! ┌──┬──────────┐ ┌────────┐ ┌────────┐ ┌─────┬─────┐
//! │S1 S0│P13..P8│ │ P7..P0 │ │T10..T3 │ │T2..T0│xxxxx│
//! └──┴──────────┘ └────────┘ └────────┘ └─────┴─────┘
//! ```
//!
//! - Status: `00` normal, `01` reserved, `10` stale (no new conversion since
//!   the last read), `11` fault.
//! - The five trailing bits of byte 3 are not part of the reading.
//!
//! ## Transfer Function
//!
//! Type A output spans 10%..90% of the 14-bit range over -1..+1 psi:
//!
//! ```text
//! psi = -((count - 0.1·16383) · (Pmax - Pmin) / (0.8·16383) + Pmin)
//! Pa  = psi · 6894.757
//! °C  = t_count · 200/2047 - 50
//! ```
//!
//! The result is negated so that a pitot plumbed with the bottom port as
//! static and the top port as dynamic reads positive with airflow.
//!
//! All arithmetic is `f32` in exactly this order so readings are
//! bit-reproducible.

use crate::{
    constants::airspeed::{
        FRAME_LEN, PRESSURE_COUNTS_FULL_SCALE, PRESSURE_HIGH_MASK, PRESSURE_MAX_PSI,
        PRESSURE_MIN_PSI, PRESSURE_OUTPUT_MIN_FRACTION, PRESSURE_OUTPUT_SPAN_FRACTION,
        PSI_TO_PA, STATUS_MASK, STATUS_SHIFT, TEMPERATURE_COUNTS_FULL_SCALE,
        TEMPERATURE_OFFSET_C, TEMPERATURE_SHIFT, TEMPERATURE_SPAN_C, TEMPERATURE_WORD_MASK,
    },
    errors::{SensorError, SensorResult},
};

/// Two-bit status reported in every frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameStatus {
    /// Fresh conversion
    Normal,
    /// Reserved by the manufacturer
    Reserved,
    /// Data already read once; no new conversion yet
    Stale,
    /// Diagnostic fault detected by the transducer
    Fault,
}

impl FrameStatus {
    /// Map the two status bits to a status
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => Self::Normal,
            1 => Self::Reserved,
            2 => Self::Stale,
            _ => Self::Fault,
        }
    }

    /// The two status bits
    pub fn bits(&self) -> u8 {
        match self {
            Self::Normal => 0,
            Self::Reserved => 1,
            Self::Stale => 2,
            Self::Fault => 3,
        }
    }

    /// Only a fresh conversion should drive control loops
    pub fn is_usable(&self) -> bool {
        matches!(self, Self::Normal)
    }
}

/// One decoded pressure/temperature reading
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PressureReading {
    /// Status bits from byte 0
    pub status: FrameStatus,
    /// Raw 14-bit differential pressure count
    pub dp_raw: u16,
    /// Raw 11-bit temperature count
    pub t_raw: u16,
    /// Differential pressure (Pa), positive for airflow into the dynamic port
    pub diff_press_pa: f32,
    /// Transducer temperature (°C)
    pub temperature_c: f32,
}

/// Status bits: byte 0 & 0xC0, shifted down 6
pub fn status_bits(frame: &[u8; FRAME_LEN]) -> u8 {
    (frame[0] & STATUS_MASK) >> STATUS_SHIFT
}

/// Pressure count: (byte 0 & 0x3F) << 8 | byte 1, range 0..=16383
pub fn pressure_count(frame: &[u8; FRAME_LEN]) -> u16 {
    (((frame[0] & PRESSURE_HIGH_MASK) as u16) << 8) + frame[1] as u16
}

/// Temperature count: ((byte 2 << 8) + byte 3) & 0xFFE0, shifted down 5, range 0..=2047
pub fn temperature_count(frame: &[u8; FRAME_LEN]) -> u16 {
    let word = ((frame[2] as u16) << 8) + frame[3] as u16;
    (word & TEMPERATURE_WORD_MASK) >> TEMPERATURE_SHIFT
}

/// Differential pressure in psi for a 14-bit count
pub fn count_to_psi(dp_raw: u16) -> f32 {
    let scale = PRESSURE_MAX_PSI - PRESSURE_MIN_PSI;
    let zero = PRESSURE_OUTPUT_MIN_FRACTION * PRESSURE_COUNTS_FULL_SCALE;
    let span = PRESSURE_OUTPUT_SPAN_FRACTION * PRESSURE_COUNTS_FULL_SCALE;
    -((dp_raw as f32 - zero) * scale / span + PRESSURE_MIN_PSI)
}

/// Differential pressure in pascals for a 14-bit count
pub fn count_to_pa(dp_raw: u16) -> f32 {
    count_to_psi(dp_raw) * PSI_TO_PA
}

/// Temperature in °C for an 11-bit count
pub fn count_to_celsius(t_raw: u16) -> f32 {
    let factor = TEMPERATURE_SPAN_C / TEMPERATURE_COUNTS_FULL_SCALE;
    t_raw as f32 * factor + TEMPERATURE_OFFSET_C
}

/// Decode the bytes delivered by one bus read
///
/// `raw` is exactly what the bus delivered, which may be less than a full
/// frame. Anything shorter than 4 bytes is rejected without producing a
/// partial reading; bytes past the fourth are ignored.
pub fn decode(raw: &[u8]) -> SensorResult<PressureReading> {
    let frame: &[u8; FRAME_LEN] = raw
        .get(..FRAME_LEN)
        .and_then(|head| head.try_into().ok())
        .ok_or(SensorError::ShortFrame {
            expected: FRAME_LEN,
            available: raw.len(),
        })?;

    let dp_raw = pressure_count(frame);
    let t_raw = temperature_count(frame);

    Ok(PressureReading {
        status: FrameStatus::from_bits(status_bits(frame)),
        dp_raw,
        t_raw,
        diff_press_pa: count_to_pa(dp_raw),
        temperature_c: count_to_celsius(t_raw),
    })
}
