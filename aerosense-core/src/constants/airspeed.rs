//! Differential Pressure Transducer Characteristics
//!
//! Digital pitot transducer (MS4525DO family, ±1 psi, type A output) read
//! as a 4-byte frame over a register-addressed bus.

// ===== FRAME LAYOUT =====

/// Bytes in one pressure/temperature frame.
pub const FRAME_LEN: usize = 4;

/// Status field: byte 0 bits 7-6.
pub const STATUS_MASK: u8 = 0xC0;

/// Shift that moves the status bits down to 0-1.
pub const STATUS_SHIFT: u8 = 6;

/// High pressure bits: byte 0 bits 5-0.
pub const PRESSURE_HIGH_MASK: u8 = 0x3F;

/// Temperature field mask over the big-endian word of bytes 2-3.
///
/// The low 5 bits of byte 3 are not part of the reading.
pub const TEMPERATURE_WORD_MASK: u16 = 0xFFE0;

/// Shift that right-aligns the 11-bit temperature count.
pub const TEMPERATURE_SHIFT: u16 = 5;

// ===== TRANSFER FUNCTION =====

/// Full-scale count of the 14-bit pressure output.
pub const PRESSURE_COUNTS_FULL_SCALE: f32 = 16383.0;

/// Output at minimum pressure, as a fraction of full scale (type A: 10%).
pub const PRESSURE_OUTPUT_MIN_FRACTION: f32 = 0.1;

/// Output span as a fraction of full scale (type A: 10%..90%).
pub const PRESSURE_OUTPUT_SPAN_FRACTION: f32 = 0.8;

/// Lower end of the pressure range (psi).
pub const PRESSURE_MIN_PSI: f32 = -1.0;

/// Upper end of the pressure range (psi).
pub const PRESSURE_MAX_PSI: f32 = 1.0;

/// Pounds per square inch to pascals.
pub const PSI_TO_PA: f32 = 6894.757;

/// Temperature span of the 11-bit count (°C).
pub const TEMPERATURE_SPAN_C: f32 = 200.0;

/// Full-scale count of the 11-bit temperature output.
pub const TEMPERATURE_COUNTS_FULL_SCALE: f32 = 2047.0;

/// Temperature at count zero (°C).
pub const TEMPERATURE_OFFSET_C: f32 = -50.0;

// ===== BUS =====

/// Factory I2C address.
pub const DEFAULT_ADDRESS: u8 = 0x28;

/// Bus clock the transducer is run at (Hz).
pub const DEFAULT_BUS_RATE_HZ: u32 = 400_000;
