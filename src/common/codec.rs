// src/common/codec.rs

//! Little-endian numeric encodings used on the SARK-110 wire.
//!
//! Every function here is total: any bit pattern decodes to some value and
//! nothing panics. Slice-based helpers read from fixed offsets inside a
//! frame and are only called with offsets validated by the frame layout.

// === Binary32 / binary16 layout constants ===

const F32_SIGN: u32 = 0x8000_0000;
const F32_INFINITY: u32 = 0x7F80_0000;
/// Largest finite half value (65504.0) as an f32 bit pattern.
const F32_HALF_MAX: u32 = 0x477F_E000;
/// Smallest normal half value (2^-14) as an f32 bit pattern.
const F32_HALF_MIN_NORMAL: u32 = 0x3880_0000;

const HALF_SIGN: u16 = 0x8000;
const HALF_INFINITY: u16 = 0x7C00;
const HALF_MANTISSA: u16 = 0x03FF;

/// Mantissa bits dropped when narrowing binary32 to binary16.
const MANTISSA_SHIFT: u32 = 13;
/// Exponent bias difference (127 - 15), pre-shifted into the half exponent field.
const EXPONENT_REBIAS: u32 = (127 - 15) << 10;
/// 2^24: one half-precision subnormal step is 2^-24.
const SUBNORMAL_SCALE: f32 = 16_777_216.0;

// --- Integers and binary32 ---

#[inline]
pub fn encode_u32(value: u32) -> [u8; 4] {
    value.to_le_bytes()
}

#[inline]
pub fn decode_u32(bytes: [u8; 4]) -> u32 {
    u32::from_le_bytes(bytes)
}

#[inline]
pub fn encode_u16(value: u16) -> [u8; 2] {
    value.to_le_bytes()
}

#[inline]
pub fn decode_u16(bytes: [u8; 2]) -> u16 {
    u16::from_le_bytes(bytes)
}

/// Encodes the raw IEEE-754 bit pattern of `value`; NaN payloads are kept.
#[inline]
pub fn encode_f32(value: f32) -> [u8; 4] {
    encode_u32(value.to_bits())
}

/// Reinterprets four little-endian bytes as an IEEE-754 single.
#[inline]
pub fn decode_f32(bytes: [u8; 4]) -> f32 {
    f32::from_bits(decode_u32(bytes))
}

// --- Half precision ---

/// Widens an IEEE-754 binary16 pattern to `f32`.
///
/// Widening is always exact: normals are rebiased, subnormals are scaled by
/// 2^-24, infinities stay infinite and NaN payloads are carried into the top
/// of the binary32 mantissa. The sign bit is applied independently, so
/// `0x8000` yields `-0.0`.
pub fn half_to_f32(half: u16) -> f32 {
    let sign = u32::from(half & HALF_SIGN) << 16;
    let exponent = (half & HALF_INFINITY) >> 10;
    let mantissa = u32::from(half & HALF_MANTISSA);

    let magnitude = match exponent {
        0 => (mantissa as f32 / SUBNORMAL_SCALE).to_bits(),
        0x1F => F32_INFINITY | (mantissa << MANTISSA_SHIFT),
        _ => ((u32::from(half & !HALF_SIGN)) << MANTISSA_SHIFT) + (EXPONENT_REBIAS << MANTISSA_SHIFT),
    };

    f32::from_bits(sign | magnitude)
}

/// Narrows an `f32` to an IEEE-754 binary16 pattern.
///
/// The conversion truncates towards zero, matching the instrument firmware:
///
/// * magnitudes in the half normal range drop their low 13 mantissa bits;
/// * magnitudes below 2^-14 go through the subnormal path
///   (`trunc(|v| * 2^24)`), so they only reach zero below 2^-24;
/// * magnitudes above 65504 (including infinity) saturate to half infinity;
/// * NaN keeps the top ten payload bits, forced non-zero so it cannot turn
///   into infinity.
///
/// The sign bit is always copied through.
pub fn f32_to_half(value: f32) -> u16 {
    let bits = value.to_bits();
    let sign = ((bits & F32_SIGN) >> 16) as u16;
    let magnitude = bits & !F32_SIGN;

    let half = if magnitude > F32_INFINITY {
        let payload = ((magnitude >> MANTISSA_SHIFT) as u16) & HALF_MANTISSA;
        HALF_INFINITY | payload.max(1)
    } else if magnitude > F32_HALF_MAX {
        HALF_INFINITY
    } else if magnitude < F32_HALF_MIN_NORMAL {
        // < 1024 after scaling, and `as` truncates
        (f32::from_bits(magnitude) * SUBNORMAL_SCALE) as u16
    } else {
        ((magnitude >> MANTISSA_SHIFT) - EXPONENT_REBIAS) as u16
    };

    half | sign
}

// --- Offset helpers over frame bytes ---

#[inline]
pub(crate) fn read_u16_at(buf: &[u8], offset: usize) -> u16 {
    decode_u16([buf[offset], buf[offset + 1]])
}

#[inline]
pub(crate) fn read_u32_at(buf: &[u8], offset: usize) -> u32 {
    decode_u32([buf[offset], buf[offset + 1], buf[offset + 2], buf[offset + 3]])
}

#[inline]
pub(crate) fn read_f32_at(buf: &[u8], offset: usize) -> f32 {
    f32::from_bits(read_u32_at(buf, offset))
}

#[inline]
pub(crate) fn read_half_at(buf: &[u8], offset: usize) -> f32 {
    half_to_f32(read_u16_at(buf, offset))
}
