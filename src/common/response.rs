// src/common/response.rs

//! Typed payloads decoded from OK responses.
//!
//! Offsets are relative to the start of the frame; byte 0 is always the
//! status tag and has already been checked by the caller.

use arrayvec::ArrayString;

use super::frame::{ResponseFrame, RX_SIZE};

/// Longest text the device can return after the status byte.
pub const TEXT_CAPACITY: usize = RX_SIZE - 1;

/// `VERSION` response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionInfo {
    pub protocol: u16,
    /// Firmware identification, NUL padding removed.
    pub firmware: ArrayString<TEXT_CAPACITY>,
}

/// `MEAS_RX` response: impedance plus the MK1 transmission pair.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RxMeasurement {
    pub resistance: f32,
    pub reactance: f32,
    pub s21_re: f32,
    pub s21_im: f32,
}

/// One R/X pair from an efficient (half-float) measurement.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RxPair {
    pub resistance: f32,
    pub reactance: f32,
}

/// Raw magnitude/phase vector shared by `MEAS_VECTOR` and `MEAS_RF`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct VectorMeasurement {
    pub mag_v: f32,
    pub phase_v: f32,
    pub mag_i: f32,
    pub phase_i: f32,
}

/// `MEAS_VEC_THRU` response.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ThruMeasurement {
    pub mag_v_out: f32,
    pub phase_v_out: f32,
    pub mag_v_in: f32,
    pub phase_v_in: f32,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BatteryStatus {
    /// USB VBUS reading as reported by the charger.
    pub vbus: u8,
    /// Battery voltage, device units.
    pub voltage: u16,
    pub charge_status: u8,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DiskInfo {
    pub total: u32,
    pub free: u32,
}

/// Number of R/X pairs packed into one `MEAS_RX_EFF` response.
pub const EFFICIENT_POINTS: usize = 4;

// --- Decoders ---

pub fn decode_version(frame: &ResponseFrame) -> VersionInfo {
    VersionInfo {
        protocol: frame.u16_at(1),
        firmware: decode_text(frame.tail(3)),
    }
}

pub fn decode_rx(frame: &ResponseFrame) -> RxMeasurement {
    RxMeasurement {
        resistance: frame.f32_at(1),
        reactance: frame.f32_at(5),
        s21_re: frame.f32_at(9),
        s21_im: frame.f32_at(13),
    }
}

pub fn decode_rx_efficient(frame: &ResponseFrame) -> [RxPair; EFFICIENT_POINTS] {
    core::array::from_fn(|k| {
        let offset = 1 + k * 4;
        RxPair {
            resistance: frame.half_at(offset),
            reactance: frame.half_at(offset + 2),
        }
    })
}

pub fn decode_vector(frame: &ResponseFrame) -> VectorMeasurement {
    VectorMeasurement {
        mag_v: frame.f32_at(1),
        phase_v: frame.f32_at(5),
        mag_i: frame.f32_at(9),
        phase_i: frame.f32_at(13),
    }
}

pub fn decode_thru(frame: &ResponseFrame) -> ThruMeasurement {
    ThruMeasurement {
        mag_v_out: frame.f32_at(1),
        phase_v_out: frame.f32_at(5),
        mag_v_in: frame.f32_at(9),
        phase_v_in: frame.f32_at(13),
    }
}

pub fn decode_battery(frame: &ResponseFrame) -> BatteryStatus {
    BatteryStatus {
        vbus: frame.u8_at(1),
        voltage: frame.u16_at(2),
        charge_status: frame.u8_at(4),
    }
}

pub fn decode_disk_info(frame: &ResponseFrame) -> DiskInfo {
    DiskInfo {
        total: frame.u32_at(1),
        free: frame.u32_at(5),
    }
}

pub fn decode_volume(frame: &ResponseFrame) -> ArrayString<TEXT_CAPACITY> {
    decode_text(frame.tail(1))
}

pub fn decode_key(frame: &ResponseFrame) -> u8 {
    frame.u8_at(1)
}

/// Text up to the first NUL; bytes that are not printable ASCII are skipped.
fn decode_text(bytes: &[u8]) -> ArrayString<TEXT_CAPACITY> {
    let mut text = ArrayString::new();
    for &byte in bytes.iter().take_while(|b| **b != 0) {
        if byte.is_ascii_graphic() || byte == b' ' {
            // capacity >= tail length, cannot overflow
            let _ = text.try_push(byte as char);
        }
    }
    text
}
