//! SARK-110 command definitions.
//!
//! Each variant of [`Command`] maps to one opcode of the HID protocol and
//! knows how to lay out its parameters inside an 18-byte [`CommandFrame`].

use core::fmt;

use super::frame::CommandFrame;

/// Opcode byte (position 0) of a request.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum Opcode {
    /// Protocol version and firmware id.
    Version = 1,
    /// Measures R and X at one frequency.
    MeasRx = 2,
    /// Raw voltage/current vector.
    MeasVector = 3,
    /// Signal generator output.
    SignalGen = 4,
    /// Raw RF vector.
    MeasRf = 5,
    /// Raw thru vector (MK1 hardware).
    MeasVecThru = 6,
    /// Battery charger status.
    BattStat = 7,
    /// Disk capacity.
    DiskInfo = 8,
    /// Disk volume name.
    DiskVolume = 9,
    /// Four R/X pairs packed as half floats.
    MeasRxEff = 12,
    Buzzer = 20,
    GetKey = 21,
    DevReset = 50,
}

impl Opcode {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Opcode::Version),
            2 => Some(Opcode::MeasRx),
            3 => Some(Opcode::MeasVector),
            4 => Some(Opcode::SignalGen),
            5 => Some(Opcode::MeasRf),
            6 => Some(Opcode::MeasVecThru),
            7 => Some(Opcode::BattStat),
            8 => Some(Opcode::DiskInfo),
            9 => Some(Opcode::DiskVolume),
            12 => Some(Opcode::MeasRxEff),
            20 => Some(Opcode::Buzzer),
            21 => Some(Opcode::GetKey),
            50 => Some(Opcode::DevReset),
            _ => None,
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Opcode::Version => "VERSION",
            Opcode::MeasRx => "MEAS_RX",
            Opcode::MeasVector => "MEAS_VECTOR",
            Opcode::SignalGen => "SIGNAL_GEN",
            Opcode::MeasRf => "MEAS_RF",
            Opcode::MeasVecThru => "MEAS_VEC_THRU",
            Opcode::BattStat => "BATT_STAT",
            Opcode::DiskInfo => "DISK_INFO",
            Opcode::DiskVolume => "DISK_VOLUME",
            Opcode::MeasRxEff => "MEAS_RX_EFF",
            Opcode::Buzzer => "BUZZER",
            Opcode::GetKey => "GET_KEY",
            Opcode::DevReset => "DEV_RST",
        };
        f.write_str(name)
    }
}

/// Calibration flag carried at position 5 of `MEAS_RX` and `MEAS_RX_EFF`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
#[repr(u8)]
pub enum Calibration {
    /// OSL-calibrated value.
    #[default]
    Calibrated = 1,
    /// Raw, uncalibrated value.
    Uncalibrated = 2,
}

impl From<bool> for Calibration {
    fn from(calibrated: bool) -> Self {
        if calibrated {
            Calibration::Calibrated
        } else {
            Calibration::Uncalibrated
        }
    }
}

// --- Parameter offsets ---
const FREQ_OFFSET: usize = 1;
const CAL_OFFSET: usize = 5;
const SAMPLES_OFFSET: usize = 6;
const EFF_STEP_OFFSET: usize = 7;
const GEN_LEVEL_OFFSET: usize = 5;
const GEN_GAIN_OFFSET: usize = 7;
const BUZZER_FREQ_OFFSET: usize = 1;
const BUZZER_DURATION_OFFSET: usize = 3;

/// A typed SARK-110 request.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Command {
    Version,
    /// Single-point R/X measurement averaged over `samples` readings.
    MeasureRx { frequency: u32, calibration: Calibration, samples: u8 },
    /// Four R/X measurements at `frequency + k * step`, `k = 0..4`.
    MeasureRxEfficient { frequency: u32, step: u32, calibration: Calibration, samples: u8 },
    MeasureVector { frequency: u32 },
    MeasureRf { frequency: u32 },
    MeasureVectorThru { frequency: u32 },
    SignalGenerator { frequency: u32, level: u16, gain: u8 },
    BatteryStatus,
    DiskInfo,
    DiskVolume,
    /// Sounds the buzzer; `frequency` in Hz, `duration` in ms.
    Buzzer { frequency: u16, duration: u16 },
    GetKey,
    DeviceReset,
}

impl Command {
    pub fn opcode(&self) -> Opcode {
        match self {
            Command::Version => Opcode::Version,
            Command::MeasureRx { .. } => Opcode::MeasRx,
            Command::MeasureRxEfficient { .. } => Opcode::MeasRxEff,
            Command::MeasureVector { .. } => Opcode::MeasVector,
            Command::MeasureRf { .. } => Opcode::MeasRf,
            Command::MeasureVectorThru { .. } => Opcode::MeasVecThru,
            Command::SignalGenerator { .. } => Opcode::SignalGen,
            Command::BatteryStatus => Opcode::BattStat,
            Command::DiskInfo => Opcode::DiskInfo,
            Command::DiskVolume => Opcode::DiskVolume,
            Command::Buzzer { .. } => Opcode::Buzzer,
            Command::GetKey => Opcode::GetKey,
            Command::DeviceReset => Opcode::DevReset,
        }
    }

    /// Lays the command out in a zero-filled request frame.
    pub fn to_frame(&self) -> CommandFrame {
        let frame = CommandFrame::new(self.opcode());
        match *self {
            Command::MeasureRx { frequency, calibration, samples } => frame
                .with_u32(FREQ_OFFSET, frequency)
                .with_u8(CAL_OFFSET, calibration as u8)
                .with_u8(SAMPLES_OFFSET, samples),
            Command::MeasureRxEfficient { frequency, step, calibration, samples } => frame
                .with_u32(FREQ_OFFSET, frequency)
                .with_u8(CAL_OFFSET, calibration as u8)
                .with_u8(SAMPLES_OFFSET, samples)
                .with_u32(EFF_STEP_OFFSET, step),
            Command::MeasureVector { frequency }
            | Command::MeasureRf { frequency }
            | Command::MeasureVectorThru { frequency } => frame.with_u32(FREQ_OFFSET, frequency),
            Command::SignalGenerator { frequency, level, gain } => frame
                .with_u32(FREQ_OFFSET, frequency)
                .with_u16(GEN_LEVEL_OFFSET, level)
                .with_u8(GEN_GAIN_OFFSET, gain),
            Command::Buzzer { frequency, duration } => frame
                .with_u16(BUZZER_FREQ_OFFSET, frequency)
                .with_u16(BUZZER_DURATION_OFFSET, duration),
            Command::Version
            | Command::BatteryStatus
            | Command::DiskInfo
            | Command::DiskVolume
            | Command::GetKey
            | Command::DeviceReset => frame,
        }
    }
}
