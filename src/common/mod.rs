// src/common/mod.rs

// --- Declare all public modules within common ---
pub mod codec;
pub mod command;
pub mod error;
pub mod frame;
pub mod hal_traits;
pub mod response;
pub mod timing;

// --- Re-export key types/traits/functions for easier access ---

pub use codec::{
    decode_f32, decode_u16, decode_u32, encode_f32, encode_u16, encode_u32, f32_to_half, half_to_f32,
};

pub use command::{Calibration, Command, Opcode};

pub use error::{CommandError, ExchangeFault, TransportError};

pub use frame::{CommandFrame, ResponseFrame, Status, RX_SIZE, TX_SIZE};

pub use hal_traits::{HidConnector, HidLink, LinkError, LinkInstant, LinkTimer};

pub use response::{
    BatteryStatus, DiskInfo, RxMeasurement, RxPair, ThruMeasurement, VectorMeasurement, VersionInfo,
    EFFICIENT_POINTS,
};
