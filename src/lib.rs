// src/lib.rs

#![cfg_attr(not(any(feature = "std", test)), no_std)]

pub mod client;
pub mod common;
pub mod transport;

#[cfg(feature = "std")]
pub mod acquisition;

#[cfg(test)]
pub(crate) mod test_utils;

// Re-export key types for convenience
pub use client::Sark110Client;
pub use common::{Calibration, Command, CommandError, Opcode, TransportError};
pub use transport::{RetryPolicy, Transport, SARK110_PID, SARK110_VID};

#[cfg(feature = "std")]
pub use acquisition::{Analyzer, Sample, ScanConfig, ScanResult, SweepPlan};
