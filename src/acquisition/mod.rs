// src/acquisition/mod.rs

//! Acquisition engine: single-point measurements and frequency sweeps on top
//! of the command client, with derived SWR/impedance and scan statistics.

pub mod analyzer;
pub mod config;
pub mod scan;
pub mod sweep;

pub use analyzer::{Analyzer, AnalyzerError, SweepError};
pub use config::ScanConfig;
pub use scan::{reflection_coefficient, swr_from_rho, Sample, ScanResult, ScanStats, SWR_CEILING};
pub use sweep::{progress_percent, Band, SweepPlan, FMAX, FMIN, WINDOW_MIN};
