// src/acquisition/config.rs

use crate::common::command::Calibration;

/// Tunables for sweeps and scan statistics.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ScanConfig {
    /// Highest SWR considered when locating the maximum-SWR sample.
    pub swr_ceiling: f64,
    /// SWR at or below which a sample counts towards the usable bandwidth.
    pub bandwidth_swr: f64,
    /// Request OSL-calibrated values from the instrument.
    pub calibrated: bool,
    /// Readings averaged by the instrument per point.
    pub samples: u8,
    /// Fetch four points per exchange with `MEAS_RX_EFF`.
    pub fast_sweep: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            swr_ceiling: 10.0,
            bandwidth_swr: 2.0,
            calibrated: true,
            samples: 1,
            fast_sweep: false,
        }
    }
}

impl ScanConfig {
    pub fn calibration(&self) -> Calibration {
        Calibration::from(self.calibrated)
    }
}
