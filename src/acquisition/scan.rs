// src/acquisition/scan.rs

//! Measurement samples, scan results and their summary statistics.

use std::fmt::Write as _;

use num_complex::Complex64;

use super::config::ScanConfig;

/// Reference impedance of the reflection coefficient, in ohms.
pub const REFERENCE_IMPEDANCE: f64 = 50.0;
/// SWR reported once the reflection coefficient passes [`RHO_CLAMP`].
pub const SWR_CEILING: f64 = 99.999;
/// |ρ| at which SWR reaches [`SWR_CEILING`].
pub const RHO_CLAMP: f64 = 0.980197824;

/// Reflection coefficient of `z` against the 50 Ω reference.
pub fn reflection_coefficient(z: Complex64) -> Complex64 {
    (z - REFERENCE_IMPEDANCE) / (z + REFERENCE_IMPEDANCE)
}

/// SWR for a reflection-coefficient magnitude, clamped to [`SWR_CEILING`].
pub fn swr_from_rho(rho: f64) -> f64 {
    if rho.is_nan() || rho > RHO_CLAMP {
        SWR_CEILING
    } else {
        (1.0 + rho) / (1.0 - rho)
    }
}

/// One sweep point.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sample {
    /// Hz.
    pub frequency: u32,
    pub resistance: f64,
    pub reactance: f64,
    /// |R + jX|.
    pub impedance: f64,
    pub swr: f64,
}

impl Sample {
    /// Derives impedance magnitude and SWR from a measured R/X pair.
    pub fn from_rx(frequency: u32, resistance: f64, reactance: f64) -> Self {
        let z = Complex64::new(resistance, reactance);
        let rho = reflection_coefficient(z).norm();
        Sample {
            frequency,
            resistance,
            reactance,
            impedance: z.norm(),
            swr: swr_from_rho(rho),
        }
    }

    pub fn impedance_complex(&self) -> Complex64 {
        Complex64::new(self.resistance, self.reactance)
    }

    pub fn reflection(&self) -> Complex64 {
        reflection_coefficient(self.impedance_complex())
    }
}

/// Indices into [`ScanResult::samples`]; `None` when the scan is empty or no
/// sample qualifies.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScanStats {
    pub swr_min: Option<usize>,
    /// Highest SWR not above [`ScanConfig::swr_ceiling`].
    pub swr_max: Option<usize>,
    pub resistance_min: Option<usize>,
    pub resistance_max: Option<usize>,
    pub reactance_min: Option<usize>,
    pub reactance_max: Option<usize>,
    pub impedance_min: Option<usize>,
    pub impedance_max: Option<usize>,
    /// Lowest index of the contiguous run around `swr_min` with SWR at or
    /// below [`ScanConfig::bandwidth_swr`].
    pub bandwidth_low: Option<usize>,
    /// Highest index of that run.
    pub bandwidth_high: Option<usize>,
}

/// Ordered samples of one sweep plus its bounds and statistics.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScanResult {
    start: u32,
    end: u32,
    step: u32,
    samples: Vec<Sample>,
    stats: ScanStats,
}

impl ScanResult {
    pub fn new(start: u32, end: u32, step: u32) -> Self {
        ScanResult { start, end, step, ..Default::default() }
    }

    /// Drops all samples and statistics and adopts new bounds.
    pub(crate) fn reset(&mut self, start: u32, end: u32, step: u32) {
        self.start = start;
        self.end = end;
        self.step = step;
        self.samples.clear();
        self.stats = ScanStats::default();
    }

    /// Appends a sample. Frequencies must be strictly ascending.
    pub(crate) fn push(&mut self, sample: Sample) {
        debug_assert!(self
            .samples
            .last()
            .map_or(true, |last| last.frequency < sample.frequency));
        self.samples.push(sample);
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    pub fn step(&self) -> u32 {
        self.step
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn stats(&self) -> &ScanStats {
        &self.stats
    }

    /// Points the sweep loop visits: frequencies `start, start + step, ...`
    /// strictly below `end`.
    pub fn expected_points(&self) -> usize {
        if self.step == 0 || self.start >= self.end {
            return 0;
        }
        (u64::from(self.end - self.start)).div_ceil(u64::from(self.step)) as usize
    }

    /// True when every point of the sweep was collected.
    pub fn is_complete(&self) -> bool {
        self.samples.len() == self.expected_points()
    }

    pub fn min_swr(&self) -> Option<&Sample> {
        self.stats.swr_min.map(|i| &self.samples[i])
    }

    /// Frequency span between the bandwidth edges, in Hz.
    pub fn bandwidth_hz(&self) -> Option<u32> {
        let low = self.samples.get(self.stats.bandwidth_low?)?;
        let high = self.samples.get(self.stats.bandwidth_high?)?;
        Some(high.frequency - low.frequency)
    }

    /// Recomputes every statistic over the full sample sequence.
    pub fn recompute_stats(&mut self, config: &ScanConfig) {
        let samples = &self.samples;
        let swr_min = index_of_min(samples, |s| s.swr);
        let (bandwidth_low, bandwidth_high) = match swr_min {
            Some(i) if samples[i].swr <= config.bandwidth_swr => {
                let within = |s: &Sample| s.swr <= config.bandwidth_swr;
                let low = samples[..i]
                    .iter()
                    .rposition(|s| !within(s))
                    .map_or(0, |outside| outside + 1);
                let high = samples[i + 1..]
                    .iter()
                    .position(|s| !within(s))
                    .map_or(samples.len() - 1, |outside| i + outside);
                (Some(low), Some(high))
            }
            _ => (None, None),
        };

        self.stats = ScanStats {
            swr_min,
            swr_max: index_of_max(samples.iter().enumerate().filter(|(_, s)| s.swr <= config.swr_ceiling), |s| {
                s.swr
            }),
            resistance_min: index_of_min(samples, |s| s.resistance),
            resistance_max: index_of_max(samples.iter().enumerate(), |s| s.resistance),
            reactance_min: index_of_min(samples, |s| s.reactance),
            reactance_max: index_of_max(samples.iter().enumerate(), |s| s.reactance),
            impedance_min: index_of_min(samples, |s| s.impedance),
            impedance_max: index_of_max(samples.iter().enumerate(), |s| s.impedance),
            bandwidth_low,
            bandwidth_high,
        };
    }

    /// Tab-separated table with a `freq\tSWR\tZ\tR\tX` header; frequency in MHz.
    pub fn to_tsv(&self) -> String {
        let mut out = String::from("freq\tSWR\tZ\tR\tX\n");
        for s in &self.samples {
            // writing to a String cannot fail
            let _ = writeln!(
                out,
                "{:.6}\t{:.3}\t{:.3}\t{:.3}\t{:.3}",
                f64::from(s.frequency) / 1_000_000.0,
                s.swr,
                s.impedance,
                s.resistance,
                s.reactance
            );
        }
        out
    }
}

// --- Extremum helpers (first occurrence wins, NaN keys never win) ---

fn index_of_min(samples: &[Sample], key: impl Fn(&Sample) -> f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, s) in samples.iter().enumerate() {
        let value = key(s);
        if value.is_nan() {
            continue;
        }
        if best.map_or(true, |(_, b)| value < b) {
            best = Some((i, value));
        }
    }
    best.map(|(i, _)| i)
}

fn index_of_max<'a>(
    samples: impl Iterator<Item = (usize, &'a Sample)>,
    key: impl Fn(&Sample) -> f64,
) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, s) in samples {
        let value = key(s);
        if value.is_nan() {
            continue;
        }
        if best.map_or(true, |(_, b)| value > b) {
            best = Some((i, value));
        }
    }
    best.map(|(i, _)| i)
}
