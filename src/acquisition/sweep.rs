// src/acquisition/sweep.rs

//! Sweep bounds, band presets and progress arithmetic.

use core::fmt;

/// Lowest frequency the instrument measures, in Hz.
pub const FMIN: u32 = 1_000_000;
/// Highest frequency the instrument measures, in Hz.
pub const FMAX: u32 = 700_000_000;
/// Lowest edge a centred window may reach, in Hz.
pub const WINDOW_MIN: u32 = 100_000;

/// Frequencies `start, start + step, ...` strictly below `end`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SweepPlan {
    pub start: u32,
    pub end: u32,
    pub step: u32,
}

impl SweepPlan {
    pub fn new(start: u32, end: u32, step: u32) -> Self {
        SweepPlan { start, end, step }
    }

    /// `points` steps across `span_hz` centred on `centre_hz`.
    ///
    /// The window is shifted (and if necessary narrowed) to stay inside
    /// `WINDOW_MIN..=FMAX`; the step is `span / points`.
    pub fn centred(centre_hz: u32, span_hz: u32, points: u32) -> Self {
        let span = span_hz.min(FMAX - WINDOW_MIN);
        let mut start = centre_hz.saturating_sub(span / 2).max(WINDOW_MIN);
        let mut end = start.saturating_add(span);
        if end > FMAX {
            end = FMAX;
            start = end - span;
        }
        SweepPlan { start, end, step: span / points.max(1) }
    }

    pub fn for_band(band: Band, points: u32) -> Self {
        Self::centred(band.centre_hz(), band.span_hz(), points)
    }

    /// Steps used as the progress denominator, `(end - start) / step`.
    pub fn total_steps(&self) -> u32 {
        if self.step == 0 || self.start >= self.end {
            0
        } else {
            (self.end - self.start) / self.step
        }
    }

    pub fn centre_hz(&self) -> u32 {
        self.start + (self.end.saturating_sub(self.start)) / 2
    }

    pub fn span_hz(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }
}

/// Percentage reported after the point at `index` (zero-based) completes.
///
/// Truncating, so a sweep of ten steps reports `0, 10, ..., 90`. Capped at 100.
pub fn progress_percent(index: u32, total_steps: u32) -> u8 {
    if total_steps == 0 {
        return 100;
    }
    let percent = 100 * u64::from(index) / u64::from(total_steps);
    percent.min(100) as u8
}

/// Preset sweep windows.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Band {
    M160,
    M80,
    M40,
    M30,
    M25,
    M20,
    M17,
    M15,
    M12,
    M11,
    M10,
    M8,
    M6,
    /// 3-30 MHz.
    Hf,
    /// 25-30 MHz.
    M12To10,
    RfidHf,
    /// 1-230 MHz.
    Wideband,
    Cm125,
    Cm70,
}

impl Band {
    pub const ALL: [Band; 19] = [
        Band::M160,
        Band::M80,
        Band::M40,
        Band::M30,
        Band::M25,
        Band::M20,
        Band::M17,
        Band::M15,
        Band::M12,
        Band::M11,
        Band::M10,
        Band::M8,
        Band::M6,
        Band::Hf,
        Band::M12To10,
        Band::RfidHf,
        Band::Wideband,
        Band::Cm125,
        Band::Cm70,
    ];

    /// (centre, span) in Hz.
    fn window(self) -> (u32, u32) {
        match self {
            Band::M160 => (1_500_000, 1_000_000),
            Band::M80 => (3_500_000, 3_000_000),
            Band::M40 => (6_500_000, 3_000_000),
            Band::M30 => (9_500_000, 3_000_000),
            Band::M25 => (12_000_000, 2_000_000),
            Band::M20 => (15_000_000, 4_000_000),
            Band::M17 => (18_000_000, 2_000_000),
            Band::M15 => (21_000_000, 4_000_000),
            Band::M12 => (24_500_000, 3_000_000),
            Band::M11 => (27_000_000, 2_000_000),
            Band::M10 => (29_500_000, 3_000_000),
            Band::M8 => (40_000_000, 18_000_000),
            Band::M6 => (51_000_000, 4_000_000),
            Band::Hf => (16_500_000, 27_000_000),
            Band::M12To10 => (27_500_000, 5_000_000),
            Band::RfidHf => (13_500_000, 5_000_000),
            Band::Wideband => (115_500_000, 229_000_000),
            Band::Cm125 => (223_500_000, 3_000_000),
            Band::Cm70 => (435_000_000, 30_000_000),
        }
    }

    pub fn centre_hz(self) -> u32 {
        self.window().0
    }

    pub fn span_hz(self) -> u32 {
        self.window().1
    }

    pub fn label(self) -> &'static str {
        match self {
            Band::M160 => "160m",
            Band::M80 => "80m",
            Band::M40 => "40m",
            Band::M30 => "30m",
            Band::M25 => "25m",
            Band::M20 => "20m",
            Band::M17 => "17m",
            Band::M15 => "15m",
            Band::M12 => "12m",
            Band::M11 => "11m",
            Band::M10 => "10m",
            Band::M8 => "8m",
            Band::M6 => "6m",
            Band::Hf => "HF (3-30MHz)",
            Band::M12To10 => "12-10m (25-30MHz)",
            Band::RfidHf => "RFID HF",
            Band::Wideband => "1-230MHz",
            Band::Cm125 => "1.25m",
            Band::Cm70 => "70cm",
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
