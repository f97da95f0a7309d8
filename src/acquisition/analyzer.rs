// src/acquisition/analyzer.rs

use core::fmt::Debug;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, warn};

use super::config::ScanConfig;
use super::scan::{Sample, ScanResult};
use super::sweep::{progress_percent, SweepPlan};
use crate::client::Sark110Client;
use crate::common::{
    error::{CommandError, TransportError},
    hal_traits::{HidConnector, LinkError},
    response::EFFICIENT_POINTS,
};

/// Frequency of the measurement that quiesces the instrument.
const QUIESCE_FREQUENCY: u32 = 0;

/// Why a measurement could not be taken.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalyzerError<E = ()>
where
    E: Debug,
{
    #[error("{0}")]
    Command(CommandError<E>),

    #[error("invalid sweep {start}..{end} with step {step}")]
    InvalidSweep { start: u32, end: u32, step: u32 },
}

impl<E: Debug> AnalyzerError<E> {
    /// True when the failure ended the connection.
    pub fn is_communication_failure(&self) -> bool {
        matches!(self, AnalyzerError::Command(e) if e.is_communication_failure())
    }
}

impl<E: Debug> From<CommandError<E>> for AnalyzerError<E> {
    fn from(e: CommandError<E>) -> Self {
        AnalyzerError::Command(e)
    }
}

/// A sweep that stopped early. The samples taken so far stay in
/// [`Analyzer::scan`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("sweep stopped at {frequency} Hz with {samples_retained} samples: {error}")]
pub struct SweepError<E = ()>
where
    E: Debug,
{
    /// First frequency that was not measured.
    pub frequency: u32,
    pub samples_retained: usize,
    pub error: AnalyzerError<E>,
}

/// Drives sweeps and single-point measurements and owns the resulting scan.
pub struct Analyzer<C: HidConnector> {
    client: Sark110Client<C>,
    config: ScanConfig,
    scan: ScanResult,
}

impl<C: HidConnector> Analyzer<C> {
    pub fn new(connector: C) -> Self {
        Self::from_client(Sark110Client::new(connector))
    }

    pub fn from_client(client: Sark110Client<C>) -> Self {
        Analyzer {
            client,
            config: ScanConfig::default(),
            scan: ScanResult::default(),
        }
    }

    pub fn with_config(mut self, config: ScanConfig) -> Self {
        self.config = config;
        self
    }

    // --- Connection ---

    pub fn connect(&mut self) -> Result<(), TransportError<LinkError<C>>> {
        self.client.connect()
    }

    pub fn disconnect(&mut self) {
        self.client.disconnect();
    }

    /// True iff a connection is open.
    pub fn is_ready(&self) -> bool {
        self.client.is_connected()
    }

    /// The underlying client, for commands outside the sweep workflow.
    pub fn client_mut(&mut self) -> &mut Sark110Client<C> {
        &mut self.client
    }

    // --- Configuration and results ---

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Replaces the configuration and recomputes the statistics of the
    /// retained scan.
    pub fn set_config(&mut self, config: ScanConfig) {
        self.config = config;
        self.scan.recompute_stats(&self.config);
    }

    pub fn scan(&self) -> &ScanResult {
        &self.scan
    }

    // --- Measurement ---

    /// Measures one frequency and derives its impedance and SWR.
    ///
    /// A communication failure closes the connection before it is returned.
    pub fn measure_point(&mut self, frequency: u32) -> Result<Sample, AnalyzerError<LinkError<C>>> {
        let rx = self
            .client
            .measure_rx(frequency, self.config.calibration(), self.config.samples)
            .map_err(|e| self.command_failed(e))?;
        let sample = Sample::from_rx(frequency, f64::from(rx.resistance), f64::from(rx.reactance));
        debug!(frequency, swr = sample.swr, "Measured point");
        Ok(sample)
    }

    /// Quiesces the instrument. Failures are logged and swallowed; a
    /// communication failure still closes the connection.
    pub fn stop(&mut self) {
        if let Err(e) = self.measure_point(QUIESCE_FREQUENCY) {
            debug!("Quiesce failed: {}", e);
        }
    }

    /// Sweeps `start, start + step, ...` below `end`, calling `progress` with
    /// a percentage after every point.
    ///
    /// Any failure halts the sweep; the samples already taken are kept in
    /// [`scan`](Self::scan) with their statistics recomputed.
    pub fn run_sweep<F>(
        &mut self,
        start: u32,
        end: u32,
        step: u32,
        mut progress: F,
    ) -> Result<&ScanResult, SweepError<LinkError<C>>>
    where
        F: FnMut(u8),
    {
        self.sweep(SweepPlan::new(start, end, step), None, &mut progress)?;
        Ok(&self.scan)
    }

    /// Like [`run_sweep`](Self::run_sweep), but stops cleanly before the next
    /// point once `cancel` is set. An in-flight exchange always completes.
    pub fn run_sweep_cancellable<F>(
        &mut self,
        start: u32,
        end: u32,
        step: u32,
        cancel: &AtomicBool,
        mut progress: F,
    ) -> Result<&ScanResult, SweepError<LinkError<C>>>
    where
        F: FnMut(u8),
    {
        self.sweep(SweepPlan::new(start, end, step), Some(cancel), &mut progress)?;
        Ok(&self.scan)
    }

    pub fn run_plan<F>(
        &mut self,
        plan: &SweepPlan,
        mut progress: F,
    ) -> Result<&ScanResult, SweepError<LinkError<C>>>
    where
        F: FnMut(u8),
    {
        self.sweep(*plan, None, &mut progress)?;
        Ok(&self.scan)
    }

    // --- Internals ---

    fn sweep(
        &mut self,
        plan: SweepPlan,
        cancel: Option<&AtomicBool>,
        progress: &mut dyn FnMut(u8),
    ) -> Result<(), SweepError<LinkError<C>>> {
        let SweepPlan { start, end, step } = plan;
        if step == 0 {
            return Err(SweepError {
                frequency: start,
                samples_retained: 0,
                error: AnalyzerError::InvalidSweep { start, end, step },
            });
        }

        self.scan.reset(start, end, step);
        info!(start, end, step, fast = self.config.fast_sweep, "Starting sweep");

        let result = if self.config.fast_sweep {
            self.sweep_efficient(plan, cancel, progress)
        } else {
            self.sweep_single(plan, cancel, progress)
        };

        self.scan.recompute_stats(&self.config);
        match &result {
            Ok(()) => info!(samples = self.scan.len(), "Sweep finished"),
            Err(e) => warn!("Sweep halted: {}", e),
        }
        result
    }

    fn sweep_single(
        &mut self,
        plan: SweepPlan,
        cancel: Option<&AtomicBool>,
        progress: &mut dyn FnMut(u8),
    ) -> Result<(), SweepError<LinkError<C>>> {
        let total_steps = plan.total_steps();
        let mut index = 0u32;
        let mut frequency = plan.start;

        while frequency < plan.end {
            if is_cancelled(cancel) {
                info!(frequency, "Sweep cancelled");
                return Ok(());
            }

            let sample = self.measure_point(frequency).map_err(|error| SweepError {
                frequency,
                samples_retained: self.scan.len(),
                error,
            })?;
            self.scan.push(sample);
            progress(progress_percent(index, total_steps));
            index += 1;

            match frequency.checked_add(plan.step) {
                Some(next) => frequency = next,
                None => break,
            }
        }
        Ok(())
    }

    /// One `MEAS_RX_EFF` per group of four adjacent points.
    fn sweep_efficient(
        &mut self,
        plan: SweepPlan,
        cancel: Option<&AtomicBool>,
        progress: &mut dyn FnMut(u8),
    ) -> Result<(), SweepError<LinkError<C>>> {
        let total_steps = plan.total_steps();
        let mut index = 0u32;
        let mut frequency = Some(plan.start);

        while let Some(batch_start) = frequency.filter(|f| *f < plan.end) {
            if is_cancelled(cancel) {
                info!(frequency = batch_start, "Sweep cancelled");
                return Ok(());
            }

            let pairs = self
                .client
                .measure_rx_efficient(
                    batch_start,
                    plan.step,
                    self.config.calibration(),
                    self.config.samples,
                )
                .map_err(|e| SweepError {
                    frequency: batch_start,
                    samples_retained: self.scan.len(),
                    error: self.command_failed(e),
                })?;

            frequency = Some(batch_start);
            for pair in pairs.iter().take(EFFICIENT_POINTS) {
                let Some(point) = frequency.filter(|f| *f < plan.end) else {
                    break;
                };
                let sample = Sample::from_rx(point, f64::from(pair.resistance), f64::from(pair.reactance));
                self.scan.push(sample);
                progress(progress_percent(index, total_steps));
                index += 1;
                frequency = point.checked_add(plan.step);
            }
        }
        Ok(())
    }

    /// Converts a command failure, closing the connection when the link is gone.
    fn command_failed(&mut self, e: CommandError<LinkError<C>>) -> AnalyzerError<LinkError<C>> {
        if e.is_communication_failure() {
            warn!("Connection lost: {}", e);
            self.client.disconnect();
        }
        AnalyzerError::Command(e)
    }
}

fn is_cancelled(cancel: Option<&AtomicBool>) -> bool {
    cancel.is_some_and(|flag| flag.load(Ordering::Relaxed))
}
