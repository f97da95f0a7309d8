// src/client/mod.rs

//! Command client: typed SARK-110 requests layered on the transport channel.
//!
//! Every command builds a zero-filled request frame, runs one exchange and
//! decodes the payload at fixed offsets. A response tagged `'E'` becomes
//! [`CommandError::DeviceRejected`]; anything that stops the exchange from
//! producing a response becomes [`CommandError::CommunicationFailure`].

use arrayvec::ArrayString;
use tracing::{debug, warn};

use crate::common::{
    command::{Calibration, Command},
    error::{CommandError, TransportError},
    frame::{ResponseFrame, Status},
    hal_traits::{HidConnector, LinkError},
    response::{
        self, BatteryStatus, DiskInfo, RxMeasurement, RxPair, ThruMeasurement, VectorMeasurement,
        VersionInfo, EFFICIENT_POINTS, TEXT_CAPACITY,
    },
};
use crate::transport::Transport;

/// Result type of every typed command issued through a client over connector `C`.
pub type CommandResult<T, C> = Result<T, CommandError<LinkError<C>>>;

/// Typed front end over one [`Transport`].
pub struct Sark110Client<C: HidConnector> {
    transport: Transport<C>,
}

impl<C: HidConnector> Sark110Client<C> {
    pub fn new(connector: C) -> Self {
        Sark110Client { transport: Transport::new(connector) }
    }

    /// Wraps an already configured transport (custom ids or retry policy).
    pub fn from_transport(transport: Transport<C>) -> Self {
        Sark110Client { transport }
    }

    pub fn connect(&mut self) -> Result<(), TransportError<LinkError<C>>> {
        self.transport.open()
    }

    pub fn disconnect(&mut self) {
        self.transport.close();
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_open()
    }

    pub fn transport(&self) -> &Transport<C> {
        &self.transport
    }

    /// Runs `command` and returns its OK response frame.
    ///
    /// Fails without touching the link when no connection is open.
    pub fn execute(&mut self, command: Command) -> CommandResult<ResponseFrame, C> {
        let opcode = command.opcode();
        debug!(%opcode, "Executing command");

        let response = self.transport.exchange(&command.to_frame()).map_err(|e| {
            warn!(%opcode, "Command failed: {}", e);
            CommandError::CommunicationFailure(e)
        })?;

        match response.status() {
            Some(Status::Ok) => Ok(response),
            _ => {
                warn!(%opcode, "Device rejected command");
                Err(CommandError::DeviceRejected { opcode })
            }
        }
    }

    // --- Device information ---

    pub fn version(&mut self) -> CommandResult<VersionInfo, C> {
        let frame = self.execute(Command::Version)?;
        Ok(response::decode_version(&frame))
    }

    pub fn battery_status(&mut self) -> CommandResult<BatteryStatus, C> {
        let frame = self.execute(Command::BatteryStatus)?;
        Ok(response::decode_battery(&frame))
    }

    pub fn disk_info(&mut self) -> CommandResult<DiskInfo, C> {
        let frame = self.execute(Command::DiskInfo)?;
        Ok(response::decode_disk_info(&frame))
    }

    pub fn disk_volume(&mut self) -> CommandResult<ArrayString<TEXT_CAPACITY>, C> {
        let frame = self.execute(Command::DiskVolume)?;
        Ok(response::decode_volume(&frame))
    }

    /// Last key pressed on the instrument, `0` when none.
    pub fn get_key(&mut self) -> CommandResult<u8, C> {
        let frame = self.execute(Command::GetKey)?;
        Ok(response::decode_key(&frame))
    }

    // --- Measurements ---

    /// Single-point R/X measurement averaged over `samples` readings.
    pub fn measure_rx(
        &mut self,
        frequency: u32,
        calibration: Calibration,
        samples: u8,
    ) -> CommandResult<RxMeasurement, C> {
        let frame = self.execute(Command::MeasureRx { frequency, calibration, samples })?;
        Ok(response::decode_rx(&frame))
    }

    /// Four R/X pairs at `frequency + k * step` for `k` in `0..4`, decoded
    /// from half floats.
    pub fn measure_rx_efficient(
        &mut self,
        frequency: u32,
        step: u32,
        calibration: Calibration,
        samples: u8,
    ) -> CommandResult<[RxPair; EFFICIENT_POINTS], C> {
        let frame = self.execute(Command::MeasureRxEfficient {
            frequency,
            step,
            calibration,
            samples,
        })?;
        Ok(response::decode_rx_efficient(&frame))
    }

    pub fn measure_vector(&mut self, frequency: u32) -> CommandResult<VectorMeasurement, C> {
        let frame = self.execute(Command::MeasureVector { frequency })?;
        Ok(response::decode_vector(&frame))
    }

    pub fn measure_rf(&mut self, frequency: u32) -> CommandResult<VectorMeasurement, C> {
        let frame = self.execute(Command::MeasureRf { frequency })?;
        Ok(response::decode_vector(&frame))
    }

    pub fn measure_vector_thru(&mut self, frequency: u32) -> CommandResult<ThruMeasurement, C> {
        let frame = self.execute(Command::MeasureVectorThru { frequency })?;
        Ok(response::decode_thru(&frame))
    }

    // --- Control ---

    pub fn signal_generator(&mut self, frequency: u32, level: u16, gain: u8) -> CommandResult<(), C> {
        self.execute(Command::SignalGenerator { frequency, level, gain })?;
        Ok(())
    }

    /// Sounds the buzzer. `frequency` in Hz (0 = device default), `duration` in ms.
    pub fn buzzer(&mut self, frequency: u16, duration: u16) -> CommandResult<(), C> {
        self.execute(Command::Buzzer { frequency, duration })?;
        Ok(())
    }

    pub fn device_reset(&mut self) -> CommandResult<(), C> {
        self.execute(Command::DeviceReset)?;
        Ok(())
    }
}

impl<C: HidConnector> core::fmt::Debug for Sark110Client<C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Sark110Client")
            .field("connected", &self.is_connected())
            .finish()
    }
}
