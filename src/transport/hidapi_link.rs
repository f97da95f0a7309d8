// src/transport/hidapi_link.rs

//! Host-side link backed by `hidapi`.

use std::time::{Duration, Instant};

use hidapi::{HidApi, HidDevice, HidError};
use tracing::debug;

use crate::common::{
    frame::TX_SIZE,
    hal_traits::{HidConnector, HidLink, LinkTimer},
};

/// Report id prepended to every output report; the instrument uses none.
const REPORT_ID: u8 = 0x00;

/// Opens SARK-110 devices through the system HID API.
pub struct HidApiConnector {
    api: HidApi,
}

impl HidApiConnector {
    pub fn new() -> Result<Self, HidError> {
        Ok(HidApiConnector { api: HidApi::new()? })
    }
}

impl HidConnector for HidApiConnector {
    type Link = HidApiLink;

    fn open(&mut self, vendor_id: u16, product_id: u16) -> Result<HidApiLink, HidError> {
        self.api.refresh_devices()?;
        let device = self.api.open(vendor_id, product_id)?;
        device.set_blocking_mode(false)?;
        debug!("Opened HID device {:04x}:{:04x}", vendor_id, product_id);
        Ok(HidApiLink { device })
    }
}

/// One open HID device in non-blocking mode.
pub struct HidApiLink {
    device: HidDevice,
}

impl HidLink for HidApiLink {
    type Error = HidError;

    fn write_report(&mut self, report: &[u8]) -> nb::Result<usize, HidError> {
        let len = report.len().min(TX_SIZE);
        let mut out = [0u8; TX_SIZE + 1];
        out[0] = REPORT_ID;
        out[1..=len].copy_from_slice(&report[..len]);

        match self.device.write(&out[..=len]) {
            Ok(written) => Ok(written.saturating_sub(1)),
            Err(e) => Err(nb::Error::Other(e)),
        }
    }

    fn read_report(&mut self, buf: &mut [u8]) -> nb::Result<usize, HidError> {
        match self.device.read(buf) {
            Ok(0) => Err(nb::Error::WouldBlock),
            Ok(n) => Ok(n),
            Err(e) => Err(nb::Error::Other(e)),
        }
    }
}

impl LinkTimer for HidApiLink {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn delay_us(&mut self, us: u32) {
        std::thread::sleep(Duration::from_micros(u64::from(us)));
    }
}
