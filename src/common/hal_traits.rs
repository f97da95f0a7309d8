// src/common/hal_traits.rs

use core::fmt::Debug;
use core::ops::Add;
use core::time::Duration;

/// Monotonic timestamp produced by a [`LinkTimer`].
pub trait LinkInstant: Copy + Ord + Add<Duration, Output = Self> {}

impl<T> LinkInstant for T where T: Copy + Ord + Add<Duration, Output = T> {}

/// Clock and delay source used to bound every blocking step of an exchange.
pub trait LinkTimer {
    type Instant: LinkInstant;

    fn now(&self) -> Self::Instant;

    /// Delay for at least the specified number of microseconds.
    fn delay_us(&mut self, us: u32);
}

/// Abstraction for non-blocking HID report I/O.
///
/// Reports are the raw 18-byte protocol frames; adding or stripping a HID
/// report id is the implementation's job.
pub trait HidLink {
    /// Associated error type for communication errors.
    type Error: Debug;

    /// Attempts to send one output report.
    ///
    /// Returns `Err(nb::Error::WouldBlock)` while the device cannot accept it yet.
    fn write_report(&mut self, report: &[u8]) -> nb::Result<usize, Self::Error>;

    /// Attempts to read one input report into `buf`.
    ///
    /// Returns the number of bytes received, or `Err(nb::Error::WouldBlock)` if
    /// no report is pending. A zero-length read is treated the same as `WouldBlock`.
    fn read_report(&mut self, buf: &mut [u8]) -> nb::Result<usize, Self::Error>;
}

/// Locates and opens the instrument.
pub trait HidConnector {
    /// An open connection; it carries its own clock so deadlines follow the link.
    type Link: HidLink + LinkTimer;

    /// Opens the first device matching `vendor_id`/`product_id`.
    fn open(
        &mut self,
        vendor_id: u16,
        product_id: u16,
    ) -> Result<Self::Link, <Self::Link as HidLink>::Error>;
}

/// Error type of the links a connector produces.
pub type LinkError<C> = <<C as HidConnector>::Link as HidLink>::Error;
