// src/transport/mod.rs

//! Transport channel: owns the open connection to the instrument and moves
//! one fixed-size request out and one fixed-size response back per exchange.

use core::time::Duration;

use tracing::{debug, info, warn};

use crate::common::{
    error::TransportError,
    hal_traits::{HidConnector, LinkError},
    timing,
};

mod exchange;
mod io_helpers;

#[cfg(feature = "hid")]
pub mod hidapi_link;

#[cfg(feature = "hid")]
pub use hidapi_link::{HidApiConnector, HidApiLink};

/// USB vendor id of the SARK-110 HID interface.
pub const SARK110_VID: u16 = 0x0483;
/// USB product id of the SARK-110 HID interface.
pub const SARK110_PID: u16 = 0x5750;

/// Bounds on a single exchange.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Full write+read cycles before giving up.
    pub max_attempts: u8,
    pub write_timeout: Duration,
    pub read_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: timing::MAX_EXCHANGE_ATTEMPTS,
            write_timeout: timing::WRITE_TIMEOUT,
            read_timeout: timing::READ_TIMEOUT,
        }
    }
}

/// An open link to one instrument. Dropping it releases the device.
#[derive(Debug)]
pub struct Connection<L> {
    link: L,
    vendor_id: u16,
    product_id: u16,
}

impl<L> Connection<L> {
    pub fn vendor_id(&self) -> u16 {
        self.vendor_id
    }

    pub fn product_id(&self) -> u16 {
        self.product_id
    }
}

/// Single owner of the instrument connection.
///
/// Not reentrant: one exchange is in flight at a time and every call blocks
/// until it completes or its retries run out.
pub struct Transport<C: HidConnector> {
    connector: C,
    connection: Option<Connection<C::Link>>,
    policy: RetryPolicy,
    vendor_id: u16,
    product_id: u16,
}

impl<C: HidConnector> Transport<C> {
    pub fn new(connector: C) -> Self {
        Transport {
            connector,
            connection: None,
            policy: RetryPolicy::default(),
            vendor_id: SARK110_VID,
            product_id: SARK110_PID,
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Overrides the identifiers used by [`open`](Self::open).
    pub fn with_device_ids(mut self, vendor_id: u16, product_id: u16) -> Self {
        self.vendor_id = vendor_id;
        self.product_id = product_id;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Locates and opens the instrument, closing any connection already open.
    pub fn open(&mut self) -> Result<(), TransportError<LinkError<C>>> {
        self.close();

        match self.connector.open(self.vendor_id, self.product_id) {
            Ok(link) => {
                info!(
                    "Connected to device {:04x}:{:04x}",
                    self.vendor_id, self.product_id
                );
                self.connection = Some(Connection {
                    link,
                    vendor_id: self.vendor_id,
                    product_id: self.product_id,
                });
                Ok(())
            }
            Err(e) => {
                warn!(
                    error = ?e,
                    "Cannot open device {:04x}:{:04x}",
                    self.vendor_id, self.product_id
                );
                Err(TransportError::DeviceNotFound {
                    vendor_id: self.vendor_id,
                    product_id: self.product_id,
                })
            }
        }
    }

    /// Releases the connection. Safe to call when nothing is open.
    pub fn close(&mut self) {
        if let Some(connection) = self.connection.take() {
            debug!(
                "Closing device {:04x}:{:04x}",
                connection.vendor_id, connection.product_id
            );
            drop(connection);
        }
    }

    pub fn is_open(&self) -> bool {
        self.connection.is_some()
    }

    pub fn connection(&self) -> Option<&Connection<C::Link>> {
        self.connection.as_ref()
    }
}
