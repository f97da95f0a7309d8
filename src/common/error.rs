// src/common/error.rs

use core::fmt::Debug;

use super::command::Opcode;

/// Why a single write/read attempt failed.
///
/// Every variant counts against the same retry budget; the distinction is
/// kept so callers can tell a dead link from an out-of-sync one.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExchangeFault<E = ()>
where
    E: Debug,
{
    /// Underlying link error while sending the request.
    #[error("write error: {0:?}")]
    Write(E),

    /// Underlying link error while reading the response.
    #[error("read error: {0:?}")]
    Read(E),

    /// No report arrived (or could be sent) before the deadline.
    #[error("operation timed out")]
    Timeout,

    /// A report arrived whose status byte is neither `'O'` nor `'E'`.
    #[error("malformed response (status byte {tag:#04x})")]
    Malformed { tag: u8 },

    /// A report arrived shorter than a full response frame.
    #[error("truncated response ({len} bytes)")]
    Truncated { len: usize },
}

/// Errors raised by the transport channel.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError<E = ()>
where
    E: Debug,
{
    /// No instrument with the expected identifiers could be opened.
    #[error("no device found (vid {vendor_id:#06x}, pid {product_id:#06x})")]
    DeviceNotFound { vendor_id: u16, product_id: u16 },

    /// A request was made while no connection is open.
    #[error("not connected")]
    NotConnected,

    /// Every attempt of one exchange failed; the connection has been closed.
    #[error("exchange failed after {attempts} attempts, last: {last}")]
    RetriesExhausted { attempts: u8, last: ExchangeFault<E> },
}

/// Outcome of a typed command that did not produce a payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError<E = ()>
where
    E: Debug,
{
    /// The device answered with the ERROR tag.
    #[error("device rejected {opcode}")]
    DeviceRejected { opcode: Opcode },

    /// The exchange never produced an accepted response, or there is no connection.
    #[error("communication failure: {0}")]
    CommunicationFailure(TransportError<E>),
}

impl<E: Debug> CommandError<E> {
    /// True for failures that end the connection.
    pub fn is_communication_failure(&self) -> bool {
        matches!(self, CommandError::CommunicationFailure(_))
    }
}

impl<E: Debug> From<TransportError<E>> for CommandError<E> {
    fn from(e: TransportError<E>) -> Self {
        CommandError::CommunicationFailure(e)
    }
}
