// src/transport/exchange.rs

use tracing::{debug, error, trace, warn};

use super::{io_helpers, RetryPolicy, Transport};
use crate::common::{
    error::{ExchangeFault, TransportError},
    frame::{CommandFrame, ResponseFrame, RX_SIZE},
    hal_traits::{HidConnector, HidLink, LinkError, LinkTimer},
};

impl<C: HidConnector> Transport<C> {
    /// Sends one request and returns the first response carrying a valid
    /// status byte.
    ///
    /// Write errors, read errors, timeouts and reports whose first byte is
    /// neither `'O'` nor `'E'` all consume one attempt. When the budget is
    /// spent the connection is closed and `RetriesExhausted` is returned. An
    /// `'E'` response is a successful exchange; interpreting it is the
    /// caller's job.
    pub fn exchange(
        &mut self,
        request: &CommandFrame,
    ) -> Result<ResponseFrame, TransportError<LinkError<C>>> {
        let policy = self.policy;
        let Some(connection) = self.connection.as_mut() else {
            return Err(TransportError::NotConnected);
        };

        let mut last_fault = ExchangeFault::Timeout;
        for attempt in 1..=policy.max_attempts {
            trace!(attempt, opcode = request.opcode_byte(), "Sending request");
            match attempt_once(&mut connection.link, request, &policy) {
                Ok(response) => {
                    if attempt > 1 {
                        debug!(attempt, "Exchange recovered after retry");
                    }
                    return Ok(response);
                }
                Err(fault) => {
                    warn!(
                        attempt,
                        max_attempts = policy.max_attempts,
                        "Exchange attempt failed: {}",
                        fault
                    );
                    last_fault = fault;
                }
            }
        }

        error!(
            attempts = policy.max_attempts,
            "Exchange failed, closing connection: {}", last_fault
        );
        self.close();
        Err(TransportError::RetriesExhausted {
            attempts: policy.max_attempts,
            last: last_fault,
        })
    }
}

/// One write+read cycle on a fresh, zero-filled receive buffer.
///
/// Reports still queued from an earlier attempt (a late answer to a timed-out
/// request) are dropped before the write.
fn attempt_once<L>(
    link: &mut L,
    request: &CommandFrame,
    policy: &RetryPolicy,
) -> Result<ResponseFrame, ExchangeFault<L::Error>>
where
    L: HidLink + LinkTimer,
{
    let stale = io_helpers::discard_pending(link)?;
    if stale > 0 {
        debug!(stale, "Discarded stale input reports");
    }

    io_helpers::write_with_timeout(link, request.as_bytes(), policy.write_timeout)?;

    let mut buf = [0u8; RX_SIZE];
    let received = io_helpers::read_with_timeout(link, &mut buf, policy.read_timeout)?;
    if received < RX_SIZE {
        return Err(ExchangeFault::Truncated { len: received });
    }

    let response = ResponseFrame::from_bytes(buf);
    match response.status() {
        Some(_) => Ok(response),
        None => Err(ExchangeFault::Malformed { tag: response.tag() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::command::Opcode;
    use crate::common::timing;
    use crate::test_utils::{
        ok_rx_frame, request_frequency, tagged_frame, MockCommError, MockDevice, Reply,
    };

    fn open_transport(device: &MockDevice) -> Transport<crate::test_utils::MockConnector> {
        let mut transport = Transport::new(device.connector());
        transport.open().unwrap();
        transport
    }

    #[test]
    fn test_exchange_first_attempt() {
        let device = MockDevice::new();
        device.push(Reply::Frame(ok_rx_frame(50.0, 0.0)));
        let mut transport = open_transport(&device);

        let request = CommandFrame::new(Opcode::Version);
        let response = transport.exchange(&request).unwrap();
        assert_eq!(response.tag(), b'O');
        assert_eq!(device.write_count(), 1);
        assert_eq!(device.writes()[0], request.as_bytes().to_vec());
    }

    #[test]
    fn test_exchange_succeeds_on_third_attempt() {
        let device = MockDevice::new();
        device
            .push(Reply::WriteError)
            .push(Reply::ReadError)
            .push(Reply::Frame(tagged_frame(b'O')));
        let mut transport = open_transport(&device);

        let response = transport.exchange(&CommandFrame::new(Opcode::BattStat));
        assert!(response.is_ok());
        assert_eq!(device.write_count(), 3);
        assert!(transport.is_open());
    }

    #[test]
    fn test_exchange_skips_malformed_then_returns_third_unmodified() {
        let device = MockDevice::new();
        let mut good = ok_rx_frame(12.5, -3.0);
        good[17] = 0xA5;
        device
            .push(Reply::Frame(tagged_frame(0x00)))
            .push(Reply::Frame(tagged_frame(0x00)))
            .push(Reply::Frame(good));
        let mut transport = open_transport(&device);

        let response = transport.exchange(&CommandFrame::new(Opcode::MeasRx)).unwrap();
        assert_eq!(response.as_bytes(), &good);
        assert_eq!(device.write_count(), 3);
    }

    #[test]
    fn test_exchange_accepts_error_tag() {
        let device = MockDevice::new();
        device.push(Reply::Frame(tagged_frame(b'E')));
        let mut transport = open_transport(&device);

        let response = transport.exchange(&CommandFrame::new(Opcode::Buzzer)).unwrap();
        assert_eq!(response.tag(), b'E');
        assert_eq!(device.write_count(), 1);
    }

    #[test]
    fn test_exchange_exhausts_on_malformed_responses() {
        let device = MockDevice::new();
        for _ in 0..5 {
            device.push(Reply::Frame(tagged_frame(0x00)));
        }
        let mut transport = open_transport(&device);

        let result = transport.exchange(&CommandFrame::new(Opcode::MeasRx));
        assert_eq!(
            result,
            Err(TransportError::RetriesExhausted {
                attempts: 5,
                last: ExchangeFault::Malformed { tag: 0x00 },
            })
        );
        assert_eq!(device.write_count(), 5);
        assert!(!transport.is_open());
        assert_eq!(device.0.borrow().live_links, 0);
    }

    #[test]
    fn test_exchange_exhausts_on_silence() {
        let device = MockDevice::new();
        let mut transport = open_transport(&device);

        let result = transport.exchange(&CommandFrame::new(Opcode::Version));
        assert_eq!(
            result,
            Err(TransportError::RetriesExhausted {
                attempts: 5,
                last: ExchangeFault::Timeout,
            })
        );
        assert_eq!(device.write_count(), 5);
        let read_budget = timing::READ_TIMEOUT.as_micros() as u64 * 5;
        assert!(device.now_us() >= read_budget);
        assert!(!transport.is_open());
    }

    #[test]
    fn test_exchange_last_fault_is_reported() {
        let device = MockDevice::new();
        for _ in 0..4 {
            device.push(Reply::Frame(tagged_frame(0x00)));
        }
        device.push(Reply::WriteError);
        let mut transport = open_transport(&device);

        let result = transport.exchange(&CommandFrame::new(Opcode::Version));
        assert_eq!(
            result,
            Err(TransportError::RetriesExhausted {
                attempts: 5,
                last: ExchangeFault::Write(MockCommError),
            })
        );
    }

    /// 'O' report echoing the frequency field of `request`.
    fn echo_frame(request: &[u8]) -> [u8; RX_SIZE] {
        let mut frame = tagged_frame(b'O');
        frame[1..5].copy_from_slice(&request[1..5]);
        frame
    }

    #[test]
    fn test_late_answer_is_not_returned_to_next_request() {
        let device = MockDevice::new();
        let mut answered = 0;
        device.respond_with(move |request| {
            answered += 1;
            let frame = echo_frame(request);
            if answered == 1 {
                Reply::Delayed { after_us: 300_000, frame }
            } else {
                Reply::Frame(frame)
            }
        });
        let mut transport = open_transport(&device);

        let first = CommandFrame::new(Opcode::MeasRx).with_u32(1, 1_000_000);
        let response = transport.exchange(&first).unwrap();
        assert_eq!(request_frequency(response.as_bytes()), 1_000_000);
        assert_eq!(device.write_count(), 2);

        // the first attempt's answer lands while nothing is reading
        device.advance_us(200_000);

        let second = CommandFrame::new(Opcode::MeasRx).with_u32(1, 2_000_000);
        let response = transport.exchange(&second).unwrap();
        assert_eq!(request_frequency(response.as_bytes()), 2_000_000);
        assert_eq!(device.write_count(), 3);
        assert!(!device.has_pending_reports());
    }

    #[test]
    fn test_short_report_consumes_an_attempt() {
        let device = MockDevice::new();
        device
            .push(Reply::Short { frame: ok_rx_frame(50.0, 0.0), len: 5 })
            .push(Reply::Frame(ok_rx_frame(75.0, 0.0)));
        let mut transport = open_transport(&device);

        let response = transport.exchange(&CommandFrame::new(Opcode::MeasRx)).unwrap();
        assert_eq!(response.f32_at(1), 75.0);
        assert_eq!(device.write_count(), 2);
    }

    #[test]
    fn test_exchange_exhausts_on_short_reports() {
        let device = MockDevice::new();
        for _ in 0..5 {
            device.push(Reply::Short { frame: tagged_frame(b'O'), len: 9 });
        }
        let mut transport = open_transport(&device);

        let result = transport.exchange(&CommandFrame::new(Opcode::MeasRx));
        assert_eq!(
            result,
            Err(TransportError::RetriesExhausted {
                attempts: 5,
                last: ExchangeFault::Truncated { len: 9 },
            })
        );
        assert!(!transport.is_open());
    }

    #[test]
    fn test_exchange_without_connection() {
        let device = MockDevice::new();
        let mut transport = Transport::new(device.connector());

        let result = transport.exchange(&CommandFrame::new(Opcode::Version));
        assert_eq!(result, Err(TransportError::NotConnected));
        assert_eq!(device.write_count(), 0);
    }

    #[test]
    fn test_exchange_honours_custom_policy() {
        let device = MockDevice::new();
        let mut transport = Transport::new(device.connector()).with_policy(RetryPolicy {
            max_attempts: 2,
            ..RetryPolicy::default()
        });
        transport.open().unwrap();

        let result = transport.exchange(&CommandFrame::new(Opcode::Version));
        assert!(matches!(
            result,
            Err(TransportError::RetriesExhausted { attempts: 2, .. })
        ));
        assert_eq!(device.write_count(), 2);
    }
}
