// src/transport/io_helpers.rs

use core::time::Duration;

use crate::common::{
    error::ExchangeFault,
    frame::RX_SIZE,
    hal_traits::{HidLink, LinkTimer},
    timing,
};

/// Upper bound on reports thrown away before one request.
const MAX_STALE_REPORTS: usize = 64;

/// Result of a deadline-bounded poll that did not succeed.
#[derive(Debug, PartialEq, Eq)]
enum PollFailure<E> {
    Timeout,
    Io(E),
}

/// Executes a non-blocking I/O operation (`f`) repeatedly until it
/// stops returning `WouldBlock`, returning the final result or a timeout.
fn execute_blocking_io_with_timeout<L, T, F>(
    link: &mut L,
    timeout: Duration,
    mut f: F,
) -> Result<T, PollFailure<L::Error>>
where
    L: HidLink + LinkTimer,
    F: FnMut(&mut L) -> nb::Result<T, L::Error>,
{
    let deadline = link.now() + timeout;

    loop {
        match f(link) {
            Ok(result) => return Ok(result),
            Err(nb::Error::WouldBlock) => {
                if link.now() >= deadline {
                    return Err(PollFailure::Timeout);
                }
                link.delay_us(timing::POLL_INTERVAL_US);
            }
            Err(nb::Error::Other(e)) => return Err(PollFailure::Io(e)),
        }
    }
}

/// Sends one request report within `timeout`.
pub(super) fn write_with_timeout<L>(
    link: &mut L,
    report: &[u8],
    timeout: Duration,
) -> Result<usize, ExchangeFault<L::Error>>
where
    L: HidLink + LinkTimer,
{
    execute_blocking_io_with_timeout(link, timeout, |l| l.write_report(report)).map_err(|e| match e {
        PollFailure::Timeout => ExchangeFault::Timeout,
        PollFailure::Io(e) => ExchangeFault::Write(e),
    })
}

/// Reads one response report into `buf` within `timeout`.
pub(super) fn read_with_timeout<L>(
    link: &mut L,
    buf: &mut [u8],
    timeout: Duration,
) -> Result<usize, ExchangeFault<L::Error>>
where
    L: HidLink + LinkTimer,
{
    execute_blocking_io_with_timeout(link, timeout, |l| match l.read_report(buf) {
        Ok(0) => Err(nb::Error::WouldBlock),
        other => other,
    })
    .map_err(|e| match e {
        PollFailure::Timeout => ExchangeFault::Timeout,
        PollFailure::Io(e) => ExchangeFault::Read(e),
    })
}

/// Reads and drops every input report already waiting on the link, so the
/// next read can only see an answer to the next write. Returns the number
/// of reports dropped.
pub(super) fn discard_pending<L>(link: &mut L) -> Result<usize, ExchangeFault<L::Error>>
where
    L: HidLink,
{
    let mut scratch = [0u8; RX_SIZE];
    let mut discarded = 0;
    while discarded < MAX_STALE_REPORTS {
        match link.read_report(&mut scratch) {
            Ok(0) | Err(nb::Error::WouldBlock) => break,
            Ok(_) => discarded += 1,
            Err(nb::Error::Other(e)) => return Err(ExchangeFault::Read(e)),
        }
    }
    Ok(discarded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::hal_traits::HidConnector;
    use crate::test_utils::{tagged_frame, MockCommError, MockDevice, Reply};

    #[test]
    fn test_execute_blocking_io_with_timeout() {
        let device = MockDevice::new();
        let mut link = device.connector().open(0, 0).unwrap();

        // Ok path after a few WouldBlocks
        let mut calls = 0;
        let result = execute_blocking_io_with_timeout(&mut link, Duration::from_millis(10), |_| {
            calls += 1;
            if calls < 4 { Err(nb::Error::WouldBlock) } else { Ok(123) }
        });
        assert_eq!(result, Ok(123));
        assert_eq!(calls, 4);
        assert_eq!(device.now_us(), 3 * u64::from(timing::POLL_INTERVAL_US));

        // Timeout path
        let start = device.now_us();
        let result: Result<(), _> =
            execute_blocking_io_with_timeout(&mut link, Duration::from_millis(5), |_| Err(nb::Error::WouldBlock));
        assert_eq!(result, Err(PollFailure::Timeout));
        assert!(device.now_us() - start >= 5_000);

        // IO error path
        let result: Result<(), _> = execute_blocking_io_with_timeout(&mut link, Duration::from_millis(5), |_| {
            Err(nb::Error::Other(MockCommError))
        });
        assert_eq!(result, Err(PollFailure::Io(MockCommError)));
    }

    #[test]
    fn test_read_times_out_without_reply() {
        let device = MockDevice::new();
        device.push(Reply::Silent);
        let mut link = device.connector().open(0, 0).unwrap();

        write_with_timeout(&mut link, &[1u8; 18], timing::WRITE_TIMEOUT).unwrap();
        let mut buf = [0u8; 18];
        let result = read_with_timeout(&mut link, &mut buf, timing::READ_TIMEOUT);
        assert_eq!(result, Err(ExchangeFault::Timeout));
        assert!(device.now_us() >= timing::READ_TIMEOUT.as_micros() as u64);
    }

    #[test]
    fn test_read_and_write_errors_are_tagged() {
        let device = MockDevice::new();
        device.push(Reply::WriteError).push(Reply::ReadError);
        let mut link = device.connector().open(0, 0).unwrap();
        let mut buf = [0u8; 18];

        assert_eq!(
            write_with_timeout(&mut link, &[1u8; 18], timing::WRITE_TIMEOUT),
            Err(ExchangeFault::Write(MockCommError))
        );
        write_with_timeout(&mut link, &[1u8; 18], timing::WRITE_TIMEOUT).unwrap();
        assert_eq!(
            read_with_timeout(&mut link, &mut buf, timing::READ_TIMEOUT),
            Err(ExchangeFault::Read(MockCommError))
        );
    }

    #[test]
    fn test_discard_pending_drops_only_arrived_reports() {
        let device = MockDevice::new();
        device
            .push(Reply::Frame(tagged_frame(b'O')))
            .push(Reply::Delayed { after_us: 1_000, frame: tagged_frame(b'E') });
        let mut link = device.connector().open(0, 0).unwrap();

        write_with_timeout(&mut link, &[1u8; 18], timing::WRITE_TIMEOUT).unwrap();
        write_with_timeout(&mut link, &[2u8; 18], timing::WRITE_TIMEOUT).unwrap();
        assert_eq!(discard_pending(&mut link), Ok(1));
        assert_eq!(discard_pending(&mut link), Ok(0));

        let mut buf = [0u8; 18];
        assert_eq!(read_with_timeout(&mut link, &mut buf, timing::READ_TIMEOUT), Ok(18));
        assert_eq!(buf[0], b'E');
        assert!(device.now_us() >= 1_000);
    }

    #[test]
    fn test_read_copies_report() {
        let device = MockDevice::new();
        device.push(Reply::Frame(tagged_frame(b'O')));
        let mut link = device.connector().open(0, 0).unwrap();
        let mut buf = [0u8; 18];

        write_with_timeout(&mut link, &[1u8; 18], timing::WRITE_TIMEOUT).unwrap();
        assert_eq!(read_with_timeout(&mut link, &mut buf, timing::READ_TIMEOUT), Ok(18));
        assert_eq!(buf[0], b'O');
    }
}
