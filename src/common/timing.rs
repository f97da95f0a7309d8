// src/common/timing.rs

use core::time::Duration;

// === Exchange Timing ===

/// Deadline for handing one request report to the device.
pub const WRITE_TIMEOUT: Duration = Duration::from_millis(100);
/// Deadline for the response report. Longer than the write deadline because
/// the device measures before it answers.
pub const READ_TIMEOUT: Duration = Duration::from_millis(220);

/// Sleep between polls of a link that returned `WouldBlock`.
pub const POLL_INTERVAL_US: u32 = 100;

// === Retry ===

/// Full write+read cycles attempted per exchange.
pub const MAX_EXCHANGE_ATTEMPTS: u8 = 5;

/// Worst-case time one exchange can block (every attempt timing out).
pub const EXCHANGE_WORST_CASE: Duration = Duration::from_millis(
    (WRITE_TIMEOUT.as_millis() as u64 + READ_TIMEOUT.as_millis() as u64) * MAX_EXCHANGE_ATTEMPTS as u64,
);
