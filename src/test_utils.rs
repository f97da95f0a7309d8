//! Shared mocks for unit tests: a scripted HID link with a simulated clock
//! and a connector that hands out links over the same shared state.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::ops::Add;
use std::rc::Rc;
use std::time::Duration;
use std::vec::Vec;

use crate::common::frame::RX_SIZE;
use crate::common::hal_traits::{HidConnector, HidLink, LinkTimer};

// --- Mock Instant ---
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct MockInstant(pub u64);

impl Add<Duration> for MockInstant {
    type Output = Self;
    fn add(self, rhs: Duration) -> Self {
        MockInstant(self.0.saturating_add(rhs.as_micros() as u64))
    }
}

// --- Mock Comm Error ---
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MockCommError;

/// What the mock device does with the next request it receives.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Answer with this report.
    Frame([u8; RX_SIZE]),
    /// Fail the write itself.
    WriteError,
    /// Accept the write, then fail the read.
    ReadError,
    /// Accept the write and never answer.
    Silent,
    /// Answer with this report `after_us` microseconds after the write.
    Delayed { after_us: u64, frame: [u8; RX_SIZE] },
    /// Answer with only the first `len` bytes of this report.
    Short { frame: [u8; RX_SIZE], len: usize },
}

type Responder = Box<dyn FnMut(&[u8]) -> Reply>;

#[derive(Default)]
pub struct MockState {
    pub now_us: u64,
    pub script: VecDeque<Reply>,
    pub responder: Option<Responder>,
    pub writes: Vec<Vec<u8>>,
    /// Replies in arrival order, each with the time it becomes readable.
    inbox: VecDeque<(u64, Reply)>,
    pub present: bool,
    pub opens: u32,
    pub live_links: u32,
    pub max_live_links: u32,
}

/// Handle shared between a test and the links it hands out.
#[derive(Clone)]
pub struct MockDevice(pub Rc<RefCell<MockState>>);

impl MockDevice {
    pub fn new() -> Self {
        let state = MockState { present: true, ..MockState::default() };
        MockDevice(Rc::new(RefCell::new(state)))
    }

    pub fn absent() -> Self {
        let device = Self::new();
        device.0.borrow_mut().present = false;
        device
    }

    pub fn push(&self, reply: Reply) -> &Self {
        self.0.borrow_mut().script.push_back(reply);
        self
    }

    /// Answers every unscripted request by calling `f` with the request bytes.
    pub fn respond_with<F>(&self, f: F)
    where
        F: FnMut(&[u8]) -> Reply + 'static,
    {
        self.0.borrow_mut().responder = Some(Box::new(f));
    }

    pub fn write_count(&self) -> usize {
        self.0.borrow().writes.len()
    }

    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.0.borrow().writes.clone()
    }

    pub fn now_us(&self) -> u64 {
        self.0.borrow().now_us
    }

    pub fn advance_us(&self, us: u64) {
        self.0.borrow_mut().now_us += us;
    }

    /// True while any reply, arrived or not, is still unread.
    pub fn has_pending_reports(&self) -> bool {
        !self.0.borrow().inbox.is_empty()
    }

    pub fn connector(&self) -> MockConnector {
        MockConnector { device: self.clone() }
    }
}

pub struct MockLink {
    device: MockDevice,
}

impl Drop for MockLink {
    fn drop(&mut self) {
        self.device.0.borrow_mut().live_links -= 1;
    }
}

impl LinkTimer for MockLink {
    type Instant = MockInstant;

    fn now(&self) -> Self::Instant {
        MockInstant(self.device.0.borrow().now_us)
    }

    fn delay_us(&mut self, us: u32) {
        let mut state = self.device.0.borrow_mut();
        state.now_us = state.now_us.saturating_add(u64::from(us));
    }
}

impl HidLink for MockLink {
    type Error = MockCommError;

    fn write_report(&mut self, report: &[u8]) -> nb::Result<usize, Self::Error> {
        let mut state = self.device.0.borrow_mut();
        state.writes.push(report.to_vec());

        let reply = match state.script.pop_front() {
            Some(reply) => reply,
            None => match state.responder.as_mut() {
                Some(responder) => responder(report),
                None => Reply::Silent,
            },
        };

        let now = state.now_us;
        match reply {
            Reply::WriteError => return Err(nb::Error::Other(MockCommError)),
            Reply::Silent => {}
            Reply::Delayed { after_us, frame } => state.deliver(now + after_us, Reply::Frame(frame)),
            other => state.deliver(now, other),
        }
        Ok(report.len())
    }

    fn read_report(&mut self, buf: &mut [u8]) -> nb::Result<usize, Self::Error> {
        let mut state = self.device.0.borrow_mut();
        let now = state.now_us;
        if !matches!(state.inbox.front(), Some((ready_at, _)) if *ready_at <= now) {
            return Err(nb::Error::WouldBlock);
        }
        match state.inbox.pop_front().map(|(_, reply)| reply) {
            Some(Reply::Frame(frame)) => Ok(copy_report(&frame, frame.len(), buf)),
            Some(Reply::Short { frame, len }) => Ok(copy_report(&frame, len, buf)),
            Some(Reply::ReadError) => Err(nb::Error::Other(MockCommError)),
            _ => Err(nb::Error::WouldBlock),
        }
    }
}

impl MockState {
    fn deliver(&mut self, ready_at: u64, reply: Reply) {
        let position = self
            .inbox
            .iter()
            .position(|(t, _)| *t > ready_at)
            .unwrap_or(self.inbox.len());
        self.inbox.insert(position, (ready_at, reply));
    }
}

fn copy_report(frame: &[u8], len: usize, buf: &mut [u8]) -> usize {
    let len = len.min(frame.len()).min(buf.len());
    buf[..len].copy_from_slice(&frame[..len]);
    len
}

pub struct MockConnector {
    device: MockDevice,
}

impl HidConnector for MockConnector {
    type Link = MockLink;

    fn open(&mut self, _vendor_id: u16, _product_id: u16) -> Result<MockLink, MockCommError> {
        let mut state = self.device.0.borrow_mut();
        if !state.present {
            return Err(MockCommError);
        }
        state.opens += 1;
        state.live_links += 1;
        state.max_live_links = state.max_live_links.max(state.live_links);
        Ok(MockLink { device: self.device.clone() })
    }
}

// --- Frame builders ---

pub fn tagged_frame(tag: u8) -> [u8; RX_SIZE] {
    let mut bytes = [0u8; RX_SIZE];
    bytes[0] = tag;
    bytes
}

pub fn ok_rx_frame(resistance: f32, reactance: f32) -> [u8; RX_SIZE] {
    let mut bytes = tagged_frame(b'O');
    bytes[1..5].copy_from_slice(&resistance.to_le_bytes());
    bytes[5..9].copy_from_slice(&reactance.to_le_bytes());
    bytes
}

pub fn ok_eff_frame(halves: [(u16, u16); 4]) -> [u8; RX_SIZE] {
    let mut bytes = tagged_frame(b'O');
    for (k, (r, x)) in halves.iter().enumerate() {
        let offset = 1 + k * 4;
        bytes[offset..offset + 2].copy_from_slice(&r.to_le_bytes());
        bytes[offset + 2..offset + 4].copy_from_slice(&x.to_le_bytes());
    }
    bytes
}

/// Frequency field of a recorded measurement request.
pub fn request_frequency(request: &[u8]) -> u32 {
    u32::from_le_bytes([request[1], request[2], request[3], request[4]])
}
