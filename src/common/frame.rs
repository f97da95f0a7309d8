// src/common/frame.rs

use super::codec;
use super::command::Opcode;

/// Size of every request report sent to the instrument.
pub const TX_SIZE: usize = 18;
/// Size of every response report received from the instrument.
pub const RX_SIZE: usize = 18;

/// Status tag in byte 0 of a response.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[repr(u8)]
pub enum Status {
    /// `'O'` - the command was executed.
    Ok = b'O',
    /// `'E'` - the device refused the command.
    Error = b'E',
}

impl Status {
    /// Returns `None` for any tag other than `'O'` or `'E'`.
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            b'O' => Some(Status::Ok),
            b'E' => Some(Status::Error),
            _ => None,
        }
    }
}

/// An outbound 18-byte request: opcode in byte 0, parameters at fixed offsets,
/// everything else zero.
///
/// Built once per request through the `with_*` methods and never mutated after
/// being handed to the transport.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct CommandFrame([u8; TX_SIZE]);

impl CommandFrame {
    pub fn new(opcode: Opcode) -> Self {
        let mut bytes = [0u8; TX_SIZE];
        bytes[0] = opcode as u8;
        CommandFrame(bytes)
    }

    pub fn with_u8(mut self, offset: usize, value: u8) -> Self {
        self.0[offset] = value;
        self
    }

    pub fn with_u16(mut self, offset: usize, value: u16) -> Self {
        self.0[offset..offset + 2].copy_from_slice(&codec::encode_u16(value));
        self
    }

    pub fn with_u32(mut self, offset: usize, value: u32) -> Self {
        self.0[offset..offset + 4].copy_from_slice(&codec::encode_u32(value));
        self
    }

    #[inline]
    pub fn opcode_byte(&self) -> u8 {
        self.0[0]
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8; TX_SIZE] {
        &self.0
    }
}

/// An inbound 18-byte response. The payload layout is not self-describing;
/// the caller knows it from the request it sent.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ResponseFrame([u8; RX_SIZE]);

impl ResponseFrame {
    pub fn from_bytes(bytes: [u8; RX_SIZE]) -> Self {
        ResponseFrame(bytes)
    }

    /// Raw status byte (byte 0).
    #[inline]
    pub fn tag(&self) -> u8 {
        self.0[0]
    }

    /// Parsed status, or `None` for a malformed / out-of-sync response.
    #[inline]
    pub fn status(&self) -> Option<Status> {
        Status::from_tag(self.tag())
    }

    #[inline]
    pub fn u8_at(&self, offset: usize) -> u8 {
        self.0[offset]
    }

    #[inline]
    pub fn u16_at(&self, offset: usize) -> u16 {
        codec::read_u16_at(&self.0, offset)
    }

    #[inline]
    pub fn u32_at(&self, offset: usize) -> u32 {
        codec::read_u32_at(&self.0, offset)
    }

    #[inline]
    pub fn f32_at(&self, offset: usize) -> f32 {
        codec::read_f32_at(&self.0, offset)
    }

    /// Half-float at `offset`, widened to `f32`.
    #[inline]
    pub fn half_at(&self, offset: usize) -> f32 {
        codec::read_half_at(&self.0, offset)
    }

    /// Bytes from `offset` to the end of the frame.
    #[inline]
    pub fn tail(&self, offset: usize) -> &[u8] {
        &self.0[offset..]
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8; RX_SIZE] {
        &self.0
    }
}
