//! Hex record framing and validation
//!
//! A record on the wire is `:LLAAAATT<data>CC`, every byte sent as two hex
//! digits. The decoder is fed one character at a time and yields a
//! [`Record`] once the length announced by the record itself has arrived.

use super::hex::{decode_byte, decode_u16};
use super::{RecordError, Result};
use crate::config::MAX_RECORD_DATA;

/// Start-of-record marker.
pub const RECORD_START: u8 = b':';

/// Characters in length + address + type + checksum.
const FRAME_CHARS: usize = 2 + 4 + 2 + 2;

/// Characters in the longest record the decoder buffers.
const MAX_RECORD_CHARS: usize = FRAME_CHARS + 2 * MAX_RECORD_DATA;

/// Polled byte input.
pub trait ByteSource {
    /// Copy available bytes into `buffer` without waiting; may return 0.
    fn read(&mut self, buffer: &mut [u8]) -> usize;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordType {
    Data,
    EndOfFile,
    Other(u8),
}

impl From<u8> for RecordType {
    fn from(value: u8) -> Self {
        match value {
            0x00 => RecordType::Data,
            0x01 => RecordType::EndOfFile,
            other => RecordType::Other(other),
        }
    }
}

/// A checksum-verified record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    kind: RecordType,
    address: u16,
    length: u8,
    data: [u8; MAX_RECORD_DATA],
}

impl Record {
    /// Validate and decode the characters following `:`.
    ///
    /// `chars` must hold exactly `10 + 2 * length` characters; the framer
    /// never completes a record longer than the buffer.
    fn parse(chars: &[u8]) -> Result<Self> {
        let length = decode_byte(&chars[0..2]);
        debug_assert!(usize::from(length) <= MAX_RECORD_DATA);

        let sum = chars
            .chunks_exact(2)
            .fold(0u8, |sum, pair| sum.wrapping_add(decode_byte(pair)));
        if sum != 0 {
            return Err(RecordError::Checksum { sum });
        }

        let mut data = [0u8; MAX_RECORD_DATA];
        let payload = &chars[8..8 + 2 * usize::from(length)];
        for (byte, pair) in data.iter_mut().zip(payload.chunks_exact(2)) {
            *byte = decode_byte(pair);
        }

        Ok(Self {
            kind: RecordType::from(decode_byte(&chars[6..8])),
            address: decode_u16(&chars[2..6]),
            length,
            data,
        })
    }

    pub fn kind(&self) -> RecordType {
        self.kind
    }

    pub fn address(&self) -> u16 {
        self.address
    }

    pub fn data(&self) -> &[u8] {
        &self.data[..usize::from(self.length)]
    }
}

/// Incremental record framer.
pub struct RecordDecoder {
    buffer: [u8; MAX_RECORD_CHARS],
    received: usize,
    in_record: bool,
}

impl RecordDecoder {
    pub const fn new() -> Self {
        Self {
            buffer: [0; MAX_RECORD_CHARS],
            received: 0,
            in_record: false,
        }
    }

    /// Consume one character of the stream.
    ///
    /// Characters outside a record are skipped until the next `:`. Returns the
    /// outcome once a record is complete or has outgrown the buffer.
    pub fn feed(&mut self, byte: u8) -> Option<Result<Record>> {
        if !self.in_record {
            if byte == RECORD_START {
                self.in_record = true;
                self.received = 0;
            }
            return None;
        }

        self.buffer[self.received] = byte;
        self.received += 1;

        if self.received < FRAME_CHARS {
            return None;
        }

        let length = decode_byte(&self.buffer[0..2]);
        let expected = FRAME_CHARS + 2 * usize::from(length);

        if self.received == expected {
            self.in_record = false;
            Some(Record::parse(&self.buffer[..self.received]))
        } else if self.received == MAX_RECORD_CHARS {
            self.in_record = false;
            Some(Err(RecordError::Oversized { length }))
        } else {
            None
        }
    }

    /// Pull characters from `source` until a record completes.
    ///
    /// Returns `WouldBlock` as soon as the source runs dry; progress is kept
    /// across calls.
    pub fn poll<S: ByteSource + ?Sized>(&mut self, source: &mut S) -> nb::Result<Record, RecordError> {
        let mut byte = [0u8];
        loop {
            if source.read(&mut byte) == 0 {
                return Err(nb::Error::WouldBlock);
            }
            if let Some(outcome) = self.feed(byte[0]) {
                return outcome.map_err(nb::Error::Other);
            }
        }
    }
}

impl Default for RecordDecoder {
    fn default() -> Self {
        Self::new()
    }
}
