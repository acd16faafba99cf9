//! Transport layer: interrupt-fed receive queue with XON/XOFF flow control
//!
//! The receive interrupt is the only producer and the main loop the only
//! consumer. Both reach the queue through a [`SharedQueue`], which runs the
//! access inside a critical section. Flow-control bytes are transmitted from
//! inside that same section so the `accepting` flag and the byte on the wire
//! can never disagree.

use core::cell::RefCell;

use embedded_hal::serial;
use ufmt::uWrite;

use super::record::ByteSource;
use crate::config::{RX_BUFFER_SIZE, RX_HIGH_WATER, RX_LOW_WATER, XOFF, XON};
use crate::drivers::SerialConsole;

/// Software flow-control request for the upstream sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowSignal {
    Stop,
    Resume,
}

impl FlowSignal {
    /// Byte transmitted for this request.
    pub const fn byte(self) -> u8 {
        match self {
            FlowSignal::Stop => XOFF,
            FlowSignal::Resume => XON,
        }
    }
}

/// Fixed-capacity FIFO of received bytes.
pub struct RxQueue {
    data: [u8; RX_BUFFER_SIZE],
    read_pos: usize,
    write_pos: usize,
    count: usize,
    accepting: bool,
}

impl RxQueue {
    pub const fn new() -> Self {
        Self {
            data: [0; RX_BUFFER_SIZE],
            read_pos: 0,
            write_pos: 0,
            count: 0,
            accepting: true,
        }
    }

    /// Append a byte received by the interrupt handler.
    ///
    /// A full queue drops the byte. Returns [`FlowSignal::Stop`] when this
    /// byte pushed occupancy over the high-water mark while the sender was
    /// still allowed to send; the caller must transmit it.
    pub fn enqueue(&mut self, byte: u8) -> Option<FlowSignal> {
        if self.count >= RX_BUFFER_SIZE {
            return None;
        }

        self.data[self.write_pos] = byte;
        self.write_pos = (self.write_pos + 1) % RX_BUFFER_SIZE;
        self.count += 1;

        if self.count > RX_HIGH_WATER {
            self.pause()
        } else {
            None
        }
    }

    /// Move up to `buffer.len()` bytes out in arrival order.
    pub fn read(&mut self, buffer: &mut [u8]) -> usize {
        let to_read = buffer.len().min(self.count);

        for slot in buffer.iter_mut().take(to_read) {
            *slot = self.data[self.read_pos];
            self.read_pos = (self.read_pos + 1) % RX_BUFFER_SIZE;
        }

        self.count -= to_read;
        to_read
    }

    /// Stop accepting bytes. Only the first call after a resume yields a signal.
    pub fn pause(&mut self) -> Option<FlowSignal> {
        if !self.accepting {
            return None;
        }

        self.accepting = false;
        Some(FlowSignal::Stop)
    }

    /// Accept bytes again once occupancy is below the low-water mark.
    pub fn resume(&mut self) -> Option<FlowSignal> {
        if self.accepting || self.count >= RX_LOW_WATER {
            return None;
        }

        self.accepting = true;
        Some(FlowSignal::Resume)
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn is_accepting(&self) -> bool {
        self.accepting
    }
}

impl Default for RxQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// An [`RxQueue`] shared with the receive interrupt.
pub trait SharedQueue {
    /// Run `f` on the queue with the receive interrupt locked out.
    fn with<R>(&self, f: impl FnOnce(&mut RxQueue) -> R) -> R;
}

// Single-context hosts have no interrupt to lock out.
impl SharedQueue for RefCell<RxQueue> {
    fn with<R>(&self, f: impl FnOnce(&mut RxQueue) -> R) -> R {
        f(&mut self.borrow_mut())
    }
}

/// Receive-interrupt body: store `byte` and send XOFF if the queue is filling up.
pub fn receive<Q, TX>(queue: &Q, tx: &mut TX, byte: u8)
where
    Q: SharedQueue + ?Sized,
    TX: serial::Write<u8>,
{
    queue.with(|q| {
        if let Some(signal) = q.enqueue(byte) {
            nb::block!(tx.write(signal.byte())).ok();
        }
    });
}

/// Edge-triggered stop/resume requests towards the sender.
pub trait FlowControl {
    fn pause(&mut self);
    fn resume(&mut self);
}

/// Main-loop side of the serial link: queued input plus console output.
pub struct SerialLink<'q, Q: ?Sized, TX> {
    queue: &'q Q,
    console: SerialConsole<TX>,
}

impl<'q, Q, TX> SerialLink<'q, Q, TX>
where
    Q: SharedQueue + ?Sized,
    TX: serial::Write<u8>,
{
    pub fn new(queue: &'q Q, tx: TX) -> Self {
        Self {
            queue,
            console: SerialConsole::new(tx),
        }
    }

    /// Announce readiness: an XON for senders that start paused, then a few
    /// blank lines to separate from whatever the terminal showed before.
    pub fn init(&mut self) {
        self.console.write_byte(XON).ok();
        self.console.write_str("\n\n\n\n").ok();
    }

    /// Copy queued bytes into `buffer`, returning how many were available.
    pub fn read(&mut self, buffer: &mut [u8]) -> usize {
        let count = self.queue.with(|q| q.read(buffer));
        self.resume();
        count
    }

    pub fn read_byte(&mut self) -> Option<u8> {
        let mut byte = [0u8];
        match self.read(&mut byte) {
            0 => None,
            _ => Some(byte[0]),
        }
    }

    fn signal(&mut self, request: fn(&mut RxQueue) -> Option<FlowSignal>) {
        let console = &mut self.console;
        self.queue.with(|q| {
            if let Some(signal) = request(q) {
                console.write_byte(signal.byte()).ok();
            }
        });
    }
}

impl<Q, TX> FlowControl for SerialLink<'_, Q, TX>
where
    Q: SharedQueue + ?Sized,
    TX: serial::Write<u8>,
{
    fn pause(&mut self) {
        self.signal(RxQueue::pause);
    }

    fn resume(&mut self) {
        self.signal(RxQueue::resume);
    }
}

impl<Q, TX> ByteSource for SerialLink<'_, Q, TX>
where
    Q: SharedQueue + ?Sized,
    TX: serial::Write<u8>,
{
    fn read(&mut self, buffer: &mut [u8]) -> usize {
        SerialLink::read(self, buffer)
    }
}

impl<Q, TX> uWrite for SerialLink<'_, Q, TX>
where
    Q: SharedQueue + ?Sized,
    TX: serial::Write<u8>,
{
    type Error = TX::Error;

    fn write_str(&mut self, s: &str) -> Result<(), Self::Error> {
        self.console.write_str(s)
    }
}
