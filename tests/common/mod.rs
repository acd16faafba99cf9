//! Simulated ATmega128 for driving the bootloader on the host.
#![allow(dead_code)]

use std::cell::RefCell;
use std::convert::Infallible;
use std::rc::Rc;

use atmega128_bootloader::config::{SPM_PAGESIZE, XOFF, XON};
use atmega128_bootloader::hal::{Application, Deadline, Interrupts, SelfProgram};
use atmega128_bootloader::protocol::{transport, RxQueue, SerialLink};
use atmega128_bootloader::{Bootloader, State};
use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::serial;

pub const FLASH_SIZE: usize = 0x1_0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Sent(u8),
    InterruptsOff,
    InterruptsOn,
    Delay(u8),
    Erase(u16),
    Fill(u16, u16),
    Write(u16),
    WaitReady,
    EnableRww,
    DeadlineStart,
    DeadlineCancel,
    RestoreVectors,
    Jump,
}

pub type Log = Rc<RefCell<Vec<Event>>>;

pub fn new_log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

pub struct SimTx(pub Log);

impl serial::Write<u8> for SimTx {
    type Error = Infallible;

    fn write(&mut self, byte: u8) -> nb::Result<(), Infallible> {
        self.0.borrow_mut().push(Event::Sent(byte));
        Ok(())
    }

    fn flush(&mut self) -> nb::Result<(), Infallible> {
        Ok(())
    }
}

#[derive(Clone)]
pub struct SimInterrupts(pub Log);

impl Interrupts for SimInterrupts {
    fn disable(&mut self) {
        self.0.borrow_mut().push(Event::InterruptsOff);
    }

    fn enable(&mut self) {
        self.0.borrow_mut().push(Event::InterruptsOn);
    }
}

pub struct SimDelay(pub Log);

impl DelayMs<u8> for SimDelay {
    fn delay_ms(&mut self, ms: u8) {
        self.0.borrow_mut().push(Event::Delay(ms));
    }
}

/// Flash with an SPM-style temporary page buffer.
pub struct SimFlash {
    log: Log,
    pub memory: Vec<u8>,
    page_buffer: Vec<u8>,
}

impl SimFlash {
    pub fn new(log: Log) -> Self {
        Self {
            log,
            memory: vec![0xFF; FLASH_SIZE],
            page_buffer: vec![0xFF; SPM_PAGESIZE],
        }
    }

    pub fn page(&self, start: usize) -> &[u8] {
        &self.memory[start..start + SPM_PAGESIZE]
    }
}

impl SelfProgram for SimFlash {
    fn erase_page(&mut self, address: u16) {
        self.log.borrow_mut().push(Event::Erase(address));
        let start = usize::from(address) / SPM_PAGESIZE * SPM_PAGESIZE;
        self.memory[start..start + SPM_PAGESIZE].fill(0xFF);
    }

    fn fill_word(&mut self, address: u16, word: u16) {
        self.log.borrow_mut().push(Event::Fill(address, word));
        let offset = usize::from(address) % SPM_PAGESIZE;
        self.page_buffer[offset..offset + 2].copy_from_slice(&word.to_le_bytes());
    }

    fn write_page(&mut self, address: u16) {
        self.log.borrow_mut().push(Event::Write(address));
        let start = usize::from(address) / SPM_PAGESIZE * SPM_PAGESIZE;
        // Programming can only clear bits
        for (cell, &new) in self.memory[start..start + SPM_PAGESIZE].iter_mut().zip(&self.page_buffer) {
            *cell &= new;
        }
        self.page_buffer.fill(0xFF);
    }

    fn wait_ready(&mut self) {
        self.log.borrow_mut().push(Event::WaitReady);
    }

    fn enable_rww(&mut self) {
        self.log.borrow_mut().push(Event::EnableRww);
    }
}

/// Expires after a fixed number of polls, or never.
pub struct SimDeadline {
    log: Log,
    polls_left: Option<u32>,
}

impl Deadline for SimDeadline {
    fn start(&mut self) {
        self.log.borrow_mut().push(Event::DeadlineStart);
    }

    fn cancel(&mut self) {
        self.log.borrow_mut().push(Event::DeadlineCancel);
    }

    fn expired(&mut self) -> bool {
        match self.polls_left.as_mut() {
            Some(0) => true,
            Some(left) => {
                *left -= 1;
                false
            }
            None => false,
        }
    }
}

pub struct SimApp(pub Log);

impl Application for SimApp {
    fn restore_vectors(&mut self) {
        self.0.borrow_mut().push(Event::RestoreVectors);
    }

    fn start(&mut self) -> ! {
        self.0.borrow_mut().push(Event::Jump);
        panic!("jumped to application");
    }
}

pub type SimLink<'q> = SerialLink<'q, RefCell<RxQueue>, SimTx>;
pub type SimBootloader<'q> =
    Bootloader<SimLink<'q>, SimFlash, SimInterrupts, SimDelay, SimDeadline, SimApp>;

pub fn bootloader<'q>(queue: &'q RefCell<RxQueue>, log: &Log, deadline_polls: Option<u32>) -> SimBootloader<'q> {
    Bootloader::new(
        SerialLink::new(queue, SimTx(log.clone())),
        SimFlash::new(log.clone()),
        SimInterrupts(log.clone()),
        SimDelay(log.clone()),
        SimDeadline {
            log: log.clone(),
            polls_left: deadline_polls,
        },
        SimApp(log.clone()),
    )
}

/// Upstream sender that honours XON/XOFF: bytes only go out while the
/// bootloader is accepting, a few at a time between polls.
pub fn run_session(bootloader: &mut SimBootloader<'_>, queue: &RefCell<RxQueue>, log: &Log, input: &[u8]) -> State {
    let mut isr_tx = SimTx(log.clone());
    let mut pending = input;

    for _ in 0..1_000_000 {
        let mut burst = 0;
        while !pending.is_empty() && burst < 8 && queue.borrow().is_accepting() {
            transport::receive(queue, &mut isr_tx, pending[0]);
            pending = &pending[1..];
            burst += 1;
        }

        let state = bootloader.step();
        match state {
            State::Booting(_) => return state,
            // Input used up mid-session: the bootloader waits forever from here
            State::Programming if pending.is_empty() && queue.borrow().is_empty() => return state,
            _ => {}
        }
    }
    panic!("session did not finish");
}

/// Run `Bootloader::boot`, catching the simulated jump.
pub fn boot(bootloader: &mut SimBootloader<'_>) {
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        bootloader.boot();
    }));
    assert!(result.is_err(), "boot must never return");
}

/// Text written to the console, flow-control bytes removed.
pub fn console_text(log: &Log) -> String {
    log.borrow()
        .iter()
        .filter_map(|event| match *event {
            Event::Sent(byte) if byte != XON && byte != XOFF => Some(char::from(byte)),
            _ => None,
        })
        .collect()
}

pub fn count(log: &Log, matches: impl Fn(&Event) -> bool) -> usize {
    log.borrow().iter().filter(|event| matches(event)).count()
}

/// Encode one record as `:LLAAAATT<data>CC`.
pub fn record(address: u16, kind: u8, data: &[u8]) -> String {
    let mut bytes = vec![data.len() as u8, (address >> 8) as u8, address as u8, kind];
    bytes.extend_from_slice(data);
    let sum = bytes.iter().fold(0u8, |sum, &b| sum.wrapping_add(b));
    bytes.push(sum.wrapping_neg());

    let mut line = String::from(":");
    for byte in bytes {
        line.push_str(&format!("{byte:02X}"));
    }
    line.push_str("\r\n");
    line
}

pub fn end_of_file() -> String {
    record(0, 0x01, &[])
}
