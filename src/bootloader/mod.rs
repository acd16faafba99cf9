//! Bootloader state machine
//!
//! ```text
//! AwaitingTrigger --'p'--> Programming --EOF record--> Booting
//!        \                                               ^
//!         `----------------- takeover timer ------------'
//! ```
//!
//! The driver is polled through [`Bootloader::step`]; every call does a
//! bounded amount of work except when a flash page has to be committed.

mod page;
mod takeover;

pub use page::PageBuffer;
pub use takeover::Takeover;

use embedded_hal::blocking::delay::DelayMs;
use ufmt::{uWrite, uwriteln};

use crate::config::{SPM_PAGESIZE, TRIGGER_BYTE};
use crate::drivers::FlashCommitter;
use crate::hal::{Application, Deadline, Interrupts, SelfProgram};
use crate::protocol::{ByteSource, FlowControl, RecordDecoder, RecordError, RecordType};

/// Why the application is being started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootReason {
    /// Nobody asked for a programming session in time.
    Timeout,
    /// An end-of-file record closed the programming session.
    Programmed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    AwaitingTrigger,
    Programming,
    Booting(BootReason),
}

pub struct Bootloader<L, F, I, D, T, A> {
    link: L,
    committer: FlashCommitter<F, I, D>,
    pages: PageBuffer<SPM_PAGESIZE>,
    decoder: RecordDecoder,
    takeover: Takeover<T>,
    interrupts: I,
    app: A,
    state: State,
}

impl<L, F, I, D, T, A> Bootloader<L, F, I, D, T, A>
where
    L: ByteSource + FlowControl + uWrite,
    F: SelfProgram,
    I: Interrupts + Clone,
    D: DelayMs<u8>,
    T: Deadline,
    A: Application,
{
    /// Prompt for a session and start the takeover deadline.
    pub fn new(mut link: L, flash: F, interrupts: I, delay: D, deadline: T, app: A) -> Self {
        uwriteln!(&mut link, "Press p to program").ok();

        Self {
            link,
            committer: FlashCommitter::new(flash, interrupts.clone(), delay),
            pages: PageBuffer::new(),
            decoder: RecordDecoder::new(),
            takeover: Takeover::arm(deadline),
            interrupts,
            app,
            state: State::AwaitingTrigger,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Advance the state machine by one poll.
    pub fn step(&mut self) -> State {
        self.state = match self.state {
            State::AwaitingTrigger => self.await_trigger(),
            State::Programming => self.program(),
            booting @ State::Booting(_) => booting,
        };
        self.state
    }

    /// Poll until a boot is due, then start the application.
    pub fn run(mut self) -> ! {
        loop {
            if let State::Booting(_) = self.step() {
                self.boot();
            }
        }
    }

    /// Flush any staged page and jump to the application.
    pub fn boot(&mut self) -> ! {
        let link = &mut self.link;
        let committer = &mut self.committer;
        self.pages.finish(|start, page| committer.commit(&mut *link, start, page));

        hand_off(&mut self.link, &mut self.takeover, &mut self.interrupts, &mut self.app)
    }

    pub fn flash(&self) -> &F {
        self.committer.flash()
    }

    fn await_trigger(&mut self) -> State {
        if self.takeover.expired() {
            return State::Booting(BootReason::Timeout);
        }

        let mut byte = [0u8];
        if self.link.read(&mut byte) == 0 || byte[0] != TRIGGER_BYTE {
            return State::AwaitingTrigger;
        }

        self.takeover.disarm();
        uwriteln!(&mut self.link, "Entering programming mode").ok();
        State::Programming
    }

    fn program(&mut self) -> State {
        let record = match self.decoder.poll(&mut self.link) {
            Ok(record) => record,
            Err(nb::Error::WouldBlock) => return State::Programming,
            Err(nb::Error::Other(RecordError::Checksum { .. })) => {
                uwriteln!(&mut self.link, "Checksum verification failed").ok();
                return State::Programming;
            }
            Err(nb::Error::Other(RecordError::Oversized { .. })) => {
                uwriteln!(&mut self.link, "Record too long").ok();
                return State::Programming;
            }
        };

        let link = &mut self.link;
        let committer = &mut self.committer;

        match record.kind() {
            RecordType::Data => {
                self.pages.absorb(record.address(), record.data(), |start, page| {
                    committer.commit(&mut *link, start, page)
                });
                State::Programming
            }
            RecordType::EndOfFile => {
                self.pages.finish(|start, page| committer.commit(&mut *link, start, page));
                State::Booting(BootReason::Programmed)
            }
            RecordType::Other(_) => State::Programming,
        }
    }
}

/// Final steps shared by the main loop and the takeover interrupt: stop the
/// deadline, say goodbye, give the vector table back and jump to address 0.
pub fn hand_off<W, T, I, A>(console: &mut W, takeover: &mut Takeover<T>, interrupts: &mut I, app: &mut A) -> !
where
    W: uWrite + ?Sized,
    T: Deadline,
    I: Interrupts,
    A: Application,
{
    takeover.disarm();
    uwriteln!(console, "Booting app").ok();

    interrupts.disable();
    app.restore_vectors();
    app.start()
}
