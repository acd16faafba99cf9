//! Application flash programming via SPM
//!
//! A page commit is the only place the bootloader mutates flash. The sender
//! is paused first, then the whole erase/fill/write sequence runs with
//! interrupts masked; the receive interrupt is starved until it completes.

use embedded_hal::blocking::delay::DelayMs;
use ufmt::{uWrite, uwriteln};

use crate::config::FLOW_DRAIN_MS;
use crate::drivers::Hex16;
use crate::hal::{Interrupts, SelfProgram};
use crate::protocol::FlowControl;

pub struct FlashCommitter<F, I, D> {
    flash: F,
    interrupts: I,
    delay: D,
}

impl<F, I, D> FlashCommitter<F, I, D>
where
    F: SelfProgram,
    I: Interrupts,
    D: DelayMs<u8>,
{
    pub fn new(flash: F, interrupts: I, delay: D) -> Self {
        Self {
            flash,
            interrupts,
            delay,
        }
    }

    /// Erase the page at `start` and program it with `page`.
    ///
    /// `start` must be page aligned and `page` exactly one page long.
    pub fn commit<L>(&mut self, link: &mut L, start: u16, page: &[u8])
    where
        L: FlowControl + uWrite,
    {
        uwriteln!(link, "Programming page {}", Hex16(start)).ok();

        link.pause();
        self.delay.delay_ms(FLOW_DRAIN_MS);
        self.interrupts.disable();

        self.flash.erase_page(start);
        self.flash.wait_ready();

        for (offset, word) in (0u16..).step_by(2).zip(page.chunks_exact(2)) {
            self.flash
                .fill_word(start.wrapping_add(offset), u16::from_le_bytes([word[0], word[1]]));
        }

        self.flash.write_page(start);
        self.flash.wait_ready();

        self.flash.enable_rww();

        self.interrupts.enable();
        link.resume();
    }

    pub fn flash(&self) -> &F {
        &self.flash
    }

    pub fn release(self) -> (F, I, D) {
        (self.flash, self.interrupts, self.delay)
    }
}
