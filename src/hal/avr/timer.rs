use avr_device::atmega128a::{TC0, TC1};
use embedded_hal::blocking::delay::DelayMs;

use crate::config::TAKEOVER_COMPARE;
use crate::hal::Deadline;

// TIMSK / TIFR bits for timer 1 compare A
const OCIE1A: u8 = 1 << 4;
const OCF1A: u8 = 1 << 4;

// TCCR1B: CTC on OCR1A, clk/1024
const WGM12: u8 = 1 << 3;
const CS1_DIV1024: u8 = 0b101;

// TCCR0: clk/64 (timer 0 has its own prescaler table on this part)
const CS0_DIV64: u8 = 0b100;

/// Takeover deadline on timer 1 compare match A.
///
/// The compare-match interrupt is enabled while armed; its handler starts
/// the application directly.
pub struct Tc1Deadline;

impl Deadline for Tc1Deadline {
    fn start(&mut self) {
        unsafe {
            let tc1 = &*TC1::ptr();
            let tc0 = &*TC0::ptr();
            tc1.tccr1a.write(|w| w.bits(0));
            tc1.tcnt1.write(|w| w.bits(0));
            tc1.ocr1a.write(|w| w.bits(TAKEOVER_COMPARE));
            tc0.tifr.write(|w| w.bits(OCF1A));
            tc0.timsk.modify(|r, w| w.bits(r.bits() | OCIE1A));
            tc1.tccr1b.write(|w| w.bits(WGM12 | CS1_DIV1024));
        }
    }

    fn cancel(&mut self) {
        unsafe {
            (*TC1::ptr()).tccr1b.write(|w| w.bits(0));
            (*TC0::ptr()).timsk.modify(|r, w| w.bits(r.bits() & !OCIE1A));
        }
    }

    fn expired(&mut self) -> bool {
        unsafe { (*TC0::ptr()).tifr.read().bits() & OCF1A != 0 }
    }
}

/// Busy-wait millisecond delay on timer 0.
pub struct Tc0Delay;

impl DelayMs<u8> for Tc0Delay {
    fn delay_ms(&mut self, ms: u8) {
        // 16MHz/64 = 250kHz, 250 ticks = 1ms
        unsafe {
            let p = &*TC0::ptr();
            p.tcnt0.write(|w| w.bits(0));
            p.tccr0.write(|w| w.bits(CS0_DIV64));

            for _ in 0..ms {
                while p.tcnt0.read().bits() < 250 {}
                p.tcnt0.write(|w| w.bits(0));
            }

            p.tccr0.write(|w| w.bits(0));
        }
    }
}
