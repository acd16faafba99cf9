use core::arch::asm;

use avr_device::atmega128a::CPU;

use crate::hal::{Application, Interrupts};

// MCUCR
const IVCE: u8 = 1 << 0;
const IVSEL: u8 = 1 << 1;

/// Global interrupt flag.
#[derive(Clone, Copy)]
pub struct Cpu;

impl Interrupts for Cpu {
    #[inline]
    fn disable(&mut self) {
        avr_device::interrupt::disable();
    }

    #[inline]
    fn enable(&mut self) {
        unsafe { avr_device::interrupt::enable() };
    }
}

/// Interrupt vector placement.
pub struct BootVectors;

impl BootVectors {
    /// Move the vector table to the start of the boot section so the
    /// bootloader's own handlers are used. Interrupts must be masked.
    pub fn claim() {
        unsafe {
            let mcucr = &(*CPU::ptr()).mcucr;
            mcucr.write(|w| w.bits(IVCE));
            mcucr.write(|w| w.bits(IVSEL));
        }
    }

    /// Put the vector table back at address 0 for the application.
    pub fn release() {
        unsafe {
            let mcucr = &(*CPU::ptr()).mcucr;
            mcucr.write(|w| w.bits(IVCE));
            mcucr.write(|w| w.bits(0x00));
        }
    }
}

/// Application image starting at flash address 0.
pub struct ResetVector;

impl Application for ResetVector {
    fn restore_vectors(&mut self) {
        BootVectors::release();
    }

    fn start(&mut self) -> ! {
        unsafe { asm!("jmp 0", options(noreturn)) }
    }
}
