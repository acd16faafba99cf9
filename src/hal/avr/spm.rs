//! Self-programming through SPMCSR + `spm`
//!
//! Only the lower 64K of flash is reachable (RAMPZ is left at 0), which
//! covers every address a 16-bit hex record can name.

use core::arch::asm;

use avr_device::atmega128a::BOOT_LOAD;

use crate::hal::SelfProgram;

const SPMEN: u8 = 1 << 0;
const PGERS: u8 = 1 << 1;
const PGWRT: u8 = 1 << 2;
const RWWSRE: u8 = 1 << 4;

/// SPM access from the boot section. Callers keep interrupts masked
/// between erase and `enable_rww`.
pub struct Spm;

impl Spm {
    /// Store `command` to SPMCSR (data address 0x68) and issue `spm` within
    /// the 4-cycle window.
    #[inline(always)]
    fn spm(command: u8, address: u16) {
        unsafe {
            asm!(
                "sts 0x68, {command}",
                "spm",
                command = in(reg) command,
                in("Z") address,
            );
        }
    }
}

impl SelfProgram for Spm {
    fn erase_page(&mut self, address: u16) {
        Self::spm(PGERS | SPMEN, address);
    }

    fn fill_word(&mut self, address: u16, word: u16) {
        unsafe {
            asm!(
                "mov r0, {low}",
                "mov r1, {high}",
                "sts 0x68, {command}",
                "spm",
                "clr r1",
                low = in(reg) word as u8,
                high = in(reg) (word >> 8) as u8,
                command = in(reg) SPMEN,
                in("Z") address,
            );
        }
    }

    fn write_page(&mut self, address: u16) {
        Self::spm(PGWRT | SPMEN, address);
    }

    fn wait_ready(&mut self) {
        let spmcsr = unsafe { &(*BOOT_LOAD::ptr()).spmcsr };
        while spmcsr.read().bits() & SPMEN != 0 {}
    }

    fn enable_rww(&mut self) {
        Self::spm(RWWSRE | SPMEN, 0);
    }
}
