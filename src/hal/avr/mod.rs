//! ATmega128 implementations of the bootloader's hardware seams

pub mod cpu;
pub mod spm;
pub mod timer;
pub mod uart;

pub use cpu::{BootVectors, Cpu, ResetVector};
pub use spm::Spm;
pub use timer::{Tc0Delay, Tc1Deadline};
pub use uart::{UsartRx, UsartTx};
