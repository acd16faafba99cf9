//! Serial hex bootloader for the ATmega128
//!
//! Receives an image as hex records over USART0, programs it page by page
//! through SPM and starts the application. If no programming session is
//! requested before the takeover timer runs out, the existing application
//! is started unchanged.
#![cfg_attr(not(test), no_std)]
#![cfg_attr(target_arch = "avr", feature(asm_experimental_arch))]

pub mod bootloader;
pub mod config;
pub mod drivers;
pub mod hal;
pub mod protocol;

pub use bootloader::{BootReason, Bootloader, State};
