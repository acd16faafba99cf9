//! Hardware seams used by the bootloader core.
//!
//! Everything the protocol engine needs from the chip goes through the traits
//! below, so the engine itself runs unchanged on the ATmega128 and on a host
//! test harness. The AVR implementations live in `hal::avr`.

#[cfg(target_arch = "avr")]
pub mod avr;

/// Global interrupt enable flag.
pub trait Interrupts {
    /// Mask all interrupts (`cli`).
    fn disable(&mut self);

    /// Unmask interrupts (`sei`).
    fn enable(&mut self);
}

/// Self-programming (SPM) access to the application flash section.
///
/// Addresses are byte addresses. Erase and write start an operation that must
/// be awaited with [`SelfProgram::wait_ready`] before the next one.
pub trait SelfProgram {
    /// Start erasing the page containing `address`.
    fn erase_page(&mut self, address: u16);

    /// Load one little-endian word into the temporary page buffer.
    fn fill_word(&mut self, address: u16, word: u16);

    /// Start writing the temporary page buffer to the page at `address`.
    fn write_page(&mut self, address: u16);

    /// Block until the running erase or write has finished.
    fn wait_ready(&mut self);

    /// Make the read-while-write section readable again after programming.
    fn enable_rww(&mut self);
}

/// One-shot deadline backing the takeover timer.
pub trait Deadline {
    /// Start counting from zero.
    fn start(&mut self);

    /// Stop counting; the deadline can no longer fire.
    fn cancel(&mut self);

    /// `true` once the deadline has passed.
    fn expired(&mut self) -> bool;
}

/// The application image the bootloader hands over to.
pub trait Application {
    /// Point the interrupt vector table back at the application section.
    fn restore_vectors(&mut self);

    /// Jump to the application reset vector at address 0.
    fn start(&mut self) -> !;
}
