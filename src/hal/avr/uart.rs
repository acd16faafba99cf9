use avr_device::atmega128a::USART0;
use avr_device::interrupt::{self, Mutex};
use core::cell::RefCell;
use core::convert::Infallible;
use embedded_hal::serial;

use crate::config::UBRR_VALUE;
use crate::protocol::transport;
use crate::protocol::{RxQueue, SharedQueue};

// UCSR0A / UCSR0B / UCSR0C bits
const UDRE0: u8 = 1 << 5;
const RXCIE0: u8 = 1 << 7;
const RXEN0: u8 = 1 << 4;
const TXEN0: u8 = 1 << 3;
const UCSZ01: u8 = 1 << 2;
const UCSZ00: u8 = 1 << 1;

// Filled by the USART0 RX interrupt, drained by the main loop
static RX_QUEUE: Mutex<RefCell<RxQueue>> = Mutex::new(RefCell::new(RxQueue::new()));

/// 8N1 at `UART_BAUD`, receiver interrupt enabled.
pub fn init() {
    unsafe {
        let p = &*USART0::ptr();
        p.ubrr0h.write(|w| w.bits((UBRR_VALUE >> 8) as u8));
        p.ubrr0l.write(|w| w.bits(UBRR_VALUE as u8));
        p.ucsr0b.write(|w| w.bits(RXEN0 | TXEN0 | RXCIE0));
        p.ucsr0c.write(|w| w.bits(UCSZ01 | UCSZ00));
    }
}

/// Handle to the interrupt-shared receive queue.
pub struct UsartRx;

impl UsartRx {
    pub fn queue() -> &'static UsartRx {
        &UsartRx
    }

    /// USART0 RX interrupt body.
    pub fn on_receive() {
        let byte = unsafe { (*USART0::ptr()).udr0.read().bits() };
        transport::receive(Self::queue(), &mut UsartTx, byte);
    }
}

impl SharedQueue for UsartRx {
    fn with<R>(&self, f: impl FnOnce(&mut RxQueue) -> R) -> R {
        interrupt::free(|cs| f(&mut RX_QUEUE.borrow(cs).borrow_mut()))
    }
}

/// Polled transmitter on USART0.
pub struct UsartTx;

impl serial::Write<u8> for UsartTx {
    type Error = Infallible;

    fn write(&mut self, byte: u8) -> nb::Result<(), Self::Error> {
        let p = unsafe { &*USART0::ptr() };
        if p.ucsr0a.read().bits() & UDRE0 == 0 {
            return Err(nb::Error::WouldBlock);
        }
        p.udr0.write(|w| unsafe { w.bits(byte) });
        Ok(())
    }

    fn flush(&mut self) -> nb::Result<(), Self::Error> {
        let p = unsafe { &*USART0::ptr() };
        if p.ucsr0a.read().bits() & UDRE0 == 0 {
            return Err(nb::Error::WouldBlock);
        }
        Ok(())
    }
}
