use embedded_hal::serial;
use ufmt::{uDisplay, uWrite, Formatter};

/// Blocking text output on the programming UART.
pub struct SerialConsole<TX> {
    tx: TX,
}

impl<TX: serial::Write<u8>> SerialConsole<TX> {
    pub fn new(tx: TX) -> Self {
        Self { tx }
    }

    pub fn write_byte(&mut self, byte: u8) -> Result<(), TX::Error> {
        nb::block!(self.tx.write(byte))
    }

    pub fn write_str(&mut self, s: &str) -> Result<(), TX::Error> {
        for byte in s.bytes() {
            self.write_byte(byte)?;
        }
        Ok(())
    }
}

impl<TX: serial::Write<u8>> uWrite for SerialConsole<TX> {
    type Error = TX::Error;

    fn write_str(&mut self, s: &str) -> Result<(), Self::Error> {
        SerialConsole::write_str(self, s)
    }
}

/// 16-bit value printed as `0x` followed by four lowercase hex digits.
#[derive(Clone, Copy)]
pub struct Hex16(pub u16);

impl uDisplay for Hex16 {
    fn fmt<W>(&self, f: &mut Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: uWrite + ?Sized,
    {
        const HEX_CHARS: [u8; 16] = *b"0123456789abcdef";

        let mut digits = [0u8; 4];
        for (i, digit) in digits.iter_mut().enumerate() {
            let shift = 12 - 4 * i;
            *digit = HEX_CHARS[usize::from((self.0 >> shift) as u8 & 0x0F)];
        }

        f.write_str("0x")?;
        f.write_str(core::str::from_utf8(&digits).unwrap_or("????"))
    }
}
