//! Configuration constants for the ATmega128 bootloader

/// CPU frequency in Hz
pub const CPU_FREQ_HZ: u32 = 16_000_000;

/// UART baud rate
pub const UART_BAUD: u32 = 38_400;

/// USART baud register value for `UART_BAUD` in normal-speed mode
pub const UBRR_VALUE: u16 = (CPU_FREQ_HZ / 16 / UART_BAUD - 1) as u16;

/// Receive queue capacity in bytes
pub const RX_BUFFER_SIZE: usize = 128;

/// Occupancy above which the sender is told to stop
pub const RX_HIGH_WATER: usize = RX_BUFFER_SIZE - 32;

/// Occupancy below which a stopped sender is told to resume
pub const RX_LOW_WATER: usize = RX_BUFFER_SIZE - 4;

/// Software flow control: resume sending
pub const XON: u8 = 0x11;

/// Software flow control: stop sending
pub const XOFF: u8 = 0x13;

/// Flash page size (SPM_PAGESIZE) in bytes
pub const SPM_PAGESIZE: usize = 256;

/// Value of an erased flash byte
pub const ERASED_BYTE: u8 = 0xFF;

/// Byte that starts a programming session
pub const TRIGGER_BYTE: u8 = b'p';

/// Timer 1 compare value for the takeover deadline (~4.2s at /1024)
pub const TAKEOVER_COMPARE: u16 = 65_535;

/// Time given to in-flight bytes after XOFF before flash is touched
pub const FLOW_DRAIN_MS: u8 = 1;

/// Largest data payload accepted in a single record
pub const MAX_RECORD_DATA: usize = 32;
