//! Serial programming protocol: hex records over a flow-controlled byte stream

pub mod hex;
pub mod record;
pub mod transport;

pub use record::{ByteSource, Record, RecordDecoder, RecordType};
pub use transport::{FlowControl, FlowSignal, RxQueue, SerialLink, SharedQueue};

/// Reasons a framed record is discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordError {
    /// Decoded bytes summed to `sum` instead of zero.
    Checksum { sum: u8 },
    /// Length field exceeds what a record may carry.
    Oversized { length: u8 },
}

pub type Result<T> = core::result::Result<T, RecordError>;
