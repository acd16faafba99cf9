pub mod flash;
pub mod serial_console;

pub use flash::FlashCommitter;
pub use serial_console::{Hex16, SerialConsole};
