//! Line source implementations
//!
//! - `SerialLineSource`: a real device opened through `serialport`
//! - `ScriptedLineSource`: canned lines for tests and dry runs

mod scripted;
mod serial;

pub use scripted::{ScriptedLineSource, WhenExhausted};
pub use serial::{ReaderLineSource, SerialLineSource, MAX_LINE_LEN};
