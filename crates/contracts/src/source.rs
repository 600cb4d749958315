//! LineSource trait - serial line input abstraction
//!
//! Decouples the source worker from the concrete device, so real serial
//! ports and scripted test inputs are driven by the same loop.

use std::io;

/// Line-oriented byte source with a bounded read timeout
pub trait LineSource: Send {
    /// Human-readable origin (port path, script name)
    fn describe(&self) -> String;

    /// Read one complete line.
    ///
    /// Returns `Ok(None)` when no complete line arrived within the read
    /// timeout. Any `Err` is treated as a lost device.
    fn read_line(&mut self) -> io::Result<Option<Vec<u8>>>;
}
