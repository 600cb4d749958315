//! Serial device line source

use std::io::{self, Read};
use std::time::Duration;

use contracts::LineSource;
use serialport::SerialPort;
use tracing::{info, warn};

/// Longest line kept while waiting for a terminator. NMEA caps sentences at
/// 82 bytes, so anything this long is line noise.
pub const MAX_LINE_LEN: usize = 1024;

const READ_CHUNK: usize = 256;

/// Line source over an opened serial port
pub type SerialLineSource = ReaderLineSource<Box<dyn SerialPort>>;

impl SerialLineSource {
    /// Open `port` at `baud` with the given per-read timeout.
    pub fn open(port: &str, baud: u32, timeout: Duration) -> io::Result<Self> {
        let device = serialport::new(port, baud)
            .timeout(timeout)
            .open()
            .map_err(io::Error::from)?;
        info!(port = %port, baud, timeout_ms = timeout.as_millis() as u64, "serial port opened");
        Ok(ReaderLineSource::new(port, device))
    }
}

/// Splits a timed-out byte stream into lines.
///
/// Bytes of an unfinished line are kept across timeouts, so a sentence split
/// over several reads is still delivered whole. End of stream means the
/// device went away.
pub struct ReaderLineSource<R> {
    name: String,
    reader: R,
    buffer: Vec<u8>,
}

impl<R: Read + Send> ReaderLineSource<R> {
    pub fn new(name: impl Into<String>, reader: R) -> Self {
        Self {
            name: name.into(),
            reader,
            buffer: Vec::with_capacity(READ_CHUNK),
        }
    }

    fn take_line(&mut self) -> Option<Vec<u8>> {
        let end = self.buffer.iter().position(|&b| b == b'\n')?;
        let mut line: Vec<u8> = self.buffer.drain(..=end).collect();
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Some(line)
    }
}

impl<R: Read + Send> LineSource for ReaderLineSource<R> {
    fn describe(&self) -> String {
        self.name.clone()
    }

    fn read_line(&mut self) -> io::Result<Option<Vec<u8>>> {
        if let Some(line) = self.take_line() {
            return Ok(Some(line));
        }

        let mut chunk = [0u8; READ_CHUNK];
        match self.reader.read(&mut chunk) {
            Ok(0) => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("{} closed", self.name),
            )),
            Ok(n) => {
                self.buffer.extend_from_slice(&chunk[..n]);
                if let Some(line) = self.take_line() {
                    return Ok(Some(line));
                }
                if self.buffer.len() > MAX_LINE_LEN {
                    warn!(
                        port = %self.name,
                        bytes = self.buffer.len(),
                        "discarding unterminated input"
                    );
                    self.buffer.clear();
                }
                Ok(None)
            }
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
                ) =>
            {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}
