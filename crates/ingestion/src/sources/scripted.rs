//! Scripted line source for tests and dry runs

use std::collections::VecDeque;
use std::io;
use std::thread;
use std::time::Duration;

use contracts::LineSource;

/// Behaviour once every scripted line has been delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhenExhausted {
    /// Keep reporting read timeouts, like a quiet device
    Idle(Duration),
    /// Fail as if the device had been unplugged
    Fail,
}

/// Replays a fixed list of lines
pub struct ScriptedLineSource {
    name: String,
    lines: VecDeque<Vec<u8>>,
    when_exhausted: WhenExhausted,
}

impl ScriptedLineSource {
    pub fn new<I, S>(name: impl Into<String>, lines: I, when_exhausted: WhenExhausted) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            lines: lines.into_iter().map(|l| l.into().into_bytes()).collect(),
            when_exhausted,
        }
    }

    pub fn remaining(&self) -> usize {
        self.lines.len()
    }
}

impl LineSource for ScriptedLineSource {
    fn describe(&self) -> String {
        format!("script:{}", self.name)
    }

    fn read_line(&mut self) -> io::Result<Option<Vec<u8>>> {
        match self.lines.pop_front() {
            Some(line) => Ok(Some(line)),
            None => match self.when_exhausted {
                WhenExhausted::Idle(timeout) => {
                    thread::sleep(timeout);
                    Ok(None)
                }
                WhenExhausted::Fail => Err(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    format!("{} exhausted", self.name),
                )),
            },
        }
    }
}
