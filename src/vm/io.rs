//! Input and output streams for the IN and OUT opcodes.
//!
//! Both streams are line oriented: one signed integer per line.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

/// Where IN takes its values from.
pub trait InputSource {
    /// Next value, or `None` once the source is exhausted.
    fn next_value(&mut self) -> io::Result<Option<i64>>;
}

/// Where OUT sends its values.
pub trait OutputSink {
    fn emit(&mut self, value: i64) -> io::Result<()>;
}

impl InputSource for VecDeque<i64> {
    fn next_value(&mut self) -> io::Result<Option<i64>> {
        Ok(self.pop_front())
    }
}

impl<I: InputSource + ?Sized> InputSource for &mut I {
    fn next_value(&mut self) -> io::Result<Option<i64>> {
        (**self).next_value()
    }
}

impl OutputSink for Vec<i64> {
    fn emit(&mut self, value: i64) -> io::Result<()> {
        self.push(value);
        Ok(())
    }
}

impl<O: OutputSink + ?Sized> OutputSink for &mut O {
    fn emit(&mut self, value: i64) -> io::Result<()> {
        (**self).emit(value)
    }
}

/// Reads one integer per line from any buffered reader.
///
/// Blank lines are skipped. Blocks until a line is available.
pub struct LineReader<R> {
    inner: R,
    line: String,
}

impl<R: BufRead> LineReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, line: String::new() }
    }
}

impl LineReader<io::StdinLock<'static>> {
    /// Values typed on the process's standard input.
    pub fn stdin() -> Self {
        Self::new(io::stdin().lock())
    }
}

impl<R: BufRead> InputSource for LineReader<R> {
    fn next_value(&mut self) -> io::Result<Option<i64>> {
        loop {
            self.line.clear();
            if self.inner.read_line(&mut self.line)? == 0 {
                return Ok(None);
            }
            let text = self.line.trim();
            if text.is_empty() {
                continue;
            }
            return text.parse().map(Some).map_err(|e| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("expected an integer, got `{}`: {}", text, e),
                )
            });
        }
    }
}

/// Writes one integer per line.
pub struct LineWriter<W> {
    inner: W,
}

impl<W: Write> LineWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl LineWriter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> OutputSink for LineWriter<W> {
    fn emit(&mut self, value: i64) -> io::Result<()> {
        writeln!(self.inner, "{}", value)?;
        self.inner.flush()
    }
}
