//! Input collaborator
//!
//! The producer pulls lines from a [`LineSource`]. Each line is returned by
//! value with its terminator stripped; an empty line is the sentinel that
//! ends the producer loop.
//!
//! Reader-backed sources never buffer more than [`line_byte_cap`] bytes of a
//! line. The rest of an oversize line is discarded up to its newline, so a
//! stream with no line breaks cannot grow memory.

use crate::config::{OversizePolicy, DEFAULT_MAX_LINE_LEN};
use duolog_core::{Error, Result};
use std::collections::VecDeque;
use std::io::{self, BufRead, Read};
use std::time::Duration;

/// A line-oriented text source read only by the producer.
pub trait LineSource: Send {
    /// Read the next line without its terminator
    ///
    /// Returns `Ok(None)` at end of input.
    fn read_line(&mut self) -> Result<Option<String>>;

    /// Bound lines to `max_chars` characters
    ///
    /// Sources may return a prefix of a longer line as long as the prefix
    /// still exceeds `max_chars`, so the line policy sees it as oversize.
    fn limit_line_len(&mut self, _max_chars: usize) {}
}

impl<S: LineSource + ?Sized> LineSource for Box<S> {
    fn read_line(&mut self) -> Result<Option<String>> {
        (**self).read_line()
    }

    fn limit_line_len(&mut self, max_chars: usize) {
        (**self).limit_line_len(max_chars)
    }
}

/// Strip a trailing `\n` or `\r\n`
pub fn strip_terminator(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

/// Bytes of line content kept for a `max_chars` limit
///
/// Any line longer than this holds more than `max_chars` characters, even
/// after dropping a split UTF-8 sequence at the cut.
pub fn line_byte_cap(max_chars: usize) -> usize {
    max_chars.saturating_mul(4).saturating_add(4)
}

/// Read one line into `buf`, keeping at most `cap` content bytes
///
/// Returns `(bytes consumed, truncated)`. A truncated line has had its tail
/// skipped up to and including the next newline.
fn read_capped<R: BufRead + ?Sized>(
    reader: &mut R,
    buf: &mut Vec<u8>,
    cap: usize,
) -> io::Result<(usize, bool)> {
    buf.clear();
    // Room for the content plus `\r\n`
    let limit = cap.saturating_add(2) as u64;
    let read = (&mut *reader).take(limit).read_until(b'\n', buf)?;
    if read == 0 || buf.last() == Some(&b'\n') || (read as u64) < limit {
        return Ok((read, false));
    }

    buf.truncate(cap);
    let skipped = skip_line(reader)?;
    Ok((read + skipped, true))
}

/// Discard input up to and including the next newline
fn skip_line<R: BufRead + ?Sized>(reader: &mut R) -> io::Result<usize> {
    let mut skipped = 0;
    loop {
        let available = match reader.fill_buf() {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        if available.is_empty() {
            return Ok(skipped);
        }
        match available.iter().position(|b| *b == b'\n') {
            Some(at) => {
                reader.consume(at + 1);
                return Ok(skipped + at + 1);
            }
            None => {
                let len = available.len();
                reader.consume(len);
                skipped += len;
            }
        }
    }
}

fn decode(mut buf: Vec<u8>, truncated: bool) -> Result<String> {
    if truncated {
        // The cut may have split the last character
        if let Err(e) = std::str::from_utf8(&buf) {
            if e.error_len().is_none() {
                buf.truncate(e.valid_up_to());
            }
        }
    }
    let line = String::from_utf8(buf)
        .map_err(|e| Error::InvalidInput(format!("input line is not valid UTF-8: {}", e)))?;
    Ok(strip_terminator(&line).to_string())
}

/// Line source over any buffered reader.
#[derive(Debug)]
pub struct BufReadSource<R> {
    reader: R,
    buf: Vec<u8>,
    cap: usize,
}

impl<R: BufRead> BufReadSource<R> {
    /// Wrap a buffered reader
    pub fn new(reader: R) -> Self {
        BufReadSource {
            reader,
            buf: Vec::new(),
            cap: line_byte_cap(DEFAULT_MAX_LINE_LEN),
        }
    }
}

impl<R: BufRead + Send> LineSource for BufReadSource<R> {
    fn read_line(&mut self) -> Result<Option<String>> {
        let (read, truncated) = read_capped(&mut self.reader, &mut self.buf, self.cap)?;
        if read == 0 {
            return Ok(None);
        }
        decode(std::mem::take(&mut self.buf), truncated).map(Some)
    }

    fn limit_line_len(&mut self, max_chars: usize) {
        self.cap = line_byte_cap(max_chars);
    }
}

/// Line source reading standard input.
///
/// The stdin lock is taken per read, so the source can be created on one
/// thread and used on another.
#[derive(Debug)]
pub struct StdinSource {
    buf: Vec<u8>,
    cap: usize,
}

impl StdinSource {
    /// Create a stdin source
    pub fn new() -> Self {
        StdinSource {
            buf: Vec::new(),
            cap: line_byte_cap(DEFAULT_MAX_LINE_LEN),
        }
    }
}

impl Default for StdinSource {
    fn default() -> Self {
        Self::new()
    }
}

impl LineSource for StdinSource {
    fn read_line(&mut self) -> Result<Option<String>> {
        let (read, truncated) = read_capped(&mut io::stdin().lock(), &mut self.buf, self.cap)?;
        if read == 0 {
            return Ok(None);
        }
        decode(std::mem::take(&mut self.buf), truncated).map(Some)
    }

    fn limit_line_len(&mut self, max_chars: usize) {
        self.cap = line_byte_cap(max_chars);
    }
}

/// Line source replaying a fixed script, optionally pausing before each line.
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    lines: VecDeque<String>,
    delay: Duration,
}

impl ScriptedSource {
    /// Replay `lines` with no delay
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ScriptedSource {
            lines: lines.into_iter().map(Into::into).collect(),
            delay: Duration::ZERO,
        }
    }

    /// Pause for `delay` before returning each line
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Lines not yet read
    pub fn remaining(&self) -> usize {
        self.lines.len()
    }
}

impl LineSource for ScriptedSource {
    fn read_line(&mut self) -> Result<Option<String>> {
        let Some(line) = self.lines.pop_front() else {
            return Ok(None);
        };
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        Ok(Some(strip_terminator(&line).to_string()))
    }
}

/// Length limit applied to every non-sentinel line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinePolicy {
    max_len: usize,
    oversize: OversizePolicy,
}

impl LinePolicy {
    /// Create a policy
    pub fn new(max_len: usize, oversize: OversizePolicy) -> Self {
        LinePolicy { max_len, oversize }
    }

    /// Maximum characters kept per line
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Check if `line` is the end-of-input sentinel
    pub fn is_sentinel(line: &str) -> bool {
        line.is_empty()
    }

    /// Apply the length limit
    ///
    /// Truncation counts characters, never splitting a UTF-8 sequence. For a
    /// line a source already cut short, `InputTooLong` reports the length of
    /// the part that was read.
    pub fn admit(&self, line: String) -> Result<String> {
        let len = line.chars().count();
        if len <= self.max_len {
            return Ok(line);
        }
        match self.oversize {
            OversizePolicy::Reject => Err(Error::InputTooLong {
                len,
                limit: self.max_len,
            }),
            OversizePolicy::Truncate => {
                tracing::warn!(len, limit = self.max_len, "truncating oversize input line");
                Ok(line.chars().take(self.max_len).collect())
            }
        }
    }
}
