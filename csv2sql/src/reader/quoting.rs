//! Quote structure check for the byte stream feeding the CSV parser.
//!
//! The `csv` crate accepts stray quotes and unterminated quoted fields
//! without complaint. [`QuoteChecker`] scans the stream as it passes
//! through and fails with a [`QuoteError`] on:
//!
//! - a `"` inside a field that did not start with one,
//! - a closing `"` followed by anything but `"`, the delimiter or a line break,
//! - end of input while a quoted field is still open.
//!
//! Bytes before the offending one are handed out first, so every complete
//! record ahead of the error still reaches the parser.

use std::io::{self, Read};

use crate::error::QuoteError;

const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldState {
    /// Nothing read yet in the current field
    Start,
    Unquoted,
    Quoted,
    /// A `"` seen inside a quoted field: either an escape or the closing quote
    QuoteInQuoted,
}

/// Pass-through reader rejecting malformed field quoting.
pub struct QuoteChecker<R> {
    inner: R,
    delimiter: u8,
    state: FieldState,
    line: u64,
    quote_line: u64,
    bom_seen: usize,
    pending: Option<QuoteError>,
}

impl<R: Read> QuoteChecker<R> {
    pub fn new(inner: R, delimiter: u8) -> Self {
        Self {
            inner,
            delimiter,
            state: FieldState::Start,
            line: 1,
            quote_line: 1,
            bom_seen: 0,
            pending: None,
        }
    }

    fn step(&mut self, byte: u8) -> Result<(), QuoteError> {
        if self.bom_seen < UTF8_BOM.len() {
            if self.line == 1 && self.state == FieldState::Start && byte == UTF8_BOM[self.bom_seen] {
                self.bom_seen += 1;
                return Ok(());
            }
            self.bom_seen = UTF8_BOM.len();
        }

        self.state = match (self.state, byte) {
            (FieldState::Start, b'"') => {
                self.quote_line = self.line;
                FieldState::Quoted
            }
            (FieldState::Quoted, b'"') => FieldState::QuoteInQuoted,
            (FieldState::QuoteInQuoted, b'"') => FieldState::Quoted,
            (FieldState::Quoted, _) => FieldState::Quoted,
            (FieldState::Unquoted, b'"') => return Err(QuoteError::bare_quote(self.line)),
            (_, b'\n') | (_, b'\r') => FieldState::Start,
            (_, b) if b == self.delimiter => FieldState::Start,
            (FieldState::QuoteInQuoted, _) => return Err(QuoteError::extraneous_quote(self.line)),
            _ => FieldState::Unquoted,
        };

        if byte == b'\n' {
            self.line += 1;
        }
        Ok(())
    }
}

impl<R: Read> Read for QuoteChecker<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if let Some(err) = self.pending.take() {
            return Err(err.into());
        }
        if buf.is_empty() {
            return Ok(0);
        }

        let n = self.inner.read(buf)?;
        if n == 0 {
            if self.state == FieldState::Quoted {
                return Err(QuoteError::unterminated(self.quote_line).into());
            }
            return Ok(0);
        }

        for (i, &byte) in buf[..n].iter().enumerate() {
            if let Err(err) = self.step(byte) {
                if i == 0 {
                    return Err(err.into());
                }
                self.pending = Some(err);
                return Ok(i);
            }
        }
        Ok(n)
    }
}
