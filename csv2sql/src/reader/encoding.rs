//! Input encoding detection and streaming transcoding to UTF-8.
//!
//! Detection looks at a bounded prefix of the input only, so files of any
//! size are handled without reading them fully. UTF-8 input is passed
//! through untouched; single-byte encodings are decoded on the fly.

use std::fmt;
use std::io::{self, BufRead, Read};
use std::str::FromStr;

use encoding_rs::{CoderResult, Decoder, Encoding, ISO_8859_15, WINDOWS_1252};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Maximum number of bytes inspected for encoding detection (64 KB).
pub const DETECTION_SAMPLE_SIZE: usize = 64 * 1024;

/// Character encoding of the CSV input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputEncoding {
    /// Detect from a sample of the input
    #[default]
    #[serde(rename = "auto")]
    Auto,
    #[serde(rename = "utf-8")]
    Utf8,
    /// ISO-8859-1, decoded with the windows-1252 superset
    #[serde(rename = "iso-8859-1")]
    Latin1,
    /// ISO-8859-15: Latin-1 with the euro sign at 0xA4
    #[serde(rename = "iso-8859-15")]
    Latin9,
    #[serde(rename = "windows-1252")]
    Windows1252,
}

impl InputEncoding {
    /// Canonical label, as accepted by `--encoding`.
    pub fn label(self) -> &'static str {
        match self {
            InputEncoding::Auto => "auto",
            InputEncoding::Utf8 => "utf-8",
            InputEncoding::Latin1 => "iso-8859-1",
            InputEncoding::Latin9 => "iso-8859-15",
            InputEncoding::Windows1252 => "windows-1252",
        }
    }

    /// Whether bytes must be transcoded before CSV parsing.
    pub fn needs_decoding(self) -> bool {
        self.decoder_encoding().is_some()
    }

    fn decoder_encoding(self) -> Option<&'static Encoding> {
        match self {
            InputEncoding::Auto | InputEncoding::Utf8 => None,
            InputEncoding::Latin1 | InputEncoding::Windows1252 => Some(WINDOWS_1252),
            InputEncoding::Latin9 => Some(ISO_8859_15),
        }
    }
}

impl fmt::Display for InputEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for InputEncoding {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(InputEncoding::Auto),
            "utf-8" | "utf8" | "ascii" => Ok(InputEncoding::Utf8),
            "iso-8859-1" | "latin-1" | "latin1" => Ok(InputEncoding::Latin1),
            "iso-8859-15" | "latin-9" | "latin9" => Ok(InputEncoding::Latin9),
            "windows-1252" | "cp1252" => Ok(InputEncoding::Windows1252),
            other => Err(ConfigError::UnknownEncoding(other.to_string())),
        }
    }
}

/// Detect the encoding of a sample of raw bytes.
///
/// Valid UTF-8 (a multi-byte sequence cut off at the end of the sample is
/// tolerated) is always reported as UTF-8. Otherwise `chardet` is asked;
/// anything it names that is not a known single-byte encoding falls back
/// to windows-1252, which can decode every byte.
pub fn detect_encoding(sample: &[u8]) -> InputEncoding {
    match std::str::from_utf8(sample) {
        Ok(_) => return InputEncoding::Utf8,
        Err(e) if e.error_len().is_none() => return InputEncoding::Utf8,
        Err(_) => {}
    }

    let (charset, _confidence, _language) = chardet::detect(sample);
    match charset.to_lowercase().as_str() {
        "iso-8859-1" | "latin-1" | "latin1" => InputEncoding::Latin1,
        "iso-8859-15" | "latin-9" | "latin9" => InputEncoding::Latin9,
        _ => InputEncoding::Windows1252,
    }
}

/// Streaming decoder from a single-byte encoding to UTF-8.
pub struct DecodingReader<R> {
    inner: R,
    decoder: Decoder,
    out: Vec<u8>,
    pos: usize,
    done: bool,
}

impl<R: BufRead> DecodingReader<R> {
    /// Wraps `inner`, decoding it as `encoding`.
    ///
    /// UTF-8 callers should not decode at all; see
    /// [`InputEncoding::needs_decoding`]. Passing one anyway falls back to
    /// windows-1252.
    pub fn new(inner: R, encoding: InputEncoding) -> Self {
        debug_assert!(encoding.needs_decoding());
        let target = encoding.decoder_encoding().unwrap_or(WINDOWS_1252);
        Self {
            inner,
            decoder: target.new_decoder_without_bom_handling(),
            out: Vec::new(),
            pos: 0,
            done: false,
        }
    }
}

impl<R: BufRead> Read for DecodingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            if self.pos < self.out.len() {
                let n = buf.len().min(self.out.len() - self.pos);
                buf[..n].copy_from_slice(&self.out[self.pos..self.pos + n]);
                self.pos += n;
                return Ok(n);
            }
            if self.done || buf.is_empty() {
                return Ok(0);
            }

            self.out.clear();
            self.pos = 0;

            let input = self.inner.fill_buf()?;
            let last = input.is_empty();
            let capacity = self
                .decoder
                .max_utf8_buffer_length(input.len())
                .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "decode buffer overflow"))?;
            self.out.resize(capacity, 0);

            let (result, read, written, _) = self.decoder.decode_to_utf8(input, &mut self.out, last);
            self.out.truncate(written);
            self.inner.consume(read);

            if last && matches!(result, CoderResult::InputEmpty) {
                self.done = true;
            }
        }
    }
}
