//! Pull-based CSV record source.
//!
//! Wraps a `csv::Reader` so records come out one at a time, each tagged with
//! the physical line it starts on. Broken quoting is rejected on the way in
//! (see [`quoting`]). Field counts are not checked here: the expected arity
//! is only known once the header has been read, so that is left to the SQL
//! emitter.

pub mod encoding;
pub mod quoting;

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use tracing::debug;

pub use encoding::{detect_encoding, DecodingReader, InputEncoding, DETECTION_SAMPLE_SIZE};
pub use quoting::QuoteChecker;

use crate::config::ConvertOptions;
use crate::error::{ConvertError, ConvertResult};

/// One logical row of the CSV input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    line: u64,
    fields: Vec<String>,
}

impl Record {
    /// Record starting on physical line `line`.
    pub fn new(line: u64, fields: Vec<String>) -> Self {
        Self { line, fields }
    }

    /// Physical line (1-based) the record starts on.
    pub fn line(&self) -> u64 {
        self.line
    }

    /// Field values in input order.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Mutable access for in-place rewriting of the header.
    pub fn fields_mut(&mut self) -> &mut [String] {
        &mut self.fields
    }

    /// Number of fields. A parsed record always has at least one.
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }
}

/// Byte stream feeding the CSV parser, transcoded when needed.
pub enum InputStream<R> {
    Plain(BufReader<R>),
    Decoded(DecodingReader<BufReader<R>>),
}

impl<R: Read> Read for InputStream<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            InputStream::Plain(r) => r.read(buf),
            InputStream::Decoded(r) => r.read(buf),
        }
    }
}

/// Open the CSV input file.
pub fn open_input(path: &Path) -> ConvertResult<File> {
    File::open(path).map_err(|source| ConvertError::InputOpen {
        path: path.to_path_buf(),
        source,
    })
}

/// Ordered, finite sequence of [`Record`]s read from a delimited stream.
pub struct RecordSource<R> {
    reader: csv::Reader<QuoteChecker<InputStream<R>>>,
    buf: StringRecord,
    encoding: InputEncoding,
    last_line: u64,
}

impl<R: Read> RecordSource<R> {
    /// Build a record source over `input`.
    ///
    /// With [`InputEncoding::Auto`], up to [`DETECTION_SAMPLE_SIZE`] bytes are
    /// peeked (not consumed) to pick the encoding.
    pub fn new(input: R, options: &ConvertOptions) -> ConvertResult<Self> {
        let mut buffered = BufReader::with_capacity(DETECTION_SAMPLE_SIZE, input);

        let encoding = match options.encoding {
            InputEncoding::Auto => {
                let sample = buffered.fill_buf().map_err(|e| ConvertError::MalformedInput {
                    line: 1,
                    message: format!("read failed: {}", e),
                })?;
                let detected = detect_encoding(sample);
                debug!("Detected input encoding: {} ({} byte sample)", detected, sample.len());
                detected
            }
            explicit => explicit,
        };

        let stream = if encoding.needs_decoding() {
            InputStream::Decoded(DecodingReader::new(buffered, encoding))
        } else {
            InputStream::Plain(buffered)
        };

        let reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(options.delimiter)
            .from_reader(QuoteChecker::new(stream, options.delimiter));

        Ok(Self {
            reader,
            buf: StringRecord::new(),
            encoding,
            last_line: 0,
        })
    }

    /// Encoding the input is being read as.
    pub fn encoding(&self) -> InputEncoding {
        self.encoding
    }

    /// Read the next record.
    ///
    /// Returns `Ok(None)` once the input is exhausted.
    pub fn next_record(&mut self) -> ConvertResult<Option<Record>> {
        match self.reader.read_record(&mut self.buf) {
            Ok(true) => {
                let line = self
                    .buf
                    .position()
                    .map(|pos| pos.line())
                    .unwrap_or(self.last_line + 1);
                self.last_line = line;
                let fields = self.buf.iter().map(str::to_string).collect();
                Ok(Some(Record::new(line, fields)))
            }
            Ok(false) => Ok(None),
            Err(e) => Err(ConvertError::from_csv(e, self.last_line + 1)),
        }
    }
}

impl<R: Read> Iterator for RecordSource<R> {
    type Item = ConvertResult<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}
