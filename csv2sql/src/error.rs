//! Error types for the CSV to SQL conversion pipeline.
//!
//! - [`ConfigError`] - Invalid run configuration
//! - [`ConvertError`] - Fatal conversion errors (input, parsing, structure, output)
//!
//! Every variant of [`ConvertError`] is fatal: the run stops at the first one
//! and nothing is retried. `From` implementations let `?` cross the boundary
//! between configuration checks and the conversion itself.

use std::path::PathBuf;

use thiserror::Error;

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors raised while validating [`crate::ConvertOptions`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Table name is missing or blank.
    #[error("Table name must not be empty")]
    EmptyTableName,

    /// Encoding label is not one we can decode.
    #[error("Unsupported encoding: {0}")]
    UnknownEncoding(String),

    /// Delimiter must be a single ASCII character other than `"`, CR or LF.
    #[error("Invalid delimiter {0:?}: must be a single ASCII character other than '\"', CR or LF")]
    InvalidDelimiter(char),
}

// =============================================================================
// Quoting Errors
// =============================================================================

/// Broken field quoting found while scanning the input.
///
/// Travels inside an [`std::io::Error`] of kind `InvalidData` through the
/// `csv` reader and is turned back into [`ConvertError::MalformedInput`] by
/// [`ConvertError::from_csv`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct QuoteError {
    pub line: u64,
    pub message: &'static str,
}

impl QuoteError {
    pub fn bare_quote(line: u64) -> Self {
        Self {
            line,
            message: "bare \" in non-quoted field",
        }
    }

    pub fn extraneous_quote(line: u64) -> Self {
        Self {
            line,
            message: "extraneous or missing \" in quoted field",
        }
    }

    pub fn unterminated(line: u64) -> Self {
        Self {
            line,
            message: "unterminated quoted field",
        }
    }
}

impl From<QuoteError> for std::io::Error {
    fn from(err: QuoteError) -> Self {
        std::io::Error::new(std::io::ErrorKind::InvalidData, err)
    }
}

// =============================================================================
// Conversion Errors
// =============================================================================

/// Fatal errors of a conversion run.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// Input file could not be opened.
    #[error("Cannot open input '{}': {source}", path.display())]
    InputOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Delimited text could not be decoded.
    #[error("Malformed CSV input at line {line}: {message}")]
    MalformedInput { line: u64, message: String },

    /// A data row does not have as many fields as the header.
    #[error("Line {line} has {found} fields, but the header has {expected}")]
    FieldCountMismatch {
        line: u64,
        expected: usize,
        found: usize,
    },

    /// The sink rejected a write or flush.
    #[error("Failed to write SQL output: {0}")]
    OutputWrite(#[source] std::io::Error),

    /// Input held no records, not even a header.
    #[error("CSV input is empty: no header record found")]
    EmptyInput,

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl ConvertError {
    /// Maps a `csv` crate error onto [`ConvertError::MalformedInput`].
    ///
    /// `fallback_line` is used when the error carries no position. A
    /// [`QuoteError`] carried by an I/O error keeps its own line.
    pub fn from_csv(err: csv::Error, fallback_line: u64) -> Self {
        if let csv::ErrorKind::Io(io) = err.kind() {
            if let Some(quote) = io.get_ref().and_then(|e| e.downcast_ref::<QuoteError>()) {
                return ConvertError::MalformedInput {
                    line: quote.line,
                    message: quote.message.to_string(),
                };
            }
        }

        let line = err
            .position()
            .map(|pos| pos.line())
            .unwrap_or(fallback_line);

        let message = match err.kind() {
            csv::ErrorKind::Utf8 { err, .. } => format!("invalid UTF-8 in field {}", err.field() + 1),
            csv::ErrorKind::Io(io) => format!("read failed: {}", io),
            _ => err.to_string(),
        };

        ConvertError::MalformedInput { line, message }
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for configuration checks.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for conversion operations.
pub type ConvertResult<T> = Result<T, ConvertError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_converts() {
        let err: ConvertError = ConfigError::EmptyTableName.into();
        assert!(matches!(err, ConvertError::Config(ConfigError::EmptyTableName)));
        assert!(err.to_string().contains("Table name"));
    }

    #[test]
    fn test_field_count_mismatch_format() {
        let err = ConvertError::FieldCountMismatch {
            line: 7,
            expected: 3,
            found: 2,
        };
        let msg = err.to_string();
        assert!(msg.contains("Line 7"));
        assert!(msg.contains("2 fields"));
        assert!(msg.contains("has 3"));
    }

    #[test]
    fn test_input_open_names_path() {
        let err = ConvertError::InputOpen {
            path: PathBuf::from("missing.csv"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        };
        assert!(err.to_string().contains("missing.csv"));
    }

    #[test]
    fn test_utf8_csv_error_maps_to_malformed() {
        let data: &[u8] = b"a,b\n\xff\xfe,x\n";
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(data);
        let err = reader
            .records()
            .find_map(|r| r.err())
            .expect("expected a UTF-8 error");

        match ConvertError::from_csv(err, 0) {
            ConvertError::MalformedInput { line, message } => {
                assert_eq!(line, 2);
                assert!(message.contains("UTF-8"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_quote_error_keeps_its_line() {
        let io: std::io::Error = QuoteError::bare_quote(4).into();
        let err = ConvertError::from_csv(csv::Error::from(io), 1);

        match err {
            ConvertError::MalformedInput { line, message } => {
                assert_eq!(line, 4);
                assert!(message.contains("bare \""));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
