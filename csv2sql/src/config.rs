//! Run configuration for a conversion.
//!
//! A [`ConvertOptions`] value is built once (usually from the command line)
//! and handed to the emitter and record source. Nothing mutates it afterwards.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::reader::InputEncoding;

/// How non-NULL field values are written inside `INSERT` statements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueQuoting {
    /// Wrap in double quotes, leave embedded quotes untouched.
    ///
    /// A value containing `"` produces a statement SQLite will reject.
    #[default]
    Legacy,
    /// Wrap in double quotes and double any embedded `"`.
    Escaped,
}

/// Options for a single conversion run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertOptions {
    /// Name of the table created and filled by the script
    pub table_name: String,

    /// Use header fields verbatim as column names
    pub keep_original_header: bool,

    /// Value quoting mode for `INSERT` statements
    pub value_quoting: ValueQuoting,

    /// Wrap column names in double quotes in `CREATE TABLE`
    pub quote_columns: bool,

    /// Field delimiter
    pub delimiter: u8,

    /// Character encoding of the input
    pub encoding: InputEncoding,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            table_name: String::new(),
            keep_original_header: false,
            value_quoting: ValueQuoting::Legacy,
            quote_columns: false,
            delimiter: b',',
            encoding: InputEncoding::Auto,
        }
    }
}

impl ConvertOptions {
    /// Creates options for the given table with everything else at default.
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            ..Self::default()
        }
    }

    /// Keeps the header fields unsanitized.
    pub fn keep_original_header(mut self, keep: bool) -> Self {
        self.keep_original_header = keep;
        self
    }

    /// Sets the value quoting mode.
    pub fn value_quoting(mut self, quoting: ValueQuoting) -> Self {
        self.value_quoting = quoting;
        self
    }

    /// Quotes column names in the schema statement.
    pub fn quote_columns(mut self, quote: bool) -> Self {
        self.quote_columns = quote;
        self
    }

    /// Sets the field delimiter.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidDelimiter`] for non-ASCII characters,
    /// the quote character and line breaks.
    pub fn delimiter(mut self, delimiter: char) -> ConfigResult<Self> {
        if !is_valid_delimiter(delimiter) {
            return Err(ConfigError::InvalidDelimiter(delimiter));
        }
        self.delimiter = delimiter as u8;
        Ok(self)
    }

    /// Sets the input encoding.
    pub fn encoding(mut self, encoding: InputEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Checks the options before a run starts.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.table_name.trim().is_empty() {
            return Err(ConfigError::EmptyTableName);
        }
        let delimiter = char::from(self.delimiter);
        if !is_valid_delimiter(delimiter) {
            return Err(ConfigError::InvalidDelimiter(delimiter));
        }
        Ok(())
    }
}

fn is_valid_delimiter(delimiter: char) -> bool {
    delimiter.is_ascii() && !matches!(delimiter, '"' | '\n' | '\r')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let opts = ConvertOptions::default();
        assert!(!opts.keep_original_header);
        assert!(!opts.quote_columns);
        assert_eq!(opts.value_quoting, ValueQuoting::Legacy);
        assert_eq!(opts.delimiter, b',');
        assert_eq!(opts.encoding, InputEncoding::Auto);
    }

    #[test]
    fn test_empty_table_name_rejected() {
        assert!(matches!(
            ConvertOptions::new("  ").validate(),
            Err(ConfigError::EmptyTableName)
        ));
        assert!(ConvertOptions::new("people").validate().is_ok());
    }

    #[test]
    fn test_delimiter_must_be_ascii() {
        let opts = ConvertOptions::new("t").delimiter(';').unwrap();
        assert_eq!(opts.delimiter, b';');

        let err = ConvertOptions::new("t").delimiter('§').unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDelimiter('§')));
    }

    #[test]
    fn test_delimiter_rejects_quote_and_line_breaks() {
        for bad in ['"', '\n', '\r'] {
            let err = ConvertOptions::new("t").delimiter(bad).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidDelimiter(c) if c == bad));
        }
        assert!(ConvertOptions::new("t").delimiter('\t').is_ok());
    }

    #[test]
    fn test_validate_checks_delimiter_field() {
        let opts = ConvertOptions {
            delimiter: b'"',
            ..ConvertOptions::new("t")
        };
        assert!(matches!(opts.validate(), Err(ConfigError::InvalidDelimiter('"'))));
    }
}
