//! Streaming SQL emitter.
//!
//! The emitter is fed one [`Record`] at a time. The first record is the
//! header: it fixes the field count and becomes the `CREATE TABLE` column
//! list. Every later record becomes one `INSERT` statement, written to the
//! sink before the next record is accepted. [`SqlEmitter::finish`] closes the
//! transaction.
//!
//! ```text
//!            header                 row (len == field_count)
//! ┌────────┐ ─────────▶ ┌────────┐ ◀───┐
//! │ Schema │            │  Rows  │ ────┘
//! └────────┘            └────────┘ ── row (len != field_count) ──▶ FieldCountMismatch
//! ```

use std::io::Write;

use serde::Serialize;
use tracing::{debug, trace};

use super::{clean_header_fields, push_insert, push_schema, COMMIT_STATEMENT};
use crate::config::ConvertOptions;
use crate::error::{ConvertError, ConvertResult};
use crate::reader::Record;

/// Counters reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConversionStats {
    /// Records consumed, header included
    pub lines: u64,
    /// Fields per record, fixed by the header
    pub fields: usize,
    /// Statements written: schema block, inserts and commit
    pub statements: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EmitterState {
    /// Waiting for the header record
    Schema,
    /// Header written; every record must have `field_count` fields
    Rows { field_count: usize },
}

/// Converts records into SQL statements written to `W`.
///
/// `W` should be buffered; each statement is handed over with a single
/// `write_all`.
pub struct SqlEmitter<W: Write> {
    sink: W,
    options: ConvertOptions,
    state: EmitterState,
    line_buf: String,
    stats: ConversionStats,
}

impl<W: Write> SqlEmitter<W> {
    pub fn new(sink: W, options: ConvertOptions) -> Self {
        Self {
            sink,
            options,
            state: EmitterState::Schema,
            line_buf: String::new(),
            stats: ConversionStats::default(),
        }
    }

    /// Field count fixed by the header, once it has been seen.
    pub fn field_count(&self) -> Option<usize> {
        match self.state {
            EmitterState::Schema => None,
            EmitterState::Rows { field_count } => Some(field_count),
        }
    }

    pub fn stats(&self) -> &ConversionStats {
        &self.stats
    }

    /// Convert one record and write its statement.
    ///
    /// # Errors
    ///
    /// [`ConvertError::FieldCountMismatch`] if a data row's arity differs from
    /// the header's, [`ConvertError::OutputWrite`] if the sink fails. Both are
    /// fatal: the emitter must not be fed again after an error.
    pub fn push(&mut self, record: Record) -> ConvertResult<()> {
        match self.state {
            EmitterState::Schema => self.emit_schema(record)?,
            EmitterState::Rows { field_count } => self.emit_row(&record, field_count)?,
        }

        self.stats.lines += 1;
        trace!("..{}", self.stats.lines);
        Ok(())
    }

    fn emit_schema(&mut self, mut header: Record) -> ConvertResult<()> {
        let field_count = header.field_count();

        if self.options.keep_original_header {
            debug!("Keeping original header fields as column names");
        } else {
            clean_header_fields(header.fields_mut());
        }

        push_schema(
            &mut self.line_buf,
            &self.options.table_name,
            header.fields(),
            self.options.quote_columns,
        );
        self.write_statement()?;

        debug!(
            "CREATE TABLE {} with {} columns: {}",
            self.options.table_name,
            field_count,
            header.fields().join(",")
        );

        self.stats.fields = field_count;
        self.state = EmitterState::Rows { field_count };
        Ok(())
    }

    fn emit_row(&mut self, row: &Record, field_count: usize) -> ConvertResult<()> {
        if row.field_count() != field_count {
            return Err(ConvertError::FieldCountMismatch {
                line: row.line(),
                expected: field_count,
                found: row.field_count(),
            });
        }

        push_insert(
            &mut self.line_buf,
            &self.options.table_name,
            row.fields(),
            self.options.value_quoting,
        );
        self.write_statement()
    }

    fn write_statement(&mut self) -> ConvertResult<()> {
        let result = self.sink.write_all(self.line_buf.as_bytes());
        self.line_buf.clear();
        result.map_err(ConvertError::OutputWrite)?;
        self.stats.statements += 1;
        Ok(())
    }

    /// Write `COMMIT;`, flush, and hand back the sink with the final counters.
    ///
    /// # Errors
    ///
    /// [`ConvertError::EmptyInput`] if no header was ever pushed; nothing is
    /// written in that case.
    pub fn finish(mut self) -> ConvertResult<(W, ConversionStats)> {
        if self.state == EmitterState::Schema {
            return Err(ConvertError::EmptyInput);
        }

        self.line_buf.push_str(COMMIT_STATEMENT);
        self.write_statement()?;
        self.sink.flush().map_err(ConvertError::OutputWrite)?;

        Ok((self.sink, self.stats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ValueQuoting;
    use std::io;

    fn record(line: u64, fields: &[&str]) -> Record {
        Record::new(line, fields.iter().map(|f| f.to_string()).collect())
    }

    fn emitter(options: ConvertOptions) -> SqlEmitter<Vec<u8>> {
        SqlEmitter::new(Vec::new(), options)
    }

    fn output(emitter: SqlEmitter<Vec<u8>>) -> (String, ConversionStats) {
        let (sink, stats) = emitter.finish().unwrap();
        (String::from_utf8(sink).unwrap(), stats)
    }

    #[test]
    fn test_statement_order() {
        let mut em = emitter(ConvertOptions::new("t"));
        em.push(record(1, &["Full Name", "e-mail", "Count"])).unwrap();
        em.push(record(2, &["John Smith", "", "5"])).unwrap();
        em.push(record(3, &["Jane", "jane@example.com", "NULL"])).unwrap();

        let (sql, stats) = output(em);
        assert_eq!(
            sql,
            "PRAGMA foreign_keys=OFF;\n\
             BEGIN TRANSACTION;\n\
             CREATE TABLE t (Full_Name,e_mail,Count);\n\
             INSERT INTO t VALUES (\"John Smith\",NULL,\"5\");\n\
             INSERT INTO t VALUES (\"Jane\",\"jane@example.com\",NULL);\n\
             COMMIT;\n"
        );
        assert_eq!(
            stats,
            ConversionStats {
                lines: 3,
                fields: 3,
                statements: 4
            }
        );
    }

    #[test]
    fn test_header_only() {
        let mut em = emitter(ConvertOptions::new("t"));
        em.push(record(1, &["a", "b"])).unwrap();

        let (sql, stats) = output(em);
        assert!(sql.ends_with("CREATE TABLE t (a,b);\nCOMMIT;\n"));
        assert_eq!(stats.lines, 1);
        assert_eq!(stats.statements, 2);
    }

    #[test]
    fn test_keep_original_header() {
        let mut em = emitter(ConvertOptions::new("t").keep_original_header(true));
        em.push(record(1, &["Full Name", "e-mail"])).unwrap();

        let (sql, _) = output(em);
        assert!(sql.contains("CREATE TABLE t (Full Name,e-mail);\n"));
    }

    #[test]
    fn test_header_values_not_null_rendered() {
        let mut em = emitter(ConvertOptions::new("t"));
        em.push(record(1, &["", "NULL"])).unwrap();

        let (sql, _) = output(em);
        assert!(sql.contains("CREATE TABLE t (,NULL);\n"));
    }

    #[test]
    fn test_sanitizing_only_touches_header() {
        let mut em = emitter(ConvertOptions::new("t"));
        em.push(record(1, &["a b"])).unwrap();
        em.push(record(2, &["c d"])).unwrap();

        let (sql, _) = output(em);
        assert!(sql.contains("(a_b);"));
        assert!(sql.contains("VALUES (\"c d\");"));
    }

    #[test]
    fn test_field_count_mismatch() {
        let mut em = emitter(ConvertOptions::new("t"));
        em.push(record(1, &["a", "b", "c"])).unwrap();
        em.push(record(2, &["1", "2", "3"])).unwrap();

        match em.push(record(3, &["1", "2"])) {
            Err(ConvertError::FieldCountMismatch {
                line,
                expected,
                found,
            }) => {
                assert_eq!(line, 3);
                assert_eq!(expected, 3);
                assert_eq!(found, 2);
            }
            other => panic!("expected FieldCountMismatch, got {other:?}"),
        }

        assert_eq!(em.stats().lines, 2);
        let written = String::from_utf8(em.sink.clone()).unwrap();
        assert_eq!(written.matches("INSERT").count(), 1);
        assert!(!written.contains("COMMIT"));
    }

    #[test]
    fn test_too_many_fields_rejected() {
        let mut em = emitter(ConvertOptions::new("t"));
        em.push(record(1, &["a"])).unwrap();
        assert!(matches!(
            em.push(record(2, &["1", "2"])),
            Err(ConvertError::FieldCountMismatch { found: 2, .. })
        ));
    }

    #[test]
    fn test_empty_input_is_an_error() {
        let em = emitter(ConvertOptions::new("t"));
        assert_eq!(em.field_count(), None);
        assert!(matches!(em.finish(), Err(ConvertError::EmptyInput)));
    }

    #[test]
    fn test_escaped_values() {
        let mut em = emitter(ConvertOptions::new("t").value_quoting(ValueQuoting::Escaped));
        em.push(record(1, &["quote"])).unwrap();
        em.push(record(2, &["6\" ruler"])).unwrap();

        let (sql, _) = output(em);
        assert!(sql.contains("VALUES (\"6\"\" ruler\");"));
    }

    #[test]
    fn test_column_list_round_trips() {
        let header = ["Full Name", "e-mail", "Count", "x(y)"];
        for keep in [false, true] {
            let mut em = emitter(ConvertOptions::new("t").keep_original_header(keep));
            em.push(record(1, &header)).unwrap();
            let (sql, _) = output(em);

            let start = sql.find("CREATE TABLE t (").unwrap() + "CREATE TABLE t (".len();
            let end = sql[start..].find(");\n").unwrap() + start;
            let columns: Vec<&str> = sql[start..end].split(',').collect();

            let expected: Vec<String> = header
                .iter()
                .map(|h| if keep { h.to_string() } else { crate::clean_header(h).into_owned() })
                .collect();
            assert_eq!(columns, expected);
        }
    }

    struct FailingSink;

    impl Write for FailingSink {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_sink_failure_is_output_write() {
        let mut em = SqlEmitter::new(FailingSink, ConvertOptions::new("t"));
        let err = em.push(record(1, &["a"])).unwrap_err();
        assert!(matches!(err, ConvertError::OutputWrite(_)));
        assert!(err.to_string().contains("disk full"));
        assert_eq!(em.stats().statements, 0);
    }
}
