//! SQL text generation for SQLite.
//!
//! - [`sanitize`] - Header field clean-up
//! - [`emitter`] - Record stream to statement stream
//!
//! The helpers here append to a caller-owned `String` so a single buffer can
//! be reused for every statement of a run.

pub mod emitter;
pub mod sanitize;

pub use emitter::{ConversionStats, SqlEmitter};
pub use sanitize::{clean_header, clean_header_fields, HEADER_REPLACED_CHARS};

use crate::config::ValueQuoting;

/// Opening of every script: disables FK checks and starts the transaction.
pub const SCRIPT_PREAMBLE: &str = "PRAGMA foreign_keys=OFF;\nBEGIN TRANSACTION;\n";

/// Last statement of every successful script.
pub const COMMIT_STATEMENT: &str = "COMMIT;\n";

/// A field rendered as SQL `NULL` rather than a string.
pub fn is_null_value(field: &str) -> bool {
    field.is_empty() || field == "NULL"
}

/// Append a double-quoted token, doubling embedded quotes if `escape`.
fn push_quoted(buf: &mut String, text: &str, escape: bool) {
    buf.push('"');
    if escape && text.contains('"') {
        buf.push_str(&text.replace('"', "\"\""));
    } else {
        buf.push_str(text);
    }
    buf.push('"');
}

/// Append one value of an `INSERT` statement.
pub fn push_value(buf: &mut String, field: &str, quoting: ValueQuoting) {
    if is_null_value(field) {
        buf.push_str("NULL");
    } else {
        push_quoted(buf, field, quoting == ValueQuoting::Escaped);
    }
}

/// Append the schema block: preamble plus `CREATE TABLE`.
pub fn push_schema<S: AsRef<str>>(buf: &mut String, table: &str, columns: &[S], quote_columns: bool) {
    buf.push_str(SCRIPT_PREAMBLE);
    buf.push_str("CREATE TABLE ");
    buf.push_str(table);
    buf.push_str(" (");
    for (i, column) in columns.iter().enumerate() {
        if i > 0 {
            buf.push(',');
        }
        if quote_columns {
            push_quoted(buf, column.as_ref(), true);
        } else {
            buf.push_str(column.as_ref());
        }
    }
    buf.push_str(");\n");
}

/// Append an `INSERT INTO ... VALUES (...)` statement.
pub fn push_insert<S: AsRef<str>>(buf: &mut String, table: &str, fields: &[S], quoting: ValueQuoting) {
    buf.push_str("INSERT INTO ");
    buf.push_str(table);
    buf.push_str(" VALUES (");
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            buf.push(',');
        }
        push_value(buf, field.as_ref(), quoting);
    }
    buf.push_str(");\n");
}
