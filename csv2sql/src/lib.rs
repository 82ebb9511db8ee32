//! # csv2sql - CSV to SQLite script conversion
//!
//! csv2sql turns a CSV file into a plain SQL script that recreates its
//! contents as a SQLite table. Load the result with the sqlite3 shell's
//! `.read` command.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   CSV File  │────▶│ RecordSource │────▶│ SqlEmitter  │────▶│  SQL Script │
//! │ (UTF8/1252) │     │ (one record) │     │ (one stmt)  │     │ (buffered)  │
//! └─────────────┘     └──────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! The first record is the header. Its fields are cleaned up into column
//! names and fix the number of fields every later record must have. Each
//! later record becomes one `INSERT` statement, and the whole script is
//! wrapped in `BEGIN TRANSACTION;` / `COMMIT;`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use csv2sql::{convert_file, ConvertOptions, OutputOptions};
//!
//! let input = Path::new("people.csv");
//! let summary = convert_file(input, &OutputOptions::for_input(input), &ConvertOptions::new("people"))?;
//! println!("{} lines with {} fields", summary.stats.lines, summary.stats.fields);
//! # Ok::<(), csv2sql::ConvertError>(())
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types
//! - [`config`] - Run options
//! - [`reader`] - CSV record source with encoding detection
//! - [`sql`] - Header clean-up, value rendering and the emitter
//! - [`output`] - Output file naming and sinks
//! - [`convert`] - End-to-end pipeline

// Core modules
pub mod config;
pub mod error;

// Input
pub mod reader;

// SQL generation
pub mod sql;

// Output
pub mod output;

// Pipeline
pub mod convert;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{ConfigError, ConfigResult, ConvertError, ConvertResult, QuoteError};

// =============================================================================
// Re-exports - Configuration
// =============================================================================

pub use config::{ConvertOptions, ValueQuoting};

// =============================================================================
// Re-exports - Record source
// =============================================================================

pub use reader::{detect_encoding, open_input, InputEncoding, Record, RecordSource};

// =============================================================================
// Re-exports - SQL
// =============================================================================

pub use sql::{
    clean_header,
    clean_header_fields,
    is_null_value,
    ConversionStats,
    SqlEmitter,
    HEADER_REPLACED_CHARS,
};

// =============================================================================
// Re-exports - Output
// =============================================================================

pub use output::{sql_file_name, AtomicSqlWriter, OutputOptions, OutputSink, OutputTarget};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use convert::{convert, convert_file, ConversionSummary};
