//! High-level conversion API: CSV in, SQL script out.
//!
//! Records are pulled from the [`RecordSource`] one at a time and pushed into
//! the [`SqlEmitter`], which writes each statement before the next record is
//! read. Neither the input nor the output is ever held in memory as a whole.
//!
//! # Example
//!
//! ```
//! use csv2sql::{convert, ConvertOptions};
//!
//! let csv = "Full Name,e-mail,Count\nJohn Smith,,5\n";
//! let (sql, stats) = convert(csv.as_bytes(), Vec::new(), &ConvertOptions::new("t")).unwrap();
//!
//! let sql = String::from_utf8(sql).unwrap();
//! assert!(sql.contains("CREATE TABLE t (Full_Name,e_mail,Count);"));
//! assert!(sql.contains("INSERT INTO t VALUES (\"John Smith\",NULL,\"5\");"));
//! assert_eq!(stats.lines, 2);
//! ```

use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::ConvertOptions;
use crate::error::{ConvertError, ConvertResult};
use crate::output::{OutputOptions, OutputSink};
use crate::reader::{open_input, InputEncoding, RecordSource};
use crate::sql::{ConversionStats, SqlEmitter};

/// Outcome of a successful [`convert_file`] run.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionSummary {
    pub input: PathBuf,
    /// `None` when the script went to stdout
    pub output: Option<PathBuf>,
    pub table: String,
    pub encoding: InputEncoding,
    #[serde(flatten)]
    pub stats: ConversionStats,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    #[serde(skip)]
    pub elapsed: Duration,
}

/// Pump every record of `source` through `emitter`.
fn pump<R: Read, W: Write>(
    source: &mut RecordSource<R>,
    mut emitter: SqlEmitter<W>,
) -> ConvertResult<(W, ConversionStats)> {
    while let Some(record) = source.next_record()? {
        emitter.push(record)?;
    }
    emitter.finish()
}

/// Convert CSV from `input` into SQL written to `output`.
///
/// `output` is wrapped in a `BufWriter`; the unwrapped writer is returned
/// once the script has been flushed.
///
/// # Errors
///
/// Any [`ConvertError`]. On error, statements written before the
/// failure remain in `output`.
pub fn convert<R: Read, W: Write>(
    input: R,
    output: W,
    options: &ConvertOptions,
) -> ConvertResult<(W, ConversionStats)> {
    options.validate()?;

    let mut source = RecordSource::new(input, options)?;
    let emitter = SqlEmitter::new(BufWriter::new(output), options.clone());
    let (sink, stats) = pump(&mut source, emitter)?;

    let output = sink
        .into_inner()
        .map_err(|e| ConvertError::OutputWrite(e.into_error()))?;
    Ok((output, stats))
}

/// Convert the CSV file at `input` into a SQL script.
///
/// This is the entry point used by the CLI. It:
/// 1. Opens the input and detects its encoding
/// 2. Opens the output sink (direct, atomic or stdout)
/// 3. Streams records through the emitter
/// 4. Flushes (and in atomic mode persists) the script
pub fn convert_file(
    input: &Path,
    output: &OutputOptions,
    options: &ConvertOptions,
) -> ConvertResult<ConversionSummary> {
    options.validate()?;

    debug!("Opening the CSV file: {}", input.display());
    let file = open_input(input)?;

    let started_at = Utc::now();
    let start = Instant::now();

    let mut source = RecordSource::new(file, options)?;
    let sink = OutputSink::open(output)?;
    let emitter = SqlEmitter::new(sink, options.clone());

    let (sink, stats) = pump(&mut source, emitter)?;
    sink.finish()?;

    let elapsed = start.elapsed();
    info!(
        "Converted {} lines with {} fields per record into {} statements",
        stats.lines, stats.fields, stats.statements
    );

    Ok(ConversionSummary {
        input: input.to_path_buf(),
        output: output.target.path().map(Path::to_path_buf),
        table: options.table_name.clone(),
        encoding: source.encoding(),
        stats,
        started_at,
        elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        elapsed,
    })
}
