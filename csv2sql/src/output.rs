//! Output destinations for the generated SQL script.
//!
//! By default the script streams straight into its destination file, so a
//! failed run leaves a truncated file behind. In atomic mode the script is
//! written to a temporary file in the destination directory and only moved
//! into place once the whole script, `COMMIT;` included, has been flushed.

use std::fs::File;
use std::io::{self, BufWriter, Stdout, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::{ConvertError, ConvertResult};

/// Prefix of derived output file names.
pub const SQL_FILE_PREFIX: &str = "SQL-";

/// Derive the output file name for an input CSV path.
///
/// The directory and extension are dropped: `data/test-123.csv` becomes
/// `SQL-test-123.sql`, relative to the current directory.
pub fn sql_file_name(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_else(|| "output".into());
    PathBuf::from(format!("{}{}.sql", SQL_FILE_PREFIX, stem))
}

/// Where the script goes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputTarget {
    File(PathBuf),
    Stdout,
}

impl OutputTarget {
    /// Parse a `--output` value; `-` means stdout.
    pub fn from_arg(arg: &str) -> Self {
        if arg == "-" {
            OutputTarget::Stdout
        } else {
            OutputTarget::File(PathBuf::from(arg))
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            OutputTarget::File(p) => Some(p),
            OutputTarget::Stdout => None,
        }
    }
}

/// Output settings for a run.
#[derive(Debug, Clone)]
pub struct OutputOptions {
    pub target: OutputTarget,
    /// Write to a temporary file and persist only on success
    pub atomic: bool,
}

impl OutputOptions {
    /// Output to the file name derived from `input`.
    pub fn for_input(input: &Path) -> Self {
        Self {
            target: OutputTarget::File(sql_file_name(input)),
            atomic: false,
        }
    }

    pub fn target(mut self, target: OutputTarget) -> Self {
        self.target = target;
        self
    }

    pub fn atomic(mut self, atomic: bool) -> Self {
        self.atomic = atomic;
        self
    }
}

// =============================================================================
// Atomic writer
// =============================================================================

/// Buffered writer over a temporary file that replaces `final_path` on
/// [`finish`](Self::finish). Dropping it unfinished deletes the temporary
/// file and leaves `final_path` untouched.
pub struct AtomicSqlWriter {
    writer: BufWriter<NamedTempFile>,
    final_path: PathBuf,
}

impl AtomicSqlWriter {
    /// The temporary file is created next to `final_path` so the final
    /// rename stays on one filesystem.
    pub fn new(final_path: impl AsRef<Path>) -> ConvertResult<Self> {
        let final_path = final_path.as_ref().to_path_buf();

        let parent_dir = match final_path.parent() {
            Some(p) if p.as_os_str().is_empty() => Path::new("."),
            Some(p) => p,
            None => {
                return Err(ConvertError::OutputWrite(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("Cannot determine parent directory for: {}", final_path.display()),
                )))
            }
        };

        let temp_file = NamedTempFile::new_in(parent_dir).map_err(ConvertError::OutputWrite)?;
        debug!("Writing SQL to temporary file {}", temp_file.path().display());

        Ok(Self {
            writer: BufWriter::new(temp_file),
            final_path,
        })
    }

    /// Flush and move the temporary file over the destination.
    pub fn finish(self) -> ConvertResult<PathBuf> {
        let temp_file = self
            .writer
            .into_inner()
            .map_err(|e| ConvertError::OutputWrite(e.into_error()))?;

        temp_file
            .persist(&self.final_path)
            .map_err(|e| ConvertError::OutputWrite(e.error))?;

        Ok(self.final_path)
    }
}

impl Write for AtomicSqlWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

// =============================================================================
// Sink
// =============================================================================

/// The buffered sink the emitter writes into.
pub enum OutputSink {
    Direct(BufWriter<File>),
    Atomic(AtomicSqlWriter),
    Stdout(BufWriter<Stdout>),
}

impl OutputSink {
    /// Open the destination. An existing file is overwritten without asking.
    pub fn open(options: &OutputOptions) -> ConvertResult<Self> {
        match (&options.target, options.atomic) {
            (OutputTarget::Stdout, atomic) => {
                if atomic {
                    warn!("--atomic has no effect when writing to stdout");
                }
                Ok(OutputSink::Stdout(BufWriter::new(io::stdout())))
            }
            (OutputTarget::File(path), true) => Ok(OutputSink::Atomic(AtomicSqlWriter::new(path)?)),
            (OutputTarget::File(path), false) => {
                debug!("Opening the SQL output file: {}", path.display());
                let file = File::create(path).map_err(ConvertError::OutputWrite)?;
                Ok(OutputSink::Direct(BufWriter::new(file)))
            }
        }
    }

    /// Flush everything and, in atomic mode, persist the file.
    pub fn finish(self) -> ConvertResult<()> {
        match self {
            OutputSink::Direct(mut w) => w.flush().map_err(ConvertError::OutputWrite),
            OutputSink::Stdout(mut w) => w.flush().map_err(ConvertError::OutputWrite),
            OutputSink::Atomic(w) => w.finish().map(|_| ()),
        }
    }
}

impl Write for OutputSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            OutputSink::Direct(w) => w.write(buf),
            OutputSink::Atomic(w) => w.write(buf),
            OutputSink::Stdout(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            OutputSink::Direct(w) => w.flush(),
            OutputSink::Atomic(w) => w.flush(),
            OutputSink::Stdout(w) => w.flush(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_sql_file_name() {
        assert_eq!(sql_file_name(Path::new("test-123.csv")), PathBuf::from("SQL-test-123.sql"));
        assert_eq!(sql_file_name(Path::new("/data/in/people.csv")), PathBuf::from("SQL-people.sql"));
        assert_eq!(sql_file_name(Path::new("noext")), PathBuf::from("SQL-noext.sql"));
        assert_eq!(sql_file_name(Path::new("archive.tar.csv")), PathBuf::from("SQL-archive.tar.sql"));
    }

    #[test]
    fn test_output_target_from_arg() {
        assert_eq!(OutputTarget::from_arg("-"), OutputTarget::Stdout);
        assert_eq!(
            OutputTarget::from_arg("out.sql").path(),
            Some(Path::new("out.sql"))
        );
    }

    #[test]
    fn test_direct_sink_overwrites() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("out.sql");
        fs::write(&path, "OLD_CONTENT").unwrap();

        let opts = OutputOptions::for_input(Path::new("x.csv")).target(OutputTarget::File(path.clone()));
        let mut sink = OutputSink::open(&opts).unwrap();
        sink.write_all(b"COMMIT;\n").unwrap();
        sink.finish().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "COMMIT;\n");
    }

    #[test]
    fn test_atomic_sink_persists_on_finish() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("out.sql");

        let opts = OutputOptions::for_input(Path::new("x.csv"))
            .target(OutputTarget::File(path.clone()))
            .atomic(true);
        let mut sink = OutputSink::open(&opts).unwrap();
        sink.write_all(b"BEGIN TRANSACTION;\n").unwrap();
        assert!(!path.exists(), "destination must not exist before finish");

        sink.finish().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "BEGIN TRANSACTION;\n");
    }

    #[test]
    fn test_atomic_writer_drop_cleanup() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("out.sql");
        fs::write(&path, "PREVIOUS RUN").unwrap();

        {
            let mut writer = AtomicSqlWriter::new(&path).unwrap();
            writer.write_all(b"PRAGMA foreign_keys=OFF;\n").unwrap();
            // dropped without finish()
        }

        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1, "temporary file should be removed");
        assert_eq!(fs::read_to_string(&path).unwrap(), "PREVIOUS RUN");
    }

    #[cfg(unix)]
    #[test]
    fn test_atomic_writer_rejects_root() {
        assert!(matches!(
            AtomicSqlWriter::new("/"),
            Err(ConvertError::OutputWrite(_))
        ));
    }
}
