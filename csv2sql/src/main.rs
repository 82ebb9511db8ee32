//! csv2sql CLI - Convert a CSV file into a SQLite import script
//!
//! ```bash
//! csv2sql -t people -f people.csv          # writes SQL-people.sql
//! csv2sql -t people -f people.csv -k       # keep header fields as-is
//! csv2sql -t people -f people.csv -o -     # script to stdout
//! csv2sql -t people -f people.csv --atomic # no partial file on failure
//! ```
//!
//! Then, in the sqlite3 shell: `.read SQL-people.sql`

use clap::Parser;
use csv2sql::{
    convert_file, ConversionSummary, ConvertOptions, InputEncoding, OutputOptions, OutputTarget,
    ValueQuoting,
};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

const LONG_ABOUT: &str = "\
Convert a comma separated value (CSV) file into SQL statements that create
and fill a SQLite table.

The first line of the CSV file is the header: its fields become the column
names of the new table. Every other line must have the same number of fields
as the header, otherwise the conversion stops with an error naming the line.

Spaces and the characters | - + @ # / \\ : ( ) ' in header fields are replaced
with '_' so the column names are easy to use in SQL. Pass -k to keep the
header fields exactly as they are.

Empty fields and fields containing the text NULL become SQL NULL; everything
else is inserted as text.

The output file is named after the input: 'test-123.csv' becomes
'SQL-test-123.sql' in the current directory. An existing file with that name
is overwritten. Import it into a database with the sqlite3 command:

    .read SQL-test-123.sql";

#[derive(Parser)]
#[command(name = "csv2sql", version)]
#[command(about = "Convert a CSV file into SQL statements for import into SQLite")]
#[command(long_about = LONG_ABOUT)]
struct Cli {
    /// Name of the SQLite table to hold the CSV data
    #[arg(short = 't', long = "table", env = "CSV2SQL_TABLE")]
    table: String,

    /// CSV file to convert
    #[arg(short = 'f', long = "file", env = "CSV2SQL_FILE")]
    file: PathBuf,

    /// Keep the original CSV header fields as column names
    #[arg(short = 'k', long)]
    keep_original_header: bool,

    /// Show debug output while running
    #[arg(short, long)]
    debug: bool,

    /// Output file (default: SQL-<input name>.sql, '-' for stdout)
    #[arg(short, long)]
    output: Option<String>,

    /// Only replace the output file once the whole script was written
    #[arg(long)]
    atomic: bool,

    /// Double embedded '"' in values so they stay valid SQL
    #[arg(long)]
    escape_quotes: bool,

    /// Wrap column names in double quotes
    #[arg(long)]
    quote_columns: bool,

    /// Input encoding: auto, utf-8, iso-8859-1, iso-8859-15 or windows-1252
    #[arg(long, default_value = "auto")]
    encoding: InputEncoding,

    /// Field delimiter
    #[arg(long, default_value_t = ',')]
    delimiter: char,

    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,
}

fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.debug);

    if let Err(e) = run(cli) {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

/// Logs go to stderr; `RUST_LOG` wins over `--debug`.
fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    debug!("Command line arguments provided are:");
    debug!("  CSV file to use: {}", cli.file.display());
    debug!("  SQL table name to use: {}", cli.table);
    debug!("  Keep original csv header fields: {}", cli.keep_original_header);
    debug!("  Encoding: {}, delimiter: '{}'", cli.encoding, cli.delimiter);

    let quoting = if cli.escape_quotes {
        ValueQuoting::Escaped
    } else {
        ValueQuoting::Legacy
    };

    let options = ConvertOptions::new(cli.table)
        .keep_original_header(cli.keep_original_header)
        .value_quoting(quoting)
        .quote_columns(cli.quote_columns)
        .encoding(cli.encoding)
        .delimiter(cli.delimiter)?;

    let mut output = OutputOptions::for_input(&cli.file).atomic(cli.atomic);
    if let Some(arg) = cli.output.as_deref() {
        output = output.target(OutputTarget::from_arg(arg));
    }

    eprintln!("📄 Converting: {}", cli.file.display());
    let summary = convert_file(&cli.file, &output, &options)?;

    if cli.json {
        let json = serde_json::to_string_pretty(&summary)?;
        match output.target {
            // stdout already carries the script
            OutputTarget::Stdout => eprintln!("{}", json),
            OutputTarget::File(_) => println!("{}", json),
        }
    } else {
        print_summary(&summary);
    }

    Ok(())
}

fn print_summary(summary: &ConversionSummary) {
    match summary.output {
        Some(ref path) => eprintln!("✅ SQL script written to: {}", path.display()),
        None => eprintln!("✅ SQL script written to stdout"),
    }
    eprintln!(
        "📊 {} has {} lines with {} CSV fields per record",
        summary.input.display(),
        summary.stats.lines,
        summary.stats.fields
    );
    eprintln!("   Table: {}", summary.table);
    eprintln!("   Encoding: {}", summary.encoding);
    eprintln!("⏱️  Conversion took {:?}", summary.elapsed);
}
