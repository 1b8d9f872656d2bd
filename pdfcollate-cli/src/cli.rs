//! CLI argument parsing for pdfcollate.
//!
//! Every option can also be set through an environment variable, which is
//! how the service is usually configured inside a container.
//!
//! # Examples
//!
//! ```no_run
//! use clap::Parser;
//!
//! let cli = Cli::parse();
//! println!("Watching {}", cli.source.display());
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use pdfcollate::config::{
    Config, DEFAULT_DESTINATION_DIR, DEFAULT_OUTPUT_NAME_SUFFIX, DEFAULT_SOURCE_DIR,
};
use pdfcollate::error::Result;

/// Collate duplex scans from a watched directory.
///
/// pdfcollate watches a directory for PDFs written by a simplex scanner. Two
/// consecutive scans of the same stack (front sides, then back sides in
/// reverse) are merged into one document with the pages in reading order.
#[derive(Parser, Debug)]
#[command(name = "pdfcollate")]
#[command(version)]
#[command(about = "Collate duplex scans from a watched directory", long_about = None)]
#[command(author)]
pub struct Cli {
    /// Directory the scanner writes to
    ///
    /// Watched recursively. Must exist when the service starts.
    #[arg(
        short,
        long,
        value_name = "DIR",
        env = "SOURCE_DIRECTORY",
        default_value = DEFAULT_SOURCE_DIR
    )]
    pub source: PathBuf,

    /// Directory merged documents are written to
    ///
    /// Created if it does not exist.
    #[arg(
        short,
        long,
        value_name = "DIR",
        env = "DESTINATION_DIRECTORY",
        default_value = DEFAULT_DESTINATION_DIR
    )]
    pub destination: PathBuf,

    /// Longest wait between the first scan and the second
    ///
    /// When the second scan starts later than this after the first one
    /// finished, the first scan is dropped and the new file starts a new
    /// pair. Accepts human-readable durations.
    ///
    /// Examples:
    ///   --timeout 10m
    ///   --timeout "1h 30m"
    #[arg(
        short,
        long,
        value_name = "DURATION",
        env = "COLLATE_TIMEOUT",
        default_value = "10m",
        value_parser = parse_duration
    )]
    pub timeout: Duration,

    /// Suffix appended to the first file's stem to name the output
    #[arg(
        long,
        value_name = "TEXT",
        env = "OUTPUT_NAME_SUFFIX",
        default_value = DEFAULT_OUTPUT_NAME_SUFFIX,
        allow_hyphen_values = true
    )]
    pub suffix: String,

    /// Remove both inputs after a successful merge
    ///
    /// Accepts true/false, yes/no, on/off or 1/0.
    #[arg(
        long,
        value_name = "BOOL",
        env = "DELETE_OLD_FILES",
        default_value = "true",
        action = clap::ArgAction::Set,
        value_parser = parse_bool
    )]
    pub delete_old_files: bool,

    /// Log filter, e.g. "debug" or "pdfcollate=trace"
    ///
    /// Overrides PDFCOLLATE_LOG and RUST_LOG.
    #[arg(long, value_name = "FILTER")]
    pub log_level: Option<String>,
}

impl Cli {
    /// Convert CLI arguments into a validated Config.
    ///
    /// # Errors
    ///
    /// Returns an error if the resulting configuration is invalid, see
    /// [`Config::validate`].
    pub fn to_config(&self) -> Result<Config> {
        let config = Config {
            source_dir: self.source.clone(),
            destination_dir: self.destination.clone(),
            collate_timeout: self.timeout,
            output_name_suffix: self.suffix.clone(),
            delete_old_files: self.delete_old_files,
        };

        config.validate()?;

        Ok(config)
    }
}

/// Parse a human-readable duration such as `10m` or `90s`.
fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    humantime::parse_duration(s.trim()).map_err(|e| format!("invalid duration '{s}': {e}"))
}

/// Parse a boolean the way shell environments spell it.
fn parse_bool(s: &str) -> std::result::Result<bool, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(format!("invalid boolean '{other}'")),
    }
}
