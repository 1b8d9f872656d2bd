//! Configuration for the collating service.
//!
//! The CLI turns flags and environment variables into a [`Config`]; this
//! module owns the validated shape of that configuration and the rules derived
//! from it:
//! - Validation of the watched and output directories
//! - Collate timeout sanity checks
//! - Output file naming

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{CollateError, Result};

/// Default directory watched for incoming scans.
pub const DEFAULT_SOURCE_DIR: &str = "/files";

/// Default directory merged documents are written to.
pub const DEFAULT_DESTINATION_DIR: &str = "/output";

/// Default gap allowed between the first scan finishing and the second one
/// starting.
pub const DEFAULT_COLLATE_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Default suffix inserted between the file stem and its extension.
pub const DEFAULT_OUTPUT_NAME_SUFFIX: &str = "-collated";

/// Complete configuration for a collating session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory watched (recursively) for new scans.
    pub source_dir: PathBuf,

    /// Directory merged documents are written to.
    pub destination_dir: PathBuf,

    /// Maximum gap between the first file finishing and the next file being
    /// created before the first file is abandoned.
    pub collate_timeout: Duration,

    /// String inserted before the extension of the output file name.
    pub output_name_suffix: String,

    /// Remove both inputs after a successful merge.
    pub delete_old_files: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from(DEFAULT_SOURCE_DIR),
            destination_dir: PathBuf::from(DEFAULT_DESTINATION_DIR),
            collate_timeout: DEFAULT_COLLATE_TIMEOUT,
            output_name_suffix: DEFAULT_OUTPUT_NAME_SUFFIX.to_string(),
            delete_old_files: true,
        }
    }
}

impl Config {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The source directory does not exist or is not a directory
    /// - The destination path exists but is not a directory
    /// - The collate timeout is zero
    /// - The suffix contains a path separator
    pub fn validate(&self) -> Result<()> {
        if !self.source_dir.try_exists()? {
            return Err(CollateError::invalid_config(format!(
                "Source directory does not exist: {}",
                self.source_dir.display()
            )));
        }

        if !self.source_dir.is_dir() {
            return Err(CollateError::invalid_config(format!(
                "Source path is not a directory: {}",
                self.source_dir.display()
            )));
        }

        if self.destination_dir.try_exists()? && !self.destination_dir.is_dir() {
            return Err(CollateError::invalid_config(format!(
                "Destination path is not a directory: {}",
                self.destination_dir.display()
            )));
        }

        if self.collate_timeout.is_zero() {
            return Err(CollateError::invalid_config(
                "Collate timeout must be greater than zero",
            ));
        }

        if self.output_name_suffix.contains(std::path::is_separator) {
            return Err(CollateError::invalid_config(format!(
                "Output name suffix must not contain a path separator: {:?}",
                self.output_name_suffix
            )));
        }

        Ok(())
    }

    /// Compute where the merged document for `first` is written.
    ///
    /// The name is the stem of `first`, followed by the configured suffix and
    /// the original extension, so `scan_0001.pdf` becomes
    /// `scan_0001-collated.pdf`. The extension keeps its original case.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdfcollate::config::Config;
    /// use std::path::{Path, PathBuf};
    ///
    /// let config = Config {
    ///     destination_dir: PathBuf::from("/output"),
    ///     ..Config::default()
    /// };
    /// assert_eq!(
    ///     config.destination_for(Path::new("/files/a.pdf")),
    ///     PathBuf::from("/output/a-collated.pdf"),
    /// );
    /// ```
    pub fn destination_for(&self, first: &Path) -> PathBuf {
        let stem = first.file_stem().unwrap_or_default();

        let mut name = stem.to_os_string();
        name.push(&self.output_name_suffix);
        if let Some(ext) = first.extension() {
            name.push(".");
            name.push(ext);
        }

        self.destination_dir.join(name)
    }
}
