//! PDF writing and saving operations.
//!
//! This module provides safe PDF writing with:
//! - Atomic writes (write to temp file, then rename)
//! - Compression support
//! - Owner and permission copying from a reference file
//! - Write statistics
//!
//! # Examples
//!
//! ```no_run
//! use pdfcollate::io::writer::PdfWriter;
//! use lopdf::Document;
//! use std::path::Path;
//!
//! # fn example(mut doc: Document) -> Result<(), Box<dyn std::error::Error>> {
//! let writer = PdfWriter::new();
//! writer.save(&mut doc, Path::new("output.pdf"), Some(Path::new("front.pdf")))?;
//! # Ok(())
//! # }
//! ```

use lopdf::Document;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::error::{CollateError, Result};

/// Options for writing PDF files.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Use atomic writes (write to temp file, then rename).
    pub atomic: bool,

    /// Compress the PDF before writing.
    pub compress: bool,

    /// Buffer size for writing (in bytes).
    pub buffer_size: usize,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            atomic: true,
            compress: true,
            buffer_size: 8192,
        }
    }
}

/// Statistics about a write operation.
#[derive(Debug, Clone)]
pub struct WriteStatistics {
    /// Time taken to write the file.
    pub write_time: Duration,

    /// Size of the written file in bytes.
    pub file_size: u64,

    /// Path where the file was written.
    pub output_path: PathBuf,
}

/// PDF writer with configurable behavior.
#[derive(Debug, Clone, Default)]
pub struct PdfWriter {
    options: WriteOptions,
}

impl PdfWriter {
    /// Create a new PDF writer with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a writer without atomic writes.
    ///
    /// A failure half-way through leaves a truncated file at the final path.
    pub fn non_atomic() -> Self {
        Self {
            options: WriteOptions {
                atomic: false,
                ..Default::default()
            },
        }
    }

    /// Save a PDF document, optionally copying ownership and permission bits
    /// from `metadata_from` onto the result.
    ///
    /// With atomic writes enabled the document and its metadata are applied
    /// to a temporary sibling first and only renamed onto `path` once both
    /// succeeded; on any failure the temporary file is removed.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The output directory cannot be created
    /// - The file cannot be created or written
    /// - Ownership or permissions cannot be copied
    /// - The final rename fails
    pub fn save(
        &self,
        doc: &mut Document,
        path: &Path,
        metadata_from: Option<&Path>,
    ) -> Result<WriteStatistics> {
        let start = Instant::now();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| CollateError::FailedToCreateOutput {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        if self.options.compress {
            doc.compress();
        }

        let write_path = if self.options.atomic {
            temp_path_for(path)
        } else {
            path.to_path_buf()
        };

        let written = self
            .write_document(doc, &write_path)
            .and_then(|()| match metadata_from {
                Some(reference) => copy_ownership_and_mode(reference, &write_path),
                None => Ok(()),
            })
            .and_then(|()| {
                if self.options.atomic {
                    fs::rename(&write_path, path).map_err(|e| CollateError::FailedToWrite {
                        path: path.to_path_buf(),
                        source: e,
                    })
                } else {
                    Ok(())
                }
            });

        if let Err(err) = written {
            if self.options.atomic {
                let _ = fs::remove_file(&write_path);
            }
            return Err(err);
        }

        let file_size = fs::metadata(path).map(|m| m.len()).unwrap_or(0);

        Ok(WriteStatistics {
            write_time: start.elapsed(),
            file_size,
            output_path: path.to_path_buf(),
        })
    }

    fn write_document(&self, doc: &mut Document, write_path: &Path) -> Result<()> {
        let file = fs::File::create(write_path).map_err(|e| CollateError::FailedToCreateOutput {
            path: write_path.to_path_buf(),
            source: e,
        })?;

        let mut writer = BufWriter::with_capacity(self.options.buffer_size, file);

        doc.save_to(&mut writer)
            .map_err(|e| CollateError::FailedToWrite {
                path: write_path.to_path_buf(),
                source: std::io::Error::other(e),
            })?;

        writer.flush().map_err(|e| CollateError::FailedToWrite {
            path: write_path.to_path_buf(),
            source: e,
        })?;

        Ok(())
    }
}

/// Temporary sibling used for atomic writes.
///
/// The `.tmp` extension keeps the in-progress file out of the PDF filter when
/// the output directory lives inside the watched tree.
fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Copy owner, group and permission bits from `reference` onto `target`.
#[cfg(unix)]
pub fn copy_ownership_and_mode(reference: &Path, target: &Path) -> Result<()> {
    use std::os::unix::fs::MetadataExt;

    let to_err = |e: std::io::Error| CollateError::FailedToCopyMetadata {
        path: target.to_path_buf(),
        source: e,
    };

    let metadata = fs::metadata(reference).map_err(to_err)?;
    std::os::unix::fs::chown(target, Some(metadata.uid()), Some(metadata.gid())).map_err(to_err)?;
    fs::set_permissions(target, metadata.permissions()).map_err(to_err)?;

    Ok(())
}

/// Copy permission bits from `reference` onto `target`.
#[cfg(not(unix))]
pub fn copy_ownership_and_mode(reference: &Path, target: &Path) -> Result<()> {
    let to_err = |e: std::io::Error| CollateError::FailedToCopyMetadata {
        path: target.to_path_buf(),
        source: e,
    };

    let metadata = fs::metadata(reference).map_err(to_err)?;
    fs::set_permissions(target, metadata.permissions()).map_err(to_err)?;

    Ok(())
}
