//! PDF reading and page counting.
//!
//! Incoming scans are only ever read, never modified, by this module. The
//! [`PageCounter`] trait is the narrow seam the pairing state machine uses to
//! decide whether two scans are compatible; [`PdfReader`] implements it on top
//! of `lopdf`.
//!
//! # Examples
//!
//! ```no_run
//! use pdfcollate::io::{PageCounter, PdfReader};
//! use std::path::Path;
//!
//! let reader = PdfReader::new();
//! let pages = reader.count_pages(Path::new("front.pdf"))?;
//! println!("front side has {pages} pages");
//! # Ok::<(), pdfcollate::CollateError>(())
//! ```

use lopdf::Document;
use std::path::{Path, PathBuf};

use crate::error::{CollateError, Result};

/// Something that can tell how many pages a PDF on disk has.
///
/// Implementations must not panic on malformed input: every failure is
/// reported through the returned [`Result`] so the caller can treat it as an
/// incompatible pair.
pub trait PageCounter {
    /// Count the pages of the document at `path`.
    fn count_pages(&self, path: &Path) -> Result<usize>;
}

/// A loaded PDF document with metadata.
#[derive(Debug)]
pub struct LoadedPdf {
    /// The PDF document.
    pub document: Document,

    /// Path to the source file.
    pub path: PathBuf,

    /// Number of pages in the document.
    pub page_count: usize,
}

/// PDF reader with configurable loading behavior.
#[derive(Debug, Clone)]
pub struct PdfReader {
    /// Whether to reject documents without pages.
    verify: bool,
}

impl PdfReader {
    /// Create a new PDF reader with default settings.
    pub fn new() -> Self {
        Self { verify: true }
    }

    /// Create a reader that accepts documents without pages.
    pub fn without_verification() -> Self {
        Self { verify: false }
    }

    /// Load a single PDF document.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The path does not exist or is a directory
    /// - File is not a valid PDF
    /// - PDF is encrypted
    /// - PDF has no pages (unless verification is disabled)
    pub fn load(&self, path: &Path) -> Result<LoadedPdf> {
        Self::check_path_exists(path)?;

        let document = Document::load(path).map_err(|e| {
            let err_msg = e.to_string();
            if err_msg.contains("encrypt") || err_msg.contains("password") {
                CollateError::encrypted_pdf(path.to_path_buf())
            } else {
                CollateError::failed_to_load_pdf(path.to_path_buf(), err_msg)
            }
        })?;

        if document.is_encrypted() {
            return Err(CollateError::encrypted_pdf(path.to_path_buf()));
        }

        let page_count = document.get_pages().len();
        if self.verify && page_count == 0 {
            return Err(CollateError::corrupted_pdf(
                path.to_path_buf(),
                "PDF has no pages",
            ));
        }

        Ok(LoadedPdf {
            document,
            path: path.to_path_buf(),
            page_count,
        })
    }

    /// Ensure `path` names an existing regular file.
    pub fn check_path_exists(path: &Path) -> Result<()> {
        if !path.try_exists()? {
            return Err(CollateError::file_not_found(path.to_path_buf()));
        }

        if path.is_dir() {
            return Err(CollateError::not_a_file(path.to_path_buf()));
        }

        Ok(())
    }
}

impl PageCounter for PdfReader {
    fn count_pages(&self, path: &Path) -> Result<usize> {
        self.load(path).map(|loaded| loaded.page_count)
    }
}

impl Default for PdfReader {
    fn default() -> Self {
        Self::new()
    }
}
