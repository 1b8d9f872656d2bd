//! Error types for pdfcollate.
//!
//! Every fallible operation in the library returns [`CollateError`]. The
//! pairing state machine never lets these escape: it logs them and turns them
//! into an [`Outcome`](crate::collate::Outcome). They only reach the process
//! boundary during startup (configuration, watcher registration).
//!
//! # Error Categories
//!
//! - **I/O Errors**: File not found, permission denied, etc.
//! - **PDF Errors**: Unreadable, corrupted or encrypted inputs
//! - **Merge Errors**: Page count mismatch, output write failures
//! - **Setup Errors**: Invalid configuration, watcher registration

use std::io;
use std::path::PathBuf;

/// Result type alias for pdfcollate operations.
pub type Result<T> = std::result::Result<T, CollateError>;

/// Main error type for pdfcollate operations.
#[derive(Debug, thiserror::Error)]
pub enum CollateError {
    /// Input file was not found.
    #[error("File not found: {}", .path.display())]
    FileNotFound {
        /// Path to the file that was not found.
        path: PathBuf,
    },

    /// Path exists but is a directory.
    #[error("Not a file: {}", .path.display())]
    NotAFile {
        /// Path that is not a file.
        path: PathBuf,
    },

    /// Failed to load PDF file.
    #[error("Failed to load PDF: {}\n  Reason: {reason}", .path.display())]
    FailedToLoadPdf {
        /// Path to the PDF file.
        path: PathBuf,
        /// Reason for the failure.
        reason: String,
    },

    /// PDF file parsed but its structure is unusable.
    #[error("Corrupted or invalid PDF: {}\n  Details: {details}", .path.display())]
    CorruptedPdf {
        /// Path to the corrupted PDF.
        path: PathBuf,
        /// Details about the corruption.
        details: String,
    },

    /// PDF file is encrypted and cannot be processed.
    #[error("PDF is encrypted and cannot be processed: {}", .path.display())]
    EncryptedPdf {
        /// Path to the encrypted PDF.
        path: PathBuf,
    },

    /// The two halves of a pair do not have the same number of pages.
    #[error(
        "Page count mismatch: {} has {first_pages} page(s), {} has {second_pages} page(s)",
        .first.display(),
        .second.display()
    )]
    PageCountMismatch {
        /// Path to the front-side scan.
        first: PathBuf,
        /// Page count of the front-side scan.
        first_pages: usize,
        /// Path to the back-side scan.
        second: PathBuf,
        /// Page count of the back-side scan.
        second_pages: usize,
    },

    /// Failed to create output file.
    #[error("Failed to create output file: {}\n  Reason: {source}", .path.display())]
    FailedToCreateOutput {
        /// Path where output should be created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Failed to write to output file.
    #[error("Failed to write to output file: {}\n  Reason: {source}", .path.display())]
    FailedToWrite {
        /// Path being written to.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Failed to copy owner or permission bits onto the output.
    #[error("Failed to copy ownership/permissions onto: {}\n  Reason: {source}", .path.display())]
    FailedToCopyMetadata {
        /// Output path that could not be updated.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Failed to remove an input after a successful merge.
    #[error("Failed to delete: {}\n  Reason: {source}", .path.display())]
    FailedToDelete {
        /// Path of the file that could not be removed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The filesystem watcher could not be created or registered.
    #[error("Filesystem watcher error: {source}")]
    Watch {
        /// Underlying notify error.
        #[from]
        source: notify::Error,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of what's wrong with the configuration.
        message: String,
    },

    /// Generic I/O error.
    #[error("I/O error: {source}")]
    Io {
        /// Underlying I/O error.
        #[from]
        source: io::Error,
    },

    /// Generic error with a custom message.
    #[error("{message}")]
    Other {
        /// Error message.
        message: String,
    },
}

impl From<lopdf::Error> for CollateError {
    fn from(err: lopdf::Error) -> Self {
        Self::other(err.to_string())
    }
}

impl CollateError {
    /// Create a FileNotFound error.
    pub fn file_not_found(path: PathBuf) -> Self {
        Self::FileNotFound { path }
    }

    /// Create a NotAFile error.
    pub fn not_a_file(path: PathBuf) -> Self {
        Self::NotAFile { path }
    }

    /// Create a FailedToLoadPdf error.
    pub fn failed_to_load_pdf(path: PathBuf, reason: impl Into<String>) -> Self {
        Self::FailedToLoadPdf {
            path,
            reason: reason.into(),
        }
    }

    /// Create a CorruptedPdf error.
    pub fn corrupted_pdf(path: PathBuf, details: impl Into<String>) -> Self {
        Self::CorruptedPdf {
            path,
            details: details.into(),
        }
    }

    /// Create an EncryptedPdf error.
    pub fn encrypted_pdf(path: PathBuf) -> Self {
        Self::EncryptedPdf { path }
    }

    /// Create an InvalidConfig error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an Other error with a custom message.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Check if this error is about an input document rather than the
    /// environment.
    ///
    /// Input errors are expected in normal operation (a scan that is still
    /// being written, a stray non-PDF renamed to `.pdf`). A merge failing
    /// with one of them is logged as a warning instead of an error.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::FailedToLoadPdf { .. }
                | Self::CorruptedPdf { .. }
                | Self::EncryptedPdf { .. }
                | Self::PageCountMismatch { .. }
        )
    }

    /// Get the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::FileNotFound { .. } => 2,
            Self::NotAFile { .. } => 2,
            Self::FailedToLoadPdf { .. } => 3,
            Self::CorruptedPdf { .. } => 3,
            Self::EncryptedPdf { .. } => 3,
            Self::PageCountMismatch { .. } => 6,
            Self::FailedToCreateOutput { .. } => 5,
            Self::FailedToWrite { .. } => 5,
            Self::FailedToCopyMetadata { .. } => 5,
            Self::FailedToDelete { .. } => 5,
            Self::Watch { .. } => 7,
            Self::InvalidConfig { .. } => 1,
            Self::Io { .. } => 5,
            Self::Other { .. } => 1,
        }
    }
}
