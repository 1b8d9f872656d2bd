//! PDF merge operations.
//!
//! The pairing state machine only sees the [`Merger`] trait. The production
//! implementation is [`InterleavingMerger`], which collates a front-side scan
//! with a back-side scan fed in reverse order.
//!
//! # Examples
//!
//! ```no_run
//! use pdfcollate::merge::{InterleavingMerger, Merger};
//! use std::path::Path;
//!
//! let report = InterleavingMerger::new().merge(
//!     Path::new("/files/front.pdf"),
//!     Path::new("/files/back.pdf"),
//!     Path::new("/output/front-collated.pdf"),
//! )?;
//! println!("{} pages in {:?}", report.total_pages, report.merge_time);
//! # Ok::<(), pdfcollate::CollateError>(())
//! ```

pub mod interleave;

pub use interleave::InterleavingMerger;

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Result;

/// Summary of a completed merge.
#[derive(Debug, Clone)]
pub struct MergeReport {
    /// Where the merged document was written.
    pub output_path: PathBuf,

    /// Number of pages in the merged document.
    pub total_pages: usize,

    /// Size of the written file in bytes.
    pub file_size: u64,

    /// Time taken to load, merge and write.
    pub merge_time: Duration,
}

/// Combines two scans into one document at `destination`.
///
/// Implementations must not leave a partial file at `destination` when they
/// fail, and must copy owner, group and mode from `first` onto the result.
pub trait Merger {
    /// Merge `first` and `second` into `destination`.
    fn merge(&self, first: &Path, second: &Path, destination: &Path) -> Result<MergeReport>;
}
