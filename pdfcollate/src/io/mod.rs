//! I/O operations for pdfcollate.
//!
//! This module handles all file I/O on PDF documents:
//! - Loading scans from disk and counting their pages
//! - Writing merged documents atomically
//! - Copying ownership and permissions from the source scan

pub mod reader;
pub mod writer;

pub use reader::{LoadedPdf, PageCounter, PdfReader};
pub use writer::{PdfWriter, WriteOptions, WriteStatistics};
