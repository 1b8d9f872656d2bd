//! pdfcollate - Collate duplex scans from a watched directory.
//!
//! A simplex document feeder scans the front sides of a stack into one PDF.
//! The stack is turned over and scanned again, producing a second PDF with
//! the back sides in reverse order. This library watches the directory the
//! scanner writes to, pairs consecutive files and merges each compatible pair
//! into a single document with the pages in reading order:
//!
//! - Pairing of consecutive scans with a collate timeout
//! - Page-count compatibility check before merging
//! - Interleaving merge with atomic output writes
//! - Owner and permission copying from the front scan
//! - Optional removal of merged inputs
//!
//! # Examples
//!
//! ## Running the service
//!
//! ```no_run
//! use pdfcollate::{service, Config};
//! use std::path::PathBuf;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config {
//!     source_dir: PathBuf::from("/files"),
//!     destination_dir: PathBuf::from("/output"),
//!     ..Config::default()
//! };
//!
//! service::run(config, async {
//!     let _ = tokio::signal::ctrl_c().await;
//! })
//! .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Driving the state machine directly
//!
//! ```no_run
//! use pdfcollate::collate::{Outcome, PairingStateMachine};
//! use pdfcollate::io::PdfReader;
//! use pdfcollate::merge::InterleavingMerger;
//! use pdfcollate::Config;
//! use std::path::Path;
//! use std::time::Instant;
//!
//! let mut machine = PairingStateMachine::new(
//!     Config::default(),
//!     PdfReader::new(),
//!     InterleavingMerger::new(),
//! );
//!
//! for path in ["/files/front.pdf", "/files/back.pdf"] {
//!     machine.on_file_created(Path::new(path), Instant::now());
//!     let outcome = machine.on_file_completed(Path::new(path), Instant::now());
//!     if let Outcome::Merged { report, .. } = outcome {
//!         println!("Wrote {}", report.output_path.display());
//!     }
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod collate;
pub mod config;
pub mod error;
pub mod io;
pub mod merge;
pub mod service;
pub mod utils;
pub mod watch;

// Re-export commonly used types
pub use config::Config;
pub use error::{CollateError, Result};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
