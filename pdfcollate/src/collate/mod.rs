//! Pairing of consecutive scans.
//!
//! A duplex scan arrives as two files: the front sides first, then the back
//! sides in reverse order. This module decides which two files belong
//! together and hands complete pairs to a [`Merger`](crate::merge::Merger).
//!
//! - [`session`] holds the data model: the two slots and their [`State`].
//! - [`machine`] is the single-threaded [`PairingStateMachine`].
//! - [`collator`] wraps the machine for concurrent event sources and blocks
//!   creations while the session is busy.

pub mod collator;
pub mod machine;
pub mod session;

pub use collator::Collator;
pub use machine::PairingStateMachine;
pub use session::{PdfFile, Session, State};

use std::path::PathBuf;

use crate::error::CollateError;
use crate::merge::MergeReport;

/// What handling one event did to the session.
#[derive(Debug)]
pub enum Outcome {
    /// The path is not a PDF; the session is untouched.
    NotAPdf,

    /// A completion for a path the session is not receiving.
    UnknownPathOnCompletion,

    /// A creation arrived while a file was being received or merged.
    Busy(State),

    /// A completion arrived before its creation was applied; it will be
    /// replayed right after the creation.
    Deferred,

    /// The collator shut down while the creation was waiting.
    Abandoned,

    /// The file became `first`.
    FirstStarted,

    /// The file became `second`.
    SecondStarted,

    /// The previous `first` waited too long for a partner and was replaced.
    CollateTimeout {
        /// The `first` file that was dropped from the session.
        discarded: PathBuf,
    },

    /// `first` finished writing.
    FirstFinished,

    /// The pair could not be merged; `second` took the place of `first`.
    IncompatiblePair {
        /// The `first` file that was dropped from the session.
        discarded: PathBuf,
    },

    /// The pair was merged.
    Merged {
        /// Merge statistics.
        report: MergeReport,
        /// Whether both inputs were removed afterwards.
        inputs_deleted: bool,
    },

    /// The merge failed; the inputs were kept.
    MergeFailure(CollateError),

    /// A completion arrived in a state that cannot receive one; the session
    /// was reset.
    IllegalState(State),
}
