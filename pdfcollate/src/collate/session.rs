//! Session data model: the two slots and the state they are in.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::debug;

/// Where the session is in the pairing protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    /// Both slots empty; the next PDF becomes `first`.
    WaitingForFirst,
    /// `first` is being written.
    ReceivingFirst,
    /// `first` is complete; the next PDF becomes `second` unless the collate
    /// timeout has passed.
    WaitingForSecond,
    /// `second` is being written.
    ReceivingSecond,
    /// The pair is being merged.
    Processing,
}

impl State {
    /// Whether a new file cannot be accepted until the session moves on.
    pub fn is_busy(self) -> bool {
        matches!(
            self,
            Self::ReceivingFirst | Self::ReceivingSecond | Self::Processing
        )
    }

    /// Upper-case name used in log output.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::WaitingForFirst => "WAITING_FOR_FIRST",
            Self::ReceivingFirst => "RECEIVING_FIRST",
            Self::WaitingForSecond => "WAITING_FOR_SECOND",
            Self::ReceivingSecond => "RECEIVING_SECOND",
            Self::Processing => "PROCESSING",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One file observed by the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfFile {
    /// Path of the file; unique within a session.
    pub path: PathBuf,

    /// When the creation event was received.
    pub created_at: Instant,

    /// When the file was closed after writing. `None` while it is still being
    /// received.
    pub finished_at: Option<Instant>,
}

impl PdfFile {
    /// Start tracking a file that was just created.
    pub fn new(path: impl Into<PathBuf>, created_at: Instant) -> Self {
        Self {
            path: path.into(),
            created_at,
            finished_at: None,
        }
    }

    /// Whether the completion event has been received.
    pub fn is_finished(&self) -> bool {
        self.finished_at.is_some()
    }
}

/// Renders an optional slot for log fields.
pub(crate) struct SlotDisplay<'a>(pub(crate) Option<&'a PdfFile>);

impl fmt::Display for SlotDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(file) if file.is_finished() => write!(f, "{} (finished)", file.path.display()),
            Some(file) => write!(f, "{} (receiving)", file.path.display()),
            None => f.write_str("<empty>"),
        }
    }
}

/// The mutable state of the single pairing session.
///
/// `second` is only occupied while `first` is occupied and finished, and
/// `first` is only unfinished in [`State::ReceivingFirst`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub(crate) state: State,
    pub(crate) first: Option<PdfFile>,
    pub(crate) second: Option<PdfFile>,
}

impl Session {
    /// A fresh session waiting for its first file.
    pub fn new() -> Self {
        Self {
            state: State::WaitingForFirst,
            first: None,
            second: None,
        }
    }

    /// Current state.
    pub fn state(&self) -> State {
        self.state
    }

    /// The first slot.
    pub fn first(&self) -> Option<&PdfFile> {
        self.first.as_ref()
    }

    /// The second slot.
    pub fn second(&self) -> Option<&PdfFile> {
        self.second.as_ref()
    }

    /// Whether `path` is held by either slot.
    pub fn tracks(&self, path: &Path) -> bool {
        [self.first.as_ref(), self.second.as_ref()]
            .into_iter()
            .flatten()
            .any(|file| file.path == path)
    }

    /// Move to `new_state`, logging when it differs from the current one.
    pub(crate) fn transition(&mut self, new_state: State) {
        if new_state != self.state {
            debug!(from = %self.state, to = %new_state, "Changed state");
        }
        self.state = new_state;
    }

    /// Drop both slots and go back to [`State::WaitingForFirst`].
    pub(crate) fn clear(&mut self) {
        self.first = None;
        self.second = None;
        self.transition(State::WaitingForFirst);
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
