//! The pairing state machine.
//!
//! [`PairingStateMachine`] consumes creation and completion events one at a
//! time and decides which two files form a duplex pair. It owns no lock and
//! never blocks: a creation arriving while the session is busy is answered
//! with [`Outcome::Busy`] and it is up to the caller (normally the
//! [`Collator`](super::Collator)) to retry once the session is free.
//!
//! | State | created | completed |
//! |---|---|---|
//! | `WAITING_FOR_FIRST` | becomes `first` | illegal, reset |
//! | `RECEIVING_FIRST` | busy | `first` finished |
//! | `WAITING_FOR_SECOND` | same path or timeout: replaces `first` (→ `RECEIVING_FIRST`), else becomes `second` | illegal, reset |
//! | `RECEIVING_SECOND` | busy | `second` finished, collate |
//! | `PROCESSING` | busy | illegal, reset |

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use super::Outcome;
use super::session::{PdfFile, Session, SlotDisplay, State};
use crate::config::Config;
use crate::error::{CollateError, Result};
use crate::io::PageCounter;
use crate::merge::Merger;
use crate::utils::is_pdf;

/// Pairs consecutive scans and merges compatible pairs.
#[derive(Debug)]
pub struct PairingStateMachine<C, M> {
    session: Session,
    config: Config,
    page_counter: C,
    merger: M,
}

impl<C, M> PairingStateMachine<C, M>
where
    C: PageCounter,
    M: Merger,
{
    /// Create a machine waiting for its first file.
    pub fn new(config: Config, page_counter: C, merger: M) -> Self {
        Self {
            session: Session::new(),
            config,
            page_counter,
            merger,
        }
    }

    /// The current session.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// The current state.
    pub fn state(&self) -> State {
        self.session.state()
    }

    /// The configuration this machine was built with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Handle a creation event for `path` received at `now`.
    pub fn on_file_created(&mut self, path: &Path, now: Instant) -> Outcome {
        if !is_pdf(path) {
            info!(path = %path.display(), "Skipping file because it is not a PDF");
            return Outcome::NotAPdf;
        }

        match self.session.state {
            state if state.is_busy() => Outcome::Busy(state),
            State::WaitingForSecond => self.accept_second(path, now),
            _ => self.accept_first(path, now),
        }
    }

    /// Handle a completion (closed after write) event for `path` received at
    /// `now`.
    pub fn on_file_completed(&mut self, path: &Path, now: Instant) -> Outcome {
        if !is_pdf(path) {
            info!(path = %path.display(), "Skipping file because it is not a PDF");
            return Outcome::NotAPdf;
        }

        if !self.session.tracks(path) {
            warn!(
                path = %path.display(),
                first = %SlotDisplay(self.session.first()),
                second = %SlotDisplay(self.session.second()),
                "Skipping completion for a file that is not being received"
            );
            return Outcome::UnknownPathOnCompletion;
        }

        match self.session.state {
            State::ReceivingFirst => {
                if let Some(first) = self.session.first.as_mut() {
                    first.finished_at = Some(now);
                }
                self.session.transition(State::WaitingForSecond);
                info!(path = %path.display(), "First file received");
                Outcome::FirstFinished
            }
            State::ReceivingSecond => {
                if let Some(second) = self.session.second.as_mut() {
                    second.finished_at = Some(now);
                }
                info!(path = %path.display(), "Second file received");
                self.collate()
            }
            state => {
                error!(
                    path = %path.display(),
                    %state,
                    "Reached an illegal state: a file was closed while nothing was being received"
                );
                self.reset();
                Outcome::IllegalState(state)
            }
        }
    }

    fn accept_first(&mut self, path: &Path, now: Instant) -> Outcome {
        info!(path = %path.display(), "Receiving first file");
        self.session.first = Some(PdfFile::new(path, now));
        self.session.transition(State::ReceivingFirst);
        Outcome::FirstStarted
    }

    fn accept_second(&mut self, path: &Path, now: Instant) -> Outcome {
        let Some(finished_at) = self.session.first().and_then(|first| first.finished_at) else {
            error!(
                path = %path.display(),
                first = %SlotDisplay(self.session.first()),
                "Waiting for a second file without a finished first file"
            );
            self.reset();
            return self.accept_first(path, now);
        };

        if self.session.tracks(path) {
            info!(path = %path.display(), "First file is being written again");
            self.session.first = Some(PdfFile::new(path, now));
            self.session.transition(State::ReceivingFirst);
            return Outcome::FirstStarted;
        }

        let waited = now.saturating_duration_since(finished_at);
        if waited > self.config.collate_timeout {
            let discarded = self.session.first.replace(PdfFile::new(path, now));
            warn!(
                discarded = %SlotDisplay(discarded.as_ref()),
                path = %path.display(),
                waited = %humantime::format_duration(round_to_secs(waited)),
                timeout = %humantime::format_duration(self.config.collate_timeout),
                "Collate timeout: first file was discarded and replaced"
            );
            // The replacement is unfinished, so `first` is being received again.
            self.session.transition(State::ReceivingFirst);
            return Outcome::CollateTimeout {
                discarded: discarded.map(|file| file.path).unwrap_or_default(),
            };
        }

        info!(path = %path.display(), "Receiving second file");
        self.session.second = Some(PdfFile::new(path, now));
        self.session.transition(State::ReceivingSecond);
        Outcome::SecondStarted
    }

    /// Decide what to do with a complete pair.
    fn collate(&mut self) -> Outcome {
        let (Some(first), Some(second)) = (self.session.first(), self.session.second()) else {
            error!(
                first = %SlotDisplay(self.session.first()),
                second = %SlotDisplay(self.session.second()),
                "Cannot collate an incomplete pair"
            );
            self.reset();
            return Outcome::IllegalState(State::ReceivingSecond);
        };
        let first = first.path.clone();
        let second = second.path.clone();

        if let Err(reason) = self.check_compatibility(&first, &second) {
            warn!(
                first = %first.display(),
                second = %second.display(),
                %reason,
                "PDFs are not compatible, keeping the second file as the new first"
            );
            self.session.first = self.session.second.take();
            self.session.transition(State::WaitingForSecond);
            return Outcome::IncompatiblePair { discarded: first };
        }

        self.process(first, second)
    }

    /// Both files must be readable and have the same number of pages.
    fn check_compatibility(&self, first: &Path, second: &Path) -> Result<usize> {
        let first_pages = self.page_counter.count_pages(first)?;
        let second_pages = self.page_counter.count_pages(second)?;

        if first_pages != second_pages {
            return Err(CollateError::PageCountMismatch {
                first: first.to_path_buf(),
                first_pages,
                second: second.to_path_buf(),
                second_pages,
            });
        }

        Ok(first_pages)
    }

    fn process(&mut self, first: PathBuf, second: PathBuf) -> Outcome {
        self.session.transition(State::Processing);

        let destination = self.config.destination_for(&first);
        info!(
            first = %first.display(),
            second = %second.display(),
            "Starting processing"
        );

        let result = self.merger.merge(&first, &second, &destination);

        info!(
            first = %first.display(),
            second = %second.display(),
            destination = %destination.display(),
            "End of processing"
        );

        let outcome = match result {
            Ok(report) => {
                debug!(
                    pages = report.total_pages,
                    bytes = report.file_size,
                    elapsed_ms = report.merge_time.as_millis() as u64,
                    "Merge statistics"
                );
                let inputs_deleted = self.config.delete_old_files
                    && delete_inputs(&[first.as_path(), second.as_path()]);
                Outcome::Merged {
                    report,
                    inputs_deleted,
                }
            }
            Err(err) if err.is_recoverable() => {
                warn!(
                    first = %first.display(),
                    second = %second.display(),
                    error = %err,
                    "Inputs could not be merged, keeping the original files"
                );
                Outcome::MergeFailure(err)
            }
            Err(err) => {
                error!(
                    first = %first.display(),
                    second = %second.display(),
                    error = %err,
                    "Error while processing, keeping the original files"
                );
                Outcome::MergeFailure(err)
            }
        };

        self.session.clear();
        outcome
    }

    /// Log the current slots and start over.
    fn reset(&mut self) {
        error!(
            state = %self.session.state,
            first = %SlotDisplay(self.session.first()),
            second = %SlotDisplay(self.session.second()),
            "Resetting state"
        );
        self.session.clear();
    }

    #[cfg(test)]
    pub(crate) fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }
}

/// Remove the inputs of a successful merge. Returns whether all were removed.
fn delete_inputs(paths: &[&Path]) -> bool {
    let mut all_deleted = true;

    for path in paths {
        if let Err(source) = std::fs::remove_file(path) {
            let err = CollateError::FailedToDelete {
                path: path.to_path_buf(),
                source,
            };
            error!(error = %err, "Could not remove merged input");
            all_deleted = false;
        }
    }

    all_deleted
}

/// Sub-second precision only adds noise to log lines.
fn round_to_secs(duration: Duration) -> Duration {
    Duration::from_secs(duration.as_secs())
}
