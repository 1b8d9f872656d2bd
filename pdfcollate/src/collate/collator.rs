//! Thread-safe front end of the pairing state machine.
//!
//! Creation events have to wait while the session is busy, completion events
//! never do. The [`Collator`] keeps the machine behind a mutex and parks
//! creations on a condition variable that is signalled after every
//! completion, so a completion can always get through while creations wait.
//!
//! Events from the watcher are split into two lanes by the caller: creations
//! are applied one at a time on a dedicated thread, completions are applied
//! as they arrive. Because the lanes run independently a completion may
//! overtake the creation of the same file. [`Collator::announce_creation`]
//! registers a creation before it is queued; a completion for an announced
//! path is held back and replayed as soon as the creation has been applied.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use tracing::{debug, trace};

use super::machine::PairingStateMachine;
use super::session::{Session, State};
use super::Outcome;
use crate::io::PageCounter;
use crate::merge::Merger;
use crate::utils::is_pdf;

struct Shared<C, M> {
    machine: PairingStateMachine<C, M>,
    closed: bool,
    /// Announced creations not yet applied, with the time of a completion
    /// that arrived in the meantime.
    pending: HashMap<PathBuf, Option<Instant>>,
}

/// Serializes access to a [`PairingStateMachine`].
pub struct Collator<C, M> {
    shared: Mutex<Shared<C, M>>,
    session_free: Condvar,
}

impl<C, M> Collator<C, M>
where
    C: PageCounter,
    M: Merger,
{
    /// Wrap `machine`.
    pub fn new(machine: PairingStateMachine<C, M>) -> Self {
        Self {
            shared: Mutex::new(Shared {
                machine,
                closed: false,
                pending: HashMap::new(),
            }),
            session_free: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Shared<C, M>> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record that a creation for `path` has been queued.
    ///
    /// A completion already deferred for the same path is kept.
    pub fn announce_creation(&self, path: &Path) {
        if is_pdf(path) {
            self.lock().pending.entry(path.to_path_buf()).or_insert(None);
        }
    }

    /// Apply a creation event, blocking while the session is busy.
    ///
    /// Returns the outcome of the creation followed by the outcome of a
    /// completion for the same path that was deferred while it waited.
    pub fn on_file_created(&self, path: &Path, now: Instant) -> Vec<Outcome> {
        let mut shared = self.lock();

        let outcome = loop {
            if shared.closed {
                shared.pending.remove(path);
                return vec![Outcome::Abandoned];
            }
            match shared.machine.on_file_created(path, now) {
                Outcome::Busy(state) => {
                    trace!(path = %path.display(), %state, "Waiting for the session to become free");
                    shared = self
                        .session_free
                        .wait(shared)
                        .unwrap_or_else(PoisonError::into_inner);
                }
                outcome => break outcome,
            }
        };

        let mut outcomes = vec![outcome];
        if let Some(Some(completed_at)) = shared.pending.remove(path) {
            debug!(path = %path.display(), "Replaying deferred completion");
            outcomes.push(shared.machine.on_file_completed(path, completed_at));
        }

        drop(shared);
        self.session_free.notify_all();
        outcomes
    }

    /// Apply a completion event. Never waits for the session.
    pub fn on_file_completed(&self, path: &Path, now: Instant) -> Outcome {
        let mut shared = self.lock();

        if let Some(slot) = shared.pending.get_mut(path) {
            debug!(path = %path.display(), "Deferring completion until its creation is applied");
            *slot = Some(now);
            return Outcome::Deferred;
        }

        let outcome = shared.machine.on_file_completed(path, now);
        drop(shared);
        self.session_free.notify_all();
        outcome
    }

    /// Release every waiting creation and refuse new ones.
    pub fn close(&self) {
        self.lock().closed = true;
        self.session_free.notify_all();
    }

    /// Whether [`close`](Self::close) was called.
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Current state of the session.
    pub fn state(&self) -> State {
        self.lock().machine.state()
    }

    /// A copy of the current session.
    pub fn snapshot(&self) -> Session {
        self.lock().machine.session().clone()
    }
}
