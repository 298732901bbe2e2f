//! # Scripting Types
//!
//! Handle types for Rhai scripting integration.
//!
//! ## Responsibilities
//! - **ProjectHandle**: Wrapper around a [`LinkSession`] and the frames it edits

use crate::notice::{Notice, SyncOutcome};
use crate::session::LinkSession;
use linkframe_data::model::Frame;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// The session and frame collection a script operates on.
#[derive(Debug)]
pub struct ProjectState {
    pub session: LinkSession,
    pub frames: Vec<Frame>,
    /// Notices from every operation the script ran, in order.
    pub notices: Vec<Notice>,
}

impl ProjectState {
    /// Adopts an operation's frames and notices. Returns whether it applied.
    pub fn apply(&mut self, outcome: SyncOutcome) -> bool {
        self.frames = outcome.frames;
        self.notices.extend(outcome.notices);
        outcome.applied
    }
}

/// Wrapper around a linking session for Rhai scripting.
#[derive(Debug, Clone)]
pub struct ProjectHandle {
    pub state: Arc<Mutex<ProjectState>>,
}

impl ProjectHandle {
    /// Loads `frames` into `session`, rebuilding its registry.
    pub fn new(mut session: LinkSession, frames: &[Frame]) -> Self {
        let loaded = session.reset(frames);
        Self {
            state: Arc::new(Mutex::new(ProjectState {
                session,
                frames: loaded.frames,
                notices: loaded.notices,
            })),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, ProjectState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs one session operation against the current frames and adopts
    /// its outcome. Returns whether the operation applied.
    pub fn run<F>(&self, op: F) -> bool
    where
        F: FnOnce(&mut LinkSession, &[Frame]) -> SyncOutcome,
    {
        let mut guard = self.lock();
        let state = &mut *guard;
        let outcome = op(&mut state.session, &state.frames);
        state.apply(outcome)
    }

    /// The current frames.
    pub fn frames(&self) -> Vec<Frame> {
        self.lock().frames.clone()
    }

    /// Drains the notices collected so far.
    pub fn take_notices(&self) -> Vec<Notice> {
        std::mem::take(&mut self.lock().notices)
    }
}
