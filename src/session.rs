//! Session state for the task forest
//!
//! A [`Session`] owns the current forest snapshot and a short log of state
//! transitions. [`Core`] wraps a session behind a mutex so that hosts serving
//! concurrent requests apply one mutation at a time, and broadcasts a
//! notification after every mutation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::convert::Infallible;
use std::sync::{Arc, Mutex};

use crate::gesture::{self, Gesture, GestureOutcome};
use crate::models::{Forest, ForestError, TaskId};
use crate::view::{self, LevelView};

/// Represents a single state transition event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionLogEntry {
    pub timestamp: DateTime<Utc>,
    pub action: String,
    pub details: Option<String>,
}

impl TransitionLogEntry {
    pub fn new(action: String, details: Option<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            action,
            details,
        }
    }
}

// Define the maximum size for the history buffer
const MAX_HISTORY_SIZE: usize = 20;

/// The forest owned by one editing session
pub struct Session {
    forest: Arc<Forest>,
    history: VecDeque<TransitionLogEntry>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Forest::new())
    }
}

impl Session {
    /// Creates a session around the given forest
    pub fn new(forest: Forest) -> Self {
        Self {
            forest: Arc::new(forest),
            history: VecDeque::with_capacity(MAX_HISTORY_SIZE),
        }
    }

    /// Logs a state transition, maintaining the history buffer size.
    fn log_transition(&mut self, action: &str, details: Option<String>) {
        if self.history.len() == MAX_HISTORY_SIZE {
            self.history.pop_front();
        }
        self.history
            .push_back(TransitionLogEntry::new(action.to_string(), details));
    }

    /// The current, fully settled forest
    pub fn snapshot(&self) -> Arc<Forest> {
        Arc::clone(&self.forest)
    }

    pub fn view(&self) -> Vec<LevelView> {
        view::build_view(&self.forest)
    }

    pub fn span(&self, task_id: TaskId, level_index: usize) -> usize {
        view::span(&self.forest, task_id, level_index)
    }

    /// Applies a drop gesture. The snapshot is only replaced when the gesture
    /// succeeds.
    pub fn apply_gesture(&mut self, gesture: &Gesture) -> Result<GestureOutcome, ForestError> {
        match gesture::apply_gesture(&self.forest, gesture) {
            Ok((next, outcome)) => {
                tracing::info!(
                    "Applied {:?}: {} -> {}",
                    outcome.kind,
                    gesture.source,
                    gesture.target
                );
                self.forest = Arc::new(next);
                self.log_transition(
                    "apply_gesture",
                    Some(format!(
                        "{:?} from {} to {} (position: {:?})",
                        outcome.kind, gesture.source, gesture.target, gesture.position
                    )),
                );
                Ok(outcome)
            }
            Err(e) => {
                tracing::warn!(
                    "Rejected gesture {} -> {}: {}",
                    gesture.source,
                    gesture.target,
                    e
                );
                self.log_transition("gesture_rejected", Some(e.to_string()));
                Err(e)
            }
        }
    }

    /// Appends an empty trailing level, returning its index
    pub fn add_level(&mut self) -> usize {
        let index = Arc::make_mut(&mut self.forest).add_level();
        self.log_transition("add_level", Some(format!("Added level {}", index)));
        index
    }

    /// Replaces the whole forest, e.g. with one loaded by the host
    pub fn replace_forest(&mut self, forest: Forest) -> Result<(), ForestError> {
        forest.validate()?;
        let details = format!(
            "{} task(s) on {} level(s)",
            forest.task_count(),
            forest.level_count()
        );
        self.forest = Arc::new(forest);
        self.log_transition("replace_forest", Some(details));
        Ok(())
    }

    /// Recent transitions, oldest first
    pub fn history(&self) -> Vec<TransitionLogEntry> {
        self.history.iter().cloned().collect()
    }
}

/// Shared handle to a session
#[derive(Clone)]
pub struct Core {
    inner: Arc<Mutex<Session>>,
    update_tx: Arc<tokio::sync::broadcast::Sender<()>>,
}

impl Default for Core {
    fn default() -> Self {
        Self::new(Session::default())
    }
}

impl Core {
    pub fn new(session: Session) -> Self {
        // Create a broadcast channel with capacity for 100 messages
        let (tx, _rx) = tokio::sync::broadcast::channel(100);

        Self {
            inner: Arc::new(Mutex::new(session)),
            update_tx: Arc::new(tx),
        }
    }

    fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Session) -> R,
    {
        let session = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&session)
    }

    // Helper method to safely access the session and notify observers when
    // the mutation went through
    fn with_session<F, R, E>(&self, f: F) -> Result<R, E>
    where
        F: FnOnce(&mut Session) -> Result<R, E>,
    {
        let mut session = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let result = f(&mut session);

        if result.is_ok() {
            // Nobody listening is fine
            let _ = self.update_tx.send(());
        }

        result
    }

    pub fn forest(&self) -> Arc<Forest> {
        self.read(Session::snapshot)
    }

    pub fn view(&self) -> Vec<LevelView> {
        // Build outside the lock: the snapshot never changes under us
        let forest = self.forest();
        view::build_view(&forest)
    }

    pub fn span(&self, task_id: TaskId, level_index: usize) -> usize {
        let forest = self.forest();
        view::span(&forest, task_id, level_index)
    }

    pub fn apply_gesture(&self, gesture: &Gesture) -> Result<GestureOutcome, ForestError> {
        self.with_session(|session| session.apply_gesture(gesture))
    }

    pub fn add_level(&self) -> usize {
        self.with_session(|session| Ok::<_, Infallible>(session.add_level()))
            .unwrap_or_else(|never| match never {})
    }

    pub fn replace_forest(&self, forest: Forest) -> Result<(), ForestError> {
        self.with_session(|session| session.replace_forest(forest))
    }

    pub fn history(&self) -> Vec<TransitionLogEntry> {
        self.read(Session::history)
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<()> {
        self.update_tx.subscribe()
    }
}
