//! Bounded command queue with fluent builders and snapshot/restore.
//!
//! A [`CommandQueue`] is a cheap, cloneable handle to one ordered buffer of
//! [`Action`]s. The controller's drain loop is the single reader; any number
//! of handles may append concurrently. Append, pop and the drain-and-discard
//! step of an immediate clear each happen under one lock, so an action
//! appended before `clear(true)` can never run after it.
//!
//! # Capacity
//!
//! The queue holds at most `capacity` actions (default
//! [`DEFAULT_CAPACITY`]). Appending to a full queue silently drops the new
//! action. Sequences are hand-written and far smaller than the limit, so a
//! full queue means a runaway producer and dropping its newest output is the
//! least surprising outcome. [`CommandQueue::dropped`] counts the drops.
//!
//! # Snapshots
//!
//! [`save`](CommandQueue::save) deep-copies the pending actions;
//! [`restore`](CommandQueue::restore) replaces the live contents with a fresh
//! copy of the snapshot and can be repeated. This is what lets a finished
//! sequence play again on the next trigger.
//!
//! ```rust
//! use wac_robot::CommandQueue;
//!
//! let queue = CommandQueue::new("main");
//! queue
//!     .set_color(255, 0, 0, 500) // red for half a second
//!     .set_motion(100, 100, 1000)
//!     .stop(0)
//!     .save();
//!
//! assert_eq!(queue.len(), 5);
//! while let Ok(Some(_)) = queue.pop() {}
//! queue.restore();
//! assert_eq!(queue.len(), 5);
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;
use tracing::{debug, warn};

use crate::actions::{shutdown_sequence, Action, Pattern};
use crate::error::QueueClosed;

/// Default maximum number of pending actions per queue.
pub const DEFAULT_CAPACITY: usize = 100;

/// Default tone length for [`CommandQueue::emit_tone`] callers that have no
/// preference, in milliseconds.
pub const DEFAULT_TONE_MS: u64 = 250;

#[derive(Default)]
struct QueueState {
    actions: VecDeque<Action>,
    snapshot: Option<VecDeque<Action>>,
    closed: bool,
    dropped: usize,
}

impl QueueState {
    fn push(&mut self, action: Action, capacity: usize, name: &str) -> bool {
        if self.closed {
            debug!(queue = name, %action, "queue closed, action dropped");
            self.dropped += 1;
            return false;
        }
        if self.actions.len() >= capacity {
            warn!(queue = name, %action, capacity, "queue full, action dropped");
            self.dropped += 1;
            return false;
        }
        self.actions.push_back(action);
        true
    }
}

struct Inner {
    name: String,
    capacity: usize,
    state: Mutex<QueueState>,
    waker: Arc<Notify>,
}

/// Shared handle to a bounded FIFO of actions.
///
/// Cloning the handle does not copy the queue; all clones see the same
/// contents. Builder methods take `&self` and return `&Self` so sequences
/// can be chained.
#[derive(Clone)]
pub struct CommandQueue {
    inner: Arc<Inner>,
}

impl CommandQueue {
    /// Creates an empty queue with [`DEFAULT_CAPACITY`].
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_capacity(name, DEFAULT_CAPACITY)
    }

    /// Creates an empty queue holding at most `capacity` actions.
    pub fn with_capacity(name: impl Into<String>, capacity: usize) -> Self {
        Self::with_waker(name, capacity, Arc::new(Notify::new()))
    }

    /// Creates a queue that signals `waker` on every accepted append.
    pub(crate) fn with_waker(name: impl Into<String>, capacity: usize, waker: Arc<Notify>) -> Self {
        Self {
            inner: Arc::new(Inner {
                name: name.into(),
                capacity,
                state: Mutex::new(QueueState::default()),
                waker,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        // Every critical section leaves the state consistent, so a panic
        // elsewhere does not invalidate it.
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue name, used in logs and status messages.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Maximum number of pending actions.
    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// Number of pending actions.
    pub fn len(&self) -> usize {
        self.lock().actions.len()
    }

    /// Returns true if no actions are pending.
    pub fn is_empty(&self) -> bool {
        self.lock().actions.is_empty()
    }

    /// Returns true if a snapshot has been saved.
    pub fn has_snapshot(&self) -> bool {
        self.lock().snapshot.is_some()
    }

    /// Returns true once [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Number of actions dropped because the queue was full or closed.
    pub fn dropped(&self) -> usize {
        self.lock().dropped
    }

    /// Copy of the pending actions, front first.
    pub fn pending(&self) -> Vec<Action> {
        self.lock().actions.iter().cloned().collect()
    }

    /// Returns true if both handles point at the same queue.
    pub fn same_queue(&self, other: &CommandQueue) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    // ------------------------------------------------------------------------
    // Appending
    // ------------------------------------------------------------------------

    /// Append one action.
    ///
    /// Returns `false` if the action was dropped because the queue is full
    /// or closed.
    #[must_use]
    pub fn push(&self, action: Action) -> bool {
        let accepted = self
            .lock()
            .push(action, self.inner.capacity, &self.inner.name);
        if accepted {
            self.inner.waker.notify_one();
        }
        accepted
    }

    fn append(&self, actions: impl IntoIterator<Item = Action>) -> &Self {
        let accepted = {
            let mut state = self.lock();
            let mut any = false;
            for action in actions {
                any |= state.push(action, self.inner.capacity, &self.inner.name);
            }
            any
        };
        if accepted {
            self.inner.waker.notify_one();
        }
        self
    }

    fn with_wait(action: Action, duration_ms: u64) -> impl Iterator<Item = Action> {
        core::iter::once(action).chain((duration_ms > 0).then(|| Action::wait(duration_ms)))
    }

    /// Set the light color, then hold for `duration_ms`.
    pub fn set_color(&self, red: i32, green: i32, blue: i32, duration_ms: u64) -> &Self {
        self.append(Self::with_wait(
            Action::set_color(red, green, blue),
            duration_ms,
        ))
    }

    /// Drive the wheels, then hold for `duration_ms`.
    pub fn set_motion(&self, left: i32, right: i32, duration_ms: u64) -> &Self {
        self.append(Self::with_wait(Action::set_motion(left, right), duration_ms))
    }

    /// Stop both wheels, then hold for `duration_ms`.
    pub fn stop(&self, duration_ms: u64) -> &Self {
        self.set_motion(0, 0, duration_ms)
    }

    /// Pause. A zero duration appends nothing.
    pub fn wait(&self, duration_ms: u64) -> &Self {
        if duration_ms > 0 {
            self.append([Action::wait(duration_ms)]);
        }
        self
    }

    /// Show text, then hold for `duration_ms`.
    pub fn display_text(&self, text: impl Into<String>, duration_ms: u64) -> &Self {
        self.append(Self::with_wait(Action::display_text(text), duration_ms))
    }

    /// Show a pattern, then hold for `duration_ms`.
    pub fn display_pattern(&self, pattern: Pattern, duration_ms: u64) -> &Self {
        self.append(Self::with_wait(Action::display_pattern(pattern), duration_ms))
    }

    /// Blank the display.
    pub fn clear_display(&self) -> &Self {
        self.append([Action::clear_display()])
    }

    /// Sound a tone for `duration_ms`, then silence the buzzer.
    ///
    /// The tone-off action is always appended so sound never outlives its
    /// duration. Use [`DEFAULT_TONE_MS`] for a short beep.
    pub fn emit_tone(&self, frequency: u32, duration_ms: u64) -> &Self {
        self.append(
            Self::with_wait(Action::tone(frequency), duration_ms)
                .chain(core::iter::once(Action::tone_off())),
        )
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Append the shutdown sequence (display off, wheels stopped, lights off,
    /// buzzer off).
    ///
    /// With `immediate`, every pending action is discarded first. Discarding
    /// and appending happen under one lock, so nothing appended before this
    /// call executes after it.
    pub fn clear(&self, immediate: bool) -> &Self {
        {
            let mut state = self.lock();
            if immediate {
                let discarded = state.actions.len();
                state.actions.clear();
                if discarded > 0 {
                    debug!(queue = %self.inner.name, discarded, "pending actions discarded");
                }
            }
            for action in shutdown_sequence() {
                state.push(action, self.inner.capacity, &self.inner.name);
            }
        }
        self.inner.waker.notify_one();
        self
    }

    /// Drop every pending action without appending anything.
    pub fn discard(&self) -> usize {
        let mut state = self.lock();
        let discarded = state.actions.len();
        state.actions.clear();
        discarded
    }

    /// Save a deep copy of the pending actions, replacing any earlier one.
    pub fn save(&self) -> &Self {
        let mut state = self.lock();
        state.snapshot = Some(state.actions.clone());
        drop(state);
        self
    }

    /// Replace the pending actions with a copy of the snapshot.
    ///
    /// Does nothing without a snapshot. The snapshot is kept, so restoring
    /// twice gives the same contents.
    pub fn restore(&self) -> &Self {
        let restored = {
            let mut state = self.lock();
            match state.snapshot.clone() {
                Some(snapshot) if !state.closed => {
                    state.actions = snapshot;
                    !state.actions.is_empty()
                }
                _ => false,
            }
        };
        if restored {
            self.inner.waker.notify_one();
        }
        self
    }

    /// Restore from the snapshot only if the queue is currently empty.
    ///
    /// Returns true if actions were restored.
    pub(crate) fn restore_if_empty(&self) -> bool {
        let mut guard = self.lock();
        let state = &mut *guard;
        if state.closed || !state.actions.is_empty() {
            return false;
        }
        match &state.snapshot {
            Some(snapshot) if !snapshot.is_empty() => {
                state.actions = snapshot.clone();
                true
            }
            _ => false,
        }
    }

    /// True if the queue has actions now or a non-empty snapshot to replay.
    pub(crate) fn can_play(&self) -> bool {
        let state = self.lock();
        !state.closed
            && (!state.actions.is_empty()
                || state.snapshot.as_ref().is_some_and(|s| !s.is_empty()))
    }

    /// Prepare a bound queue for dispatch.
    ///
    /// A queue with actions but no snapshot is saved so it can replay; an
    /// empty queue with a snapshot is restored. Returns true if the queue
    /// has actions to run afterwards.
    pub(crate) fn arm_for_replay(&self) -> bool {
        let mut guard = self.lock();
        let state = &mut *guard;
        if state.closed {
            return false;
        }
        if state.actions.is_empty() {
            if let Some(snapshot) = &state.snapshot {
                state.actions = snapshot.clone();
            }
        } else if state.snapshot.is_none() {
            state.snapshot = Some(state.actions.clone());
        }
        !state.actions.is_empty()
    }

    /// Take the next action.
    ///
    /// Returns `Ok(None)` when empty and [`QueueClosed`] once the queue has
    /// been closed.
    pub fn pop(&self) -> Result<Option<Action>, QueueClosed> {
        let mut state = self.lock();
        if state.closed {
            return Err(QueueClosed);
        }
        Ok(state.actions.pop_front())
    }

    /// Permanently close the queue. Pending actions are discarded, later
    /// appends are dropped and `pop` returns [`QueueClosed`].
    pub fn close(&self) {
        let mut state = self.lock();
        state.closed = true;
        state.actions.clear();
    }
}

impl fmt::Debug for CommandQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("CommandQueue")
            .field("name", &self.inner.name)
            .field("len", &state.actions.len())
            .field("capacity", &self.inner.capacity)
            .field("has_snapshot", &state.snapshot.is_some())
            .field("closed", &state.closed)
            .finish()
    }
}
