//! Key bindings and input dispatch.
//!
//! The [`InputRouter`] maps keys from a fixed set to dedicated
//! [`CommandQueue`]s and, when a bound key fires, points the controller's
//! active queue at that binding. The drain loop does the rest.
//!
//! # Redirect Rules
//!
//! - Input is ignored until the controller is connected, so the main
//!   sequence always starts first.
//! - While the controller is idle the redirect takes effect at once.
//! - While an action is executing the redirect is parked and applied at the
//!   next action boundary. Several redirects in that window coalesce; the
//!   most recent wins and the earlier targets are left untouched.
//! - A binding that has actions is snapshotted the first time its redirect
//!   is applied, and an emptied binding is restored from that snapshot on
//!   the next press, so repeated presses replay the same sequence.
//! - A binding with nothing to play gets a one-shot acknowledgement instead:
//!   the key's label on the display.
//! - Once a key's sequence or acknowledgement drains, the controller runs
//!   the shutdown sequence before handing control back to main.
//!
//! # Example
//!
//! ```rust
//! use wac_robot::hal::MockLink;
//! use wac_robot::{Config, DeviceController, Key};
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let link = MockLink::new().with_device("WAC-2463", "F0:01");
//! let mut controller = DeviceController::new(link, Config::for_device("beep")).unwrap();
//!
//! controller.bind("w").unwrap().set_motion(100, 100, 500).stop(0);
//! controller.bind("s").unwrap().set_motion(-100, -100, 500).stop(0);
//! assert!(controller.bind("F13").is_err());
//!
//! // Input is ignored until the robot is connected.
//! let router = controller.router();
//! assert!(!router.dispatch_key(Key::parse("w").unwrap()));
//!
//! // Terminal input, or hardware buttons via `InputSink`.
//! controller.connect().await.unwrap();
//! assert!(router.dispatch_key(Key::parse("w").unwrap()));
//! # });
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;
use tracing::{debug, info};

use crate::controller::{ActiveQueue, ActiveSlot, QueueRole};
use crate::error::InvalidKey;
use crate::queue::CommandQueue;

// ============================================================================
// Keys
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum KeyCode {
    /// Lowercase ASCII letter or digit.
    Char(u8),
    Up,
    Down,
    Left,
    Right,
    ButtonA,
    ButtonB,
}

/// A key from the fixed bindable set: letters, digits, arrow keys and the
/// robot's two hardware buttons.
///
/// Keys can only be obtained through [`Key::parse`], the constants, or
/// [`Key::from_button`], so every `Key` is valid.
///
/// # Examples
///
/// ```
/// use wac_robot::Key;
///
/// assert_eq!(Key::parse("A").unwrap(), Key::parse("a").unwrap());
/// assert_eq!(Key::parse(" up ").unwrap(), Key::UP);
/// assert_eq!(Key::parse("button_b").unwrap(), Key::BUTTON_B);
/// assert!(Key::parse("ctrl").is_err());
///
/// assert_eq!(Key::from_button(1), Some(Key::BUTTON_A));
/// assert_eq!(Key::from_button(0), None);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Key(KeyCode);

impl Key {
    /// Arrow up.
    pub const UP: Key = Key(KeyCode::Up);
    /// Arrow down.
    pub const DOWN: Key = Key(KeyCode::Down);
    /// Arrow left.
    pub const LEFT: Key = Key(KeyCode::Left);
    /// Arrow right.
    pub const RIGHT: Key = Key(KeyCode::Right);
    /// The robot's A button.
    pub const BUTTON_A: Key = Key(KeyCode::ButtonA);
    /// The robot's B button.
    pub const BUTTON_B: Key = Key(KeyCode::ButtonB);

    /// Parse a key name.
    ///
    /// Accepts a single ASCII letter or digit, `up`/`down`/`left`/`right`,
    /// and `button_a`/`button_b`. Input is trimmed and case-insensitive.
    pub fn parse(s: &str) -> Result<Self, InvalidKey> {
        let name = s.trim().to_ascii_lowercase();
        let code = match name.as_str() {
            "up" => KeyCode::Up,
            "down" => KeyCode::Down,
            "left" => KeyCode::Left,
            "right" => KeyCode::Right,
            "button_a" | "button-a" => KeyCode::ButtonA,
            "button_b" | "button-b" => KeyCode::ButtonB,
            _ => match name.as_bytes() {
                [c] if c.is_ascii_alphanumeric() => KeyCode::Char(*c),
                _ => return Err(InvalidKey { key: s.to_string() }),
            },
        };
        Ok(Key(code))
    }

    /// Map a button notification byte: 1 is A, 2 is B, anything else is
    /// no button.
    pub fn from_button(byte: u8) -> Option<Self> {
        match byte {
            1 => Some(Key::BUTTON_A),
            2 => Some(Key::BUTTON_B),
            _ => None,
        }
    }

    /// Returns true for the robot's hardware buttons.
    pub fn is_button(&self) -> bool {
        matches!(self.0, KeyCode::ButtonA | KeyCode::ButtonB)
    }

    /// Short text for the robot's display.
    pub fn label(&self) -> String {
        match self.0 {
            KeyCode::Char(c) => char::from(c).to_ascii_uppercase().to_string(),
            KeyCode::Up => "UP".into(),
            KeyCode::Down => "DN".into(),
            KeyCode::Left => "LT".into(),
            KeyCode::Right => "RT".into(),
            KeyCode::ButtonA => "A".into(),
            KeyCode::ButtonB => "B".into(),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            KeyCode::Char(c) => write!(f, "{}", char::from(c)),
            KeyCode::Up => f.write_str("up"),
            KeyCode::Down => f.write_str("down"),
            KeyCode::Left => f.write_str("left"),
            KeyCode::Right => f.write_str("right"),
            KeyCode::ButtonA => f.write_str("button_a"),
            KeyCode::ButtonB => f.write_str("button_b"),
        }
    }
}

impl FromStr for Key {
    type Err = InvalidKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Key::parse(s)
    }
}

// ============================================================================
// Router
// ============================================================================

struct RouterShared {
    bindings: Mutex<BTreeMap<Key, CommandQueue>>,
    slot: Arc<ActiveSlot>,
    wake: Arc<Notify>,
    prefix: String,
    capacity: usize,
    ack_display_ms: u64,
    closed: AtomicBool,
}

/// Binds keys to queues and redirects the controller on input.
///
/// Cloning shares the same bindings. Obtain one from
/// [`DeviceController::router`](crate::DeviceController::router).
#[derive(Clone)]
pub struct InputRouter {
    shared: Arc<RouterShared>,
}

impl InputRouter {
    pub(crate) fn new(
        slot: Arc<ActiveSlot>,
        wake: Arc<Notify>,
        prefix: impl Into<String>,
        capacity: usize,
        ack_display_ms: u64,
    ) -> Self {
        Self {
            shared: Arc::new(RouterShared {
                bindings: Mutex::new(BTreeMap::new()),
                slot,
                wake,
                prefix: prefix.into(),
                capacity,
                ack_display_ms,
                closed: AtomicBool::new(false),
            }),
        }
    }

    fn bindings(&self) -> MutexGuard<'_, BTreeMap<Key, CommandQueue>> {
        self.shared
            .bindings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Validate `key` and return its queue, creating it on first use.
    ///
    /// Fails immediately for names outside the key set.
    pub fn bind(&self, key: &str) -> Result<CommandQueue, InvalidKey> {
        Ok(self.bind_key(Key::parse(key)?))
    }

    /// Return the queue bound to `key`, creating it on first use.
    pub fn bind_key(&self, key: Key) -> CommandQueue {
        self.bindings()
            .entry(key)
            .or_insert_with(|| {
                debug!(%key, "binding created");
                CommandQueue::with_waker(
                    format!("{}-{}", self.shared.prefix, key),
                    self.shared.capacity,
                    Arc::clone(&self.shared.wake),
                )
            })
            .clone()
    }

    /// The queue bound to `key`, if any.
    pub fn binding(&self, key: Key) -> Option<CommandQueue> {
        self.bindings().get(&key).cloned()
    }

    /// Bound keys in order.
    pub fn keys(&self) -> Vec<Key> {
        self.bindings().keys().copied().collect()
    }

    /// Redirect the controller to the queue bound to `key`.
    ///
    /// Returns false if the key is unbound, the controller is not connected,
    /// or the router has been closed.
    pub fn dispatch_key(&self, key: Key) -> bool {
        if self.shared.closed.load(Ordering::SeqCst) {
            debug!(%key, "router closed, input ignored");
            return false;
        }
        if !self.shared.slot.is_connected() {
            debug!(%key, "not connected, input ignored");
            return false;
        }
        let Some(queue) = self.binding(key) else {
            debug!(%key, "unbound key ignored");
            return false;
        };

        let target = if queue.can_play() {
            ActiveQueue {
                role: QueueRole::Binding(key),
                queue,
            }
        } else {
            ActiveQueue {
                role: QueueRole::Acknowledge(key),
                queue: self.acknowledgement(key),
            }
        };

        let immediate = self.shared.slot.redirect(target);
        info!(%key, immediate, "input redirect");
        self.shared.wake.notify_one();
        true
    }

    /// Parse `key` and dispatch it.
    pub fn dispatch(&self, key: &str) -> Result<bool, InvalidKey> {
        Ok(self.dispatch_key(Key::parse(key)?))
    }

    /// Handle a raw button notification.
    ///
    /// The first byte selects the button (0 none, 1 A, 2 B). Returns true
    /// if a redirect was issued.
    pub fn dispatch_raw(&self, data: &[u8]) -> bool {
        match data.first().copied().and_then(Key::from_button) {
            Some(key) => self.dispatch_key(key),
            None => false,
        }
    }

    /// A notification callback handle for [`Channel::subscribe`](crate::traits::Channel::subscribe).
    pub fn sink(&self) -> InputSink {
        InputSink {
            router: self.clone(),
        }
    }

    fn acknowledgement(&self, key: Key) -> CommandQueue {
        let queue = CommandQueue::with_waker(
            format!("{}-{}-ack", self.shared.prefix, key),
            self.shared.capacity,
            Arc::clone(&self.shared.wake),
        );
        queue.display_text(key.label(), self.shared.ack_display_ms);
        queue
    }

    pub(crate) fn queues(&self) -> Vec<CommandQueue> {
        self.bindings().values().cloned().collect()
    }

    /// True if any binding has a sequence to play, now or from a snapshot.
    pub(crate) fn has_sequences(&self) -> bool {
        self.bindings()
            .values()
            .any(|q| !q.is_empty() || q.has_snapshot())
    }

    /// Stop accepting input and close every bound queue.
    pub(crate) fn close(&self) {
        self.shared.closed.store(true, Ordering::SeqCst);
        for queue in self.queues() {
            queue.close();
        }
    }

    /// Returns true once the controller has finished.
    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for InputRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputRouter")
            .field("keys", &self.keys())
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Callback handle given to a channel's notification subscription.
///
/// Call [`deliver`](InputSink::deliver) with each raw notification. Cheap to
/// clone and safe to call from any thread.
#[derive(Clone, Debug)]
pub struct InputSink {
    router: InputRouter,
}

impl InputSink {
    /// Forward one notification payload to the router.
    pub fn deliver(&self, data: &[u8]) -> bool {
        self.router.dispatch_raw(data)
    }
}
