//! Device controller: connection lifecycle and the drain loop.
//!
//! The [`DeviceController`] owns one robot's queues (main plus one per bound
//! key), the connection to it, and the loop that pops actions off whichever
//! queue is active and executes them one at a time.
//!
//! # State Machine
//!
//! ```text
//!                  connect()                 channel open
//!  Disconnected ─────────────► Connecting ─────────────► ConnectedIdle
//!       ▲   ▲                      │                       │     ▲
//!       │   └──── not found / ─────┘           queue has   │     │ active queue
//!       │         timeout                        work      ▼     │ drained
//!       │                                                Running ┘
//!       └──────── write failure / disconnect request ──────┘
//!
//!  ConnectedIdle / Running ── finish request ──► Done (terminal)
//! ```
//!
//! # Active Queue
//!
//! Exactly one queue is active at a time. The drain loop reads the active
//! queue once per action, so a redirect from the [`InputRouter`] takes effect
//! between actions and never interrupts a write or wait in flight. When a
//! key or button sequence drains, the shutdown sequence runs (wheels
//! stopped, lights, display and buzzer off) and control reverts to main; an
//! empty main with a snapshot is restored first.
//!
//! # Example
//!
//! ```rust
//! use wac_robot::hal::MockLink;
//! use wac_robot::{Config, DeviceController, DeviceState};
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().start_paused(true).build().unwrap().block_on(async {
//! let link = MockLink::new().with_device("WAC-2463", "F0:01");
//! let device = link.device();
//! let mut controller = DeviceController::new(link, Config::for_device("beep")).unwrap();
//!
//! controller.main_queue().set_color(255, 0, 0, 1000).stop(0);
//! controller.play().await.unwrap();
//!
//! assert_eq!(controller.state(), DeviceState::Done);
//! assert!(!device.writes().is_empty());
//! # });
//! ```

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::{watch, Notify};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::actions::{gatt, shutdown_sequence};
use crate::aliases::{DeviceNameResolver, StaticAliasTable};
use crate::config::Config;
use crate::error::{ConfigError, ConnectError, ControllerError, ExecutionError, InvalidKey};
use crate::input::{InputRouter, Key};
use crate::queue::CommandQueue;
use crate::traits::{Channel, DeviceLink};

// ============================================================================
// State and Status
// ============================================================================

/// Controller lifecycle state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DeviceState {
    /// No channel. Initial state, and where failures land.
    #[default]
    Disconnected,
    /// Discovery or connection in progress.
    Connecting,
    /// Connected with nothing to execute.
    ConnectedIdle,
    /// Executing an action.
    Running,
    /// Shut down for good.
    Done,
}

impl DeviceState {
    /// Returns the state name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            DeviceState::Disconnected => "disconnected",
            DeviceState::Connecting => "connecting",
            DeviceState::ConnectedIdle => "idle",
            DeviceState::Running => "running",
            DeviceState::Done => "done",
        }
    }

    /// Returns true while a channel is open.
    pub const fn is_connected(&self) -> bool {
        matches!(self, DeviceState::ConnectedIdle | DeviceState::Running)
    }
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `(state, message)` pair published on every transition and every
/// action dispatch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ControllerStatus {
    /// Current lifecycle state.
    pub state: DeviceState,
    /// Human-readable detail, e.g. `executing SetColor`.
    pub message: String,
}

impl ControllerStatus {
    /// Creates a status update.
    pub fn new(state: DeviceState, message: impl Into<String>) -> Self {
        Self {
            state,
            message: message.into(),
        }
    }
}

// ============================================================================
// Active Queue
// ============================================================================

/// Which logical role a queue plays.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueueRole {
    /// The controller's main sequence.
    Main,
    /// A key's bound sequence.
    Binding(Key),
    /// The one-shot acknowledgement for a key with an empty binding.
    Acknowledge(Key),
}

/// A queue together with its role.
#[derive(Clone, Debug)]
pub struct ActiveQueue {
    /// Role of the queue.
    pub role: QueueRole,
    /// Handle to the queue itself.
    pub queue: CommandQueue,
}

impl ActiveQueue {
    fn main(queue: CommandQueue) -> Self {
        Self {
            role: QueueRole::Main,
            queue,
        }
    }
}

struct Selection {
    active: ActiveQueue,
    pending: Option<ActiveQueue>,
    draining: bool,
}

/// The active-queue pointer shared between the drain loop and input.
///
/// While an action is executing (`draining`) redirects are parked in
/// `pending` and the last one wins. A binding is armed for replay only when
/// its redirect is applied, so a pre-empted target is never touched.
pub(crate) struct ActiveSlot {
    selection: Mutex<Selection>,
    connected: AtomicBool,
}

impl ActiveSlot {
    pub(crate) fn new(main: CommandQueue) -> Self {
        Self {
            selection: Mutex::new(Selection {
                active: ActiveQueue::main(main),
                pending: None,
                draining: false,
            }),
            connected: AtomicBool::new(false),
        }
    }

    /// Whether input should be accepted at all.
    pub(crate) fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    pub(crate) fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    fn apply(target: ActiveQueue) -> ActiveQueue {
        if let QueueRole::Binding(_) = target.role {
            target.queue.arm_for_replay();
        }
        target
    }

    fn lock(&self) -> MutexGuard<'_, Selection> {
        self.selection.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn current(&self) -> ActiveQueue {
        self.lock().active.clone()
    }

    /// Point at `target`. Returns true if applied at once, false if parked.
    pub(crate) fn redirect(&self, target: ActiveQueue) -> bool {
        let mut selection = self.lock();
        if selection.draining {
            selection.pending = Some(target);
            false
        } else {
            selection.active = Self::apply(target);
            true
        }
    }

    pub(crate) fn set_draining(&self, draining: bool) {
        self.lock().draining = draining;
    }

    /// Apply any parked redirect and return the queue to pop from.
    pub(crate) fn begin_step(&self) -> ActiveQueue {
        let mut selection = self.lock();
        if let Some(next) = selection.pending.take() {
            selection.active = Self::apply(next);
        }
        selection.active.clone()
    }

    fn revert(&self, main: &CommandQueue) {
        self.lock().active = ActiveQueue::main(main.clone());
    }
}

// ============================================================================
// Shutdown
// ============================================================================

const STOP_NONE: u8 = 0;
const STOP_DISCONNECT: u8 = 1;
const STOP_FINISH: u8 = 2;

struct StopSignal {
    request: AtomicU8,
    wake: Arc<Notify>,
}

/// Asks a running drain loop to stop at the next action boundary.
///
/// Cheap to clone and usable from any task. A request made while no loop is
/// running is picked up by the next [`run`](DeviceController::run); a
/// disconnect request still pending when a new connection starts is
/// dropped, and a pending finish makes that [`connect`](DeviceController::connect)
/// finish instead.
#[derive(Clone)]
pub struct ShutdownHandle {
    signal: Arc<StopSignal>,
}

impl ShutdownHandle {
    fn request(&self, level: u8) {
        self.signal.request.fetch_max(level, Ordering::SeqCst);
        self.signal.wake.notify_one();
    }

    /// Terminal shutdown: discard queued work, run the shutdown sequence,
    /// disconnect and move to `Done`.
    pub fn finish(&self) {
        self.request(STOP_FINISH);
    }

    /// Run the shutdown sequence and disconnect, keeping queued work for a
    /// later reconnect.
    pub fn disconnect(&self) {
        self.request(STOP_DISCONNECT);
    }

    /// Returns true if a stop has been requested and not yet handled.
    pub fn is_requested(&self) -> bool {
        self.signal.request.load(Ordering::SeqCst) != STOP_NONE
    }

    fn take(&self) -> u8 {
        self.signal.request.swap(STOP_NONE, Ordering::SeqCst)
    }
}

impl fmt::Debug for ShutdownHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShutdownHandle")
            .field("requested", &self.is_requested())
            .finish()
    }
}

/// Owns a controller and shuts it down when the scope ends.
///
/// Dereferences to the [`DeviceController`], so connect and run through the
/// guard. [`close`](Self::close) finishes explicitly and waits for the
/// shutdown sequence. Dropping the guard without closing (an early `?`
/// return, a panic) finishes at once: queues are discarded, input stops and
/// the shutdown sequence plus disconnect are spawned onto the current tokio
/// runtime.
///
/// ```rust
/// use wac_robot::hal::MockLink;
/// use wac_robot::{Config, DeviceController, DeviceState};
///
/// # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
/// let link = MockLink::new().with_device("WAC-2463", "F0:01");
/// let device = link.device();
/// let mut robot = DeviceController::new(link, Config::for_device("beep"))
///     .unwrap()
///     .into_guard();
///
/// robot.connect().await.unwrap();
/// robot.close().await;
/// assert!(!device.is_connected());
/// # });
/// ```
#[must_use = "the controller is shut down when the guard is dropped"]
pub struct ShutdownGuard<L: DeviceLink> {
    controller: DeviceController<L>,
}

impl<L: DeviceLink> ShutdownGuard<L> {
    /// Take ownership of `controller` until the end of the scope.
    pub fn new(controller: DeviceController<L>) -> Self {
        Self { controller }
    }

    /// Finish the controller, waiting for the shutdown sequence to be
    /// written and the channel to close.
    pub async fn close(mut self) {
        self.controller.finish().await;
    }
}

impl<L: DeviceLink> Deref for ShutdownGuard<L> {
    type Target = DeviceController<L>;

    fn deref(&self) -> &Self::Target {
        &self.controller
    }
}

impl<L: DeviceLink> DerefMut for ShutdownGuard<L> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.controller
    }
}

impl<L: DeviceLink> Drop for ShutdownGuard<L> {
    fn drop(&mut self) {
        self.controller.finish_detached();
    }
}

impl<L: DeviceLink> fmt::Debug for ShutdownGuard<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ShutdownGuard").field(&self.controller).finish()
    }
}

/// Write the shutdown sequence best effort, then close the channel.
async fn shut_down_channel<C: Channel>(mut channel: C) {
    for action in shutdown_sequence() {
        if let Err(err) = action.execute(&mut channel).await {
            debug!(error = %err, "shutdown sequence cut short");
            break;
        }
    }
    channel.disconnect().await;
}

// ============================================================================
// Controller
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum IdlePolicy {
    /// Wait for more work or input.
    Wait,
    /// Finish unless a binding still has a sequence to play.
    FinishUnlessBound,
    /// Finish as soon as main drains.
    Finish,
}

/// Scheduler for one robot.
///
/// Build sequences on [`main_queue`](Self::main_queue) and on key bindings
/// from [`bind`](Self::bind), then [`connect`](Self::connect) and
/// [`run`](Self::run). Each controller is independent; run one per robot.
pub struct DeviceController<L: DeviceLink> {
    link: L,
    channel: Option<L::Channel>,
    config: Config,
    device_name: String,
    main: CommandQueue,
    router: InputRouter,
    slot: Arc<ActiveSlot>,
    wake: Arc<Notify>,
    shutdown: ShutdownHandle,
    status: watch::Sender<ControllerStatus>,
    idle_policy: IdlePolicy,
}

impl<L: DeviceLink> DeviceController<L> {
    /// Creates a controller, resolving the configured name through the
    /// built-in nickname table.
    pub fn new(link: L, config: Config) -> Result<Self, ConfigError> {
        Self::with_resolver(link, config, &StaticAliasTable::default())
    }

    /// Creates a controller with a custom name resolver.
    pub fn with_resolver<R>(link: L, config: Config, resolver: &R) -> Result<Self, ConfigError>
    where
        R: DeviceNameResolver + ?Sized,
    {
        let device_name = resolver.resolve(config.device.name.as_str())?;
        let capacity = config.controller.queue_capacity;
        let wake = Arc::new(Notify::new());

        let main = CommandQueue::with_waker(
            format!("{device_name}-main"),
            capacity,
            Arc::clone(&wake),
        );
        let slot = Arc::new(ActiveSlot::new(main.clone()));
        let router = InputRouter::new(
            Arc::clone(&slot),
            Arc::clone(&wake),
            device_name.clone(),
            capacity,
            u64::from(config.controller.ack_display_ms),
        );
        if config.input.buttons_enabled {
            router.bind_key(Key::BUTTON_A);
            router.bind_key(Key::BUTTON_B);
        }

        let shutdown = ShutdownHandle {
            signal: Arc::new(StopSignal {
                request: AtomicU8::new(STOP_NONE),
                wake: Arc::clone(&wake),
            }),
        };
        let (status, _) = watch::channel(ControllerStatus::new(
            DeviceState::Disconnected,
            "not connected",
        ));
        let idle_policy = if config.controller.exit_when_idle {
            IdlePolicy::FinishUnlessBound
        } else {
            IdlePolicy::Wait
        };

        debug!(device = %device_name, "controller created");
        Ok(Self {
            link,
            channel: None,
            config,
            device_name,
            main,
            router,
            slot,
            wake,
            shutdown,
            status,
            idle_policy,
        })
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    /// Advertised name this controller connects to.
    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    /// The configuration the controller was built with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The main sequence.
    pub fn main_queue(&self) -> CommandQueue {
        self.main.clone()
    }

    /// The input router, for terminal input or extra notification sources.
    pub fn router(&self) -> InputRouter {
        self.router.clone()
    }

    /// Bind a key and return its queue. Fails immediately for keys outside
    /// the fixed set.
    pub fn bind(&self, key: &str) -> Result<CommandQueue, InvalidKey> {
        self.router.bind(key)
    }

    /// The queue the drain loop is currently reading.
    pub fn active_queue(&self) -> ActiveQueue {
        self.slot.current()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> DeviceState {
        self.status.borrow().state
    }

    /// Current status. Never blocks the drain loop.
    pub fn status(&self) -> ControllerStatus {
        self.status.borrow().clone()
    }

    /// Receive every status update.
    pub fn subscribe_status(&self) -> watch::Receiver<ControllerStatus> {
        self.status.subscribe()
    }

    /// A handle for stopping the drain loop from another task.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Hand the controller to a [`ShutdownGuard`] that finishes it when the
    /// scope ends.
    pub fn into_guard(self) -> ShutdownGuard<L> {
        ShutdownGuard::new(self)
    }

    fn set_status(&self, state: DeviceState, message: impl Into<String>) {
        self.slot.set_connected(state.is_connected());
        let status = ControllerStatus::new(state, message);
        let previous = self.status.send_replace(status.clone());
        if previous.state != state {
            info!(device = %self.device_name, from = %previous.state, to = %state, "{}", status.message);
        } else {
            debug!(device = %self.device_name, state = %state, "{}", status.message);
        }
    }

    // ------------------------------------------------------------------------
    // Connection
    // ------------------------------------------------------------------------

    /// Discover the configured device and open a channel to it.
    ///
    /// Discovery and connection each run under the configured connect
    /// timeout. On failure the controller returns to `Disconnected`, the
    /// reason is published as status, and nothing is retried.
    pub async fn connect(&mut self) -> Result<(), ControllerError> {
        match self.state() {
            DeviceState::Done => return Err(ControllerError::Finished),
            DeviceState::ConnectedIdle | DeviceState::Running => return Ok(()),
            DeviceState::Disconnected | DeviceState::Connecting => {}
        }
        match self.shutdown.take() {
            STOP_FINISH => {
                self.finish().await;
                return Err(ControllerError::Finished);
            }
            STOP_DISCONNECT => debug!("stale disconnect request dropped"),
            _ => {}
        }

        let scan = Duration::from_millis(u64::from(self.config.device.scan_timeout_ms));
        let timeout_ms = u64::from(self.config.device.connect_timeout_ms);
        let bound = Duration::from_millis(timeout_ms);

        self.set_status(
            DeviceState::Connecting,
            format!("scanning for {}", self.device_name),
        );
        let devices = match timeout(bound, self.link.discover(scan)).await {
            Ok(devices) => devices,
            Err(_) => return self.connect_failed(ConnectError::Timeout { timeout_ms }),
        };
        debug!(found = devices.len(), "discovery finished");

        let Some(device) = devices.into_iter().find(|d| d.name == self.device_name) else {
            return self.connect_failed(ConnectError::NotFound {
                name: self.device_name.clone(),
            });
        };

        self.set_status(
            DeviceState::Connecting,
            format!("connecting to {} at {}", device.name, device.address),
        );
        let mut channel = match timeout(bound, self.link.connect(&device.address)).await {
            Ok(Ok(channel)) => channel,
            Ok(Err(err)) => return self.connect_failed(err),
            Err(_) => return self.connect_failed(ConnectError::Timeout { timeout_ms }),
        };

        if self.config.input.buttons_enabled {
            if let Err(err) = channel
                .subscribe(gatt::BUTTONS_CHAR, self.router.sink())
                .await
            {
                warn!(error = %err, "button notifications unavailable");
            }
        }

        self.channel = Some(channel);
        self.set_status(
            DeviceState::ConnectedIdle,
            format!("connected to {}", self.device_name),
        );
        Ok(())
    }

    fn connect_failed(&self, err: ConnectError) -> Result<(), ControllerError> {
        warn!(device = %self.device_name, error = %err, "connect failed");
        self.set_status(DeviceState::Disconnected, err.to_string());
        Err(err.into())
    }

    /// Run the shutdown sequence and close the channel, keeping queued work.
    ///
    /// Only usable while no drain loop is running; from another task use
    /// [`ShutdownHandle::disconnect`].
    pub async fn disconnect(&mut self) {
        self.close_channel().await;
        self.slot.set_draining(false);
        if self.state() != DeviceState::Done {
            self.set_status(DeviceState::Disconnected, "disconnected");
        }
    }

    async fn close_channel(&mut self) {
        if let Some(channel) = self.channel.take() {
            shut_down_channel(channel).await;
        }
    }

    // ------------------------------------------------------------------------
    // Drain loop
    // ------------------------------------------------------------------------

    /// Drain queues until a stop is requested, an action fails, or the idle
    /// policy says to finish.
    ///
    /// A write failure leaves the failed queue's remaining actions in place,
    /// runs the shutdown sequence best effort, and returns the error with
    /// the controller in `Disconnected`.
    pub async fn run(&mut self) -> Result<(), ControllerError> {
        if self.state() == DeviceState::Done {
            return Err(ControllerError::Finished);
        }
        if self.channel.is_none() {
            return Err(ControllerError::NotConnected);
        }

        loop {
            match self.shutdown.take() {
                STOP_FINISH => {
                    self.finish().await;
                    return Ok(());
                }
                STOP_DISCONNECT => {
                    self.disconnect().await;
                    return Ok(());
                }
                _ => {}
            }

            let active = self.slot.begin_step();
            let next = active.queue.pop().unwrap_or_default();

            if let Some(action) = next {
                self.slot.set_draining(true);
                self.set_status(DeviceState::Running, format!("executing {}", action.kind()));
                let Some(channel) = self.channel.as_mut() else {
                    return Err(ControllerError::NotConnected);
                };
                let result = action.execute(channel).await;
                if let Err(err) = result {
                    self.fail(&active, &err).await;
                    return Err(err.into());
                }
                continue;
            }

            if active.role != QueueRole::Main {
                debug!(queue = %active.queue.name(), "queue drained, back to main");
                if let Err(err) = self.settle_robot().await {
                    self.fail(&active, &err).await;
                    return Err(err.into());
                }
                self.slot.revert(&self.main);
                self.main.restore_if_empty();
                self.set_status(DeviceState::ConnectedIdle, "idle");
                continue;
            }

            self.slot.set_draining(false);
            if self.state() != DeviceState::ConnectedIdle {
                self.set_status(DeviceState::ConnectedIdle, "idle");
            }
            for queue in self.router.queues() {
                queue.restore_if_empty();
            }

            let finish = match self.idle_policy {
                IdlePolicy::Wait => false,
                IdlePolicy::FinishUnlessBound => !self.router.has_sequences(),
                IdlePolicy::Finish => true,
            };
            if finish {
                self.finish().await;
                return Ok(());
            }

            self.wake.notified().await;
        }
    }

    /// Leave the robot still, dark and quiet after a triggered sequence.
    async fn settle_robot(&mut self) -> Result<(), ExecutionError> {
        self.slot.set_draining(true);
        for action in shutdown_sequence() {
            self.set_status(DeviceState::Running, format!("executing {}", action.kind()));
            let Some(channel) = self.channel.as_mut() else {
                return Ok(());
            };
            action.execute(channel).await?;
        }
        Ok(())
    }

    async fn fail(&mut self, active: &ActiveQueue, err: &ExecutionError) {
        warn!(
            device = %self.device_name,
            queue = %active.queue.name(),
            remaining = active.queue.len(),
            error = %err,
            "action failed, disconnecting"
        );
        self.close_channel().await;
        self.slot.set_draining(false);
        self.set_status(DeviceState::Disconnected, err.to_string());
    }

    /// Terminal shutdown: discard queued work, run the shutdown sequence,
    /// disconnect, and stop accepting input.
    pub async fn finish(&mut self) {
        if self.state() == DeviceState::Done {
            return;
        }
        self.discard_all();
        self.close_channel().await;
        self.retire();
    }

    /// [`finish`](Self::finish) without awaiting: the channel shutdown runs
    /// as a spawned task.
    fn finish_detached(&mut self) {
        if self.state() == DeviceState::Done {
            return;
        }
        self.discard_all();
        if let Some(channel) = self.channel.take() {
            match tokio::runtime::Handle::try_current() {
                Ok(runtime) => {
                    runtime.spawn(shut_down_channel(channel));
                }
                Err(_) => warn!(
                    device = %self.device_name,
                    "no runtime, channel dropped without shutdown sequence"
                ),
            }
        }
        self.retire();
    }

    fn discard_all(&self) {
        let discarded: usize = self.main.discard()
            + self
                .router
                .queues()
                .iter()
                .map(CommandQueue::discard)
                .sum::<usize>();
        debug!(discarded, "finishing");
    }

    fn retire(&self) {
        self.router.close();
        self.main.close();
        self.slot.set_draining(false);
        self.set_status(DeviceState::Done, "done");
    }

    /// Append the shutdown sequence to main, connect if needed, drain main
    /// once, then finish.
    pub async fn play(&mut self) -> Result<(), ControllerError> {
        if self.state() == DeviceState::Done {
            return Err(ControllerError::Finished);
        }
        self.main.clear(false);
        self.connect().await?;

        let policy = self.idle_policy;
        self.idle_policy = IdlePolicy::Finish;
        let result = self.run().await;
        self.idle_policy = policy;
        result
    }
}

impl<L: DeviceLink> fmt::Debug for DeviceController<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceController")
            .field("device", &self.device_name)
            .field("state", &self.state())
            .field("main", &self.main)
            .field("router", &self.router)
            .finish_non_exhaustive()
    }
}
