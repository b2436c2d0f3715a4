//! Mock implementations for testing without a robot.
//!
//! This module provides test doubles for the transport and display traits,
//! enabling development and testing on desktop without Bluetooth hardware.
//!
//! # Available Mocks
//!
//! | Mock | Trait | Purpose |
//! |------|-------|---------|
//! | [`MockLink`] | [`DeviceLink`] | Scripted discovery and connection |
//! | [`MockChannel`] | [`Channel`] | Records writes, injects failures |
//! | [`MockDevice`] | - | Shared view of the simulated robot |
//! | [`MockDisplay`] | [`StatusDisplay`] | Records status updates |
//!
//! The link and every channel it opens share one [`MockDevice`], so a test
//! can keep a handle, hand the link to a controller, and inspect what the
//! robot received afterwards.
//!
//! # Example
//!
//! ```rust
//! use wac_robot::hal::MockLink;
//! use wac_robot::{Config, DeviceController};
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let link = MockLink::new().with_device("WAC-7F36", "F0:02");
//! let device = link.device();
//!
//! let mut controller = DeviceController::new(link, Config::for_device("boop")).unwrap();
//! controller.connect().await.unwrap();
//!
//! assert!(device.is_connected());
//! assert!(device.is_subscribed(wac_robot::actions::gatt::BUTTONS_CHAR));
//! # });
//! ```
//!
//! [`DeviceLink`]: crate::traits::DeviceLink
//! [`Channel`]: crate::traits::Channel
//! [`StatusDisplay`]: crate::traits::StatusDisplay

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::controller::ControllerStatus;
use crate::error::{ConnectError, TransportError};
use crate::input::InputSink;
use crate::traits::{Channel, DeviceLink, DiscoveredDevice, StatusDisplay};

// ============================================================================
// Simulated device
// ============================================================================

/// One payload written to the mock device.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MockWrite {
    /// Service the payload was addressed to.
    pub service: String,
    /// Characteristic the payload was addressed to.
    pub characteristic: String,
    /// Raw payload bytes.
    pub payload: Vec<u8>,
}

#[derive(Debug, Default)]
struct RobotState {
    writes: Vec<MockWrite>,
    fail_after: Option<usize>,
    subscriptions: Vec<(String, InputSink)>,
    connected: bool,
    connects: usize,
    disconnects: usize,
}

/// Shared handle to the simulated robot.
///
/// Clones observe the same device.
#[derive(Clone, Debug, Default)]
pub struct MockDevice {
    state: Arc<Mutex<RobotState>>,
}

impl MockDevice {
    fn lock(&self) -> MutexGuard<'_, RobotState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Every successful write, in order.
    pub fn writes(&self) -> Vec<MockWrite> {
        self.lock().writes.clone()
    }

    /// Payloads written to one characteristic, in order.
    pub fn payloads_to(&self, characteristic: &str) -> Vec<Vec<u8>> {
        self.lock()
            .writes
            .iter()
            .filter(|w| w.characteristic == characteristic)
            .map(|w| w.payload.clone())
            .collect()
    }

    /// Accept `count` more writes in total, then fail every later one.
    pub fn fail_writes_after(&self, count: usize) {
        let mut state = self.lock();
        state.fail_after = Some(state.writes.len() + count);
    }

    /// Stop injecting write failures.
    pub fn heal(&self) {
        self.lock().fail_after = None;
    }

    /// Simulate a button notification. Returns true if any subscriber
    /// issued a redirect.
    pub fn notify(&self, characteristic: &str, data: &[u8]) -> bool {
        // Deliver outside the lock; sinks may take their own locks.
        let sinks: Vec<InputSink> = self
            .lock()
            .subscriptions
            .iter()
            .filter(|(c, _)| c == characteristic)
            .map(|(_, sink)| sink.clone())
            .collect();
        sinks
            .iter()
            .fold(false, |redirected, sink| sink.deliver(data) || redirected)
    }

    /// Press a hardware button (1 = A, 2 = B).
    pub fn press(&self, button: u8) -> bool {
        self.notify(crate::actions::gatt::BUTTONS_CHAR, &[button])
    }

    /// True while a channel is open.
    pub fn is_connected(&self) -> bool {
        self.lock().connected
    }

    /// True if some channel subscribed to `characteristic`.
    pub fn is_subscribed(&self, characteristic: &str) -> bool {
        self.lock()
            .subscriptions
            .iter()
            .any(|(c, _)| c == characteristic)
    }

    /// Number of successful connections.
    pub fn connect_count(&self) -> usize {
        self.lock().connects
    }

    /// Number of `disconnect` calls.
    pub fn disconnect_count(&self) -> usize {
        self.lock().disconnects
    }
}

// ============================================================================
// Transport Mocks
// ============================================================================

/// Mock discovery and connection.
///
/// # Example
///
/// ```rust
/// use wac_robot::hal::MockLink;
/// use wac_robot::traits::DeviceLink;
/// use std::time::Duration;
///
/// # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
/// let mut link = MockLink::new()
///     .with_device("WAC-2463", "F0:01")
///     .with_device("WAC-98CE", "F0:03");
///
/// let found = link.discover(Duration::from_millis(10)).await;
/// assert_eq!(found.len(), 2);
/// assert!(link.connect("00:00").await.is_err());
/// # });
/// ```
#[derive(Debug, Default)]
pub struct MockLink {
    /// Devices every scan reports.
    pub advertised: Vec<DiscoveredDevice>,
    /// How long a scan takes before returning.
    pub scan_delay: Duration,
    /// How long a connect takes before returning.
    pub connect_delay: Duration,
    /// Error returned by every connect attempt, if set.
    pub connect_error: Option<ConnectError>,
    /// Number of scans performed.
    pub scans: usize,
    device: MockDevice,
}

impl MockLink {
    /// Creates a link that advertises nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Advertise a device.
    pub fn with_device(mut self, name: &str, address: &str) -> Self {
        self.advertised.push(DiscoveredDevice::new(name, address));
        self
    }

    /// Make every scan take `ms` milliseconds.
    pub fn with_scan_delay_ms(mut self, ms: u64) -> Self {
        self.scan_delay = Duration::from_millis(ms);
        self
    }

    /// Make every connect take `ms` milliseconds.
    pub fn with_connect_delay_ms(mut self, ms: u64) -> Self {
        self.connect_delay = Duration::from_millis(ms);
        self
    }

    /// Fail every connect attempt with `err`.
    pub fn with_connect_error(mut self, err: ConnectError) -> Self {
        self.connect_error = Some(err);
        self
    }

    /// Handle to the simulated robot behind this link.
    pub fn device(&self) -> MockDevice {
        self.device.clone()
    }
}

impl DeviceLink for MockLink {
    type Channel = MockChannel;

    async fn discover(&mut self, _timeout: Duration) -> Vec<DiscoveredDevice> {
        self.scans += 1;
        if !self.scan_delay.is_zero() {
            tokio::time::sleep(self.scan_delay).await;
        }
        self.advertised.clone()
    }

    async fn connect(&mut self, address: &str) -> Result<MockChannel, ConnectError> {
        if !self.connect_delay.is_zero() {
            tokio::time::sleep(self.connect_delay).await;
        }
        if let Some(err) = &self.connect_error {
            return Err(err.clone());
        }
        if !self.advertised.iter().any(|d| d.address == address) {
            return Err(ConnectError::NotFound {
                name: address.to_string(),
            });
        }
        {
            let mut state = self.device.lock();
            state.connected = true;
            state.connects += 1;
        }
        Ok(MockChannel {
            device: self.device.clone(),
        })
    }
}

/// Mock connected channel.
///
/// Records writes on its [`MockDevice`]. Writes fail with
/// [`TransportError::WriteFailed`] once the device's failure point is
/// reached, and with [`TransportError::Disconnected`] after `disconnect`.
#[derive(Debug)]
pub struct MockChannel {
    device: MockDevice,
}

impl MockChannel {
    /// Creates a channel to a fresh, connected device.
    pub fn new() -> Self {
        let device = MockDevice::default();
        device.lock().connected = true;
        Self { device }
    }

    /// Handle to the device this channel writes to.
    pub fn device(&self) -> MockDevice {
        self.device.clone()
    }
}

impl Default for MockChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl Channel for MockChannel {
    async fn write_payload(
        &mut self,
        service: &str,
        characteristic: &str,
        payload: &[u8],
    ) -> Result<(), TransportError> {
        let mut state = self.device.lock();
        if !state.connected {
            return Err(TransportError::Disconnected);
        }
        if state.fail_after.is_some_and(|n| state.writes.len() >= n) {
            return Err(TransportError::WriteFailed {
                reason: "injected failure".into(),
            });
        }
        state.writes.push(MockWrite {
            service: service.into(),
            characteristic: characteristic.into(),
            payload: payload.to_vec(),
        });
        Ok(())
    }

    async fn subscribe(&mut self, characteristic: &str, sink: InputSink) -> Result<(), TransportError> {
        let mut state = self.device.lock();
        if !state.connected {
            return Err(TransportError::Disconnected);
        }
        state.subscriptions.push((characteristic.into(), sink));
        Ok(())
    }

    async fn disconnect(&mut self) {
        let mut state = self.device.lock();
        state.connected = false;
        state.disconnects += 1;
        state.subscriptions.clear();
    }
}

// ============================================================================
// Display Mocks
// ============================================================================

/// Mock status display.
///
/// # Example
///
/// ```
/// use wac_robot::hal::MockDisplay;
/// use wac_robot::traits::StatusDisplay;
/// use wac_robot::{ControllerStatus, DeviceState};
///
/// let mut display = MockDisplay::new();
/// display.show(&ControllerStatus::new(DeviceState::Running, "executing Wait")).unwrap();
/// assert_eq!(display.shown.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct MockDisplay {
    /// Every status shown, in order.
    pub shown: Vec<ControllerStatus>,
}

impl MockDisplay {
    /// Creates a new mock display.
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recent status.
    pub fn last(&self) -> Option<&ControllerStatus> {
        self.shown.last()
    }
}

impl StatusDisplay for MockDisplay {
    type Error = ();

    fn show(&mut self, status: &ControllerStatus) -> Result<(), ()> {
        self.shown.push(status.clone());
        Ok(())
    }
}
