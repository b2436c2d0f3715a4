//! Transport abstraction: discovery, connection and payload writes.
//!
//! The scheduler never talks to a radio directly. It sees a [`DeviceLink`]
//! that can scan for devices and open a [`Channel`] to one of them, and a
//! channel that can write one payload at a time.
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`DeviceLink`] | Scan for advertised devices and open a connection |
//! | [`Channel`] | Single-writer handle to one connected device |
//!
//! For tests and desktop development use [`crate::hal::MockLink`].
//!
//! # Example
//!
//! ```rust
//! use wac_robot::hal::MockLink;
//! use wac_robot::traits::{Channel, DeviceLink};
//! use std::time::Duration;
//!
//! # tokio_test_block_on(async {
//! let mut link = MockLink::new().with_device("WAC-2463", "F0:01");
//! let found = link.discover(Duration::from_secs(2)).await;
//! assert_eq!(found[0].name, "WAC-2463");
//!
//! let mut channel = link.connect("F0:01").await.unwrap();
//! channel.write_payload("svc", "chr", &[1, 2, 3]).await.unwrap();
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(f)
//! # }
//! ```

use core::future::Future;
use std::time::Duration;

use crate::error::{ConnectError, TransportError};
use crate::input::InputSink;

/// A device seen during discovery.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiscoveredDevice {
    /// Advertised name (e.g. `WAC-2463`).
    pub name: String,
    /// Transport address used to connect.
    pub address: String,
}

impl DiscoveredDevice {
    /// Creates a discovery record.
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
        }
    }
}

/// Discovery and connection primitive.
///
/// Implementations own whatever adapter state scanning needs. The controller
/// wraps both calls in its own timeouts, so implementations may block for as
/// long as the underlying stack does.
pub trait DeviceLink: Send + 'static {
    /// The connected channel type.
    type Channel: Channel;

    /// Scan for advertising devices for roughly `timeout`.
    fn discover(
        &mut self,
        timeout: Duration,
    ) -> impl Future<Output = Vec<DiscoveredDevice>> + Send;

    /// Open a channel to the device at `address`.
    fn connect(
        &mut self,
        address: &str,
    ) -> impl Future<Output = Result<Self::Channel, ConnectError>> + Send;
}

/// A connected, single-writer handle to one device.
///
/// Only the controller's drain loop writes to a channel, so every method
/// takes `&mut self`. A write that fails is reported once and never retried.
pub trait Channel: Send + 'static {
    /// Write `payload` to the given service/characteristic.
    fn write_payload(
        &mut self,
        service: &str,
        characteristic: &str,
        payload: &[u8],
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Deliver notifications from `characteristic` to `sink`.
    ///
    /// Implementations call [`InputSink::deliver`] from their notification
    /// callback with the raw notification bytes.
    fn subscribe(
        &mut self,
        characteristic: &str,
        sink: InputSink,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Close the link. Best effort; never fails.
    fn disconnect(&mut self) -> impl Future<Output = ()> + Send;
}
