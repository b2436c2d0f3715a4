//! Status reporting for displays and UIs.
//!
//! The drain loop publishes every `(state, message)` change on a watch
//! channel. A [`StatusReporter`] subscribes to it and renders changes to any
//! [`StatusDisplay`], either polled from a UI loop or as its own task.
//!
//! # Example
//!
//! ```rust
//! use wac_robot::hal::{MockDisplay, MockLink};
//! use wac_robot::services::StatusReporter;
//! use wac_robot::{Config, DeviceController};
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let controller = DeviceController::new(MockLink::new(), Config::default()).unwrap();
//! let mut reporter = StatusReporter::new(controller.subscribe_status(), MockDisplay::new());
//!
//! // In a UI loop:
//! reporter.show_current().unwrap();
//! assert_eq!(reporter.display().shown.len(), 1);
//! # });
//! ```

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::controller::ControllerStatus;
use crate::traits::StatusDisplay;

// ============================================================================
// Status Reporter
// ============================================================================

/// Renders controller status to a display.
///
/// Reporters only read status; they never touch queues or the channel.
pub struct StatusReporter<D: StatusDisplay> {
    status: watch::Receiver<ControllerStatus>,
    display: D,
}

impl<D: StatusDisplay> StatusReporter<D> {
    /// Create a reporter for a status subscription.
    pub fn new(status: watch::Receiver<ControllerStatus>, display: D) -> Self {
        Self { status, display }
    }

    /// Get a reference to the display.
    pub fn display(&self) -> &D {
        &self.display
    }

    /// Get a mutable reference to the display.
    pub fn display_mut(&mut self) -> &mut D {
        &mut self.display
    }

    /// Give the display back.
    pub fn into_display(self) -> D {
        self.display
    }

    /// Render the current status unconditionally.
    pub fn show_current(&mut self) -> Result<(), D::Error> {
        let status = self.status.borrow_and_update().clone();
        self.display.show(&status)
    }

    /// Render the status if it changed since the last render.
    ///
    /// Returns `true` if something was shown. A closed controller counts as
    /// unchanged.
    pub fn show_if_changed(&mut self) -> Result<bool, D::Error> {
        if !self.status.has_changed().unwrap_or(false) {
            return Ok(false);
        }
        self.show_current()?;
        Ok(true)
    }

    /// Render every status change until the controller is dropped, then
    /// return the display.
    ///
    /// Display errors are logged and skipped. Intermediate updates that
    /// arrive faster than the display renders are coalesced.
    pub async fn run(mut self) -> D {
        if let Err(err) = self.show_current() {
            warn!(error = ?err, "status display failed");
        }
        while self.status.changed().await.is_ok() {
            if let Err(err) = self.show_current() {
                warn!(error = ?err, "status display failed");
            }
        }
        debug!("status source closed, reporter stopping");
        self.display
    }
}
