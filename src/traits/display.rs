//! Display abstraction for controller status.
//!
//! This module defines the [`StatusDisplay`] trait for rendering the
//! controller's `(state, message)` pair to a terminal, a window title or
//! anything else that shows one line of status.

use crate::ControllerStatus;

/// Display trait for rendering controller status.
///
/// Displays only read status. They never touch queues or the channel.
///
/// # Example
///
/// ```
/// use wac_robot::traits::StatusDisplay;
/// use wac_robot::ControllerStatus;
///
/// struct StderrDisplay;
///
/// impl StatusDisplay for StderrDisplay {
///     type Error = ();
///
///     fn show(&mut self, status: &ControllerStatus) -> Result<(), ()> {
///         eprintln!("[{}] {}", status.state.as_str(), status.message);
///         Ok(())
///     }
/// }
/// ```
pub trait StatusDisplay {
    /// Error type for display operations.
    type Error: core::fmt::Debug;

    /// Renders one status update.
    fn show(&mut self, status: &ControllerStatus) -> Result<(), Self::Error>;
}
