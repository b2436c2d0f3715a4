//! # wac-robot
//!
//! A command-queue scheduler for WeAllCode classroom robots: lights, wheels,
//! a 5x5 dot-matrix display and a buzzer, driven over Bluetooth LE.
//!
//! ## Features
//!
//! - **Fluent sequences**: build timed action sequences on a bounded queue
//! - **Interrupts without loss**: key presses and hardware buttons redirect
//!   the robot to a bound sequence at the next action boundary, then hand
//!   control back to the main sequence
//! - **Replay**: save/restore snapshots so bound sequences and idle loops
//!   play again on every trigger
//! - **Transport abstraction**: discovery, connection and writes sit behind
//!   traits, with an in-memory mock robot for tests
//! - **Observable status**: every transition and dispatch is published as a
//!   `(state, message)` pair
//!
//! ## Architecture
//!
//! - `actions` - Action model and wire payloads
//! - `queue` - Bounded command queue with snapshots
//! - `input` - Key set, bindings and redirect dispatch
//! - `controller` - Connection lifecycle and the drain loop
//! - `traits` - Transport and display abstractions
//! - `hal` - Concrete implementations (mock for testing)
//! - `services` - Status reporting
//!
//! ## Example
//!
//! ```rust
//! use wac_robot::{hal::MockLink, Config, DeviceController, DeviceState};
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().start_paused(true).build().unwrap().block_on(async {
//! let link = MockLink::new().with_device("WAC-2463", "F0:01");
//! let mut controller = DeviceController::new(link, Config::for_device("beep")).unwrap();
//!
//! // Main sequence: red for a second, then drive forward.
//! controller
//!     .main_queue()
//!     .set_color(255, 0, 0, 1000)
//!     .set_motion(100, 100, 500)
//!     .stop(0);
//!
//! // Key "a" shows a letter and beeps.
//! controller.bind("a").unwrap().display_text("A", 500).emit_tone(880, 250);
//!
//! controller.play().await.unwrap();
//! assert_eq!(controller.state(), DeviceState::Done);
//! # });
//! ```

#![warn(missing_docs)]

/// Action model, clamping rules and wire payloads.
pub mod actions;
/// Device nickname resolution.
pub mod aliases;
/// Controller configuration.
pub mod config;
/// Connection lifecycle, active-queue arbitration and the drain loop.
pub mod controller;
/// Error types.
pub mod error;
/// Hardware abstraction layer with mock implementations for testing.
pub mod hal;
/// Key set, bindings and input dispatch.
pub mod input;
/// Bounded command queue with save/restore snapshots.
pub mod queue;
/// Services that run alongside the drain loop.
pub mod services;
/// Transport and display abstractions.
pub mod traits;

// Re-exports for convenience
pub use actions::{Action, ActionKind, Pattern};
pub use aliases::{DeviceNameResolver, StaticAliasTable};
pub use config::{Config, ControllerConfig, DeviceConfig, InputConfig};
pub use controller::{
    ActiveQueue, ControllerStatus, DeviceController, DeviceState, QueueRole, ShutdownGuard,
    ShutdownHandle,
};
pub use error::{
    ConfigError, ConnectError, ControllerError, ExecutionError, InvalidKey, QueueClosed,
    TransportError,
};
pub use input::{InputRouter, InputSink, Key};
pub use queue::CommandQueue;
pub use traits::{Channel, DeviceLink, DiscoveredDevice, StatusDisplay};
