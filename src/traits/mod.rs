//! Trait definitions for the external collaborators of the scheduler.
//!
//! This module defines the seams that keep the scheduler independent of any
//! particular radio stack or user interface:
//!
//! - `channel`: device discovery, connection and payload writes
//! - `display`: status rendering
//!
//! # Transport Abstraction
//!
//! - [`DeviceLink`]: scan and connect
//! - [`Channel`]: write one payload at a time, subscribe to notifications
//!
//! # Status
//!
//! - [`StatusDisplay`]: consumes `(state, message)` updates

pub mod channel;
pub mod display;

pub use channel::*;
pub use display::*;
