//! Hardware Abstraction Layer implementations.
//!
//! This module contains concrete implementations of the traits
//! defined in [`crate::traits`].
//!
//! # Available Implementations
//!
//! - `mock`: In-memory robot for tests and desktop development

pub mod mock;

pub use mock::*;
