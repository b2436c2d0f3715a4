//! Services that run alongside the drain loop.
//!
//! - `status`: renders controller status to a [`StatusDisplay`](crate::traits::StatusDisplay)

pub mod status;

pub use status::*;
