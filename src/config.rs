//! Controller configuration.
//!
//! Uses `heapless::String` for device names so configs stay fixed-size and
//! cheap to clone into every controller instance.
//!
//! # Example
//!
//! ```rust
//! use wac_robot::config::{Config, ControllerConfig, DeviceConfig, InputConfig};
//!
//! // Use defaults
//! let config = Config::default();
//! assert_eq!(config.controller.queue_capacity, 100);
//!
//! // Or customize
//! let config = Config::default()
//!     .with_device(DeviceConfig::default().with_name("beep"))
//!     .with_controller(ControllerConfig::default().with_exit_when_idle(true))
//!     .with_input(InputConfig::default().with_buttons_enabled(false));
//! ```

use heapless::String as HString;
use tracing::warn;

use crate::error::ConfigError;
use crate::queue::DEFAULT_CAPACITY;

/// Maximum length for short config strings (device names, nicknames)
pub const MAX_SHORT_STRING: usize = 32;

/// Type alias for short config strings
pub type ShortString = HString<MAX_SHORT_STRING>;

// ============================================================================
// Helper for creating heapless strings
// ============================================================================

/// Create a ShortString from a &str, truncating at a char boundary if too long
pub fn short_string(s: &str) -> ShortString {
    let mut hs = ShortString::new();
    for c in s.chars() {
        if hs.push(c).is_err() {
            break;
        }
    }
    hs
}

/// Create a ShortString from a &str, rejecting anything that would not fit
pub fn try_short_string(s: &str) -> Result<ShortString, ConfigError> {
    ShortString::try_from(s).map_err(|_| ConfigError::NameTooLong {
        name: s.to_string(),
        max: MAX_SHORT_STRING,
    })
}

// ============================================================================
// Main Config
// ============================================================================

/// Complete controller configuration
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// Which robot to connect to and how long to try
    pub device: DeviceConfig,
    /// Queue and drain loop settings
    pub controller: ControllerConfig,
    /// Hardware input settings
    pub input: InputConfig,
}

impl Config {
    /// Set device configuration
    pub fn with_device(mut self, device: DeviceConfig) -> Self {
        self.device = device;
        self
    }

    /// Set controller configuration
    pub fn with_controller(mut self, controller: ControllerConfig) -> Self {
        self.controller = controller;
        self
    }

    /// Set input configuration
    pub fn with_input(mut self, input: InputConfig) -> Self {
        self.input = input;
        self
    }

    /// Shorthand for `Config::default()` with a device name or nickname.
    pub fn for_device(name: &str) -> Self {
        Self::default().with_device(DeviceConfig::default().with_name(name))
    }
}

// ============================================================================
// Device Config
// ============================================================================

/// Device identification and connection timing
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceConfig {
    /// Advertised device name or a nickname from the alias table
    pub name: ShortString,
    /// How long one discovery scan listens for advertisements
    pub scan_timeout_ms: u32,
    /// Upper bound on discovery plus connection establishment
    pub connect_timeout_ms: u32,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name: ShortString::new(),
            scan_timeout_ms: 2_000,
            connect_timeout_ms: 10_000,
        }
    }
}

impl DeviceConfig {
    /// Set the device name or nickname.
    ///
    /// Names longer than [`MAX_SHORT_STRING`] bytes are truncated, which
    /// means an exact-name match can never succeed for them. Use
    /// [`try_with_name`](Self::try_with_name) to reject them instead.
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = short_string(name);
        if self.name.len() < name.len() {
            warn!(requested = name, kept = %self.name, "device name truncated");
        }
        self
    }

    /// Set the device name or nickname, failing if it is too long to store.
    pub fn try_with_name(mut self, name: &str) -> Result<Self, ConfigError> {
        self.name = try_short_string(name)?;
        Ok(self)
    }

    /// Set the scan duration
    pub fn with_scan_timeout_ms(mut self, ms: u32) -> Self {
        self.scan_timeout_ms = ms;
        self
    }

    /// Set the connect timeout
    pub fn with_connect_timeout_ms(mut self, ms: u32) -> Self {
        self.connect_timeout_ms = ms;
        self
    }
}

// ============================================================================
// Controller Config
// ============================================================================

/// Drain loop configuration
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ControllerConfig {
    /// Bound on every queue the controller creates
    pub queue_capacity: usize,
    /// How long a key's label stays up when its binding is empty
    pub ack_display_ms: u32,
    /// Finish once main drains and no binding has a sequence
    pub exit_when_idle: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_CAPACITY,
            ack_display_ms: 1_000,
            exit_when_idle: false,
        }
    }
}

impl ControllerConfig {
    /// Set the queue capacity (at least 1)
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    /// Set the acknowledgement display time
    pub fn with_ack_display_ms(mut self, ms: u32) -> Self {
        self.ack_display_ms = ms;
        self
    }

    /// Set whether the controller finishes when idle
    pub fn with_exit_when_idle(mut self, exit: bool) -> Self {
        self.exit_when_idle = exit;
        self
    }
}

// ============================================================================
// Input Config
// ============================================================================

/// Hardware input configuration
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InputConfig {
    /// Pre-bind the A/B buttons and subscribe to their notifications
    pub buttons_enabled: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            buttons_enabled: true,
        }
    }
}

impl InputConfig {
    /// Enable or disable the hardware buttons
    pub fn with_buttons_enabled(mut self, enabled: bool) -> Self {
        self.buttons_enabled = enabled;
        self
    }
}

// ============================================================================
// Tests
// ============================================================================
