//! Error types for the robot scheduler.
//!
//! Each collaborator boundary has its own small error enum; [`ControllerError`]
//! wraps them for the controller's public entry points.

/// Failure to find or open a connection to the configured device.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConnectError {
    /// Discovery finished without a device whose name matches exactly.
    #[error("device {name} not found")]
    NotFound {
        /// The canonical device name that was searched for.
        name: String,
    },

    /// Discovery or connection did not finish in time.
    #[error("connection timed out after {timeout_ms}ms")]
    Timeout {
        /// The bound that was exceeded, in milliseconds.
        timeout_ms: u64,
    },
}

/// Failure reported by a connected channel.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// A payload write was rejected or did not complete.
    #[error("write failed: {reason}")]
    WriteFailed {
        /// Transport-specific description.
        reason: String,
    },

    /// The link is gone.
    #[error("channel disconnected")]
    Disconnected,
}

/// Failure while executing a single action.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ExecutionError {
    /// The payload write failed. Actions are never retried.
    #[error("transport failure: {0}")]
    TransportFailure(#[from] TransportError),
}

/// A key identifier outside the fixed key set.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid key binding: {key:?}")]
pub struct InvalidKey {
    /// The rejected identifier, as given.
    pub key: String,
}

/// The queue was closed by a terminal shutdown and will never yield again.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("command queue closed")]
pub struct QueueClosed;

/// Invalid configuration.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The nickname is known but no device has been assigned to it.
    #[error("device alias {alias:?} has no assigned device")]
    UnknownDeviceAlias {
        /// The nickname that was looked up.
        alias: String,
    },

    /// The device name does not fit in a config string.
    #[error("device name {name:?} is longer than {max} bytes")]
    NameTooLong {
        /// The rejected name.
        name: String,
        /// Maximum stored length.
        max: usize,
    },
}

/// Errors surfaced by [`DeviceController`](crate::DeviceController).
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ControllerError {
    /// Connecting failed; the controller is back in `Disconnected`.
    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// An action failed mid-drain; the controller is `Disconnected`.
    #[error(transparent)]
    Execution(#[from] ExecutionError),

    /// The configuration could not be resolved.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The operation needs an open channel.
    #[error("controller is not connected")]
    NotConnected,

    /// The controller reached `Done` and accepts no further work.
    #[error("controller has finished")]
    Finished,
}

impl From<TransportError> for ControllerError {
    fn from(err: TransportError) -> Self {
        ControllerError::Execution(ExecutionError::TransportFailure(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_error_converts_through_execution() {
        let err: ControllerError = TransportError::Disconnected.into();
        assert_eq!(
            err,
            ControllerError::Execution(ExecutionError::TransportFailure(
                TransportError::Disconnected
            ))
        );
    }

    #[test]
    fn messages_name_the_subject() {
        let err = ConnectError::NotFound {
            name: "WAC-2463".into(),
        };
        assert_eq!(err.to_string(), "device WAC-2463 not found");

        let err = InvalidKey { key: "F13".into() };
        assert_eq!(err.to_string(), "invalid key binding: \"F13\"");

        let err = ControllerError::from(ConnectError::Timeout { timeout_ms: 2000 });
        assert_eq!(err.to_string(), "connection timed out after 2000ms");
    }
}
