//! Error types for typebus.
//!
//! All errors are strongly typed using thiserror. Setup-time mistakes
//! (malformed listeners, bad configuration, inverted intervals) are
//! `ValidationError`s; failures raised by user callbacks while the bus is
//! running are `ExecutionError`s.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Boxed error returned by a failing listener or hook.
pub type CallbackError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The constraint a rejected listener violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ListenerDefect {
    /// The listener parameter is `()`, so it has no event to receive.
    #[error("listener must take exactly one input argument")]
    MissingEventArgument,
}

/// Validation errors that occur during setup.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("bad listener func: {reason}")]
    BadListener {
        descriptor: &'static str,
        reason: ListenerDefect,
    },

    #[error("Invalid interval: earliest ({earliest}) must be before or equal to latest ({latest})")]
    InvalidInterval {
        earliest: DateTime<Utc>,
        latest: DateTime<Utc>,
    },

    #[error("No clock type named '{name}'")]
    UnknownClock {
        name: String,
    },

    #[error("Invalid value '{value}' for {key}")]
    InvalidConfig {
        key: String,
        value: String,
    },

    #[error("Malformed configuration: {message}")]
    MalformedConfig {
        message: String,
    },
}

/// Execution errors raised by callbacks while the bus is running.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Listener for {descriptor} failed: {source}")]
    ListenerFailed {
        descriptor: &'static str,
        #[source]
        source: CallbackError,
    },

    #[error("Hook #{index} failed: {source}")]
    HookFailed {
        index: usize,
        #[source]
        source: CallbackError,
    },

    #[error("Hook #{index} panicked: {message}")]
    HookPanicked {
        index: usize,
        message: String,
    },
}

/// Top-level error type for typebus.
#[derive(Debug, Error)]
pub enum BusError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Internal error: {message}")]
    Internal {
        message: String,
    },
}

impl BusError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is an execution error.
    #[must_use]
    pub const fn is_execution(&self) -> bool {
        matches!(self, Self::Execution(_))
    }

    /// Returns true if this is an internal error.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal { .. })
    }

    /// Returns the listener defect if this error rejected a registration.
    #[must_use]
    pub const fn listener_defect(&self) -> Option<ListenerDefect> {
        match self {
            Self::Validation(ValidationError::BadListener { reason, .. }) => Some(*reason),
            _ => None,
        }
    }
}

/// Result type alias for typebus operations.
pub type BusResult<T> = Result<T, BusError>;
