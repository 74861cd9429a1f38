//! Forwarding of events to syslog.
//!
//! Any event that declares the [`Syslogger`] capability is turned into a
//! syslog message once a [`SyslogForwarder`] is installed on the bus:
//!
//! ```
//! use std::sync::Arc;
//! use typebus::{Event, EventBus, Probe, Severity, SyslogForwarder, Syslogger};
//!
//! struct DiskFull {
//!     mount: String,
//! }
//!
//! impl Syslogger for DiskFull {
//!     fn syslog(&self) -> (Severity, String) {
//!         (Severity::Critical, format!("disk full: {}", self.mount))
//!     }
//! }
//!
//! impl Event for DiskFull {
//!     fn conform(&self, probe: &mut Probe<'_>) {
//!         probe.offer::<dyn Syslogger>(self);
//!     }
//! }
//!
//! let bus = EventBus::new();
//! // Without a daemon connection, messages go to the tracing log.
//! Arc::new(SyslogForwarder::without_writer()).install(&bus)?;
//! bus.dispatch(&DiskFull { mount: "/var".into() })?;
//! # Ok::<(), typebus::BusError>(())
//! ```
//!
//! Forwarding never fails a dispatch: write errors are logged and dropped.

pub mod writer;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::bus::listener::ListenerId;
use crate::bus::EventBus;
use crate::config::SyslogConfig;
use crate::error::BusResult;

pub use writer::SyslogWriter;
#[cfg(unix)]
pub use writer::UnixSyslogWriter;

/// Capability of events that can describe themselves as a syslog message.
pub trait Syslogger: 'static {
    /// Returns the severity (not the facility) and the message text.
    fn syslog(&self) -> (Severity, String);
}

/// Syslog severities, most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[allow(missing_docs)]
pub enum Severity {
    Emergency,
    Alert,
    Critical,
    Error,
    Warning,
    Notice,
    Info,
    Debug,
}

impl Severity {
    /// Numeric severity code, 0 (emergency) to 7 (debug).
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Inverse of [`Severity::code`].
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0 => Self::Emergency,
            1 => Self::Alert,
            2 => Self::Critical,
            3 => Self::Error,
            4 => Self::Warning,
            5 => Self::Notice,
            6 => Self::Info,
            7 => Self::Debug,
            _ => return None,
        })
    }

    /// Lowercase name of the severity.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Emergency => "emergency",
            Self::Alert => "alert",
            Self::Critical => "critical",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Notice => "notice",
            Self::Info => "info",
            Self::Debug => "debug",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bus listener that sends [`Syslogger`] events to a [`SyslogWriter`].
///
/// Without a writer, messages are logged through `tracing` instead.
pub struct SyslogForwarder {
    writer: Option<Box<dyn SyslogWriter>>,
}

impl SyslogForwarder {
    /// Forwards to `writer`.
    #[must_use]
    pub fn new(writer: impl SyslogWriter + 'static) -> Self {
        Self {
            writer: Some(Box::new(writer)),
        }
    }

    /// Logs messages locally instead of sending them to syslog.
    #[must_use]
    pub const fn without_writer() -> Self {
        Self { writer: None }
    }

    /// Connects to the daemon named in `config`.
    ///
    /// When syslog is disabled, or the connection fails, the forwarder logs
    /// locally. A failed connection is logged at `error`.
    #[must_use]
    pub fn from_config(config: &SyslogConfig) -> Self {
        if !config.enabled {
            return Self::without_writer();
        }
        Self::connect(config)
    }

    #[cfg(unix)]
    fn connect(config: &SyslogConfig) -> Self {
        let tag = config.tag.clone().unwrap_or_else(writer::default_tag);
        match UnixSyslogWriter::connect(&config.socket, tag) {
            Ok(writer) => Self::new(writer),
            Err(e) => {
                error!(socket = %config.socket.display(), error = %e, "can't connect to syslog");
                Self::without_writer()
            }
        }
    }

    #[cfg(not(unix))]
    fn connect(config: &SyslogConfig) -> Self {
        error!(socket = %config.socket.display(), "can't connect to syslog");
        Self::without_writer()
    }

    /// Returns true if messages go to a syslog writer.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.writer.is_some()
    }

    /// Registers this forwarder as a `dyn Syslogger` listener on `bus`.
    ///
    /// # Errors
    ///
    /// Returns any error from [`EventBus::add_listener`].
    pub fn install(self: Arc<Self>, bus: &EventBus) -> BusResult<ListenerId> {
        bus.add_listener(move |event: &dyn Syslogger| self.forward(event))
    }

    /// Sends one event's message.
    pub fn forward(&self, event: &dyn Syslogger) {
        let (severity, message) = event.syslog();

        let Some(writer) = &self.writer else {
            match severity {
                Severity::Emergency | Severity::Alert | Severity::Critical | Severity::Error => {
                    error!(%severity, "{message}");
                }
                Severity::Warning => warn!(%severity, "{message}"),
                Severity::Notice | Severity::Info | Severity::Debug => {
                    info!(%severity, "{message}");
                }
            }
            return;
        };

        if let Err(e) = writer.write(severity, &message) {
            error!(%severity, error = %e, "can't write syslog event");
        }
    }
}

impl fmt::Debug for SyslogForwarder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyslogForwarder")
            .field("connected", &self.is_connected())
            .finish()
    }
}
