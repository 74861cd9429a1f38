//! # typebus - Typed in-process event dispatch
//!
//! typebus routes events to listeners by type. A listener subscribes either
//! to one concrete event type or to a capability (a trait object) that many
//! event types can declare.
//!
//! ## Core Concepts
//!
//! - **EventBus**: Owns the subscription table; registers listeners and dispatches events
//! - **Event**: A dispatchable value that declares its capabilities through a [`Probe`]
//! - **Hooks**: A group of zero-argument callbacks fired concurrently and joined
//! - **Clock / Interval**: Time readings with an explicit uncertainty
//! - **SyslogForwarder**: Sends events with the [`Syslogger`] capability to syslog
//!
//! ## Usage
//!
//! ```rust
//! use typebus::{Event, EventBus, Probe};
//!
//! pub trait Audited: 'static {
//!     fn actor(&self) -> &str;
//! }
//!
//! struct Deleted {
//!     actor: String,
//!     path: String,
//! }
//!
//! impl Audited for Deleted {
//!     fn actor(&self) -> &str {
//!         &self.actor
//!     }
//! }
//!
//! impl Event for Deleted {
//!     fn conform(&self, probe: &mut Probe<'_>) {
//!         probe.offer::<dyn Audited>(self);
//!     }
//! }
//!
//! let bus = EventBus::new();
//! bus.add_listener(|ev: &Deleted| println!("deleted {}", ev.path))?;
//! bus.add_listener(|ev: &dyn Audited| println!("audit: {}", ev.actor()))?;
//!
//! bus.dispatch(&Deleted { actor: "ana".into(), path: "/tmp/x".into() })?;
//! # Ok::<(), typebus::BusError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Dispatch core
pub mod bus;
pub mod error;
pub mod event;
pub mod hooks;

// Collaborators
pub mod clock;
pub mod config;
pub mod status;
pub mod syslog;
pub mod time;

// Re-export primary types at crate root for convenience
pub use bus::descriptor::{Descriptor, DescriptorKind};
pub use bus::listener::{ListenerId, ListenerOutcome};
pub use bus::EventBus;
pub use clock::{clock_from_config, Clock, ConfiguredClock, ManualClock, SystemClock};
pub use self::config::{ClockConfig, ClockKind, Config, SyslogConfig};
pub use error::{
    BusError, BusResult, CallbackError, ExecutionError, ListenerDefect, ValidationError,
};
pub use event::{Event, Probe, Updater};
pub use hooks::Hooks;
pub use status::{HasStatus, StatusUpdate};
pub use syslog::{Severity, SyslogForwarder, SyslogWriter, Syslogger};
pub use time::Interval;
