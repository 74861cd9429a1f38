//! Status-carrying events.
//!
//! Events that report the progress of some long-lived entity embed a
//! [`StatusUpdate`] and implement [`HasStatus`]. They can then be updated and
//! dispatched in one step:
//!
//! ```
//! use typebus::{Event, EventBus, HasStatus, StatusUpdate};
//!
//! #[derive(Default)]
//! struct JobStatus {
//!     status: StatusUpdate,
//!     job: String,
//! }
//!
//! impl HasStatus for JobStatus {
//!     fn status_mut(&mut self) -> &mut StatusUpdate {
//!         &mut self.status
//!     }
//! }
//!
//! impl Event for JobStatus {}
//!
//! let bus = EventBus::new();
//! bus.add_listener(|ev: &JobStatus| println!("{}: {}", ev.job, ev.status.status))?;
//!
//! let mut ev = JobStatus { job: "backup".into(), ..Default::default() };
//! bus.dispatch_update(&mut ev, "running".to_string())?;
//! bus.dispatch_update(&mut ev, "done".to_string())?;
//! # Ok::<(), typebus::BusError>(())
//! ```

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::event::{Event, Updater};

/// A status string plus the id of the event stream it belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    /// Latest status.
    pub status: String,
    /// Identifier shared by every update of one entity. Zero until the first
    /// update.
    pub event_id: i64,
}

impl StatusUpdate {
    /// Sets the status, assigning an event id on first use.
    ///
    /// An id that is already set is kept, so every update of one entity
    /// carries the same id.
    pub fn update(&mut self, status: impl Into<String>) {
        self.status = status.into();
        if self.event_id == 0 {
            self.event_id = next_event_id();
        }
    }
}

/// Allocates a non-zero id, unique within the process and increasing.
fn next_event_id() -> i64 {
    static LAST: AtomicI64 = AtomicI64::new(0);

    let now = Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX).max(1);
    let mut last = LAST.load(Ordering::Relaxed);
    loop {
        let next = if now > last { now } else { last.saturating_add(1) };
        match LAST.compare_exchange_weak(last, next, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => return next,
            Err(actual) => last = actual,
        }
    }
}

/// Events that embed a [`StatusUpdate`].
pub trait HasStatus {
    /// The embedded status.
    fn status_mut(&mut self) -> &mut StatusUpdate;
}

impl HasStatus for StatusUpdate {
    fn status_mut(&mut self) -> &mut StatusUpdate {
        self
    }
}

impl<T: HasStatus> Updater for T {
    type Update = String;

    fn update(&mut self, update: String) {
        self.status_mut().update(update);
    }
}

impl Event for StatusUpdate {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EventBus;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Default)]
    struct Tracked {
        status: StatusUpdate,
    }

    impl HasStatus for Tracked {
        fn status_mut(&mut self) -> &mut StatusUpdate {
            &mut self.status
        }
    }

    impl Event for Tracked {}

    #[test]
    fn test_update_initializes_event_id() {
        let mut ev = Tracked::default();
        ev.status.update("status");

        assert_eq!(ev.status.status, "status");
        assert_ne!(ev.status.event_id, 0);
    }

    #[test]
    fn test_update_keeps_event_id() {
        let mut ev = Tracked::default();
        ev.status.event_id = 12345;
        ev.status.update("status");

        assert_eq!(ev.status.event_id, 12345);
    }

    #[test]
    fn test_event_ids_are_unique() {
        let mut a = StatusUpdate::default();
        let mut b = StatusUpdate::default();
        a.update("x");
        b.update("x");
        assert_ne!(a.event_id, b.event_id);
    }

    #[test]
    fn test_updater_through_has_status() {
        let mut ev = Tracked::default();
        Updater::update(&mut ev, "queued".to_string());
        assert_eq!(ev.status.status, "queued");
    }

    #[test]
    fn test_update_dispatch() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        bus.add_listener(move |ev: &Tracked| s.lock().unwrap().push(ev.status.clone()))
            .unwrap();

        let mut ev = Tracked::default();
        bus.dispatch_update(&mut ev, "status".to_string()).unwrap();

        assert_eq!(ev.status.status, "status");
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0], ev.status);
    }
}
