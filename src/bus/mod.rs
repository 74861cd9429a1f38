//! Typed event bus.
//!
//! [`EventBus`] owns the subscription table. Listeners are registered by the
//! type of their single parameter:
//!
//! - a sized type (`|ev: &Login|`) subscribes to exactly that concrete type;
//! - a trait object (`|ev: &dyn Syslogger|`) subscribes to every event that
//!   declares the capability in [`Event::conform`].
//!
//! ## Dispatch order
//! ```text
//! dispatch(&ev)
//!   ├─► listeners for type_of(ev)            (registration order)
//!   └─► for cap in capabilities              (first registration order)
//!         └─► if ev offers cap: listeners for cap (registration order)
//! ```
//!
//! ## Rules
//! - Registration is append-only; there is no unsubscribe.
//! - Dispatch runs on the caller's thread against a snapshot of the table.
//!   No lock is held while listeners run, so listeners may dispatch or
//!   register; new listeners take effect from the next dispatch.
//! - The first failing listener stops the dispatch and its error is returned.
//!   Panics unwind to the caller.

pub mod descriptor;
pub mod listener;
mod registry;

use std::any::{type_name, Any, TypeId};
use std::sync::{Arc, RwLock};

use tracing::{debug, trace};

use crate::error::{BusError, BusResult, ExecutionError, ListenerDefect, ValidationError};
use crate::event::{Event, Probe, Updater};

use descriptor::Descriptor;
use listener::{into_handler, ListenerId, ListenerOutcome};
use registry::SubscriptionTable;

/// In-process event bus with exact-type and capability routing.
pub struct EventBus {
    table: RwLock<Arc<SubscriptionTable>>,
}

impl EventBus {
    /// Creates an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self {
            table: RwLock::new(Arc::new(SubscriptionTable::default())),
        }
    }

    /// Registers a listener for the type of its parameter.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::BadListener` if the parameter type is `()`,
    /// and `BusError::Internal` if the subscription table lock is poisoned.
    ///
    /// # Examples
    ///
    /// ```
    /// use typebus::{Event, EventBus};
    ///
    /// struct Tick(u64);
    /// impl Event for Tick {}
    ///
    /// let bus = EventBus::new();
    /// bus.add_listener(|tick: &Tick| println!("tick {}", tick.0))?;
    /// bus.dispatch(&Tick(1))?;
    /// # Ok::<(), typebus::BusError>(())
    /// ```
    pub fn add_listener<T, F, R>(&self, listener: F) -> BusResult<ListenerId>
    where
        T: ?Sized + 'static,
        F: Fn(&T) -> R + Send + Sync + 'static,
        R: ListenerOutcome,
    {
        let descriptor = Descriptor::of::<T>();
        if descriptor.id() == TypeId::of::<()>() {
            return Err(ValidationError::BadListener {
                descriptor: descriptor.name(),
                reason: ListenerDefect::MissingEventArgument,
            }
            .into());
        }

        let handler = into_handler(listener);
        let id = ListenerId::new();

        let mut guard = self
            .table
            .write()
            .map_err(|_| BusError::internal("subscription table lock poisoned"))?;
        let next = guard.with_handler(handler);
        *guard = Arc::new(next);
        drop(guard);

        debug!(
            descriptor = descriptor.name(),
            kind = %descriptor.kind(),
            listener_id = %id,
            "Listener registered"
        );
        Ok(id)
    }

    /// Sends `event` to every listener registered for its concrete type, then
    /// to the listeners of every registered capability it satisfies.
    ///
    /// # Errors
    ///
    /// Returns `ExecutionError::ListenerFailed` from the first listener that
    /// fails; the remaining listeners are skipped.
    pub fn dispatch<E: Event>(&self, event: &E) -> BusResult<()> {
        let table = self.snapshot()?;

        let exact = table.handlers::<E>().map_or(0, Vec::len);
        trace!(
            event = type_name::<E>(),
            exact_listeners = exact,
            capabilities = table.capability_count(),
            "Dispatching event"
        );

        if let Some(handlers) = table.handlers::<E>() {
            for handler in handlers {
                handler(event).map_err(|source| ExecutionError::ListenerFailed {
                    descriptor: type_name::<E>(),
                    source,
                })?;
            }
        }

        for slot in table.capabilities() {
            let mut probe = Probe::new(slot.descriptor, slot.handlers.as_ref());
            probe.offer::<dyn Any>(event);
            probe.offer::<dyn Any + Send + Sync>(event);
            if !probe.matched() {
                event.conform(&mut probe);
            }
            if probe.finish()? {
                trace!(
                    event = type_name::<E>(),
                    capability = slot.descriptor.name(),
                    "Capability matched"
                );
            }
        }

        Ok(())
    }

    /// Applies `update` to `event`, then dispatches it.
    ///
    /// Every listener observes the event after the update.
    ///
    /// # Errors
    ///
    /// Same as [`EventBus::dispatch`].
    pub fn dispatch_update<E>(&self, event: &mut E, update: E::Update) -> BusResult<()>
    where
        E: Event + Updater,
    {
        event.update(update);
        self.dispatch(&*event)
    }

    /// Total number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.snapshot().map_or(0, |table| table.listener_count())
    }

    /// Number of distinct capability descriptors with listeners.
    #[must_use]
    pub fn capability_count(&self) -> usize {
        self.snapshot().map_or(0, |table| table.capability_count())
    }

    fn snapshot(&self) -> BusResult<Arc<SubscriptionTable>> {
        let guard = self
            .table
            .read()
            .map_err(|_| BusError::internal("subscription table lock poisoned"))?;
        Ok(Arc::clone(&guard))
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listener_count())
            .field("capabilities", &self.capability_count())
            .finish()
    }
}
