//! Event values and capability conformance.
//!
//! Every value passed to [`EventBus::dispatch`](crate::EventBus::dispatch)
//! implements [`Event`]. The concrete type of the value selects the exact-type
//! listeners; the capabilities (trait objects) the type declares in
//! [`Event::conform`] select the capability listeners.
//!
//! Conformance is declared, not discovered: a type satisfies `dyn Syslogger`
//! only if its `conform` offers a `&dyn Syslogger` view of itself. The one
//! exception is `dyn Any`, which every event satisfies.
//!
//! ## Shared form
//!
//! `Arc<E>` is an event in its own right with a distinct concrete type, so a
//! listener registered for `E` never sees a dispatched `Arc<E>` and vice
//! versa. The shared form satisfies every capability `E` declares in
//! `conform`, plus those `E` declares in [`Event::conform_shared`], which are
//! typically traits implemented on `Arc<E>` itself. Dispatching a bare `E`
//! never satisfies the shared-only capabilities.
//!
//! ```
//! use std::sync::Arc;
//! use typebus::{Event, EventBus, Probe};
//!
//! pub trait Describe: 'static {
//!     fn describe(&self) -> String;
//! }
//!
//! struct Login {
//!     user: String,
//! }
//!
//! impl Describe for Login {
//!     fn describe(&self) -> String {
//!         format!("login by {}", self.user)
//!     }
//! }
//!
//! impl Event for Login {
//!     fn conform(&self, probe: &mut Probe<'_>) {
//!         probe.offer::<dyn Describe>(self);
//!     }
//! }
//!
//! let bus = EventBus::new();
//! bus.add_listener(|ev: &dyn Describe| println!("{}", ev.describe()))?;
//! bus.dispatch(&Login { user: "ana".into() })?;
//! bus.dispatch(&Arc::new(Login { user: "bo".into() }))?;
//! # Ok::<(), typebus::BusError>(())
//! ```

use std::any::{Any, TypeId};
use std::sync::Arc;

use crate::bus::descriptor::Descriptor;
use crate::bus::listener::HandlerList;
use crate::error::{BusError, ExecutionError};

/// A value that can be dispatched through an [`EventBus`](crate::EventBus).
pub trait Event: Any + Send + Sync {
    /// Offers the capability views this type satisfies.
    ///
    /// Called once per registered capability descriptor during dispatch.
    /// Implementations call [`Probe::offer`] for each capability; offers for
    /// other capabilities are ignored cheaply.
    fn conform(&self, probe: &mut Probe<'_>) {
        let _ = probe;
    }

    /// Offers the capabilities only the shared form `Arc<Self>` satisfies.
    fn conform_shared(this: &Arc<Self>, probe: &mut Probe<'_>)
    where
        Self: Sized,
    {
        let _ = (this, probe);
    }
}

impl<T: Event> Event for Arc<T> {
    fn conform(&self, probe: &mut Probe<'_>) {
        T::conform(self.as_ref(), probe);
        T::conform_shared(self, probe);
    }
}

macro_rules! plain_events {
    ($($ty:ty),* $(,)?) => {
        $(impl Event for $ty {})*
    };
}

plain_events!(String, &'static str, bool, char, i32, i64, u32, u64, usize, f64);

/// Events that can be mutated before dispatch.
///
/// See [`EventBus::dispatch_update`](crate::EventBus::dispatch_update).
pub trait Updater {
    /// The update applied to the event.
    type Update;

    /// Applies `update` to the event.
    fn update(&mut self, update: Self::Update);
}

#[derive(Debug)]
enum ProbeState {
    Pending,
    Matched,
    Failed(ExecutionError),
}

/// Conformance visitor for one capability descriptor.
///
/// The probe carries the listeners registered for its capability. When the
/// event offers a view of that capability, the listeners run immediately
/// against the view, in registration order.
pub struct Probe<'a> {
    descriptor: Descriptor,
    handlers: &'a (dyn Any + Send + Sync),
    state: ProbeState,
}

impl<'a> Probe<'a> {
    pub(crate) fn new(descriptor: Descriptor, handlers: &'a (dyn Any + Send + Sync)) -> Self {
        Self {
            descriptor,
            handlers,
            state: ProbeState::Pending,
        }
    }

    /// Returns true if this probe is still waiting for a `C` view.
    #[must_use]
    pub fn wants<C: ?Sized + 'static>(&self) -> bool {
        matches!(self.state, ProbeState::Pending) && self.descriptor.id() == TypeId::of::<C>()
    }

    /// Offers a view of the event as capability `C`.
    ///
    /// Runs the capability's listeners if `C` is the probed capability and no
    /// earlier offer already matched. The first failing listener stops the
    /// remaining ones; the failure is reported by the dispatcher.
    pub fn offer<C: ?Sized + 'static>(&mut self, view: &C) {
        if !self.wants::<C>() {
            return;
        }
        self.state = ProbeState::Matched;

        let Some(handlers) = self.handlers.downcast_ref::<HandlerList<C>>() else {
            return;
        };

        for handler in handlers {
            if let Err(source) = handler(view) {
                self.state = ProbeState::Failed(ExecutionError::ListenerFailed {
                    descriptor: self.descriptor.name(),
                    source,
                });
                return;
            }
        }
    }

    /// Returns true if the event satisfied the probed capability.
    #[must_use]
    pub fn matched(&self) -> bool {
        !matches!(self.state, ProbeState::Pending)
    }

    pub(crate) fn finish(self) -> Result<bool, BusError> {
        match self.state {
            ProbeState::Pending => Ok(false),
            ProbeState::Matched => Ok(true),
            ProbeState::Failed(err) => Err(err.into()),
        }
    }
}

impl std::fmt::Debug for Probe<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Probe")
            .field("descriptor", &self.descriptor)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
