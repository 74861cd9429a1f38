//! Type-erased listener storage.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CallbackError;

/// Return types accepted from listeners and hooks.
///
/// `()` never fails; `Result<(), E>` fails with `E` boxed.
pub trait ListenerOutcome {
    /// Converts the callback's return value into a uniform result.
    ///
    /// # Errors
    ///
    /// Returns the callback's own error, boxed.
    fn into_outcome(self) -> Result<(), CallbackError>;
}

impl ListenerOutcome for () {
    fn into_outcome(self) -> Result<(), CallbackError> {
        Ok(())
    }
}

impl<E> ListenerOutcome for Result<(), E>
where
    E: Into<CallbackError>,
{
    fn into_outcome(self) -> Result<(), CallbackError> {
        self.map_err(Into::into)
    }
}

/// A stored listener for events viewed as `T`.
pub(crate) type Handler<T> = Arc<dyn Fn(&T) -> Result<(), CallbackError> + Send + Sync>;

/// All listeners for one descriptor, in registration order.
pub(crate) type HandlerList<T> = Vec<Handler<T>>;

pub(crate) fn into_handler<T, F, R>(listener: F) -> Handler<T>
where
    T: ?Sized + 'static,
    F: Fn(&T) -> R + Send + Sync + 'static,
    R: ListenerOutcome,
{
    Arc::new(move |event: &T| listener(event).into_outcome())
}

/// Identifier assigned to each registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListenerId(Uuid);

impl ListenerId {
    /// Create a new random listener id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for ListenerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
