//! Subscription table: descriptor → ordered listeners.
//!
//! The table is immutable once published. Registration builds a new table
//! from the current one (`with_handler`) and swaps it in; dispatch works on
//! whichever table was current when it started.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use super::descriptor::Descriptor;
use super::listener::{Handler, HandlerList};

#[derive(Clone)]
pub(crate) struct Slot {
    pub(crate) descriptor: Descriptor,
    /// Always a `HandlerList<T>` for the descriptor's `T`.
    pub(crate) handlers: Arc<dyn Any + Send + Sync>,
}

#[derive(Clone, Default)]
pub(crate) struct SubscriptionTable {
    slots: HashMap<TypeId, Slot>,
    /// Capability descriptors, first registration first, one entry each.
    capabilities: Vec<TypeId>,
    listener_count: usize,
}

impl SubscriptionTable {
    /// Returns a copy of this table with `handler` appended for `T`.
    pub(crate) fn with_handler<T: ?Sized + 'static>(&self, handler: Handler<T>) -> Self {
        let descriptor = Descriptor::of::<T>();
        let mut next = self.clone();

        let mut list: HandlerList<T> = next
            .slots
            .get(&descriptor.id())
            .and_then(|slot| slot.handlers.downcast_ref::<HandlerList<T>>())
            .cloned()
            .unwrap_or_default();
        list.push(handler);

        let is_new = next
            .slots
            .insert(
                descriptor.id(),
                Slot {
                    descriptor,
                    handlers: Arc::new(list),
                },
            )
            .is_none();

        if is_new && descriptor.is_capability() {
            next.capabilities.push(descriptor.id());
        }
        next.listener_count = next.listener_count.saturating_add(1);
        next
    }

    /// Listeners registered for exactly `T`.
    pub(crate) fn handlers<T: ?Sized + 'static>(&self) -> Option<&HandlerList<T>> {
        self.slots
            .get(&TypeId::of::<T>())
            .and_then(|slot| slot.handlers.downcast_ref::<HandlerList<T>>())
    }

    /// Capability slots in registration order.
    pub(crate) fn capabilities(&self) -> impl Iterator<Item = &Slot> {
        self.capabilities
            .iter()
            .filter_map(|id| self.slots.get(id))
    }

    pub(crate) fn capability_count(&self) -> usize {
        self.capabilities.len()
    }

    pub(crate) fn listener_count(&self) -> usize {
        self.listener_count
    }
}
