//! Listener interfaces for worlds and filters.
//!
//! World listeners exist for tooling: nothing in the crate
//! depends on them. Filter listeners are the channel filters
//! use to report membership changes, which is what reactive
//! systems are built on.

use crate::query::Mask;
use crate::world::FilterId;
use crate::{Entity, PackedEntity};
use alloc::boxed::Box;
use alloc::vec::Vec;

/// Identifies a registered listener so it can be removed again.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u32);

/// Observes structural changes of a `World`.
///
/// All methods default to doing nothing.
pub trait WorldEventListener: 'static {
    fn on_entity_created(&mut self, _entity: Entity) {}
    /// A component was attached to or removed from `entity`.
    fn on_entity_changed(&mut self, _entity: Entity) {}
    fn on_entity_destroyed(&mut self, _entity: Entity) {}
    fn on_query_created(&mut self, _filter: FilterId, _mask: &Mask) {}
    /// The entity slot table grew to `new_size` slots.
    fn on_world_resized(&mut self, _new_size: usize) {}
    fn on_world_destroyed(&mut self) {}
}

/// Observes membership changes of one filter.
///
/// Entities are reported as packed handles carrying the
/// generation at the time of the event, so a listener
/// holding on to them can later tell whether the entity
/// is still the same.
pub trait FilterEventListener: 'static {
    fn on_entity_added(&mut self, entity: PackedEntity);
    fn on_entity_removed(&mut self, entity: PackedEntity);
    /// `change` was called on an included component of a member entity.
    fn on_entity_updated(&mut self, _entity: PackedEntity) {}
}

/// Stores listeners together with their ids.
pub(crate) struct Listeners<L: ?Sized> {
    entries: Vec<(ListenerId, Box<L>)>,
}

impl<L: ?Sized> Default for Listeners<L> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<L: ?Sized> Listeners<L> {
    pub fn add(&mut self, id: ListenerId, listener: Box<L>) {
        self.entries.push((id, listener));
    }

    pub fn remove(&mut self, id: ListenerId) -> Option<Box<L>> {
        let pos = self.entries.iter().position(|(lid, _)| *lid == id)?;
        Some(self.entries.remove(pos).1)
    }

    /// Calls `f` on every listener in registration order.
    pub fn each(&mut self, mut f: impl FnMut(&mut L)) {
        for (_, listener) in &mut self.entries {
            f(listener);
        }
    }
}
