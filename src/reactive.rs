//! Systems driven by filter membership changes.
//!
//! A `ReactiveSystem` registers a listener on each filter it
//! subscribes to. Listeners push packed handles into a shared
//! batch; on its run turn the system resolves the batch against
//! the world and hands the surviving entities to
//! `Reactive::process` in one call.

use crate::error::Result;
use crate::events::{FilterEventListener, ListenerId};
use crate::system::{Phases, System, SystemCtx};
use crate::util::HashMap;
use crate::world::FilterId;
use crate::{Entity, PackedEntity, World};
use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::any::type_name;
use core::cell::RefCell;
use core::ops::BitOr;
use tracing::debug;

/// The kinds of membership change a subscription observes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Monitor(u8);

impl Monitor {
    pub const NONE: Monitor = Monitor(0);
    /// An entity started matching the filter.
    pub const ADDED: Monitor = Monitor(1 << 0);
    /// An entity stopped matching the filter.
    pub const REMOVED: Monitor = Monitor(1 << 1);
    /// `change` was called on an included component of a member.
    pub const UPDATED: Monitor = Monitor(1 << 2);
    pub const ADDED_OR_REMOVED: Monitor = Monitor(Self::ADDED.0 | Self::REMOVED.0);

    pub const fn contains(self, other: Monitor) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for Monitor {
    type Output = Monitor;

    fn bitor(self, rhs: Monitor) -> Monitor {
        Monitor(self.0 | rhs.0)
    }
}

/// A filter together with the changes to observe on it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FilterMonitor {
    pub filter: FilterId,
    pub monitor: Monitor,
}

impl FilterMonitor {
    pub fn new(filter: FilterId, monitor: Monitor) -> Self {
        Self { filter, monitor }
    }

    pub fn on_added(filter: FilterId) -> Self {
        Self::new(filter, Monitor::ADDED)
    }

    pub fn on_removed(filter: FilterId) -> Self {
        Self::new(filter, Monitor::REMOVED)
    }

    pub fn on_updated(filter: FilterId) -> Self {
        Self::new(filter, Monitor::UPDATED)
    }

    pub fn on_added_or_removed(filter: FilterId) -> Self {
        Self::new(filter, Monitor::ADDED_OR_REMOVED)
    }
}

/// The logic of a `ReactiveSystem`.
pub trait Reactive: 'static {
    /// Returns the filters to observe. Called on activation.
    fn subscribe(&mut self, world: &mut World) -> Result<Vec<FilterMonitor>>;

    /// Handles every entity triggered since the previous call.
    ///
    /// Each entity appears once, is alive, and, if it was only
    /// updated, still matches the filter that reported it.
    fn process(&mut self, world: &mut World, entities: &[Entity]) -> Result<()>;
}

struct Pending {
    entity: PackedEntity,
    /// Set while the entity was only reported as updated.
    requery: Option<FilterId>,
}

#[derive(Default)]
struct Batch {
    /// Union of the monitors of every subscription.
    monitor: Monitor,
    pending: Vec<Pending>,
    index: HashMap<PackedEntity, usize>,
}

impl Batch {
    fn push(&mut self, entity: PackedEntity, kind: Monitor, filter: FilterId) {
        if !self.monitor.contains(kind) {
            return;
        }
        let structural = kind != Monitor::UPDATED;
        match self.index.get(&entity) {
            Some(&pos) => {
                if structural {
                    self.pending[pos].requery = None;
                }
            }
            None => {
                self.index.insert(entity, self.pending.len());
                self.pending.push(Pending {
                    entity,
                    requery: (!structural).then_some(filter),
                });
            }
        }
    }

    fn clear(&mut self) {
        self.pending.clear();
        self.index.clear();
    }
}

struct Collector {
    filter: FilterId,
    batch: Rc<RefCell<Batch>>,
}

impl FilterEventListener for Collector {
    fn on_entity_added(&mut self, entity: PackedEntity) {
        self.batch
            .borrow_mut()
            .push(entity, Monitor::ADDED, self.filter);
    }

    fn on_entity_removed(&mut self, entity: PackedEntity) {
        self.batch
            .borrow_mut()
            .push(entity, Monitor::REMOVED, self.filter);
    }

    fn on_entity_updated(&mut self, entity: PackedEntity) {
        self.batch
            .borrow_mut()
            .push(entity, Monitor::UPDATED, self.filter);
    }
}

/// Runs a `Reactive` once per cycle on the entities its filters
/// reported since the previous cycle.
///
/// As a pipeline system it activates on `init`, flushes on `run`
/// and deactivates on `destroy`. It can also be driven by hand
/// through `activate`, `flush` and `deactivate`.
pub struct ReactiveSystem<R> {
    inner: R,
    world: Option<String>,
    batch: Rc<RefCell<Batch>>,
    subscriptions: Vec<(FilterId, ListenerId)>,
    active: bool,
    resolved: Vec<Entity>,
}

impl<R> ReactiveSystem<R>
where
    R: Reactive,
{
    /// Creates a reactive system over the default world.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            world: None,
            batch: Rc::default(),
            subscriptions: Vec::new(),
            active: false,
            resolved: Vec::new(),
        }
    }

    /// Observes the world registered under `name` instead.
    pub fn in_world(mut self, name: impl Into<String>) -> Self {
        self.world = Some(name.into());
        self
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Returns the union of the monitors of all subscriptions.
    pub fn monitor(&self) -> Monitor {
        self.batch.borrow().monitor
    }

    /// Returns the number of entities waiting for the next flush,
    /// stale handles included.
    pub fn pending_len(&self) -> usize {
        self.batch.borrow().pending.len()
    }

    /// Subscribes to the filters returned by `Reactive::subscribe`.
    ///
    /// Does nothing if already active.
    pub fn activate(&mut self, world: &mut World) -> Result<()> {
        if self.active {
            return Ok(());
        }
        let monitors = self.inner.subscribe(world)?;
        let monitor = monitors
            .iter()
            .fold(Monitor::NONE, |acc, m| acc | m.monitor);
        self.batch.borrow_mut().monitor = monitor;

        for m in monitors {
            let collector = Collector {
                filter: m.filter,
                batch: Rc::clone(&self.batch),
            };
            let id = world.add_filter_listener(m.filter, Box::new(collector));
            self.subscriptions.push((m.filter, id));
        }
        self.active = true;
        debug!(
            system = type_name::<R>(),
            filters = self.subscriptions.len(),
            "reactive system activated"
        );
        Ok(())
    }

    /// Unsubscribes from every filter and drops pending entities.
    pub fn deactivate(&mut self, world: &mut World) {
        if !self.active {
            return;
        }
        for (filter, id) in self.subscriptions.drain(..) {
            world.remove_filter_listener(filter, id);
        }
        let mut batch = self.batch.borrow_mut();
        batch.clear();
        batch.monitor = Monitor::NONE;
        self.active = false;
        debug!(system = type_name::<R>(), "reactive system deactivated");
    }

    /// Processes the pending batch.
    ///
    /// Returns `true` if `Reactive::process` was called. Entities
    /// reported while processing land in the next batch.
    pub fn flush(&mut self, world: &mut World) -> Result<bool> {
        let pending = {
            let mut batch = self.batch.borrow_mut();
            batch.index.clear();
            core::mem::take(&mut batch.pending)
        };
        if pending.is_empty() {
            return Ok(false);
        }

        let mut entities = core::mem::take(&mut self.resolved);
        entities.clear();
        entities.extend(pending.iter().filter_map(|p| {
            let entity = world.unpack(p.entity)?;
            match p.requery {
                Some(filter) if !world.query(filter).contains(entity) => None,
                _ => Some(entity),
            }
        }));

        let processed = !entities.is_empty();
        let result = if processed {
            self.inner.process(world, &entities)
        } else {
            Ok(())
        };
        self.resolved = entities;
        result.map(|_| processed)
    }
}

impl<R> System for ReactiveSystem<R>
where
    R: Reactive,
{
    fn phases(&self) -> Phases {
        Phases::INIT | Phases::RUN | Phases::DESTROY
    }

    fn init(&mut self, ctx: &mut SystemCtx) -> Result<()> {
        let world = ctx.world_by(self.world.as_deref())?;
        self.activate(world)
    }

    fn run(&mut self, ctx: &mut SystemCtx) -> Result<()> {
        let world = ctx.world_by(self.world.as_deref())?;
        self.flush(world).map(|_| ())
    }

    fn destroy(&mut self, ctx: &mut SystemCtx) -> Result<()> {
        let world = ctx.world_by(self.world.as_deref())?;
        self.deactivate(world);
        Ok(())
    }

    fn name(&self) -> &'static str {
        type_name::<R>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packed(id: u32) -> PackedEntity {
        PackedEntity { id, generation: 1 }
    }

    #[test]
    fn batch_dedupes_by_handle() {
        let mut batch = Batch {
            monitor: Monitor::ADDED_OR_REMOVED,
            ..Batch::default()
        };
        batch.push(packed(1), Monitor::ADDED, FilterId(0));
        batch.push(packed(1), Monitor::REMOVED, FilterId(0));
        batch.push(packed(2), Monitor::ADDED, FilterId(0));
        batch.push(packed(3), Monitor::UPDATED, FilterId(0));

        assert_eq!(batch.pending.len(), 2);
    }

    #[test]
    fn structural_change_clears_requery() {
        let mut batch = Batch {
            monitor: Monitor::ADDED | Monitor::UPDATED,
            ..Batch::default()
        };
        batch.push(packed(1), Monitor::UPDATED, FilterId(4));
        assert_eq!(batch.pending[0].requery, Some(FilterId(4)));

        batch.push(packed(1), Monitor::ADDED, FilterId(4));
        assert_eq!(batch.pending[0].requery, None);
        assert_eq!(batch.pending.len(), 1);
    }

    #[test]
    fn monitor_union() {
        let m = Monitor::ADDED | Monitor::UPDATED;
        assert!(m.contains(Monitor::ADDED));
        assert!(!m.contains(Monitor::REMOVED));
        assert!(Monitor::ADDED_OR_REMOVED.contains(Monitor::REMOVED));
    }
}
