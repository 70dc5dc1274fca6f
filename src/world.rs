mod allocator;
mod filter;
mod pool;

pub(crate) use filter::{Change, FilterCache};
pub use filter::{Filter, FilterCursor, FilterId};
pub(crate) use pool::AnyPool;
pub use pool::{Pool, PoolMut};

use crate::component::{Component, ComponentId};
use crate::config::WorldConfig;
use crate::entity::WorldId;
use crate::entity_ref::EntityRef;
use crate::error::{Error, Result};
use crate::events::{FilterEventListener, ListenerId, Listeners, WorldEventListener};
use crate::query::{ComponentSet, FilterBuilder, Mask};
use crate::registry::ComponentRegistry;
use crate::{Entity, PackedEntity, PackedEntityWithWorld};
use alloc::boxed::Box;
use alloc::vec::Vec;
use allocator::EntityAllocator;
use core::any::type_name;
use tracing::{debug, trace};

/// Contains entities and the components attached to them.
///
/// Each component type is stored in its own sparse-set `Pool`,
/// created the first time the type is used. Filters created
/// through `filter` are cached by mask and kept up to date on
/// every attach and detach.
///
/// An entity lives as long as it has at least one component:
/// detaching the last component destroys it.
pub struct World {
    id: WorldId,
    config: WorldConfig,
    entities: EntityAllocator,
    registry: ComponentRegistry,
    /// Component pools indexed by `ComponentId`.
    pools: Vec<Box<dyn AnyPool>>,
    filters: FilterCache,
    listeners: Listeners<dyn WorldEventListener>,
    next_listener: u32,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    /// Creates a new, empty `World` with the default configuration.
    pub fn new() -> Self {
        Self::with_config(WorldConfig::default())
    }

    pub fn with_config(config: WorldConfig) -> Self {
        Self {
            id: WorldId::next(),
            entities: EntityAllocator::new(config.entities, config.recycled_entities),
            registry: ComponentRegistry::with_capacity(config.pools),
            pools: Vec::with_capacity(config.pools),
            filters: FilterCache::with_capacity(config.filters, config.pools),
            listeners: Listeners::default(),
            next_listener: 0,
            config,
        }
    }

    pub fn id(&self) -> WorldId {
        self.id
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Creates a new entity without components.
    ///
    /// The entity must get a component before the next
    /// leaked-entity check, or be destroyed explicitly.
    pub fn create(&mut self) -> Entity {
        let (entity, resized) = self.entities.alloc();
        if let Some(capacity) = resized {
            self.resize(capacity);
        }
        trace!(entity = %entity, "entity created");
        self.listeners.each(|l| l.on_entity_created(entity));
        entity
    }

    /// Destroys an entity, detaching every component it still has.
    ///
    /// Fails with `InvalidEntity` if the entity is not alive.
    pub fn destroy(&mut self, entity: Entity) -> Result<()> {
        if !self.entities.is_alive(entity) {
            return Err(Error::InvalidEntity(entity));
        }
        self.destroy_unchecked(entity);
        Ok(())
    }

    fn destroy_unchecked(&mut self, entity: Entity) {
        let attached = self.component_count(entity);
        if attached > 0 {
            for index in 0..self.pools.len() {
                if self.pools[index].contains(entity) {
                    self.detach(ComponentId(index as u32), entity);
                }
            }
        }
        self.free(entity);
    }

    fn free(&mut self, entity: Entity) {
        self.entities.free(entity);
        trace!(entity = %entity, "entity destroyed");
        self.listeners.each(|l| l.on_entity_destroyed(entity));
    }

    /// Determines if the given `Entity` is alive within this `World`.
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.is_alive(entity)
    }

    /// Returns the current generation of the entity's slot, or `0`
    /// for a slot which was never used.
    pub fn generation(&self, entity: Entity) -> u32 {
        self.entities.slot(entity).map_or(0, |slot| slot.generation)
    }

    /// Returns the number of components attached to an alive entity.
    pub fn component_count(&self, entity: Entity) -> u32 {
        match self.entities.slot(entity) {
            Some(slot) if slot.alive => slot.components,
            _ => 0,
        }
    }

    /// Returns the number of alive entities.
    pub fn entity_count(&self) -> usize {
        self.entities.allocated()
    }

    /// Returns the size of the entity slot table.
    pub fn capacity(&self) -> usize {
        self.entities.capacity()
    }

    /// Iterates over all alive entities in id order.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.iter_alive().map(|(entity, _)| entity)
    }

    /// Destroys every entity. Pools and filters stay registered.
    pub fn clear(&mut self) {
        let alive: Vec<Entity> = self.entities().collect();
        for entity in alive {
            self.destroy_unchecked(entity);
        }
    }

    /// Returns an alive entity without components, if any.
    pub fn find_leaked_entity(&self) -> Option<Entity> {
        self.entities
            .iter_alive()
            .find(|(_, slot)| slot.components == 0)
            .map(|(entity, _)| entity)
    }

    /// Creates a reference for the world and the given entity.
    ///
    /// Returns `None` if the entity is not alive.
    pub fn entity(&self, entity: Entity) -> Option<EntityRef<'_>> {
        if self.is_alive(entity) {
            Some(EntityRef {
                world: self,
                entity,
            })
        } else {
            None
        }
    }

    pub fn pack(&self, entity: Entity) -> PackedEntity {
        PackedEntity {
            id: entity.0,
            generation: self.generation(entity),
        }
    }

    /// Resolves a packed handle.
    ///
    /// Returns `None` if its entity was destroyed, including when
    /// the slot has since been reused by another entity.
    pub fn unpack(&self, packed: PackedEntity) -> Option<Entity> {
        let entity = Entity(packed.id);
        match self.entities.slot(entity) {
            Some(slot)
                if slot.alive && !entity.is_null() && slot.generation == packed.generation =>
            {
                Some(entity)
            }
            _ => None,
        }
    }

    pub fn pack_with_world(&self, entity: Entity) -> PackedEntityWithWorld {
        PackedEntityWithWorld {
            packed: self.pack(entity),
            world: self.id,
        }
    }

    /// Returns the id of `T` in this world, creating its pool if needed.
    pub fn register<T>(&mut self) -> ComponentId
    where
        T: Component,
    {
        let (id, created) = self.registry.register::<T>();
        if created {
            let sparse = self.config.pool_sparse.max(self.entities.capacity());
            self.pools.push(Box::new(Pool::<T>::new(
                id,
                self.config.pool_dense,
                sparse,
                self.config.pool_recycled,
            )));
            self.filters.register_component(id);
            debug!(component = type_name::<T>(), id = id.0, "pool registered");
        }
        id
    }

    /// Returns the name of a registered component type.
    pub fn component_name(&self, id: ComponentId) -> &'static str {
        self.registry.name(id)
    }

    /// Returns the storage of `T`, if any entity ever used it.
    pub fn pool<T>(&self) -> Option<&Pool<T>>
    where
        T: Component,
    {
        self.registry.get::<T>().map(|id| self.typed_pool::<T>(id))
    }

    /// Returns mutable access to the components of type `T`.
    ///
    /// Prefer it over the per-call methods on `World` in hot
    /// loops: the component id is looked up once.
    pub fn pool_mut<T>(&mut self) -> PoolMut<'_, T>
    where
        T: Component,
    {
        let id = self.register::<T>();
        PoolMut::new(self, id)
    }

    /// Attaches a clean `T` to `entity` and returns it for initialization.
    ///
    /// Fails with `AlreadyAttached` if the entity already has a `T`.
    pub fn add<T>(&mut self, entity: Entity) -> Result<&mut T>
    where
        T: Component,
    {
        let id = self.register::<T>();
        self.add_by_id::<T>(id, entity)
    }

    /// Borrows component data `T` for the given entity.
    ///
    /// Fails with `NotAttached` if the entity has no `T`.
    pub fn get<T>(&self, entity: Entity) -> Result<&T>
    where
        T: Component,
    {
        match self.registry.get::<T>() {
            Some(id) => self.get_by_id::<T>(id, entity),
            None => {
                self.check_alive(entity)?;
                Err(not_attached::<T>(entity))
            }
        }
    }

    /// Mutably borrows component data `T` for the given entity.
    ///
    /// Unlike `change`, filter listeners are not notified.
    pub fn get_mut<T>(&mut self, entity: Entity) -> Result<&mut T>
    where
        T: Component,
    {
        match self.registry.get::<T>() {
            Some(id) => self.get_mut_by_id::<T>(id, entity),
            None => {
                self.check_alive(entity)?;
                Err(not_attached::<T>(entity))
            }
        }
    }

    /// Returns a copy of the entity's `T`.
    pub fn read<T>(&self, entity: Entity) -> Result<T>
    where
        T: Component + Clone,
    {
        self.get::<T>(entity).map(T::clone)
    }

    /// Returns a copy of the entity's `T`, if it has one.
    pub fn try_read<T>(&self, entity: Entity) -> Option<T>
    where
        T: Component + Clone,
    {
        self.pool::<T>()?.get(entity).cloned()
    }

    /// Checks if the given entity contains the component `T`.
    pub fn has<T>(&self, entity: Entity) -> bool
    where
        T: Component,
    {
        self.pool::<T>().map_or(false, |pool| pool.contains(entity))
    }

    /// Detaches `T` from the entity. Does nothing if it has none.
    ///
    /// Detaching the last component destroys the entity.
    pub fn remove<T>(&mut self, entity: Entity) -> Result<()>
    where
        T: Component,
    {
        match self.registry.get::<T>() {
            Some(id) => self.remove_by_id(id, entity),
            None => self.check_alive(entity),
        }
    }

    /// Returns the entity's `T` for modification, attaching it first
    /// if absent.
    ///
    /// Filters including `T` report an already attached component
    /// as updated to their listeners.
    pub fn change<T>(&mut self, entity: Entity) -> Result<&mut T>
    where
        T: Component,
    {
        let id = self.register::<T>();
        self.change_by_id::<T>(id, entity)
    }

    /// Attaches `T` if `present` and it is absent, detaches it if
    /// not `present` and it is attached.
    pub fn set<T>(&mut self, entity: Entity, present: bool) -> Result<()>
    where
        T: Component,
    {
        let id = self.register::<T>();
        self.set_by_id::<T>(id, entity, present)
    }

    /// Starts a filter including `A`.
    pub fn filter<A>(&mut self) -> FilterBuilder<'_>
    where
        A: Component,
    {
        FilterBuilder::new(self).include::<A>()
    }

    /// Creates the filter including every component of `I` and
    /// none of `E`.
    pub fn filter_of<I, E>(&mut self) -> Result<FilterId>
    where
        I: ComponentSet,
        E: ComponentSet,
    {
        FilterBuilder::new(self)
            .include_set::<I>()
            .exclude_set::<E>()
            .end()
    }

    /// Returns the cached filter for `mask`, creating and seeding it
    /// from the alive entities if needed.
    pub(crate) fn filter_for_mask(&mut self, mask: Mask) -> FilterId {
        if let Some(id) = self.filters.find(&mask) {
            return id;
        }

        let id = self.filters.create(mask, self.entities.capacity());
        for (entity, slot) in self.entities.iter_alive() {
            let packed = PackedEntity {
                id: entity.0,
                generation: slot.generation,
            };
            self.filters.seed(id, &self.pools, packed);
        }

        let filter = self.query(id);
        debug!(filter = id.0, matching = filter.len(), "filter created");
        let mask = filter.mask().clone();
        self.listeners.each(|l| l.on_query_created(id, &mask));
        id
    }

    /// Returns a filter of this world.
    ///
    /// # Panics
    /// Panics if `id` was created by another world.
    pub fn query(&self, id: FilterId) -> &Filter {
        self.filters
            .get(id)
            .unwrap_or_else(|| panic!("{} does not belong to this world", id))
    }

    /// Returns a cursor over a filter which tolerates detaching
    /// components from the current entity.
    pub fn cursor(&self, id: FilterId) -> FilterCursor {
        self.query(id);
        FilterCursor::new(id)
    }

    /// Returns the only entity with a `T`, or `Entity::NULL` if there
    /// is none.
    ///
    /// Fails with `MultipleMatches` if more than one entity has a `T`.
    pub fn single_entity<T>(&mut self) -> Result<Entity>
    where
        T: Component,
    {
        let id = self.filter::<T>().end()?;
        self.query(id).single_entity()
    }

    pub fn add_event_listener(&mut self, listener: Box<dyn WorldEventListener>) -> ListenerId {
        let id = self.next_listener_id();
        self.listeners.add(id, listener);
        id
    }

    pub fn remove_event_listener(&mut self, id: ListenerId) -> Option<Box<dyn WorldEventListener>> {
        self.listeners.remove(id)
    }

    /// Registers a listener for membership changes of `filter`.
    ///
    /// # Panics
    /// Panics if `filter` was created by another world.
    pub fn add_filter_listener(
        &mut self,
        filter: FilterId,
        listener: Box<dyn FilterEventListener>,
    ) -> ListenerId {
        self.query(filter);
        let id = self.next_listener_id();
        self.filters.add_listener(filter, id, listener);
        id
    }

    pub fn remove_filter_listener(
        &mut self,
        filter: FilterId,
        id: ListenerId,
    ) -> Option<Box<dyn FilterEventListener>> {
        self.filters.remove_listener(filter, id)
    }

    fn next_listener_id(&mut self) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        id
    }

    fn check_alive(&self, entity: Entity) -> Result<()> {
        if self.config.validation && !self.entities.is_alive(entity) {
            return Err(Error::InvalidEntity(entity));
        }
        Ok(())
    }

    fn resize(&mut self, capacity: usize) {
        for pool in &mut self.pools {
            pool.resize_sparse(capacity);
        }
        self.filters.resize(capacity);
        debug!(capacity, "entity table resized");
        self.listeners.each(|l| l.on_world_resized(capacity));
    }

    pub(crate) fn typed_pool<T>(&self, id: ComponentId) -> &Pool<T>
    where
        T: Component,
    {
        self.pools[id.index()]
            .as_any()
            .downcast_ref()
            .unwrap_or_else(|| panic!("{} is not the id of {}", id, type_name::<T>()))
    }

    fn typed_pool_mut<T>(&mut self, id: ComponentId) -> &mut Pool<T>
    where
        T: Component,
    {
        self.pools[id.index()]
            .as_any_mut()
            .downcast_mut()
            .unwrap_or_else(|| panic!("{} is not the id of {}", id, type_name::<T>()))
    }

    pub(crate) fn add_by_id<T>(&mut self, id: ComponentId, entity: Entity) -> Result<&mut T>
    where
        T: Component,
    {
        self.check_alive(entity)?;
        let pool = self.typed_pool_mut::<T>(id);
        if pool.contains(entity) {
            return Err(Error::AlreadyAttached {
                component: type_name::<T>(),
                entity,
            });
        }
        let slot = pool.insert(entity);

        self.entities.component_count_changed(entity, 1);
        let packed = self.pack(entity);
        self.filters
            .on_entity_change(&self.pools, packed, id, Change::Added);
        self.listeners.each(|l| l.on_entity_changed(entity));

        Ok(self.typed_pool_mut::<T>(id).value_mut(slot))
    }

    pub(crate) fn get_by_id<T>(&self, id: ComponentId, entity: Entity) -> Result<&T>
    where
        T: Component,
    {
        self.check_alive(entity)?;
        self.typed_pool::<T>(id)
            .get(entity)
            .ok_or_else(|| not_attached::<T>(entity))
    }

    pub(crate) fn get_mut_by_id<T>(&mut self, id: ComponentId, entity: Entity) -> Result<&mut T>
    where
        T: Component,
    {
        self.check_alive(entity)?;
        self.typed_pool_mut::<T>(id)
            .get_mut(entity)
            .ok_or_else(|| not_attached::<T>(entity))
    }

    pub(crate) fn remove_by_id(&mut self, id: ComponentId, entity: Entity) -> Result<()> {
        self.check_alive(entity)?;
        if !self.pools[id.index()].contains(entity) {
            return Ok(());
        }
        self.detach(id, entity);
        if self.entities.component_count_changed(entity, -1) == 0 {
            self.free(entity);
        }
        Ok(())
    }

    pub(crate) fn change_by_id<T>(&mut self, id: ComponentId, entity: Entity) -> Result<&mut T>
    where
        T: Component,
    {
        self.check_alive(entity)?;
        if !self.pools[id.index()].contains(entity) {
            return self.add_by_id::<T>(id, entity);
        }
        let packed = self.pack(entity);
        self.filters
            .on_entity_change(&self.pools, packed, id, Change::Updated);
        self.get_mut_by_id::<T>(id, entity)
    }

    pub(crate) fn set_by_id<T>(
        &mut self,
        id: ComponentId,
        entity: Entity,
        present: bool,
    ) -> Result<()>
    where
        T: Component,
    {
        self.check_alive(entity)?;
        match (present, self.pools[id.index()].contains(entity)) {
            (true, false) => self.add_by_id::<T>(id, entity).map(|_| ()),
            (false, true) => self.remove_by_id(id, entity),
            _ => Ok(()),
        }
    }

    /// Drops the component from its pool after updating filters.
    /// Component counts are left to the caller.
    fn detach(&mut self, id: ComponentId, entity: Entity) {
        let packed = self.pack(entity);
        self.filters
            .on_entity_change(&self.pools, packed, id, Change::Removed);
        self.pools[id.index()].remove(entity);
        self.listeners.each(|l| l.on_entity_changed(entity));
    }
}

impl Drop for World {
    fn drop(&mut self) {
        debug!(
            pools = self.pools.len(),
            filters = self.filters.len(),
            "world destroyed"
        );
        self.listeners.each(|l| l.on_world_destroyed());
    }
}

fn not_attached<T>(entity: Entity) -> Error {
    Error::NotAttached {
        component: type_name::<T>(),
        entity,
    }
}
