use crate::component::{Component, ComponentId};
use crate::error::Result;
use crate::world::World;
use crate::Entity;
use alloc::vec::Vec;
use core::any::Any;
use core::marker::PhantomData;

/// A component storage based on a sparse set.
///
/// Stores all components of one type within a `World`.
/// `dense` is 1-based; slot `0` is a sentinel so that a `0`
/// in `sparse` means "not attached". Freed slots go to
/// `recycled` and are reused before `dense` grows, which
/// keeps values packed without shifting on removal.
///
/// A `Pool` only does storage. Attaching and detaching
/// through the world also keeps entity component counts and
/// filters up to date, so mutation goes through `World` or
/// `PoolMut`.
pub struct Pool<T> {
    id: ComponentId,
    dense: Vec<T>,
    sparse: Vec<u32>,
    recycled: Vec<u32>,
}

impl<T> Pool<T>
where
    T: Component,
{
    pub(crate) fn new(id: ComponentId, dense: usize, sparse: usize, recycled: usize) -> Self {
        let mut dense_items = Vec::with_capacity(dense + 1);
        dense_items.push(T::default());
        let mut sparse_items = Vec::new();
        sparse_items.resize(sparse, 0);
        Self {
            id,
            dense: dense_items,
            sparse: sparse_items,
            recycled: Vec::with_capacity(recycled),
        }
    }

    pub fn id(&self) -> ComponentId {
        self.id
    }

    /// Number of entities which have this component.
    pub fn len(&self) -> usize {
        self.dense.len() - 1 - self.recycled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn contains(&self, entity: Entity) -> bool {
        self.slot(entity) != 0
    }

    #[inline]
    pub fn get(&self, entity: Entity) -> Option<&T> {
        match self.slot(entity) {
            0 => None,
            slot => Some(&self.dense[slot as usize]),
        }
    }

    #[inline]
    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        match self.slot(entity) {
            0 => None,
            slot => Some(&mut self.dense[slot as usize]),
        }
    }

    #[inline]
    fn slot(&self, entity: Entity) -> u32 {
        self.sparse.get(entity.index()).copied().unwrap_or(0)
    }

    /// Stores a clean value for `entity`, returning its dense slot.
    ///
    /// The caller checks the entity doesn't have the component yet.
    pub(crate) fn insert(&mut self, entity: Entity) -> u32 {
        debug_assert!(!self.contains(entity));
        let slot = match self.recycled.pop() {
            // Recycled slots were reset on removal.
            Some(slot) => slot,
            None => {
                if self.dense.len() == self.dense.capacity() {
                    let len = self.dense.len();
                    self.dense.reserve_exact(len);
                }
                let mut value = T::default();
                value.reset();
                self.dense.push(value);
                (self.dense.len() - 1) as u32
            }
        };
        if entity.index() >= self.sparse.len() {
            self.resize(entity.index() + 1);
        }
        self.sparse[entity.index()] = slot;
        slot
    }

    /// Frees the slot of `entity`, resetting its value.
    ///
    /// Returns `false` if the entity didn't have the component.
    pub(crate) fn remove(&mut self, entity: Entity) -> bool {
        let slot = self.slot(entity);
        if slot == 0 {
            return false;
        }
        self.dense[slot as usize].reset();
        self.sparse[entity.index()] = 0;
        self.recycled.push(slot);
        true
    }

    pub(crate) fn value_mut(&mut self, slot: u32) -> &mut T {
        &mut self.dense[slot as usize]
    }

    /// Grows the sparse array to `capacity`, doubling at least.
    fn resize(&mut self, capacity: usize) {
        let len = capacity.max(self.sparse.len() << 1);
        self.sparse.resize(len, 0);
    }

    /// Returns the raw dense values, sentinel and freed slots included.
    pub fn raw_dense(&self) -> &[T] {
        &self.dense
    }

    /// Returns the raw sparse array.
    pub fn raw_sparse(&self) -> &[u32] {
        &self.sparse
    }
}

/// Type-erased interface over `Pool<T>` used by the world for
/// operations which don't know the component type.
pub(crate) trait AnyPool: 'static {
    fn contains(&self, entity: Entity) -> bool;
    fn remove(&mut self, entity: Entity) -> bool;
    fn resize_sparse(&mut self, capacity: usize);
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T> AnyPool for Pool<T>
where
    T: Component,
{
    fn contains(&self, entity: Entity) -> bool {
        Pool::contains(self, entity)
    }

    fn remove(&mut self, entity: Entity) -> bool {
        Pool::remove(self, entity)
    }

    fn resize_sparse(&mut self, capacity: usize) {
        if capacity > self.sparse.len() {
            self.sparse.resize(capacity, 0);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Mutable access to the components of type `T` in a world.
///
/// Obtained through `World::pool_mut`. Caches the component
/// id so each operation indexes the pool table directly.
pub struct PoolMut<'w, T> {
    world: &'w mut World,
    id: ComponentId,
    _marker: PhantomData<fn() -> T>,
}

impl<'w, T> PoolMut<'w, T>
where
    T: Component,
{
    pub(crate) fn new(world: &'w mut World, id: ComponentId) -> Self {
        Self {
            world,
            id,
            _marker: PhantomData,
        }
    }

    pub fn id(&self) -> ComponentId {
        self.id
    }

    /// Attaches a clean component to `entity`.
    ///
    /// Fails with `AlreadyAttached` if the component is present,
    /// or `InvalidEntity` if the entity is not alive.
    pub fn add(&mut self, entity: Entity) -> Result<&mut T> {
        self.world.add_by_id::<T>(self.id, entity)
    }

    pub fn get(&self, entity: Entity) -> Result<&T> {
        self.world.get_by_id::<T>(self.id, entity)
    }

    pub fn get_mut(&mut self, entity: Entity) -> Result<&mut T> {
        self.world.get_mut_by_id::<T>(self.id, entity)
    }

    pub fn read(&self, entity: Entity) -> Result<T>
    where
        T: Clone,
    {
        self.get(entity).map(T::clone)
    }

    pub fn try_read(&self, entity: Entity) -> Option<T>
    where
        T: Clone,
    {
        self.world.typed_pool::<T>(self.id).get(entity).cloned()
    }

    pub fn has(&self, entity: Entity) -> bool {
        self.world.typed_pool::<T>(self.id).contains(entity)
    }

    /// Removes the component from `entity`. Does nothing if it is
    /// absent. Removing the last component destroys the entity.
    pub fn remove(&mut self, entity: Entity) -> Result<()> {
        self.world.remove_by_id(self.id, entity)
    }

    /// Returns the component of `entity`, attaching it first if absent.
    ///
    /// On an existing component, filters including `T` report the
    /// entity as updated to their listeners.
    pub fn change(&mut self, entity: Entity) -> Result<&mut T> {
        self.world.change_by_id::<T>(self.id, entity)
    }

    /// Attaches the component if `present`, removes it otherwise.
    pub fn set(&mut self, entity: Entity, present: bool) -> Result<()> {
        self.world.set_by_id::<T>(self.id, entity, present)
    }

    pub fn len(&self) -> usize {
        self.world.typed_pool::<T>(self.id).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
