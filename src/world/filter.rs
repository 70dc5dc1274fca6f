use crate::component::ComponentId;
use crate::error::{Error, Result};
use crate::events::{FilterEventListener, ListenerId, Listeners};
use crate::query::Mask;
use crate::util::HashMap;
use crate::world::{AnyPool, World};
use crate::{Entity, PackedEntity};
use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt::{self, Display, Formatter};

/// Identifies a filter within the world which created it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FilterId(pub(crate) u32);

impl FilterId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl Display for FilterId {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "filter#{}", self.0)
    }
}

/// The set of entities currently matching a `Mask`.
///
/// Kept up to date by the world on every attach and detach
/// of a component the mask mentions, so reading it never
/// scans pools. Members live in a dense array; removal swaps
/// the last member into the freed position, so the order of
/// members is unspecified.
pub struct Filter {
    id: FilterId,
    mask: Mask,
    dense: Vec<Entity>,
    /// Position in `dense` plus one, indexed by entity. `0` means not a member.
    sparse: Vec<u32>,
    listeners: Listeners<dyn FilterEventListener>,
}

impl Filter {
    fn new(id: FilterId, mask: Mask, capacity: usize) -> Self {
        let mut sparse = Vec::new();
        sparse.resize(capacity, 0);
        Self {
            id,
            mask,
            dense: Vec::new(),
            sparse,
            listeners: Listeners::default(),
        }
    }

    pub fn id(&self) -> FilterId {
        self.id
    }

    pub fn mask(&self) -> &Mask {
        &self.mask
    }

    /// Iterates over the matching entities.
    ///
    /// Borrows the world immutably; use `World::cursor` to
    /// iterate while detaching components.
    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.dense.iter().copied()
    }

    pub fn entities(&self) -> &[Entity] {
        &self.dense
    }

    pub fn count(&self) -> usize {
        self.dense.len()
    }

    pub fn len(&self) -> usize {
        self.dense.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.sparse
            .get(entity.index())
            .map_or(false, |&pos| pos != 0)
    }

    pub fn to_vec(&self) -> Vec<Entity> {
        self.dense.clone()
    }

    /// Returns the only matching entity, or `Entity::NULL` if
    /// nothing matches.
    pub fn single_entity(&self) -> Result<Entity> {
        match self.dense.as_slice() {
            [] => Ok(Entity::NULL),
            [entity] => Ok(*entity),
            many => Err(Error::MultipleMatches { count: many.len() }),
        }
    }

    fn insert(&mut self, entity: PackedEntity) {
        let e = entity.entity_unchecked();
        if e.index() >= self.sparse.len() {
            let len = (e.index() + 1).max(self.sparse.len() << 1);
            self.sparse.resize(len, 0);
        }
        self.dense.push(e);
        self.sparse[e.index()] = self.dense.len() as u32;
        self.listeners.each(|l| l.on_entity_added(entity));
    }

    fn remove(&mut self, entity: PackedEntity) {
        let e = entity.entity_unchecked();
        let pos = self.sparse[e.index()] as usize - 1;
        self.dense.swap_remove(pos);
        if let Some(&moved) = self.dense.get(pos) {
            self.sparse[moved.index()] = pos as u32 + 1;
        }
        self.sparse[e.index()] = 0;
        self.listeners.each(|l| l.on_entity_removed(entity));
    }

    fn resize(&mut self, capacity: usize) {
        if capacity > self.sparse.len() {
            self.sparse.resize(capacity, 0);
        }
    }
}

/// The kind of component change a world reports to its filters.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Change {
    Added,
    /// Reported while the component is still stored.
    Removed,
    Updated,
}

/// Every filter of a world, cached by mask.
pub(crate) struct FilterCache {
    list: Vec<Filter>,
    by_mask: HashMap<Mask, FilterId>,
    /// Filters including each component, indexed by `ComponentId`.
    include_index: Vec<Vec<FilterId>>,
    /// Filters excluding each component, indexed by `ComponentId`.
    exclude_index: Vec<Vec<FilterId>>,
}

impl FilterCache {
    pub fn with_capacity(filters: usize, components: usize) -> Self {
        let mut by_mask = HashMap::default();
        by_mask.reserve(filters);
        Self {
            list: Vec::with_capacity(filters),
            by_mask,
            include_index: Vec::with_capacity(components),
            exclude_index: Vec::with_capacity(components),
        }
    }

    pub fn find(&self, mask: &Mask) -> Option<FilterId> {
        self.by_mask.get(mask).copied()
    }

    pub fn get(&self, id: FilterId) -> Option<&Filter> {
        self.list.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// Makes room in the component indices for `component`.
    pub fn register_component(&mut self, component: ComponentId) {
        let len = component.index() + 1;
        if self.include_index.len() < len {
            self.include_index.resize_with(len, Vec::new);
            self.exclude_index.resize_with(len, Vec::new);
        }
    }

    /// Creates an empty filter for `mask`. The caller seeds it.
    pub fn create(&mut self, mask: Mask, capacity: usize) -> FilterId {
        let id = FilterId(self.list.len() as u32);
        for component in &mask.include {
            self.register_component(*component);
            self.include_index[component.index()].push(id);
        }
        for component in &mask.exclude {
            self.register_component(*component);
            self.exclude_index[component.index()].push(id);
        }
        self.by_mask.insert(mask.clone(), id);
        self.list.push(Filter::new(id, mask, capacity));
        id
    }

    /// Adds `entity` to a freshly created filter if it matches.
    pub fn seed(&mut self, id: FilterId, pools: &[Box<dyn AnyPool>], entity: PackedEntity) {
        let filter = &mut self.list[id.index()];
        if matches(&filter.mask, pools, entity.entity_unchecked(), None) {
            filter.insert(entity);
        }
    }

    /// Updates every filter mentioning `component` after a change
    /// to `entity`.
    ///
    /// `Added` is reported after the component is stored,
    /// `Removed` before it is dropped from its pool.
    pub fn on_entity_change(
        &mut self,
        pools: &[Box<dyn AnyPool>],
        entity: PackedEntity,
        component: ComponentId,
        change: Change,
    ) {
        let e = entity.entity_unchecked();
        let include = self
            .include_index
            .get(component.index())
            .map_or(&[][..], Vec::as_slice);
        let exclude = self
            .exclude_index
            .get(component.index())
            .map_or(&[][..], Vec::as_slice);

        match change {
            Change::Added => {
                for id in include {
                    let filter = &mut self.list[id.index()];
                    if !filter.contains(e) && matches(&filter.mask, pools, e, None) {
                        filter.insert(entity);
                    }
                }
                for id in exclude {
                    let filter = &mut self.list[id.index()];
                    if filter.contains(e) {
                        filter.remove(entity);
                    }
                }
            }
            Change::Removed => {
                for id in include {
                    let filter = &mut self.list[id.index()];
                    if filter.contains(e) {
                        filter.remove(entity);
                    }
                }
                for id in exclude {
                    let filter = &mut self.list[id.index()];
                    if !filter.contains(e) && matches(&filter.mask, pools, e, Some(component)) {
                        filter.insert(entity);
                    }
                }
            }
            Change::Updated => {
                for id in include {
                    let filter = &mut self.list[id.index()];
                    if filter.contains(e) {
                        filter.listeners.each(|l| l.on_entity_updated(entity));
                    }
                }
            }
        }
    }

    pub fn resize(&mut self, capacity: usize) {
        for filter in &mut self.list {
            filter.resize(capacity);
        }
    }

    pub fn add_listener(
        &mut self,
        filter: FilterId,
        id: ListenerId,
        listener: Box<dyn FilterEventListener>,
    ) {
        self.list[filter.index()].listeners.add(id, listener);
    }

    pub fn remove_listener(
        &mut self,
        filter: FilterId,
        id: ListenerId,
    ) -> Option<Box<dyn FilterEventListener>> {
        self.list.get_mut(filter.index())?.listeners.remove(id)
    }
}

/// Checks `entity` against `mask`, treating `without` as absent.
fn matches(
    mask: &Mask,
    pools: &[Box<dyn AnyPool>],
    entity: Entity,
    without: Option<ComponentId>,
) -> bool {
    let has = |id: &ComponentId| Some(*id) != without && pools[id.index()].contains(entity);
    mask.include.iter().all(has) && !mask.exclude.iter().any(has)
}

/// Iterates a filter while the world is mutated between steps.
///
/// Detaching the current entity (or destroying it) between two
/// calls to `next` neither skips nor repeats other members:
/// when the last returned entity is no longer where it was,
/// the member swapped into its position is visited next.
/// Entities that start matching during iteration may or may
/// not be visited.
///
/// ```ignore
/// let mut cursor = world.cursor(filter);
/// while let Some(entity) = cursor.next(&world) {
///     world.remove::<Hit>(entity)?;
/// }
/// ```
#[derive(Copy, Clone, Debug)]
pub struct FilterCursor {
    filter: FilterId,
    pos: usize,
    last: Entity,
}

impl FilterCursor {
    pub(crate) fn new(filter: FilterId) -> Self {
        Self {
            filter,
            pos: 0,
            last: Entity::NULL,
        }
    }

    pub fn filter(&self) -> FilterId {
        self.filter
    }

    pub fn next(&mut self, world: &World) -> Option<Entity> {
        let members = world.query(self.filter).entities();
        if self.pos > 0 && members.get(self.pos - 1) != Some(&self.last) {
            self.pos -= 1;
        }
        let entity = *members.get(self.pos)?;
        self.pos += 1;
        self.last = entity;
        Some(entity)
    }
}
