use crate::World;
use alloc::vec::Vec;
use core::fmt::{self, Display, Formatter};
use core::sync::atomic::{AtomicU32, Ordering};

/// A handle to an entity in a `World`.
///
/// An `Entity` is a plain slot index. Index `0` is
/// reserved as the null entity. Slots are recycled
/// once an entity is destroyed, so an `Entity` kept
/// across frames may later refer to a different entity;
/// use `PackedEntity` for references that must survive
/// that.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Entity(pub(crate) u32);

impl Entity {
    /// The null entity. Never alive in any world.
    pub const NULL: Entity = Entity(0);

    /// Creates an entity handle from a raw slot index.
    pub const fn from_raw(id: u32) -> Self {
        Entity(id)
    }

    /// Returns the raw slot index of this entity.
    pub const fn id(self) -> u32 {
        self.0
    }

    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl Display for Entity {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

/// An `(id, generation)` pair which stays safe to hold
/// across entity destruction.
///
/// The slot's generation is bumped whenever its id is
/// reused, so unpacking an old handle after the slot has
/// been recycled fails instead of resolving to the new
/// occupant.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct PackedEntity {
    pub(crate) id: u32,
    pub(crate) generation: u32,
}

impl PackedEntity {
    pub fn id(self) -> u32 {
        self.id
    }

    pub fn generation(self) -> u32 {
        self.generation
    }

    /// Returns the entity this handle was packed from,
    /// without checking it against any world.
    pub fn entity_unchecked(self) -> Entity {
        Entity(self.id)
    }

    /// Resolves this handle against `world`.
    ///
    /// Returns `None` if the entity was destroyed or its
    /// slot now belongs to a newer entity.
    pub fn unpack(self, world: &World) -> Option<Entity> {
        world.unpack(self)
    }
}

/// Identity of a `World`, unique for the lifetime of the process.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct WorldId(u32);

static NEXT_WORLD_ID: AtomicU32 = AtomicU32::new(1);

impl WorldId {
    pub(crate) fn next() -> Self {
        WorldId(NEXT_WORLD_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A `PackedEntity` which also remembers the world it came from.
///
/// Unpacking against any other world fails.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PackedEntityWithWorld {
    pub(crate) packed: PackedEntity,
    pub(crate) world: WorldId,
}

impl PackedEntityWithWorld {
    pub fn packed(self) -> PackedEntity {
        self.packed
    }

    pub fn world(self) -> WorldId {
        self.world
    }

    pub fn unpack(self, world: &World) -> Option<Entity> {
        if world.id() != self.world {
            return None;
        }
        world.unpack(self.packed)
    }
}

/// Resolves every handle in `packed` against `world`, writing the
/// entities which are still alive into `out`.
///
/// `out` is cleared first. Returns `true` if at least one handle
/// resolved.
pub fn unpack_all<'a, I>(packed: I, world: &World, out: &mut Vec<Entity>) -> bool
where
    I: IntoIterator<Item = &'a PackedEntity>,
{
    out.clear();
    out.extend(packed.into_iter().filter_map(|p| world.unpack(*p)));
    !out.is_empty()
}
