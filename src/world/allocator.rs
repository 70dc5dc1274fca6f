use crate::Entity;
use alloc::vec::Vec;

/// Per-slot bookkeeping of the entity table.
#[derive(Copy, Clone, Debug, Default)]
pub(crate) struct EntitySlot {
    /// Bumped every time the slot is reused. Never `0` for a
    /// slot which has been allocated at least once.
    pub generation: u32,
    /// Number of components currently attached.
    pub components: u32,
    pub alive: bool,
}

/// Handles allocation of entity ids.
///
/// Slot `0` is reserved for the null entity. Freed ids go to
/// a stack and are handed out again before fresh ids; the slot
/// table doubles when fresh ids run out.
#[derive(Debug)]
pub(crate) struct EntityAllocator {
    slots: Vec<EntitySlot>,
    /// Freed ids, reused last-in first-out.
    recycled: Vec<u32>,
    /// The next never-used id. Used if `recycled` is empty.
    next: u32,
    alive: usize,
}

impl EntityAllocator {
    /// Creates an allocator with room for `capacity` slots, the
    /// reserved null slot included.
    pub fn new(capacity: usize, recycled: usize) -> Self {
        let capacity = capacity.max(2);
        let mut slots = Vec::new();
        slots.resize(capacity, EntitySlot::default());
        Self {
            slots,
            recycled: Vec::with_capacity(recycled),
            next: 1,
            alive: 0,
        }
    }

    /// Allocates an entity.
    ///
    /// Returns the new size of the slot table if it had to grow.
    pub fn alloc(&mut self) -> (Entity, Option<usize>) {
        if let Some(id) = self.recycled.pop() {
            let slot = &mut self.slots[id as usize];
            slot.generation = next_generation(slot.generation);
            slot.components = 0;
            slot.alive = true;
            self.alive += 1;
            return (Entity(id), None);
        }

        let mut resized = None;
        if self.next as usize == self.slots.len() {
            let new_len = self.slots.len() << 1;
            self.slots.resize(new_len, EntitySlot::default());
            resized = Some(new_len);
        }

        let id = self.next;
        self.next += 1;
        self.slots[id as usize] = EntitySlot {
            generation: 1,
            components: 0,
            alive: true,
        };
        self.alive += 1;
        (Entity(id), resized)
    }

    /// Frees an entity id. The caller checks the entity is alive.
    pub fn free(&mut self, entity: Entity) {
        let slot = &mut self.slots[entity.index()];
        debug_assert!(slot.alive);
        slot.alive = false;
        slot.components = 0;
        self.recycled.push(entity.0);
        self.alive -= 1;
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        !entity.is_null()
            && self
                .slots
                .get(entity.index())
                .map_or(false, |slot| slot.alive)
    }

    pub fn slot(&self, entity: Entity) -> Option<&EntitySlot> {
        self.slots.get(entity.index())
    }

    /// Applies `delta` to the component count of `entity`,
    /// returning the new count.
    pub fn component_count_changed(&mut self, entity: Entity, delta: i32) -> u32 {
        let slot = &mut self.slots[entity.index()];
        slot.components = (slot.components as i64 + delta as i64).max(0) as u32;
        slot.components
    }

    /// Size of the slot table, which is also the required size
    /// of every sparse array indexed by entity.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns the total number of alive entities.
    pub fn allocated(&self) -> usize {
        self.alive
    }

    /// Iterates over every alive entity in id order.
    pub fn iter_alive(&self) -> impl Iterator<Item = (Entity, &EntitySlot)> + '_ {
        self.slots[..self.next as usize]
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, slot)| slot.alive)
            .map(|(id, slot)| (Entity(id as u32), slot))
    }
}

fn next_generation(generation: u32) -> u32 {
    match generation.wrapping_add(1) {
        0 => 1,
        g => g,
    }
}
