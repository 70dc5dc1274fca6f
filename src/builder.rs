use crate::component::Component;
use crate::error::Result;
use crate::{Entity, World};
use alloc::boxed::Box;
use alloc::vec::Vec;
use core::any::TypeId;

type Attach = Box<dyn FnOnce(&mut World, Entity) -> Result<()>>;

/// Collects component values to spawn them on a new entity at once.
///
/// ```ignore
/// let entity = EntityBuilder::new()
///     .with(Position(0, 0))
///     .with(Velocity(1))
///     .spawn_in(&mut world)?;
/// ```
#[derive(Default)]
pub struct EntityBuilder {
    components: Vec<(TypeId, Attach)>,
}

impl EntityBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<C>(mut self, component: C) -> Self
    where
        C: Component,
    {
        self.add(component);
        self
    }

    pub fn add<C>(&mut self, component: C) -> &mut Self
    where
        C: Component,
    {
        let attach: Attach = Box::new(move |world, entity| {
            *world.add::<C>(entity)? = component;
            Ok(())
        });

        // If the component already exists in the builder,
        // then override it.
        let type_id = TypeId::of::<C>();
        match self.components.iter_mut().find(|(ty, _)| *ty == type_id) {
            Some((_, existing)) => *existing = attach,
            None => self.components.push((type_id, attach)),
        }
        self
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Creates an entity in `world` with every collected component.
    ///
    /// An empty builder creates an entity without components, which
    /// has to get one before the next leaked-entity check.
    pub fn spawn_in(mut self, world: &mut World) -> Result<Entity> {
        self.spawn_one(world)
    }

    /// Like `spawn_in`, but leaves the builder empty for reuse.
    ///
    /// If attaching a component fails, the half-built entity is
    /// destroyed and the builder is still emptied.
    pub fn spawn_one(&mut self, world: &mut World) -> Result<Entity> {
        let entity = world.create();
        for (_, attach) in self.components.drain(..) {
            if let Err(err) = attach(world, entity) {
                if world.is_alive(entity) {
                    world.destroy(entity)?;
                }
                return Err(err);
            }
        }
        Ok(entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[derive(Default)]
    struct Health;
    impl Component for Health {}

    #[test]
    fn failed_attach_destroys_entity() {
        let mut world = World::new();
        let mut builder = EntityBuilder::new().with(Health);
        let failing: Attach = Box::new(|_, _| Err(Error::NotInitialized));
        builder.components.push((TypeId::of::<u8>(), failing));

        let result = builder.spawn_one(&mut world);
        assert_eq!(result, Err(Error::NotInitialized));
        assert!(builder.is_empty());
        assert_eq!(world.entity_count(), 0);
        assert_eq!(world.find_leaked_entity(), None);
        assert!(world.pool::<Health>().map_or(true, |pool| pool.is_empty()));
    }
}
