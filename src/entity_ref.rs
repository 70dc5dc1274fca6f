use crate::component::Component;
use crate::error::Result;
use crate::{Entity, PackedEntity, World};

/// Read-only view of an alive entity, created by `World::entity`.
pub struct EntityRef<'a> {
    pub(crate) world: &'a World,
    pub(crate) entity: Entity,
}

impl<'a> EntityRef<'a> {
    pub fn get<C>(&self) -> Result<&'a C>
    where
        C: Component,
    {
        self.world.get(self.entity)
    }

    pub fn try_get<C>(&self) -> Option<&'a C>
    where
        C: Component,
    {
        self.world.pool::<C>()?.get(self.entity)
    }

    pub fn has<C>(&self) -> bool
    where
        C: Component,
    {
        self.world.has::<C>(self.entity)
    }

    pub fn component_count(&self) -> u32 {
        self.world.component_count(self.entity)
    }

    pub fn pack(&self) -> PackedEntity {
        self.world.pack(self.entity)
    }

    pub fn entity(&self) -> Entity {
        self.entity
    }
}
