use crate::component::{Component, ComponentId};
use crate::util::HashMap;
use alloc::vec::Vec;
use core::any::TypeId;

/// Maps component types to the dense `ComponentId`s of one world.
///
/// Ids are handed out in registration order and never reused,
/// so they double as indices into the world's pool table.
#[derive(Debug, Default)]
pub(crate) struct ComponentRegistry {
    ids: HashMap<TypeId, ComponentId>,
    names: Vec<&'static str>,
}

impl ComponentRegistry {
    pub fn with_capacity(capacity: usize) -> Self {
        let mut ids = HashMap::default();
        ids.reserve(capacity);
        Self {
            ids,
            names: Vec::with_capacity(capacity),
        }
    }

    /// Returns the id of `T`, if the type was registered.
    pub fn get<T: Component>(&self) -> Option<ComponentId> {
        self.ids.get(&TypeId::of::<T>()).copied()
    }

    /// Returns the id of `T`, registering it if needed.
    ///
    /// The boolean is `true` if the type was registered by this call.
    pub fn register<T: Component>(&mut self) -> (ComponentId, bool) {
        if let Some(id) = self.get::<T>() {
            return (id, false);
        }
        let id = ComponentId(self.names.len() as u32);
        self.ids.insert(TypeId::of::<T>(), id);
        self.names.push(core::any::type_name::<T>());
        (id, true)
    }

    pub fn name(&self, id: ComponentId) -> &'static str {
        self.names
            .get(id.index())
            .copied()
            .unwrap_or("<unregistered>")
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.names.len()
    }
}
