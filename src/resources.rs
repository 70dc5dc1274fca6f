use crate::error::{Error, Result};
use crate::util::HashMap;
use alloc::boxed::Box;
use core::any::{type_name, Any, TypeId};
use core::cell::{Ref, RefCell, RefMut};

/// Stores a set of values, each with a distinct type.
///
/// This is the shared context handed to every system by
/// `Systems`. Resources are borrow checked at runtime, so two
/// systems can't hold conflicting borrows of one value, but
/// distinct values may be borrowed at the same time.
#[derive(Default)]
pub struct Resources {
    types: HashMap<TypeId, RefCell<Box<dyn Any>>>,
}

impl Resources {
    /// Creates a new `Resources` with no stored values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a new resource into this `Resources`.
    ///
    /// Replaces an existing value of the same type.
    pub fn insert<T>(&mut self, resource: T)
    where
        T: 'static,
    {
        self.types
            .insert(TypeId::of::<T>(), RefCell::new(Box::new(resource)));
    }

    /// Method chaining alias for `insert`.
    pub fn with<T>(mut self, resource: T) -> Self
    where
        T: 'static,
    {
        self.insert(resource);
        self
    }

    /// Removes a resource, returning it.
    pub fn remove<T>(&mut self) -> Option<T>
    where
        T: 'static,
    {
        let boxed = self.types.remove(&TypeId::of::<T>())?.into_inner();
        boxed.downcast().ok().map(|b| *b)
    }

    pub fn contains<T>(&self) -> bool
    where
        T: 'static,
    {
        self.types.contains_key(&TypeId::of::<T>())
    }

    /// Immutably borrows a resource from this container.
    ///
    /// Fails with `ResourceNotFound` if the resource does not exist,
    /// or `ResourceBorrowed` if it is already mutably borrowed.
    pub fn get<T>(&self) -> Result<Ref<'_, T>>
    where
        T: 'static,
    {
        let cell = self.cell::<T>()?;
        let borrow = cell
            .try_borrow()
            .map_err(|_| Error::ResourceBorrowed(type_name::<T>()))?;
        Ok(Ref::map(borrow, |b| downcast_ref::<T>(&**b)))
    }

    /// Mutably borrows a resource from this container.
    ///
    /// Fails with `ResourceNotFound` if the resource does not exist,
    /// or `ResourceBorrowed` if it is already borrowed.
    pub fn get_mut<T>(&self) -> Result<RefMut<'_, T>>
    where
        T: 'static,
    {
        let cell = self.cell::<T>()?;
        let borrow = cell
            .try_borrow_mut()
            .map_err(|_| Error::ResourceBorrowed(type_name::<T>()))?;
        Ok(RefMut::map(borrow, |b| downcast_mut::<T>(&mut **b)))
    }

    /// Immutably borrows a resource from this container.
    ///
    /// Returns `None` if the resource does not exist
    /// or if it is already mutably borrowed.
    pub fn try_get<T>(&self) -> Option<Ref<'_, T>>
    where
        T: 'static,
    {
        self.get().ok()
    }

    /// Mutably borrows a resource from this container.
    ///
    /// Returns `None` if the resource does not exist
    /// or it is already borrowed.
    pub fn try_get_mut<T>(&self) -> Option<RefMut<'_, T>>
    where
        T: 'static,
    {
        self.get_mut().ok()
    }

    fn cell<T>(&self) -> Result<&RefCell<Box<dyn Any>>>
    where
        T: 'static,
    {
        self.types
            .get(&TypeId::of::<T>())
            .ok_or(Error::ResourceNotFound(type_name::<T>()))
    }
}

// Entries are keyed by their own `TypeId`.
fn downcast_ref<T: 'static>(value: &dyn Any) -> &T {
    value
        .downcast_ref()
        .unwrap_or_else(|| panic!("resource stored under the wrong type"))
}

fn downcast_mut<T: 'static>(value: &mut dyn Any) -> &mut T {
    value
        .downcast_mut()
        .unwrap_or_else(|| panic!("resource stored under the wrong type"))
}
