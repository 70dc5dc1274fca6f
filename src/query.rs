use crate::component::{Component, ComponentId};
use crate::error::{Error, Result};
use crate::world::{FilterId, World};
use alloc::vec::Vec;

/// The predicate of a filter: every `include` component
/// present, no `exclude` component present.
///
/// Both lists are kept sorted and free of duplicates, so two
/// masks built from the same components in any order compare
/// equal and share one filter.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Mask {
    pub(crate) include: Vec<ComponentId>,
    pub(crate) exclude: Vec<ComponentId>,
}

impl Mask {
    pub fn include(&self) -> &[ComponentId] {
        &self.include
    }

    pub fn exclude(&self) -> &[ComponentId] {
        &self.exclude
    }

    fn normalize(&mut self) {
        self.include.sort_unstable();
        self.include.dedup();
        self.exclude.sort_unstable();
        self.exclude.dedup();
    }
}

/// Builds a filter over a world.
///
/// Created by `World::filter`. Filters are cached per
/// world, so `end` on an equal mask returns the existing
/// filter instead of building a second index.
pub struct FilterBuilder<'w> {
    world: &'w mut World,
    mask: Mask,
}

impl<'w> FilterBuilder<'w> {
    pub(crate) fn new(world: &'w mut World) -> Self {
        Self {
            world,
            mask: Mask::default(),
        }
    }

    pub fn include<C>(mut self) -> Self
    where
        C: Component,
    {
        let id = self.world.register::<C>();
        self.mask.include.push(id);
        self
    }

    pub fn exclude<C>(mut self) -> Self
    where
        C: Component,
    {
        let id = self.world.register::<C>();
        self.mask.exclude.push(id);
        self
    }

    /// Adds every component of the tuple `S` to the include list.
    pub fn include_set<S>(mut self) -> Self
    where
        S: ComponentSet,
    {
        S::register(self.world, &mut self.mask.include);
        self
    }

    /// Adds every component of the tuple `S` to the exclude list.
    pub fn exclude_set<S>(mut self) -> Self
    where
        S: ComponentSet,
    {
        S::register(self.world, &mut self.mask.exclude);
        self
    }

    /// Finishes the filter, returning the id of the cached index.
    pub fn end(self) -> Result<FilterId> {
        let FilterBuilder { world, mut mask } = self;
        mask.normalize();

        if mask.include.is_empty() {
            return Err(Error::EmptyFilter);
        }
        if let Some(id) = mask
            .include
            .iter()
            .find(|id| mask.exclude.binary_search(id).is_ok())
        {
            return Err(Error::ConflictingFilter {
                component: world.component_name(*id),
            });
        }

        Ok(world.filter_for_mask(mask))
    }
}

/// A tuple of component types.
///
/// Implemented for `()` and tuples of up to six components.
pub trait ComponentSet {
    /// Registers every component of the set with `world`,
    /// pushing its id to `out`.
    fn register(world: &mut World, out: &mut Vec<ComponentId>);
}

impl ComponentSet for () {
    fn register(_world: &mut World, _out: &mut Vec<ComponentId>) {}
}

macro_rules! recursive_macro_call_on_tuple {
    ($m: ident, $ty: ident) => {
        $m!{$ty}
    };
    ($m: ident, $ty: ident, $($tt: ident),*) => {
        $m!{$ty, $($tt),*}
        recursive_macro_call_on_tuple!{$m, $($tt),*}
    };
}

macro_rules! impl_component_set {
    ($($ty:ident),+) => {
        impl<$($ty: Component),*> ComponentSet for ($($ty,)*) {
            fn register(world: &mut World, out: &mut Vec<ComponentId>) {
                $(out.push(world.register::<$ty>());)*
            }
        }
    }
}

recursive_macro_call_on_tuple!(impl_component_set, A, B, C, D, E, F);
