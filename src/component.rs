use core::fmt::{self, Display, Formatter};

/// A type which can be used as a component.
///
/// Components are plain value records. Every pool slot
/// starts out as `Default::default()` and is passed through
/// `reset` before it is handed to an entity, and again
/// when the component is removed, so a recycled slot never
/// leaks the previous occupant's data.
///
/// The default `reset` restores `Default::default()`. Override
/// it to keep allocations alive across reuse, e.g. clearing
/// a `Vec` instead of dropping it.
pub trait Component: Default + 'static {
    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Small integer assigned to a component type the first time
/// a world sees it. Indexes the world's pool table.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(pub(crate) u32);

impl ComponentId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl Display for ComponentId {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
