use crate::Entity;
use alloc::string::String;

/// Errors raised on contract violations.
///
/// Benign absence (no component, no matching entity, stale
/// handle) is never an error; those are reported through
/// `Option`, `bool` or `Entity::NULL`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("{0} is not alive")]
    InvalidEntity(Entity),
    #[error("component `{component}` already attached to {entity}")]
    AlreadyAttached {
        component: &'static str,
        entity: Entity,
    },
    #[error("component `{component}` not attached to {entity}")]
    NotAttached {
        component: &'static str,
        entity: Entity,
    },
    #[error("systems already initialized")]
    AlreadyInitialized,
    #[error("systems not initialized")]
    NotInitialized,
    #[error("world \"{0}\" not found")]
    WorldNotFound(String),
    #[error("world \"{0}\" already added")]
    DuplicateWorld(String),
    #[error("expected a single entity, found {count}")]
    MultipleMatches { count: usize },
    #[error("filter must include at least one component")]
    EmptyFilter,
    #[error("component `{component}` is both included and excluded")]
    ConflictingFilter { component: &'static str },
    #[error("empty {entity} detected in world \"{world}\" after {system}.{hook}()")]
    LeakedEntity {
        world: String,
        entity: Entity,
        system: &'static str,
        hook: &'static str,
    },
    #[error("shared resource `{0}` not found")]
    ResourceNotFound(&'static str),
    #[error("shared resource `{0}` already borrowed")]
    ResourceBorrowed(&'static str),
}

pub type Result<T, E = Error> = core::result::Result<T, E>;
