#![cfg_attr(feature = "no-std", no_std)]

extern crate alloc;

mod builder;
mod component;
mod config;
mod entity;
mod entity_ref;
mod error;
mod events;
mod group;
mod query;
mod reactive;
mod registry;
mod resources;
mod system;
mod util;
mod world;

pub use builder::EntityBuilder;
pub use component::{Component, ComponentId};
pub use config::WorldConfig;
pub use entity::{unpack_all, Entity, PackedEntity, PackedEntityWithWorld, WorldId};
pub use entity_ref::EntityRef;
pub use error::{Error, Result};
pub use events::{FilterEventListener, ListenerId, WorldEventListener};
pub use group::{ClearComponent, GroupState, SystemGroup};
pub use query::{ComponentSet, FilterBuilder, Mask};
pub use reactive::{FilterMonitor, Monitor, Reactive, ReactiveSystem};
pub use resources::Resources;
pub use system::{system_fn, FnSystem, Phases, System, SystemCtx, Systems};
pub use world::{Filter, FilterCursor, FilterId, Pool, PoolMut, World};
