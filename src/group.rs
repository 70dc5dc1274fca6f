use crate::component::Component;
use crate::error::{Error, Result};
use crate::system::{Hook, Phases, System, SystemCtx};
use crate::world::FilterId;
use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::marker::PhantomData;
use tracing::debug;

/// Event component toggling the `SystemGroup` called `name`.
///
/// Attach it to any entity of the group's events world; the
/// group consumes it on its next run turn.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GroupState {
    pub name: String,
    pub enabled: bool,
}

impl Component for GroupState {
    fn reset(&mut self) {
        self.name.clear();
        self.enabled = false;
    }
}

/// A named set of systems which can be switched on and off at runtime.
///
/// Nested systems get every lifecycle hook, in order for
/// `pre_init` and `init` and in reverse for `destroy` and
/// `post_destroy`. `run` and `late_run` are only forwarded
/// while the group is enabled.
pub struct SystemGroup {
    name: String,
    enabled: bool,
    events_world: Option<String>,
    systems: Vec<Box<dyn System>>,
    events: Option<FilterId>,
}

impl SystemGroup {
    pub fn new(name: impl Into<String>, enabled: bool) -> Self {
        Self {
            name: name.into(),
            enabled,
            events_world: None,
            systems: Vec::new(),
            events: None,
        }
    }

    /// Reads `GroupState` events from the world named `name`
    /// instead of the default world.
    pub fn with_events_world(mut self, name: impl Into<String>) -> Self {
        self.events_world = Some(name.into());
        self
    }

    pub fn with(mut self, system: impl System) -> Self {
        self.add(system);
        self
    }

    pub fn add(&mut self, system: impl System) -> &mut Self {
        self.systems.push(Box::new(system));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn len(&self) -> usize {
        self.systems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    fn forward(&mut self, hook: Hook, ctx: &mut SystemCtx, reverse: bool) -> Result<()> {
        let phase = hook.phase();
        let mut call = |system: &mut Box<dyn System>| {
            if system.phases().contains(phase) {
                hook.invoke(system.as_mut(), ctx)
            } else {
                Ok(())
            }
        };
        if reverse {
            self.systems.iter_mut().rev().try_for_each(&mut call)
        } else {
            self.systems.iter_mut().try_for_each(&mut call)
        }
    }

    /// Applies and consumes the `GroupState` events addressed to this group.
    fn consume_events(&mut self, ctx: &mut SystemCtx) -> Result<()> {
        let filter = self.events.ok_or(Error::NotInitialized)?;
        let world = ctx.world_by(self.events_world.as_deref())?;
        let mut cursor = world.cursor(filter);
        while let Some(entity) = cursor.next(world) {
            let state = world.get::<GroupState>(entity)?;
            if state.name != self.name {
                continue;
            }
            let enabled = state.enabled;
            world.remove::<GroupState>(entity)?;
            if enabled != self.enabled {
                debug!(group = self.name.as_str(), enabled, "group toggled");
            }
            self.enabled = enabled;
        }
        Ok(())
    }
}

impl System for SystemGroup {
    fn phases(&self) -> Phases {
        Phases::PRE_INIT
            | Phases::INIT
            | Phases::RUN
            | Phases::LATE_RUN
            | Phases::DESTROY
            | Phases::POST_DESTROY
    }

    fn pre_init(&mut self, ctx: &mut SystemCtx) -> Result<()> {
        let world = ctx.world_by(self.events_world.as_deref())?;
        self.events = Some(world.filter::<GroupState>().end()?);
        self.forward(Hook::PreInit, ctx, false)
    }

    fn init(&mut self, ctx: &mut SystemCtx) -> Result<()> {
        self.forward(Hook::Init, ctx, false)
    }

    fn run(&mut self, ctx: &mut SystemCtx) -> Result<()> {
        self.consume_events(ctx)?;
        if self.enabled {
            self.forward(Hook::Run, ctx, false)?;
        }
        Ok(())
    }

    fn late_run(&mut self, ctx: &mut SystemCtx) -> Result<()> {
        if self.enabled {
            self.forward(Hook::LateRun, ctx, false)?;
        }
        Ok(())
    }

    fn destroy(&mut self, ctx: &mut SystemCtx) -> Result<()> {
        self.forward(Hook::Destroy, ctx, true)
    }

    fn post_destroy(&mut self, ctx: &mut SystemCtx) -> Result<()> {
        self.forward(Hook::PostDestroy, ctx, true)
    }
}

/// Removes component `T` from every entity once per cycle.
///
/// Add it after the systems reading `T` to make `T` a
/// one-cycle event.
pub struct ClearComponent<T> {
    world: Option<String>,
    filter: Option<FilterId>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Default for ClearComponent<T> {
    fn default() -> Self {
        Self {
            world: None,
            filter: None,
            _marker: PhantomData,
        }
    }
}

impl<T> ClearComponent<T>
where
    T: Component,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears `T` in the world named `name` instead of the default world.
    pub fn in_world(name: impl Into<String>) -> Self {
        Self {
            world: Some(name.into()),
            ..Self::default()
        }
    }
}

impl<T> System for ClearComponent<T>
where
    T: Component,
{
    fn phases(&self) -> Phases {
        Phases::INIT | Phases::RUN
    }

    fn init(&mut self, ctx: &mut SystemCtx) -> Result<()> {
        let world = ctx.world_by(self.world.as_deref())?;
        self.filter = Some(world.filter::<T>().end()?);
        Ok(())
    }

    fn run(&mut self, ctx: &mut SystemCtx) -> Result<()> {
        let filter = self.filter.ok_or(Error::NotInitialized)?;
        let world = ctx.world_by(self.world.as_deref())?;
        let mut cursor = world.cursor(filter);
        while let Some(entity) = cursor.next(world) {
            world.remove::<T>(entity)?;
        }
        Ok(())
    }
}
