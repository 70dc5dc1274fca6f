use crate::error::{Error, Result};
use crate::resources::Resources;
use crate::World;
use alloc::boxed::Box;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::any::type_name;
use core::cell::{Ref, RefMut};
use core::ops::BitOr;
use tracing::{debug, error};

/// The lifecycle phases a system takes part in.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Phases(u8);

impl Phases {
    pub const NONE: Phases = Phases(0);
    pub const PRE_INIT: Phases = Phases(1 << 0);
    pub const INIT: Phases = Phases(1 << 1);
    pub const RUN: Phases = Phases(1 << 2);
    pub const LATE_RUN: Phases = Phases(1 << 3);
    pub const DESTROY: Phases = Phases(1 << 4);
    pub const POST_DESTROY: Phases = Phases(1 << 5);

    pub const fn union(self, other: Phases) -> Phases {
        Phases(self.0 | other.0)
    }

    pub const fn contains(self, other: Phases) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for Phases {
    type Output = Phases;

    fn bitor(self, rhs: Phases) -> Phases {
        self.union(rhs)
    }
}

/// A unit of logic driven by `Systems`.
///
/// `phases` declares which hooks the pipeline calls; it is read
/// once when the system is added. Hooks of undeclared phases are
/// never called.
pub trait System: 'static {
    fn phases(&self) -> Phases;

    fn pre_init(&mut self, _ctx: &mut SystemCtx) -> Result<()> {
        Ok(())
    }

    fn init(&mut self, _ctx: &mut SystemCtx) -> Result<()> {
        Ok(())
    }

    fn run(&mut self, _ctx: &mut SystemCtx) -> Result<()> {
        Ok(())
    }

    fn late_run(&mut self, _ctx: &mut SystemCtx) -> Result<()> {
        Ok(())
    }

    fn destroy(&mut self, _ctx: &mut SystemCtx) -> Result<()> {
        Ok(())
    }

    fn post_destroy(&mut self, _ctx: &mut SystemCtx) -> Result<()> {
        Ok(())
    }

    /// Name used in leaked-entity diagnostics.
    fn name(&self) -> &'static str {
        type_name::<Self>()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Hook {
    PreInit,
    Init,
    Run,
    LateRun,
    Destroy,
    PostDestroy,
}

impl Hook {
    pub fn phase(self) -> Phases {
        match self {
            Hook::PreInit => Phases::PRE_INIT,
            Hook::Init => Phases::INIT,
            Hook::Run => Phases::RUN,
            Hook::LateRun => Phases::LATE_RUN,
            Hook::Destroy => Phases::DESTROY,
            Hook::PostDestroy => Phases::POST_DESTROY,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Hook::PreInit => "pre_init",
            Hook::Init => "init",
            Hook::Run => "run",
            Hook::LateRun => "late_run",
            Hook::Destroy => "destroy",
            Hook::PostDestroy => "post_destroy",
        }
    }

    /// Calls this hook on `system`, then runs the leaked-entity guard.
    pub fn invoke(self, system: &mut dyn System, ctx: &mut SystemCtx) -> Result<()> {
        match self {
            Hook::PreInit => system.pre_init(ctx)?,
            Hook::Init => system.init(ctx)?,
            Hook::Run => system.run(ctx)?,
            Hook::LateRun => system.late_run(ctx)?,
            Hook::Destroy => system.destroy(ctx)?,
            Hook::PostDestroy => system.post_destroy(ctx)?,
        }
        ctx.check_leaks(system.name(), self.name())
    }
}

/// What a system sees of the pipeline while one of its hooks runs.
pub struct SystemCtx<'a> {
    default_world: &'a mut World,
    worlds: &'a mut Vec<(String, World)>,
    shared: &'a Resources,
    validation: bool,
}

impl<'a> SystemCtx<'a> {
    /// Returns the default world.
    pub fn world(&mut self) -> &mut World {
        self.default_world
    }

    /// Returns the world registered under `name`.
    pub fn world_named(&mut self, name: &str) -> Result<&mut World> {
        self.worlds
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, world)| world)
            .ok_or_else(|| Error::WorldNotFound(name.to_string()))
    }

    /// Returns the world named `name`, or the default world for `None`.
    pub fn world_by(&mut self, name: Option<&str>) -> Result<&mut World> {
        match name {
            Some(name) => self.world_named(name),
            None => Ok(self.default_world),
        }
    }

    /// Names of the registered worlds, the default world excluded.
    pub fn world_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.worlds.iter().map(|(name, _)| name.as_str())
    }

    /// Returns the shared context of the pipeline.
    pub fn shared(&self) -> &'a Resources {
        self.shared
    }

    pub fn resource<T>(&self) -> Result<Ref<'a, T>>
    where
        T: 'static,
    {
        self.shared.get()
    }

    pub fn resource_mut<T>(&self) -> Result<RefMut<'a, T>>
    where
        T: 'static,
    {
        self.shared.get_mut()
    }

    pub fn validation(&self) -> bool {
        self.validation
    }

    /// Fails with `LeakedEntity` if any world holds an alive entity
    /// without components. Does nothing unless validation is on.
    pub fn check_leaks(&self, system: &'static str, hook: &'static str) -> Result<()> {
        if !self.validation {
            return Ok(());
        }
        let worlds = core::iter::once(("default", &*self.default_world))
            .chain(
                self.worlds
                    .iter()
                    .map(|(name, world)| (name.as_str(), world)),
            );
        for (name, world) in worlds {
            if let Some(entity) = world.find_leaked_entity() {
                error!(world = name, entity = %entity, system, hook, "empty entity detected");
                return Err(Error::LeakedEntity {
                    world: name.to_string(),
                    entity,
                    system,
                    hook,
                });
            }
        }
        Ok(())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum State {
    Unconfigured,
    Initialized,
    Destroyed,
}

/// An ordered pipeline of systems over a default world and any
/// number of named worlds.
///
/// Systems run in registration order within each phase, except
/// `destroy` and `post_destroy` which run in reverse.
pub struct Systems {
    default_world: World,
    /// Named worlds. (Linear search map)
    worlds: Vec<(String, World)>,
    shared: Resources,
    all: Vec<Box<dyn System>>,
    run: Vec<usize>,
    late_run: Vec<usize>,
    state: State,
    validation: bool,
}

impl Systems {
    /// Creates a pipeline over `world`.
    ///
    /// Validation follows the world's configuration.
    pub fn new(world: World) -> Self {
        Self {
            validation: world.config().validation,
            default_world: world,
            worlds: Vec::new(),
            shared: Resources::new(),
            all: Vec::new(),
            run: Vec::new(),
            late_run: Vec::new(),
            state: State::Unconfigured,
        }
    }

    /// Sets the shared context handed to every system.
    pub fn with_shared(mut self, shared: Resources) -> Self {
        self.shared = shared;
        self
    }

    /// Enables or disables the leaked-entity guard.
    pub fn with_validation(mut self, validation: bool) -> Self {
        self.validation = validation;
        self
    }

    pub fn shared(&self) -> &Resources {
        &self.shared
    }

    pub fn shared_mut(&mut self) -> &mut Resources {
        &mut self.shared
    }

    /// Adds the given system to the pipeline.
    ///
    /// Returns `Self` such that calls can be chained.
    pub fn add(&mut self, system: impl System) -> Result<&mut Self> {
        self.add_boxed(Box::new(system))
    }

    pub fn add_boxed(&mut self, system: Box<dyn System>) -> Result<&mut Self> {
        if self.state != State::Unconfigured {
            return Err(Error::AlreadyInitialized);
        }
        let index = self.all.len();
        let phases = system.phases();
        if phases.contains(Phases::RUN) {
            self.run.push(index);
        }
        if phases.contains(Phases::LATE_RUN) {
            self.late_run.push(index);
        }
        debug!(system = system.name(), index, "system added");
        self.all.push(system);
        Ok(self)
    }

    /// Registers a world under `name`.
    pub fn add_world(&mut self, name: impl Into<String>, world: World) -> Result<&mut Self> {
        if self.state != State::Unconfigured {
            return Err(Error::AlreadyInitialized);
        }
        let name = name.into();
        if self.worlds.iter().any(|(n, _)| *n == name) {
            return Err(Error::DuplicateWorld(name));
        }
        debug!(world = name.as_str(), "world added");
        self.worlds.push((name, world));
        Ok(self)
    }

    pub fn world(&self) -> &World {
        &self.default_world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.default_world
    }

    pub fn world_named(&self, name: &str) -> Result<&World> {
        self.worlds
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, world)| world)
            .ok_or_else(|| Error::WorldNotFound(name.to_string()))
    }

    pub fn world_named_mut(&mut self, name: &str) -> Result<&mut World> {
        self.worlds
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, world)| world)
            .ok_or_else(|| Error::WorldNotFound(name.to_string()))
    }

    /// Iterates over the named worlds.
    pub fn named_worlds(&self) -> impl Iterator<Item = (&str, &World)> + '_ {
        self.worlds
            .iter()
            .map(|(name, world)| (name.as_str(), world))
    }

    /// Returns the number of systems registered.
    pub fn len(&self) -> usize {
        self.all.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }

    pub fn is_initialized(&self) -> bool {
        self.state == State::Initialized
    }

    /// Runs every `pre_init` hook, then every `init` hook.
    pub fn init(&mut self) -> Result<()> {
        if self.state != State::Unconfigured {
            return Err(Error::AlreadyInitialized);
        }
        let order: Vec<usize> = (0..self.all.len()).collect();
        self.invoke(Hook::PreInit, &order)?;
        self.invoke(Hook::Init, &order)?;
        self.state = State::Initialized;
        debug!(systems = self.all.len(), "systems initialized");
        Ok(())
    }

    /// Runs one cycle of every system declaring `Phases::RUN`.
    pub fn run(&mut self) -> Result<()> {
        if self.state != State::Initialized {
            return Err(Error::NotInitialized);
        }
        let order = core::mem::take(&mut self.run);
        let result = self.invoke(Hook::Run, &order);
        self.run = order;
        result
    }

    /// Runs every system declaring `Phases::LATE_RUN`.
    pub fn late_run(&mut self) -> Result<()> {
        if self.state != State::Initialized {
            return Err(Error::NotInitialized);
        }
        let order = core::mem::take(&mut self.late_run);
        let result = self.invoke(Hook::LateRun, &order);
        self.late_run = order;
        result
    }

    /// Runs every `destroy` hook, then every `post_destroy` hook, both
    /// in reverse registration order, then drops all systems and
    /// named worlds.
    ///
    /// The pipeline can't be used again afterwards.
    pub fn destroy(&mut self) -> Result<()> {
        if self.state == State::Destroyed {
            return Ok(());
        }
        let order: Vec<usize> = (0..self.all.len()).rev().collect();
        self.invoke(Hook::Destroy, &order)?;
        self.invoke(Hook::PostDestroy, &order)?;

        self.worlds.clear();
        self.all.clear();
        self.run.clear();
        self.late_run.clear();
        self.state = State::Destroyed;
        debug!("systems destroyed");
        Ok(())
    }

    fn invoke(&mut self, hook: Hook, order: &[usize]) -> Result<()> {
        let mut ctx = SystemCtx {
            default_world: &mut self.default_world,
            worlds: &mut self.worlds,
            shared: &self.shared,
            validation: self.validation,
        };
        for &index in order {
            let system = &mut self.all[index];
            if system.phases().contains(hook.phase()) {
                hook.invoke(system.as_mut(), &mut ctx)?;
            }
        }
        Ok(())
    }
}

/// A system made of a closure, called on every phase in `phases`.
pub struct FnSystem<F> {
    phases: Phases,
    f: F,
}

/// Wraps a closure as a system.
///
/// ```ignore
/// systems.add(system_fn(Phases::RUN, |ctx| {
///     ctx.resource_mut::<Frame>()?.0 += 1;
///     Ok(())
/// }))?;
/// ```
pub fn system_fn<F>(phases: Phases, f: F) -> FnSystem<F>
where
    F: FnMut(&mut SystemCtx) -> Result<()> + 'static,
{
    FnSystem { phases, f }
}

impl<F> System for FnSystem<F>
where
    F: FnMut(&mut SystemCtx) -> Result<()> + 'static,
{
    fn phases(&self) -> Phases {
        self.phases
    }

    fn pre_init(&mut self, ctx: &mut SystemCtx) -> Result<()> {
        (self.f)(ctx)
    }

    fn init(&mut self, ctx: &mut SystemCtx) -> Result<()> {
        (self.f)(ctx)
    }

    fn run(&mut self, ctx: &mut SystemCtx) -> Result<()> {
        (self.f)(ctx)
    }

    fn late_run(&mut self, ctx: &mut SystemCtx) -> Result<()> {
        (self.f)(ctx)
    }

    fn destroy(&mut self, ctx: &mut SystemCtx) -> Result<()> {
        (self.f)(ctx)
    }

    fn post_destroy(&mut self, ctx: &mut SystemCtx) -> Result<()> {
        (self.f)(ctx)
    }

    fn name(&self) -> &'static str {
        type_name::<F>()
    }
}
