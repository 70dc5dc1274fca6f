use lecs::{
    system_fn, ClearComponent, Component, GroupState, Phases, Systems, SystemGroup, World,
    WorldConfig,
};
use std::cell::Cell;
use std::rc::Rc;

#[derive(Default)]
struct Hit;
impl Component for Hit {}

#[derive(Default)]
struct Body;
impl Component for Body {}

fn world() -> World {
    World::with_config(WorldConfig::default().with_validation(true))
}

fn counter(count: &Rc<Cell<u32>>) -> impl lecs::System {
    let count = Rc::clone(count);
    system_fn(Phases::RUN, move |_| {
        count.set(count.get() + 1);
        Ok(())
    })
}

fn toggle(world: &mut World, name: &str, enabled: bool) {
    let e = world.create();
    let state = world.add::<GroupState>(e).unwrap();
    state.name = name.to_string();
    state.enabled = enabled;
}

#[test]
fn group_toggles_by_event() {
    let count = Rc::new(Cell::new(0));
    let mut systems = Systems::new(world());
    systems
        .add(SystemGroup::new("physics", false).with(counter(&count)))
        .unwrap();
    systems.init().unwrap();

    systems.run().unwrap();
    assert_eq!(count.get(), 0);

    toggle(systems.world_mut(), "physics", true);
    systems.run().unwrap();
    assert_eq!(count.get(), 1);
    // The event was consumed along with its entity.
    assert_eq!(systems.world().entity_count(), 0);

    systems.run().unwrap();
    assert_eq!(count.get(), 2);

    toggle(systems.world_mut(), "physics", false);
    systems.run().unwrap();
    assert_eq!(count.get(), 2);
}

#[test]
fn events_for_other_groups_are_kept() {
    let count = Rc::new(Cell::new(0));
    let mut systems = Systems::new(world());
    systems.add_world("events", world()).unwrap();
    systems
        .add(
            SystemGroup::new("ai", true)
                .with_events_world("events")
                .with(counter(&count)),
        )
        .unwrap();
    systems.init().unwrap();

    toggle(systems.world_named_mut("events").unwrap(), "render", false);
    systems.run().unwrap();

    assert_eq!(count.get(), 1);
    assert_eq!(systems.world_named("events").unwrap().entity_count(), 1);
}

#[test]
fn nested_destroy_runs_in_reverse() {
    let order = Rc::new(std::cell::RefCell::new(Vec::new()));
    let hook = |name: &'static str| {
        let order = Rc::clone(&order);
        system_fn(Phases::INIT | Phases::DESTROY, move |_| {
            order.borrow_mut().push(name);
            Ok(())
        })
    };

    let mut systems = Systems::new(world());
    systems
        .add(SystemGroup::new("g", true).with(hook("a")).with(hook("b")))
        .unwrap();
    systems.init().unwrap();
    systems.destroy().unwrap();

    assert_eq!(*order.borrow(), ["a", "b", "b", "a"]);
}

#[test]
fn clear_component_removes_every_instance() {
    let mut systems = Systems::new(world());
    systems.add(ClearComponent::<Hit>::new()).unwrap();
    systems.init().unwrap();

    let world = systems.world_mut();
    let entities: Vec<_> = (0..5)
        .map(|_| {
            let e = world.create();
            world.add::<Body>(e).unwrap();
            world.add::<Hit>(e).unwrap();
            e
        })
        .collect();
    let only_hit = world.create();
    world.add::<Hit>(only_hit).unwrap();

    systems.run().unwrap();

    let world = systems.world();
    for e in &entities {
        assert!(!world.has::<Hit>(*e) && world.is_alive(*e));
    }
    assert!(!world.is_alive(only_hit));
}
