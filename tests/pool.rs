use lecs::{Component, Error, World, WorldConfig};

#[derive(Default, Clone, Debug, PartialEq)]
struct Position(i32, i32);
impl Component for Position {}

#[derive(Default, Clone, Debug, PartialEq)]
struct Velocity(i32, i32);
impl Component for Velocity {}

#[derive(Default, Debug, PartialEq)]
struct Path(Vec<u32>);
impl Component for Path {
    fn reset(&mut self) {
        self.0.clear();
    }
}

fn world() -> World {
    World::with_config(WorldConfig::default().with_validation(true))
}

#[test]
fn add_has_remove() {
    let mut world = world();
    let keep = world.create();
    world.add::<Velocity>(keep).unwrap();
    let e = world.create();

    world.add::<Position>(e).unwrap();
    assert!(world.has::<Position>(e));

    world.add::<Velocity>(e).unwrap();
    world.remove::<Position>(e).unwrap();
    assert!(!world.has::<Position>(e));

    // Removing an absent component does nothing.
    world.remove::<Position>(e).unwrap();
    assert!(world.is_alive(e));
    assert_eq!(world.component_count(e), 1);
}

#[test]
fn add_twice_fails() {
    let mut world = world();
    let e = world.create();
    world.add::<Position>(e).unwrap();

    let err = world.add::<Position>(e).unwrap_err();
    assert!(matches!(err, Error::AlreadyAttached { entity, .. } if entity == e));
}

#[test]
fn read_absent_fails() {
    let mut world = world();
    let e = world.create();
    world.add::<Velocity>(e).unwrap();

    assert!(matches!(
        world.get::<Position>(e),
        Err(Error::NotAttached { .. })
    ));
    assert!(matches!(
        world.read::<Position>(e),
        Err(Error::NotAttached { .. })
    ));
    assert_eq!(world.try_read::<Position>(e), None);
}

#[test]
fn add_to_dead_entity_fails() {
    let mut world = world();
    let e = world.create();
    world.destroy(e).unwrap();

    let err = world.add::<Position>(e).unwrap_err();
    assert_eq!(err, Error::InvalidEntity(e));
    assert_eq!(world.destroy(e).unwrap_err(), Error::InvalidEntity(e));
}

#[test]
fn auto_destroy_on_last_removal() {
    let mut world = world();
    let e = world.create();
    *world.add::<Position>(e).unwrap() = Position(1, 2);
    world.add::<Velocity>(e).unwrap();

    world.remove::<Position>(e).unwrap();
    assert!(world.is_alive(e));

    world.remove::<Velocity>(e).unwrap();
    assert!(!world.is_alive(e));
    assert_eq!(world.entity_count(), 0);
}

#[test]
fn values_survive_other_removals() {
    let mut world = world();
    let entities: Vec<_> = (0..10)
        .map(|i| {
            let e = world.create();
            *world.add::<Position>(e).unwrap() = Position(i, -i);
            e
        })
        .collect();

    for e in entities.iter().step_by(2) {
        world.remove::<Position>(*e).unwrap();
    }

    for (i, e) in entities.iter().enumerate() {
        if i % 2 == 0 {
            assert!(!world.is_alive(*e));
        } else {
            let expected = Position(i as i32, -(i as i32));
            assert_eq!(world.read::<Position>(*e).unwrap(), expected);
        }
    }
    assert_eq!(world.pool::<Position>().unwrap().len(), 5);
}

#[test]
fn recycled_slot_is_clean() {
    let mut world = world();
    let a = world.create();
    let path = world.add::<Path>(a).unwrap();
    path.0.extend_from_slice(&[1, 2, 3]);
    world.remove::<Path>(a).unwrap();

    let b = world.create();
    assert!(world.add::<Path>(b).unwrap().0.is_empty());
}

#[test]
fn change_adds_or_returns_existing() {
    let mut world = world();
    let e = world.create();

    world.change::<Position>(e).unwrap().0 = 3;
    assert_eq!(world.read::<Position>(e).unwrap(), Position(3, 0));

    world.change::<Position>(e).unwrap().1 = 4;
    assert_eq!(world.read::<Position>(e).unwrap(), Position(3, 4));
    assert_eq!(world.component_count(e), 1);
}

#[test]
fn set_toggles_presence() {
    let mut world = world();
    let e = world.create();
    world.add::<Velocity>(e).unwrap();

    world.set::<Position>(e, true).unwrap();
    world.set::<Position>(e, true).unwrap();
    assert!(world.has::<Position>(e));
    assert_eq!(world.component_count(e), 2);

    world.set::<Position>(e, false).unwrap();
    world.set::<Position>(e, false).unwrap();
    assert!(!world.has::<Position>(e));
    assert_eq!(world.component_count(e), 1);
}

#[test]
fn pool_mut_matches_world_api() {
    let mut world = world();
    let e = world.create();

    {
        let mut positions = world.pool_mut::<Position>();
        positions.add(e).unwrap().0 = 8;
        assert!(positions.has(e));
        assert_eq!(positions.read(e).unwrap(), Position(8, 0));
        positions.get_mut(e).unwrap().1 = 9;
        assert_eq!(positions.try_read(e), Some(Position(8, 9)));
        assert_eq!(positions.len(), 1);
        positions.remove(e).unwrap();
        assert!(positions.is_empty());
    }

    assert!(!world.is_alive(e));
}

#[test]
fn pools_are_created_once() {
    let mut world = world();
    let a = world.register::<Position>();
    let b = world.register::<Velocity>();
    assert_ne!(a, b);
    assert_eq!(world.register::<Position>(), a);
    assert_eq!(world.pool_mut::<Position>().id(), a);
    assert!(world.component_name(b).ends_with("Velocity"));
}
