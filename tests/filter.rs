use lecs::{Component, Entity, Error, FilterEventListener, PackedEntity, World, WorldConfig};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Default, Clone, Debug, PartialEq)]
struct A(u32);
impl Component for A {}

#[derive(Default, Clone, Debug, PartialEq)]
struct B;
impl Component for B {}

#[derive(Default, Clone, Debug, PartialEq)]
struct C;
impl Component for C {}

fn world() -> World {
    World::with_config(WorldConfig::default().with_validation(true))
}

#[test]
fn membership_follows_mask() {
    for a_first in [true, false] {
        let mut world = world();
        let filter = world
            .filter::<A>()
            .include::<B>()
            .exclude::<C>()
            .end()
            .unwrap();
        let e = world.create();

        if a_first {
            world.add::<A>(e).unwrap();
            assert!(!world.query(filter).contains(e));
            world.add::<B>(e).unwrap();
        } else {
            world.add::<B>(e).unwrap();
            assert!(!world.query(filter).contains(e));
            world.add::<A>(e).unwrap();
        }
        assert!(world.query(filter).contains(e));
        assert_eq!(world.query(filter).count(), 1);

        world.add::<C>(e).unwrap();
        assert!(!world.query(filter).contains(e));

        world.remove::<C>(e).unwrap();
        assert!(world.query(filter).contains(e));

        world.remove::<B>(e).unwrap();
        assert!(world.query(filter).is_empty());
    }
}

#[test]
fn filters_are_cached() {
    let mut world = world();
    let a = world.filter::<A>().include::<B>().end().unwrap();
    let b = world.filter_of::<(B, A), ()>().unwrap();
    let c = world.filter::<A>().end().unwrap();

    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(world.query(a).mask().include().len(), 2);
}

#[test]
fn new_filter_is_seeded() {
    let mut world = world();
    let mut expected = Vec::new();
    for i in 0..6 {
        let e = world.create();
        world.add::<A>(e).unwrap();
        if i % 3 == 0 {
            world.add::<C>(e).unwrap();
        } else {
            expected.push(e);
        }
    }

    let filter = world.filter_of::<(A,), (C,)>().unwrap();
    let mut members = world.query(filter).to_vec();
    members.sort();
    assert_eq!(members, expected);
}

#[test]
fn destroy_removes_from_filters() {
    let mut world = world();
    let filter = world.filter::<A>().end().unwrap();
    let e = world.create();
    world.add::<A>(e).unwrap();
    world.add::<B>(e).unwrap();

    world.destroy(e).unwrap();
    assert!(world.query(filter).is_empty());
    assert!(!world.query(filter).contains(e));
}

#[test]
fn cursor_tolerates_removing_current() {
    let mut world = world();
    let filter = world.filter::<A>().end().unwrap();
    let n = 50;
    for i in 0..n {
        let e = world.create();
        world.add::<A>(e).unwrap().0 = i;
        world.add::<B>(e).unwrap();
    }

    let mut visited = Vec::new();
    let mut cursor = world.cursor(filter);
    while let Some(e) = cursor.next(&world) {
        visited.push(world.read::<A>(e).unwrap().0);
        world.remove::<A>(e).unwrap();
    }

    visited.sort_unstable();
    assert_eq!(visited, (0..n).collect::<Vec<_>>());
    assert!(world.query(filter).is_empty());
}

#[test]
fn cursor_with_partial_removal() {
    let mut world = world();
    let filter = world.filter::<A>().end().unwrap();
    for i in 0..20 {
        let e = world.create();
        world.add::<A>(e).unwrap().0 = i;
    }

    let mut visited = 0;
    let mut cursor = world.cursor(filter);
    while let Some(e) = cursor.next(&world) {
        visited += 1;
        if world.read::<A>(e).unwrap().0 % 2 == 0 {
            world.destroy(e).unwrap();
        }
    }

    assert_eq!(visited, 20);
    assert_eq!(world.query(filter).len(), 10);
}

#[test]
fn single_entity() {
    let mut world = world();
    assert_eq!(world.single_entity::<A>().unwrap(), Entity::NULL);

    let e = world.create();
    world.add::<A>(e).unwrap();
    assert_eq!(world.single_entity::<A>().unwrap(), e);

    let other = world.create();
    world.add::<A>(other).unwrap();
    assert_eq!(
        world.single_entity::<A>().unwrap_err(),
        Error::MultipleMatches { count: 2 }
    );
}

#[derive(Default)]
struct Log {
    added: Vec<PackedEntity>,
    removed: Vec<PackedEntity>,
    updated: Vec<PackedEntity>,
}

struct Recorder(Rc<RefCell<Log>>);

impl FilterEventListener for Recorder {
    fn on_entity_added(&mut self, entity: PackedEntity) {
        self.0.borrow_mut().added.push(entity);
    }

    fn on_entity_removed(&mut self, entity: PackedEntity) {
        self.0.borrow_mut().removed.push(entity);
    }

    fn on_entity_updated(&mut self, entity: PackedEntity) {
        self.0.borrow_mut().updated.push(entity);
    }
}

#[test]
fn filter_listener() {
    let mut world = world();
    let filter = world.filter::<A>().exclude::<C>().end().unwrap();
    let log = Rc::new(RefCell::new(Log::default()));
    let listener = world.add_filter_listener(filter, Box::new(Recorder(Rc::clone(&log))));

    let e = world.create();
    world.add::<A>(e).unwrap();
    world.change::<A>(e).unwrap().0 = 4;
    world.get_mut::<A>(e).unwrap().0 = 5;
    world.add::<C>(e).unwrap();
    // Not a member anymore, so no update.
    world.change::<A>(e).unwrap();

    let packed = world.pack(e);
    {
        let log = log.borrow();
        assert_eq!(log.added, [packed]);
        assert_eq!(log.updated, [packed]);
        assert_eq!(log.removed, [packed]);
    }

    assert!(world.remove_filter_listener(filter, listener).is_some());
    world.remove::<C>(e).unwrap();
    assert_eq!(log.borrow().added.len(), 1);
}

#[test]
fn removed_entity_reported_with_its_generation() {
    let mut world = world();
    let filter = world.filter::<A>().end().unwrap();
    let log = Rc::new(RefCell::new(Log::default()));
    world.add_filter_listener(filter, Box::new(Recorder(Rc::clone(&log))));

    let e = world.create();
    world.add::<A>(e).unwrap();
    let packed = world.pack(e);
    world.remove::<A>(e).unwrap();

    assert_eq!(log.borrow().removed, [packed]);
    assert_eq!(world.unpack(packed), None);
}

#[test]
fn invalid_masks() {
    let mut world = world();
    assert_eq!(world.filter_of::<(), ()>().unwrap_err(), Error::EmptyFilter);
    assert!(matches!(
        world.filter_of::<(A, B), (B,)>(),
        Err(Error::ConflictingFilter { component }) if component.ends_with("B")
    ));
}
