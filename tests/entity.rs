use lecs::{unpack_all, Component, EntityBuilder, PackedEntity, World, WorldConfig};

#[derive(Default)]
struct Marker;
impl Component for Marker {}

fn spawn(world: &mut World) -> lecs::Entity {
    EntityBuilder::new()
        .with(Marker)
        .spawn_in(world)
        .unwrap()
}

#[test]
fn stale_handle_never_resolves_to_new_entity() {
    let mut world = World::new();
    let e1 = spawn(&mut world);
    let packed = world.pack(e1);
    assert_eq!(packed.unpack(&world), Some(e1));

    world.destroy(e1).unwrap();
    let e2 = spawn(&mut world);
    assert_eq!(e2.id(), e1.id());
    assert_ne!(world.generation(e2), packed.generation());

    assert_eq!(world.unpack(packed), None);
    assert_eq!(world.unpack(world.pack(e2)), Some(e2));
}

#[test]
fn ids_are_recycled_last_in_first_out() {
    let mut world = World::new();
    let a = spawn(&mut world);
    let b = spawn(&mut world);
    world.destroy(a).unwrap();
    world.destroy(b).unwrap();

    assert_eq!(spawn(&mut world).id(), b.id());
    assert_eq!(spawn(&mut world).id(), a.id());
}

#[test]
fn null_entity_is_never_alive() {
    let mut world = World::new();
    spawn(&mut world);
    assert!(!world.is_alive(lecs::Entity::NULL));
    assert_eq!(world.unpack(PackedEntity::default()), None);
}

#[test]
fn packed_with_world_checks_world() {
    let mut a = World::new();
    let b = World::new();
    let e = spawn(&mut a);

    let packed = a.pack_with_world(e);
    assert_eq!(packed.world(), a.id());
    assert_eq!(packed.unpack(&a), Some(e));
    assert_eq!(packed.unpack(&b), None);
}

#[test]
fn unpack_all_skips_stale() {
    let mut world = World::new();
    let entities: Vec<_> = (0..4).map(|_| spawn(&mut world)).collect();
    let packed: Vec<_> = entities.iter().map(|e| world.pack(*e)).collect();
    world.destroy(entities[1]).unwrap();
    world.destroy(entities[3]).unwrap();

    let mut out = vec![lecs::Entity::NULL; 8];
    assert!(unpack_all(&packed, &world, &mut out));
    assert_eq!(out, [entities[0], entities[2]]);

    world.destroy(entities[0]).unwrap();
    world.destroy(entities[2]).unwrap();
    assert!(!unpack_all(&packed, &world, &mut out));
    assert!(out.is_empty());
}

#[test]
fn entity_ref() {
    let mut world = World::new();
    let e = spawn(&mut world);

    let view = world.entity(e).unwrap();
    assert!(view.has::<Marker>());
    assert!(view.get::<Marker>().is_ok());
    assert_eq!(view.component_count(), 1);
    assert_eq!(view.entity(), e);

    world.destroy(e).unwrap();
    assert!(world.entity(e).is_none());
}

#[test]
fn table_grows_past_initial_capacity() {
    let mut world = World::with_config(WorldConfig::default().with_entities(4));
    let entities: Vec<_> = (0..100).map(|_| spawn(&mut world)).collect();

    assert_eq!(world.entity_count(), 100);
    assert!(world.capacity() > 100);
    assert!(entities.iter().all(|e| world.has::<Marker>(*e)));
    assert_eq!(world.entities().count(), 100);
}

#[test]
fn leaked_entity_is_found() {
    let mut world = World::new();
    spawn(&mut world);
    assert_eq!(world.find_leaked_entity(), None);

    let empty = world.create();
    assert_eq!(world.find_leaked_entity(), Some(empty));
}
