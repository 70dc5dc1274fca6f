use lecs::{Error, Resources};

#[test]
fn resources() {
    let mut resources = Resources::new();

    resources.insert(10i32);

    assert_eq!(*resources.get::<i32>().unwrap(), 10);
    assert!(resources.try_get::<i64>().is_none());
    assert!(matches!(resources.get::<i64>(), Err(Error::ResourceNotFound(_))));

    resources.insert(11i64);
    assert_eq!(*resources.get::<i64>().unwrap(), 11);
    assert!(resources.contains::<i64>());
}

#[test]
fn borrow_mutable_twice() {
    let resources = Resources::new().with(10i32);

    let _ref = resources.get_mut::<i32>().unwrap();
    assert!(matches!(
        resources.get_mut::<i32>(),
        Err(Error::ResourceBorrowed(_))
    ));
}

#[test]
fn borrow_immutable_and_mutable() {
    let resources = Resources::new().with(10i32);

    let _a = resources.get::<i32>().unwrap();
    let _b = resources.get::<i32>().unwrap();
    assert!(resources.try_get_mut::<i32>().is_none());
}

#[test]
fn distinct_types_borrow_independently() {
    let resources = Resources::new().with(10i32).with(15u64);

    let mut a = resources.get_mut::<i32>().unwrap();
    let mut b = resources.get_mut::<u64>().unwrap();
    *a += 1;
    *b += 1;
    drop((a, b));

    assert_eq!(*resources.get::<i32>().unwrap(), 11);
    assert_eq!(*resources.get::<u64>().unwrap(), 16);
}

#[test]
fn remove() {
    let mut resources = Resources::new().with(String::from("shared"));
    assert_eq!(resources.remove::<String>().as_deref(), Some("shared"));
    assert!(!resources.contains::<String>());
    assert_eq!(resources.remove::<String>(), None);
}
