//! Two objects competing for one key

use crate::common::*;

#[test]
fn collision_is_rejected_without_overwrite() {
    let env = TestEnv::new();
    let c = env.scenario_container();
    let first = doc(1);
    let second = doc(2);
    c.set("a", &first).unwrap();

    let err = c.set("a", &second).unwrap_err();
    assert!(matches!(err, Error::KeyCollision(ref k) if k.as_str() == "a"));
    assert!(first.is_contained());
    assert!(!second.is_contained());
}

#[test]
fn overwrite_replaces_and_releases() {
    let env = TestEnv::new();
    let c = env.scenario_container();
    let first = doc(1);
    let second = doc(2);
    c.set("a", &first).unwrap();

    c.set_with(Some(MappingKey::new("a")), &second, true).unwrap();
    assert!(!first.is_contained());
    assert_eq!(second.name(), Some(MappingKey::new("a")));
    assert_eq!(env.store.table_len("t"), 1);

    env.scopes.begin();
    assert_eq!(c.get("a").unwrap().read().x, 2);
}
