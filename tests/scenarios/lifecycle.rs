//! set / get / delete across cache invalidation

use crate::common::*;

#[test]
fn set_delete_then_absent() {
    let env = TestEnv::new();
    let c = env.scenario_container();
    c.set("a", &doc(1)).unwrap();
    c.delete("a").unwrap();

    assert!(!c.contains("a").unwrap());
    assert!(matches!(c.get("a"), Err(Error::KeyNotFound(_))));
    assert_eq!(env.store.table_len("t"), 0);
}

#[test]
fn round_trip_through_store() {
    let env = TestEnv::new();
    let c = env.scenario_container();
    let original = Contained::shared(Doc {
        x: 3,
        tags: vec!["red".into(), "blue".into()],
    });
    c.set("a", &original).unwrap();
    c.invalidate_cache();

    let loaded = c.get("a").unwrap();
    assert!(!Contained::same(&loaded, &original));
    assert_eq!(*loaded.read(), *original.read());
}

#[test]
fn update_then_reload() {
    let env = TestEnv::new();
    let c = env.scenario_container();
    let a = doc(1);
    c.set("a", &a).unwrap();
    a.write().tags.push("edited".into());
    c.update(&a).unwrap();

    env.scopes.begin();
    assert_eq!(c.get("a").unwrap().read().tags, vec!["edited".to_string()]);
}

#[test]
fn clear_empties_container() {
    let env = TestEnv::new();
    let c = env.scenario_container();
    let objects: Vec<_> = (0..3).map(doc).collect();
    for (i, o) in objects.iter().enumerate() {
        c.set(format!("k{i}"), o).unwrap();
    }
    c.clear().unwrap();
    assert!(c.is_empty().unwrap());
    assert!(objects.iter().all(|o| !o.is_contained()));
}
