//! Store round trips saved (or not) by the transaction-scoped cache

use crate::common::*;

#[test]
fn read_your_writes_without_store_reads() {
    let env = TestEnv::new();
    let c = env.scenario_container();
    let a = doc(1);
    c.set("a", &a).unwrap();

    let before = env.reads();
    let got = c.get("a").unwrap();
    assert!(Contained::same(&got, &a));
    assert!(c.contains("a").unwrap());
    assert_eq!(env.reads(), before);
}

#[test]
fn complete_cache_short_circuits_unknown_keys() {
    let env = TestEnv::new();
    let c = env.scenario_container();
    c.set("a", &doc(1)).unwrap();
    c.items().unwrap();
    assert_eq!(c.cache_state(), CacheState::Complete);

    let before = env.round_trips();
    assert!(matches!(c.get("unknown"), Err(Error::KeyNotFound(_))));
    assert_eq!(env.round_trips(), before);
}

#[test]
fn keys_never_mark_cache_complete() {
    let env = TestEnv::new();
    let c = env.scenario_container();
    c.set("a", &doc(1)).unwrap();
    c.keys().unwrap();
    assert_eq!(c.cache_state(), CacheState::Partial);

    // an unknown key still costs a query
    let before = env.reads();
    assert!(matches!(c.get("unknown"), Err(Error::KeyNotFound(_))));
    assert_eq!(env.reads(), before + 1);
}

#[test]
fn reused_container_id_is_isolated() {
    let env = TestEnv::new();
    let id = ContainerId::from_raw(424_242);
    let stale = doc(1);
    {
        let first = env
            .open_as(
                ContainerConfig::new("t").with_mapping_key_field("key"),
                ContainerIdentity::with_id(id),
            )
            .unwrap();
        first.set("a", &stale).unwrap();
    }

    let second = env
        .open_as(
            ContainerConfig::new("t").with_mapping_key_field("key"),
            ContainerIdentity::with_id(id),
        )
        .unwrap();
    let fresh = second.get("a").unwrap();
    assert!(!Contained::same(&fresh, &stale));
    assert_eq!(*fresh.read(), *stale.read());
}

#[test]
fn scope_guard_bounds_cached_objects() {
    let env = TestEnv::new();
    let c = env.scenario_container();
    let a = doc(1);
    {
        let _scope = env.scopes.enter();
        c.set("a", &a).unwrap();
        assert!(Contained::same(&c.get("a").unwrap(), &a));
    }
    assert_eq!(env.cache.partition_count(), 0);

    let _scope = env.scopes.enter();
    assert!(!Contained::same(&c.get("a").unwrap(), &a));
}
