//! Two objects in one parent-scoped container

use crate::common::*;
use serde_json::json;

#[test]
fn parent_scoped_items_count_and_find() {
    let env = TestEnv::new();
    let c = env.scenario_container();
    c.set("a", &doc(1)).unwrap();
    c.set("b", &doc(2)).unwrap();

    let mut keys: Vec<_> = c.items().unwrap().into_iter().map(|(k, _)| k).collect();
    keys.sort();
    assert_eq!(keys, vec![MappingKey::new("a"), MappingKey::new("b")]);
    assert_eq!(c.count(None).unwrap(), 2);

    let found: Vec<_> = c
        .find(Some(&Predicate::eq("x", 2)))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name(), Some(MappingKey::new("b")));

    for row in env.store.rows("t") {
        let data = row.data.unwrap();
        assert_eq!(data["parent"], json!("C1"));
    }
}

#[test]
fn sibling_parents_do_not_mix() {
    let env = TestEnv::new();
    let c1 = env.scenario_container();
    let c2 = env
        .open(
            ContainerConfig::new("t")
                .with_mapping_key_field("key")
                .with_parent_value("C2"),
        )
        .unwrap();
    c1.set("a", &doc(1)).unwrap();
    c2.set("a", &doc(2)).unwrap();

    assert_eq!(c1.len().unwrap(), 1);
    assert_eq!(c2.len().unwrap(), 1);
    assert_eq!(c1.get("a").unwrap().read().x, 1);
    assert_eq!(c2.get("a").unwrap().read().x, 2);
}
