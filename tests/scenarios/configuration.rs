//! Container configuration: validation and TOML files

use crate::common::*;
use std::fs;
use tempfile::TempDir;

#[test]
fn all_items_with_parent_value_is_rejected_before_store_access() {
    let env = TestEnv::new();
    let config = ContainerConfig::new("t")
        .with_mapping_key_field("key")
        .with_policy(PolicyKind::AllItems)
        .with_parent_value("C1");

    assert!(matches!(env.open(config), Err(Error::Configuration(_))));
    assert_eq!(env.round_trips(), 0);
}

#[test]
fn container_from_toml_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("people.toml");
    fs::write(
        &path,
        r#"
table = "people"
mapping_key_field = "key"
parent_key_field = "team"
parent_key_value = "blue"
native_columns = ["x"]
"#,
    )
    .unwrap();

    let env = TestEnv::new();
    let c = env.open(ContainerConfig::from_file(&path).unwrap()).unwrap();
    c.set("roy", &doc(5)).unwrap();

    let rows = env.store.rows("people");
    assert_eq!(rows[0].columns["x"], serde_json::json!(5));
    assert_eq!(rows[0].data.as_ref().unwrap()["team"], serde_json::json!("blue"));
    assert_eq!(c.count(Some(&Predicate::ge("x", 5))).unwrap(), 1);
}
