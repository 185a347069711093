//! Property tests over random operation sequences

use crate::common::*;
use proptest::prelude::*;
use std::collections::BTreeMap;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn read_your_writes(entries in prop::collection::btree_map("[a-z]{1,6}", any::<i64>(), 1..12)) {
        let env = TestEnv::new();
        let c = env.scenario_container();
        let objects: BTreeMap<_, _> = entries.iter().map(|(k, x)| (k.clone(), doc(*x))).collect();
        for (k, o) in &objects {
            c.set(k.as_str(), o).unwrap();
        }
        let before = env.reads();
        for (k, o) in &objects {
            prop_assert!(Contained::same(&c.get(k.as_str()).unwrap(), o));
        }
        prop_assert_eq!(env.reads(), before);
    }

    #[test]
    fn delete_then_absent(keys in prop::collection::btree_set("[a-z]{1,4}", 1..10), pick in any::<prop::sample::Index>()) {
        let env = TestEnv::new();
        let c = env.scenario_container();
        for (i, k) in keys.iter().enumerate() {
            c.set(k.as_str(), &doc(i as i64)).unwrap();
        }
        let victim = pick.get(&keys.iter().collect::<Vec<_>>()).to_string();
        c.delete(victim.as_str()).unwrap();

        prop_assert!(!c.contains(victim.as_str()).unwrap());
        prop_assert!(c.get_opt(victim.as_str()).unwrap().is_none());
        prop_assert_eq!(c.len().unwrap(), keys.len() - 1);
    }

    #[test]
    fn round_trip(x in any::<i64>(), tags in prop::collection::vec("[a-z]{0,8}", 0..5)) {
        let env = TestEnv::new();
        let c = env.scenario_container();
        let original = Contained::shared(Doc { x, tags });
        c.set("k", &original).unwrap();
        c.invalidate_cache();
        let loaded = c.get("k").unwrap();
        let (loaded, original) = (loaded.read().clone(), original.read().clone());
        prop_assert_eq!(loaded, original);
    }
}
