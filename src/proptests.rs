use proptest::prelude::*;
use std::collections::BTreeMap;

use crate::{Error, Llrb};

// Full invariant check, validate() covers red/black rules, sort order,
// black balance and entry count; height is checked against the
// red-black bound.
fn validate_tree(t: &Llrb<u16, u64>) {
    let stats = match t.validate() {
        Ok(stats) => stats,
        Err(err) => panic!("invalid tree: {}", err),
    };
    assert!(t.is_root_black(), "root must be black");
    assert_eq!(stats.entries(), t.len());

    let n = t.len() as f64;
    let height = stats.depths().max() as f64;
    assert!(
        height <= 2.0 * (n + 1.0).log2(),
        "height {} exceeds bound for {} entries",
        height,
        n
    );
}

#[derive(Clone, Debug)]
enum Op {
    Insert(u16, u64),
    Delete(u16),
    Get(u16),
}

fn ops_strategy(keys: u16) -> impl Strategy<Value = Vec<Op>> {
    let op = prop_oneof![
        50 => (0..keys, any::<u64>()).prop_map(|(k, v)| Op::Insert(k, v)),
        30 => (0..keys).prop_map(Op::Delete),
        20 => (0..keys).prop_map(Op::Get),
    ];
    prop::collection::vec(op, 0..=500)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence(ops in ops_strategy(512)) {
        let mut t: Llrb<u16, u64> = Llrb::new("prop-equivalence");
        let mut m: BTreeMap<u16, u64> = BTreeMap::new();

        for op in ops {
            let len = t.len();
            match op {
                Op::Insert(key, value) => {
                    if m.contains_key(&key) {
                        prop_assert_eq!(t.insert(key, value), Err(Error::DuplicateKey(key)));
                        prop_assert_eq!(t.len(), len);
                    } else {
                        prop_assert_eq!(t.insert(key, value), Ok(()));
                        m.insert(key, value);
                        prop_assert_eq!(t.len(), len + 1);
                    }
                }
                Op::Delete(key) => {
                    match m.remove(&key) {
                        Some(value) => {
                            prop_assert_eq!(t.delete(&key), Ok(value));
                            prop_assert_eq!(t.len(), len - 1);
                        }
                        None => {
                            prop_assert_eq!(t.delete(&key), Err(Error::KeyNotFound));
                            prop_assert_eq!(t.len(), len);
                        }
                    }
                }
                Op::Get(key) => {
                    prop_assert_eq!(t.try_get(&key), m.get(&key).copied());
                    prop_assert_eq!(t.get(&key).ok(), m.get(&key).copied());
                }
            }
            validate_tree(&t);
        }

        let got: Vec<(u16, u64)> = t.iter().map(|(k, v)| (*k, *v)).collect();
        let expected: Vec<(u16, u64)> = m.iter().map(|(k, v)| (*k, *v)).collect();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn prop_sorted(keys in prop::collection::hash_set(any::<u16>(), 0..2000)) {
        let t = Llrb::load_from("prop-sorted", keys.iter().map(|k| (*k, *k as u64)))
            .unwrap();
        validate_tree(&t);

        let mut keys: Vec<u16> = keys.into_iter().collect();
        keys.sort();
        let got: Vec<u16> = t.iter().map(|(k, _)| *k).collect();
        prop_assert_eq!(got, keys);
    }

    #[test]
    fn prop_duplicate_unchanged(
        keys in prop::collection::vec(any::<u16>(), 1..500),
        pick in any::<prop::sample::Index>(),
    ) {
        let mut t: Llrb<u16, u64> = Llrb::new("prop-duplicate");
        for key in keys.iter() {
            let _ = t.insert(*key, *key as u64);
        }
        let (shape, len) = (t.shape(), t.len());

        let key = keys[pick.index(keys.len())];
        prop_assert_eq!(t.insert(key, 0), Err(Error::DuplicateKey(key)));
        prop_assert_eq!(t.shape(), shape);
        prop_assert_eq!(t.len(), len);
        prop_assert_eq!(t.get(&key), Ok(key as u64));
    }

    #[test]
    fn prop_drain(keys in prop::collection::hash_set(any::<u16>(), 0..500)) {
        let mut t: Llrb<u16, u64> = Llrb::new("prop-drain");
        for key in keys.iter() {
            t.insert(*key, *key as u64).unwrap();
        }
        for key in keys.iter() {
            prop_assert_eq!(t.delete(key), Ok(*key as u64));
            prop_assert_eq!(t.get(key), Err(Error::KeyNotFound));
            validate_tree(&t);
        }
        prop_assert!(t.is_empty());
        prop_assert!(t.shape().is_empty());
    }
}
