//! Cross-version persistence tests: drive the containers through operation sequences and check
//! that every version ever produced still reads exactly as it did when it was current.

use std::collections::BTreeMap;

use proptest::prelude::*;
use versioned_collections::{VersionedArray, VersionedMap};

// SCENARIO TESTS
// ================================================================================================

#[test]
fn interleaved_mutations_leave_every_version_readable() {
    let mut array = VersionedArray::with_len(0);
    let mut map = VersionedMap::new();

    // The two containers advance their private clocks independently.
    let a1 = array.push("x");
    let (m1, _) = map.insert(1u32, "one");
    let a2 = array.push("y");
    let (m2, _) = map.insert(1, "uno");
    let a3 = array.replace(0, "z").unwrap();
    let (m3, _) = map.remove(&1);
    let a4 = array.remove_last().unwrap();

    assert_eq!((a1, a2, a3, a4), (1, 2, 3, 4));
    assert_eq!((m1, m2, m3), (1, 2, 3));

    assert_eq!(array.get_at(0, a1).unwrap(), Some(&"x"));
    assert_eq!(array.get_at(1, a2).unwrap(), Some(&"y"));
    assert_eq!(array.get_at(0, a3).unwrap(), Some(&"z"));
    assert_eq!(array.len_at(a4).unwrap(), 1);
    assert_eq!(array.len_at(a2).unwrap(), 2);

    assert_eq!(map.get_at(&1, m1).unwrap(), Some(&"one"));
    assert_eq!(map.get_at(&1, m2).unwrap(), Some(&"uno"));
    assert_eq!(map.get_at(&1, m3).unwrap(), None);
    assert_eq!(map.len_at(m3).unwrap(), 0);
}

// GENERATORS
// ================================================================================================

#[derive(Debug, Clone)]
enum ArrayOp {
    Push(u8),
    RemoveLast,
    Replace(usize, u8),
}

fn arb_array_op() -> impl Strategy<Value = ArrayOp> {
    prop_oneof![
        any::<u8>().prop_map(ArrayOp::Push),
        Just(ArrayOp::RemoveLast),
        // Indexes are drawn from a small range so that both in-range and out-of-range
        // replacements occur.
        (0usize..8, any::<u8>()).prop_map(|(index, value)| ArrayOp::Replace(index, value)),
    ]
}

#[derive(Debug, Clone)]
enum MapOp {
    Insert(u8, u16),
    Remove(u8),
    InsertIfAbsent(u8, u16),
    Replace(u8, u16),
    Clear,
    Extend(Vec<(u8, u16)>),
}

fn arb_map_op() -> impl Strategy<Value = MapOp> {
    // Keys are drawn from a small range so that overwrite, removal and resurrection all occur.
    let key = 0u8..6;
    prop_oneof![
        (key.clone(), any::<u16>()).prop_map(|(k, v)| MapOp::Insert(k, v)),
        key.clone().prop_map(MapOp::Remove),
        (key.clone(), any::<u16>()).prop_map(|(k, v)| MapOp::InsertIfAbsent(k, v)),
        (key.clone(), any::<u16>()).prop_map(|(k, v)| MapOp::Replace(k, v)),
        Just(MapOp::Clear),
        prop::collection::vec((key, any::<u16>()), 0..4).prop_map(MapOp::Extend),
    ]
}

// MODEL TESTS
// ================================================================================================

proptest! {
    /// Replays an arbitrary operation sequence against a [`VersionedArray`] while keeping a
    /// plain snapshot of the expected state per version, then checks every version.
    #[test]
    fn array_matches_a_snapshot_model(ops in prop::collection::vec(arb_array_op(), 0..40)) {
        let mut array = VersionedArray::with_len(0);

        // snapshots[v] is the expected state at version v.
        let mut state: Vec<Option<u8>> = Vec::new();
        let mut snapshots: Vec<Vec<Option<u8>>> = vec![state.clone()];

        for op in ops {
            match op {
                ArrayOp::Push(value) => {
                    array.push(value);
                    state.push(Some(value));
                },
                ArrayOp::RemoveLast => {
                    if state.is_empty() {
                        prop_assert!(array.remove_last().is_err());
                        continue;
                    }
                    array.remove_last().unwrap();
                    state.pop();
                },
                ArrayOp::Replace(index, value) => {
                    if index >= state.len() {
                        prop_assert!(array.replace(index, value).is_err());
                        continue;
                    }
                    array.replace(index, value).unwrap();
                    state[index] = Some(value);
                },
            }
            snapshots.push(state.clone());
        }

        prop_assert_eq!(array.current_version() as usize, snapshots.len() - 1);
        for (version, snapshot) in snapshots.iter().enumerate() {
            let version = version as u64;
            prop_assert_eq!(array.len_at(version).unwrap(), snapshot.len());
            for (index, expected) in snapshot.iter().enumerate() {
                prop_assert_eq!(array.get_at(index, version).unwrap(), expected.as_ref());
            }
        }
    }

    /// Replays an arbitrary operation sequence against a [`VersionedMap`] while keeping a plain
    /// snapshot of the expected state per version, then checks every version against the keys
    /// that ever existed.
    #[test]
    fn map_matches_a_snapshot_model(ops in prop::collection::vec(arb_map_op(), 0..40)) {
        let mut map = VersionedMap::new();

        let mut state: BTreeMap<u8, u16> = BTreeMap::new();
        let mut snapshots: Vec<BTreeMap<u8, u16>> = vec![state.clone()];

        for op in ops {
            match op {
                MapOp::Insert(key, value) => {
                    map.insert(key, value);
                    state.insert(key, value);
                },
                MapOp::Remove(key) => {
                    // Always consumes a version, written or not.
                    map.remove(&key);
                    state.remove(&key);
                },
                MapOp::InsertIfAbsent(key, value) => {
                    if state.contains_key(&key) {
                        prop_assert_eq!(map.insert_if_absent(key, value), None);
                        continue;
                    }
                    prop_assert!(map.insert_if_absent(key, value).is_some());
                    state.insert(key, value);
                },
                MapOp::Replace(key, value) => {
                    if !state.contains_key(&key) {
                        prop_assert_eq!(map.replace(&key, value), None);
                        continue;
                    }
                    prop_assert!(map.replace(&key, value).is_some());
                    state.insert(key, value);
                },
                MapOp::Clear => {
                    map.clear();
                    state.clear();
                },
                MapOp::Extend(entries) => {
                    map.extend(entries.clone());
                    state.extend(entries);
                },
            }
            snapshots.push(state.clone());
        }

        prop_assert_eq!(map.current_version() as usize, snapshots.len() - 1);
        for (version, snapshot) in snapshots.iter().enumerate() {
            let version = version as u64;
            prop_assert_eq!(map.len_at(version).unwrap(), snapshot.len());
            for key in 0u8..6 {
                prop_assert_eq!(map.get_at(&key, version).unwrap(), snapshot.get(&key));
            }
            let entries: Vec<_> = map.iter_at(version).unwrap().map(|(k, v)| (*k, *v)).collect();
            let expected: Vec<_> = snapshot.iter().map(|(k, v)| (*k, *v)).collect();
            prop_assert_eq!(entries, expected);
        }
    }
}
