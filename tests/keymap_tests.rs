use rtprobe::keymap::{populate_probe, CompositeKey, ProbeRecord, StructuralKeyMap, PROBE_RECORDS};
use std::collections::{HashMap, HashSet};

const SEED: i64 = 9_999_999;

#[test]
fn test_keys_differing_in_coordinate_zero_are_independent() {
    let mut map = StructuralKeyMap::<16, u8>::with_capacity_hint(16);

    // 1. Run the probe loop
    populate_probe(&mut map);

    // 2. Every record is its own entry
    assert_eq!(map.size(), 16, "16 distinct keys should give 16 entries");
    for i in 0..PROBE_RECORDS {
        assert_eq!(map.get(&ProbeRecord::with_coordinate(0, i)), Some(i), "record {} should map to itself", i);
    }

    // 3. Keys that were never inserted are absent
    assert_eq!(map.get(&ProbeRecord::with_coordinate(0, 16)), None);
    assert_eq!(map.get(&ProbeRecord::with_coordinate(1, 1)), None);
}

#[test]
fn test_overwrite_on_exact_match() {
    let mut map: StructuralKeyMap<4> = StructuralKeyMap::new();
    let key: CompositeKey<4> = CompositeKey::from([3, 1, 4, 1]);

    assert_eq!(map.put(key, 1), None);
    let before = map.size();

    // A structurally equal key built separately must hit the same entry
    let same: CompositeKey<4> = CompositeKey::zeroed().set(0, 3).set(1, 1).set(2, 4).set(3, 1);
    assert_eq!(map.put(same, 2), Some(1), "second put should return the replaced value");

    assert_eq!(map.get(&key), Some(2), "last write wins");
    assert_eq!(map.size(), before, "overwrite must not change size");
}

#[test]
fn test_preseeded_zero_key_is_overwritten_by_loop() {
    let mut map = StructuralKeyMap::<16, u8>::with_capacity_hint(17);

    // 1. Seed the all-zero key
    map.put(ProbeRecord::zeroed(), SEED);
    assert_eq!(map.size(), 1);

    // 2. Loop inserts coordinate 0 = 0..15; i = 0 is the seed's key
    populate_probe(&mut map);

    // 3. Seed was overwritten, not duplicated
    assert_eq!(map.get(&ProbeRecord::zeroed()), Some(0), "i=0 insertion should overwrite the seed");
    assert_eq!(map.size(), 16, "seed and i=0 share a key, so 16 entries, not 17");
    assert!(
        map.snapshot_entries().all(|(_, v)| v != SEED),
        "seed value must be gone"
    );
}

#[test]
fn test_growth_beyond_hint() {
    for hint in [0usize, 1, 4, 16] {
        let mut map: StructuralKeyMap<3> = StructuralKeyMap::with_capacity_hint(hint);
        for i in 0..200 {
            map.put(CompositeKey::from([i, i % 7, -i]), i * 10);
        }

        assert_eq!(map.size(), 200, "hint {} must not cap the map", hint);
        assert_eq!(map.capacity_hint(), hint);
        for i in 0..200 {
            assert_eq!(map.get(&CompositeKey::from([i, i % 7, -i])), Some(i * 10));
        }
    }
}

#[test]
fn test_untouched_coordinates_take_part_in_equality() {
    let mut map = StructuralKeyMap::<16, u8>::new();

    map.put(ProbeRecord::zeroed(), 1);
    map.put(ProbeRecord::with_coordinate(15, 1), 2);
    map.put(ProbeRecord::zeroed().flagged(1), 3);

    assert_eq!(map.size(), 3, "last coordinate and flag both distinguish keys");
    assert_eq!(map.get(&ProbeRecord::zeroed()), Some(1));
    assert_eq!(map.get(&ProbeRecord::with_coordinate(15, 1)), Some(2));
    assert_eq!(map.get(&ProbeRecord::default().flagged(1)), Some(3));
}

#[test]
fn test_snapshot_entries_cover_every_entry() {
    let mut map = StructuralKeyMap::<2, u8>::with_capacity_hint(4);
    let mut expected = HashMap::new();
    for i in 0..10 {
        let key = CompositeKey::new([i, 0], (i % 2) as u8);
        map.put(key, i);
        expected.insert(key, i);
    }

    let entries = map.snapshot_entries();
    assert_eq!(entries.len(), 10);

    // Order is unspecified, so compare as sets
    let seen: HashMap<_, _> = entries.collect();
    assert_eq!(seen, expected);

    let keys: HashSet<_> = map.snapshot_entries().map(|(k, _)| k).collect();
    assert_eq!(keys.len(), map.size(), "no key yielded twice");
}

#[test]
fn test_empty_map() {
    let map: StructuralKeyMap<8> = StructuralKeyMap::default();
    assert!(map.is_empty());
    assert_eq!(map.size(), 0);
    assert_eq!(map.snapshot_entries().count(), 0);
    assert_eq!(map.get(&CompositeKey::zeroed()), None);
}

#[test]
fn test_extend_follows_put_semantics() {
    let mut map: StructuralKeyMap<2> = StructuralKeyMap::new();
    map.extend(vec![
        (CompositeKey::from([1, 2]), 1),
        (CompositeKey::from([1, 2]), 2),
        (CompositeKey::from([2, 1]), 3),
    ]);

    assert_eq!(map.size(), 2);
    assert_eq!(map.get(&CompositeKey::from([1, 2])), Some(2));
}

#[test]
fn test_rendering() {
    let mut map = StructuralKeyMap::<2, u8>::new();
    map.put(CompositeKey::new([1, 0], 0), 7);
    map.put(CompositeKey::zeroed(), 5);

    assert_eq!(map.to_string(), "map[{[0 0] 0}:5 {[1 0] 0}:7]");
    let plain: CompositeKey<3> = CompositeKey::from([1, 2, 3]);
    assert_eq!(format!("{:?}", plain), "{[1 2 3]}");
    let sparse: CompositeKey<3> = CompositeKey::with_coordinate(2, -4);
    assert_eq!(sparse.to_string(), "{[0 0 -4]}");
}

#[test]
fn test_key_accessors() {
    let key = ProbeRecord::with_coordinate(3, 42);
    assert_eq!(key.len(), 16);
    assert!(!key.is_empty());
    assert_eq!(key.coordinate(3), Some(42));
    assert_eq!(key.coordinate(0), Some(0));
    assert_eq!(key.coordinate(16), None);
    assert_eq!(key.flag, 0);
}
